//! Checkpoint creation and retention
//! 检查点创建与旧文件回收

use std::fs;

use jlog_fs::{fs::sync_dir, fs_id::id_path};
use log::{info, warn};

use super::{Journal, list_journal_ids};
use crate::{
  Result,
  ckp::{Checkpoint, store_mark},
  consts::EXT,
};

impl Journal {
  /// Force, then capture the durable mark
  /// 先强制落盘，再捕获已落盘标记
  pub async fn new_checkpoint(&mut self) -> Result<Checkpoint> {
    Ok(Checkpoint::new(self.force().await?))
  }

  /// Persist the checkpoint and, with `compact`, remove files it supersedes
  /// 持久化检查点，`compact` 时删除被其覆盖的文件
  ///
  /// Files older than the checkpoint file are removed except the newest
  /// `MaxBackup`. Returns the removed ids.
  /// 删除早于检查点文件的日志，保留最新的 `MaxBackup` 个，返回被删除的 id。
  pub async fn checkpoint_complete(&mut self, ckp: Checkpoint, compact: bool) -> Result<Vec<u64>> {
    let mark = ckp.mark();
    if mark > self.stored {
      store_mark(&self.dir, mark).await?;
      self.stored = mark;
    }
    if !compact {
      return Ok(Vec::new());
    }

    let mut old = list_journal_ids(&self.dir, |id| id < mark.log_id)?;
    old.truncate(old.len().saturating_sub(self.conf.max_backup));

    let mut removed = Vec::with_capacity(old.len());
    for id in old {
      let path = id_path(&self.dir, id, EXT);
      match fs::remove_file(&path) {
        Ok(()) => {
          info!("journal {id:x} removed, superseded by {mark:?}");
          removed.push(id);
        }
        Err(e) => warn!("remove {path:?}: {e}"),
      }
    }
    if !removed.is_empty() {
      sync_dir(&self.dir).await?;
    }
    Ok(removed)
  }
}
