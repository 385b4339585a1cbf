//! Journal manager over one directory
//! 单个目录的日志管理器
//!
//! ```text
//! dir/
//!   18c2f0a1b2c.txn   <- older, removable after a checkpoint
//!   18c2f0a1b2d.txn   <- active
//!   lastMark          <- log_id u64 BE | offset u64 BE
//! ```

mod ckp;
mod scan;
mod write;

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use jlog_fs::fs_id::decode_id;
use log::debug;

pub use scan::{Replay, ScanState, replay_all};

use crate::{
  Conf, Result,
  channel::JournalChannel,
  ckp::{LogMark, load_mark},
  conf::JournalConf,
  consts::EXT,
};

/// Write-ahead journal of one directory
/// 单个目录的预写日志
pub struct Journal {
  dir: PathBuf,
  conf: JournalConf,
  cur: Option<JournalChannel>,
  last_id: u64,
  /// Highest forced position
  /// 已强制落盘的最高位置
  durable: LogMark,
  /// Mark persisted in `lastMark`
  /// 持久化于 `lastMark` 的标记
  stored: LogMark,
}

impl Journal {
  /// Open `dir`, creating it if missing; no log file is created until the first append
  /// 打开 `dir`，不存在则创建；首次追加前不创建日志文件
  pub async fn open(dir: impl Into<PathBuf>, conf: &[Conf]) -> Result<Self> {
    let conf = JournalConf::new(conf)?;
    let dir = dir.into();
    fs::create_dir_all(&dir)?;

    let stored = load_mark(&dir).await?;
    let last_id = list_journal_ids(&dir, |_| true)?
      .last()
      .copied()
      .unwrap_or(0)
      .max(stored.log_id);
    debug!("journal dir {dir:?} opened, last mark {stored:?}, last id {last_id:x}");
    Ok(Self {
      dir,
      conf,
      cur: None,
      last_id,
      durable: stored,
      stored,
    })
  }

  #[inline]
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Active file, `None` before the first append or after a roll
  /// 当前文件，首次追加前或滚动后为 `None`
  #[inline]
  pub fn cur(&self) -> Option<&JournalChannel> {
    self.cur.as_ref()
  }

  #[inline]
  pub fn durable(&self) -> LogMark {
    self.durable
  }

  /// Mark loaded from or last written to `lastMark`
  /// 从 `lastMark` 加载或最近写入的标记
  #[inline]
  pub fn last_mark(&self) -> LogMark {
    self.stored
  }

  /// All journal ids in the directory, ascending
  /// 目录中全部日志 id，升序
  #[inline]
  pub fn ids(&self) -> Result<Vec<u64>> {
    list_journal_ids(&self.dir, |_| true)
  }
}

/// Ids of `<hex>.txn` files in `dir` accepted by `filter`, ascending
/// `dir` 中被 `filter` 接受的 `<hex>.txn` 文件 id，升序
///
/// A missing directory has no journals.
/// 目录不存在时返回空。
pub fn list_journal_ids(dir: &Path, filter: impl Fn(u64) -> bool) -> Result<Vec<u64>> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(e.into()),
  };
  let mut ids: Vec<u64> = entries
    .flatten()
    .filter_map(|e| decode_id(e.file_name().to_str()?, EXT))
    .filter(|id| filter(*id))
    .collect();
  ids.sort_unstable();
  Ok(ids)
}
