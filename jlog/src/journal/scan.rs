//! Scan and replay
//! 扫描与回放

use std::fs;

use jlog_fs::fs_id::id_path;
use log::{debug, warn};

use super::{Journal, list_journal_ids};
use crate::{
  Error, Result,
  channel::JournalChannel,
  ckp::LogMark,
  consts::EXT,
  frame::Frame,
  scan::Scanner,
};

/// Recovery state of one file
/// 单个文件的恢复状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
  Unscanned,
  Scanning,
  Scanned,
  Corrupt,
}

/// Result of `Journal::replay`
/// `Journal::replay` 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
  /// Ids scanned, ascending
  /// 已扫描的 id，升序
  pub scanned: Vec<u64>,
  pub entries: u64,
  /// Where the last scanned file stopped
  /// 最后一个文件的扫描终点
  pub end: LogMark,
}

async fn scan_channel(
  ch: &JournalChannel,
  pos: u64,
  scanner: &mut impl Scanner,
) -> Result<(u64, u64)> {
  let ver = ch.ver();
  let mut pos = pos;
  let mut n = 0;
  loop {
    match ch.read_frame_at(pos).await? {
      (Frame::Data { offset, payload }, next) => {
        scanner.process(ver, offset, &payload)?;
        n += 1;
        pos = next;
      }
      (Frame::End, end) => return Ok((end, n)),
    }
  }
}

impl Journal {
  /// Feed every frame of journal `id` from `pos` to `scanner`, return the final offset
  /// 将日志 `id` 自 `pos` 起的每帧交给 `scanner`，返回最终偏移
  ///
  /// `pos` inside the header starts at the first frame. The active file is
  /// scanned through its buffer so unflushed frames are seen.
  /// `pos` 位于文件头内时从首帧开始；当前文件经缓冲扫描，可见未刷盘的帧。
  pub async fn scan_journal(&self, id: u64, pos: u64, scanner: &mut impl Scanner) -> Result<u64> {
    Ok(self.scan(id, pos, scanner).await?.0)
  }

  async fn scan(&self, id: u64, pos: u64, scanner: &mut impl Scanner) -> Result<(u64, u64)> {
    debug!("journal {id:x} from {pos}: {:?}", ScanState::Scanning);
    let r = match self.cur.as_ref().filter(|c| c.id() == id) {
      Some(cur) => scan_channel(cur, pos, scanner).await,
      None => {
        let ch = JournalChannel::open_read(&self.dir, id).await?;
        scan_channel(&ch, pos, scanner).await
      }
    };
    match &r {
      Ok((end, n)) => debug!("journal {id:x} {:?}: {n} frames, end {end}", ScanState::Scanned),
      Err(e @ Error::Corrupt { .. }) => warn!("journal {id:x} {:?}: {e}", ScanState::Corrupt),
      Err(_) => {}
    }
    r
  }

  /// Scan every file from the last mark on, ascending
  /// 自最后标记起按升序扫描全部文件
  ///
  /// The marked file starts at the marked offset, later files at their first
  /// frame. The end of the scan becomes durable. A newest file whose header
  /// never reached the disk holds nothing and is removed.
  /// 标记所在文件从标记偏移开始，其后文件从首帧开始；扫描终点记为已落盘。
  /// 文件头未落盘的最新文件不含数据，直接删除。
  pub async fn replay(&mut self, scanner: &mut impl Scanner) -> Result<Replay> {
    let from = self.stored;
    let ids = list_journal_ids(&self.dir, |id| id >= from.log_id)?;
    for id in &ids {
      debug!("journal {id:x}: {:?}", ScanState::Unscanned);
    }
    let newest = ids.last().copied();

    let mut r = Replay {
      scanned: Vec::with_capacity(ids.len()),
      entries: 0,
      end: from,
    };
    for id in ids {
      let pos = if id == from.log_id { from.offset } else { 0 };
      let scanned = self.scan(id, pos, scanner).await;
      if matches!(scanned, Err(Error::Format { .. }))
        && Some(id) == newest
        && JournalChannel::header_blank(&self.dir, id).await?
      {
        warn!("journal {id:x} has no header, torn create removed");
        fs::remove_file(id_path(&self.dir, id, EXT))?;
        break;
      }
      let (end, n) = scanned?;
      r.scanned.push(id);
      r.entries += n;
      r.end = LogMark::new(id, end);
    }

    self.durable = self.durable.max(r.end);
    self.last_id = self.last_id.max(r.end.log_id);
    Ok(r)
  }
}

/// Replay several directories in order
/// 按顺序回放多个目录
pub async fn replay_all(journals: &mut [Journal], scanner: &mut impl Scanner) -> Result<Vec<Replay>> {
  let mut out = Vec::with_capacity(journals.len());
  for journal in journals {
    out.push(journal.replay(scanner).await?);
  }
  Ok(out)
}
