//! Log marks, checkpoints and the persisted last mark
//! 日志标记、检查点与持久化的最后标记

use std::{io, path::Path};

use jlog_fs::fs::{atomic_write, read_all};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, byteorder::big_endian::U64};

use crate::{Error, Result, consts::LAST_MARK};

/// Position in a journal directory, ordered by `(log_id, offset)`
/// 日志目录中的位置，按 `(log_id, offset)` 排序
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogMark {
  pub log_id: u64,
  pub offset: u64,
}

impl LogMark {
  #[inline]
  pub const fn new(log_id: u64, offset: u64) -> Self {
    Self { log_id, offset }
  }
}

/// Durable mark handed out by `Journal::new_checkpoint`
/// 由 `Journal::new_checkpoint` 生成的已落盘标记
///
/// Not `Clone`: completing it consumes it.
/// 不可克隆：完成即消耗。
#[derive(Debug, PartialEq, Eq)]
pub struct Checkpoint {
  mark: LogMark,
}

impl Checkpoint {
  #[inline]
  pub(crate) fn new(mark: LogMark) -> Self {
    Self { mark }
  }

  #[inline]
  pub fn mark(&self) -> LogMark {
    self.mark
  }
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
struct MarkDisk {
  log_id: U64,
  offset: U64,
}

/// Load `lastMark` from `dir`, default when absent
/// 从 `dir` 加载 `lastMark`，不存在时返回默认值
pub async fn load_mark(dir: &Path) -> Result<LogMark> {
  let buf = match read_all(dir.join(LAST_MARK)).await {
    Ok(buf) => buf,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LogMark::default()),
    Err(e) => return Err(e.into()),
  };
  let Ok(disk) = MarkDisk::read_from_bytes(&buf) else {
    return Err(Error::other(format!(
      "{LAST_MARK}: expect {} bytes, got {}",
      size_of::<MarkDisk>(),
      buf.len()
    )));
  };
  Ok(LogMark::new(disk.log_id.get(), disk.offset.get()))
}

/// Persist `mark` as `lastMark` (temp file + fsync + rename)
/// 持久化 `lastMark`（临时文件 + fsync + 重命名）
pub async fn store_mark(dir: &Path, mark: LogMark) -> Result<()> {
  let disk = MarkDisk {
    log_id: U64::new(mark.log_id),
    offset: U64::new(mark.offset),
  };
  atomic_write(&dir.join(LAST_MARK), disk.as_bytes().to_vec()).await?;
  Ok(())
}
