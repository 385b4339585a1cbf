//! Error types for jlog_fs
//! jlog_fs 错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  /// Flush threshold must be positive
  /// 刷盘阈值必须为正
  #[error("invalid buffer capacity: {0}")]
  InvalidCap(usize),

  #[error("destination holds {cap} bytes, {want} requested")]
  InvalidArg { want: usize, cap: usize },

  #[error("channel closed / 通道已关闭")]
  Closed,

  #[error("short read at {pos}: want {want}")]
  ShortRead { pos: u64, want: usize },
}
