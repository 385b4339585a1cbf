//! Error types for jlog
//! jlog 错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("fs: {0}")]
  Fs(#[from] jlog_fs::Error),

  /// Header missing, unknown magic or unsupported version
  /// 文件头缺失、魔数未知或版本不支持
  #[error("journal {id:x}: bad format: {msg}")]
  Format { id: u64, msg: Box<str> },

  /// Frame length impossible for a well-formed journal
  /// 帧长度不合法
  #[error("journal {id:x}: corrupt frame at {offset}, len {len}")]
  Corrupt { id: u64, offset: u64, len: i64 },

  #[error("journal {0:x} not found")]
  NotFound(u64),

  /// Write path used on a channel opened for scanning
  /// 在扫描用通道上写入
  #[error("journal {0:x} opened read only")]
  ReadOnly(u64),

  #[error("invalid conf: {0}")]
  Conf(Box<str>),

  #[error("entry too large: {0} > {1}")]
  TooLarge(usize, usize),

  #[error("empty entry")]
  Empty,

  #[error("bad entry: {0}")]
  BadEntry(&'static str),

  #[error("{0}")]
  Other(Box<str>),
}

impl Error {
  /// Create Other error, e.g. from a failing scanner
  /// 创建 Other 错误，如扫描器失败
  #[inline]
  pub fn other(msg: impl Into<Box<str>>) -> Self {
    Self::Other(msg.into())
  }

  #[inline]
  pub(crate) fn format(id: u64, msg: impl Into<Box<str>>) -> Self {
    Self::Format {
      id,
      msg: msg.into(),
    }
  }
}
