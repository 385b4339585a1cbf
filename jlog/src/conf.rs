use crate::{
  Error, Result,
  consts::{DEFAULT_BUF_CAP, DEFAULT_MAX_SIZE, DEFAULT_PREALLOC_SIZE},
  header::Version,
};

/// Journal configuration
/// 日志配置
#[derive(Clone, Copy, Debug)]
pub enum Conf {
  /// Write buffer flush threshold
  /// 写缓冲刷盘阈值
  BufCap(usize),
  /// Force-write after this many unforced bytes, 0 disables
  /// 未落盘字节达到此值时强制落盘，0 关闭
  UnpersistedBound(u64),
  /// File growth step
  /// 文件预分配步长
  PreallocSize(u64),
  /// Roll to a new file once the active one exceeds this size
  /// 当前文件超过此大小后滚动
  MaxSize(u64),
  /// Old files kept behind a completed checkpoint
  /// 检查点之前保留的旧文件数
  MaxBackup(usize),
  /// Format version of new files
  /// 新文件的格式版本
  Version(u32),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct JournalConf {
  pub buf_cap: usize,
  pub unpersisted_bound: u64,
  pub prealloc_size: u64,
  pub max_size: u64,
  pub max_backup: usize,
  pub ver: Version,
}

impl Default for JournalConf {
  fn default() -> Self {
    Self {
      buf_cap: DEFAULT_BUF_CAP,
      unpersisted_bound: 0,
      prealloc_size: DEFAULT_PREALLOC_SIZE,
      max_size: DEFAULT_MAX_SIZE,
      max_backup: 0,
      ver: Version::CURRENT,
    }
  }
}

impl JournalConf {
  pub fn new(conf: &[Conf]) -> Result<Self> {
    let mut r = Self::default();
    for c in conf {
      match *c {
        Conf::BufCap(n) => r.buf_cap = n,
        Conf::UnpersistedBound(n) => r.unpersisted_bound = n,
        Conf::PreallocSize(n) => r.prealloc_size = n,
        Conf::MaxSize(n) => r.max_size = n,
        Conf::MaxBackup(n) => r.max_backup = n,
        Conf::Version(v) => r.ver = Version(v),
      }
    }
    if r.buf_cap == 0 {
      return Err(Error::Conf("BufCap must be positive".into()));
    }
    if r.prealloc_size == 0 {
      return Err(Error::Conf("PreallocSize must be positive".into()));
    }
    if !r.ver.is_supported() {
      return Err(Error::Conf(format!("unsupported version {}", r.ver).into()));
    }
    Ok(r)
  }
}
