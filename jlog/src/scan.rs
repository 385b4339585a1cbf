//! Scanner trait and stock scanners
//! 扫描器 trait 与内置扫描器

use std::collections::BTreeMap;

use log::debug;

use crate::{Entry, Result, header::Version};

/// Receives every real frame of a scan in file order
/// 按文件顺序接收扫描到的每个数据帧
///
/// An error aborts the scan and is returned to the caller.
/// 返回错误会中止扫描并传给调用方。
pub trait Scanner {
  fn process(&mut self, ver: Version, offset: u64, payload: &[u8]) -> Result<()>;
}

impl<F> Scanner for F
where
  F: FnMut(Version, u64, &[u8]) -> Result<()>,
{
  #[inline]
  fn process(&mut self, ver: Version, offset: u64, payload: &[u8]) -> Result<()> {
    self(ver, offset, payload)
  }
}

/// Logs each frame at debug level
/// 以 debug 级别记录每帧
#[derive(Debug, Default)]
pub struct LogScanner {
  pub frames: u64,
}

impl Scanner for LogScanner {
  fn process(&mut self, ver: Version, offset: u64, payload: &[u8]) -> Result<()> {
    self.frames += 1;
    match Entry::decode(payload) {
      Ok(entry) => debug!("{ver} @{offset}: {} bytes, {entry:?}", payload.len()),
      Err(_) => debug!("{ver} @{offset}: {} opaque bytes", payload.len()),
    }
    Ok(())
  }
}

/// Per ledger state rebuilt by `LedgerIndex`
/// `LedgerIndex` 重建的单个账本状态
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LedgerState {
  pub master_key: Option<Vec<u8>>,
  pub fenced: bool,
  pub last_entry: Option<i64>,
  pub entries: u64,
  pub explicit_lac: Option<Vec<u8>>,
}

/// Rebuilds ledger metadata from journal entries
/// 从日志条目重建账本元数据
#[derive(Debug, Default)]
pub struct LedgerIndex {
  pub ledgers: BTreeMap<i64, LedgerState>,
}

impl LedgerIndex {
  #[inline]
  pub fn get(&self, ledger_id: i64) -> Option<&LedgerState> {
    self.ledgers.get(&ledger_id)
  }
}

impl Scanner for LedgerIndex {
  fn process(&mut self, _ver: Version, _offset: u64, payload: &[u8]) -> Result<()> {
    let entry = Entry::decode(payload)?;
    let state = self.ledgers.entry(entry.ledger_id()).or_default();
    match entry {
      Entry::Data { entry_id, .. } => {
        state.entries += 1;
        state.last_entry = Some(state.last_entry.map_or(entry_id, |e| e.max(entry_id)));
      }
      Entry::Meta { master_key, .. } => state.master_key = Some(master_key),
      Entry::Fence { .. } => state.fenced = true,
      Entry::ForceLedger { .. } => {}
      Entry::ExplicitLac { lac, .. } => state.explicit_lac = Some(lac),
    }
    Ok(())
  }
}

/// Checks that every payload decodes and counts entry kinds
/// 校验每个负载可解码并统计条目类型
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
  pub data: u64,
  pub meta: u64,
  pub fence: u64,
  pub force_ledger: u64,
  pub explicit_lac: u64,
  /// Offset of the last frame seen
  pub last_offset: u64,
}

impl Validator {
  #[inline]
  pub fn total(&self) -> u64 {
    self.data + self.meta + self.fence + self.force_ledger + self.explicit_lac
  }
}

impl Scanner for Validator {
  fn process(&mut self, _ver: Version, offset: u64, payload: &[u8]) -> Result<()> {
    match Entry::decode(payload)? {
      Entry::Data { .. } => self.data += 1,
      Entry::Meta { .. } => self.meta += 1,
      Entry::Fence { .. } => self.fence += 1,
      Entry::ForceLedger { .. } => self.force_ledger += 1,
      Entry::ExplicitLac { .. } => self.explicit_lac += 1,
    }
    self.last_offset = offset;
    Ok(())
  }
}
