//! Frame encoding
//! 帧编码
//!
//! ```text
//! data:    | len i32 BE | payload(len) |
//! padding: | PADDING_MASK | pad i32 BE | zero(pad) |
//! ```

use crate::consts::{LEN_SIZE, PADDING_HEAD, PADDING_MASK, SECTOR_SIZE};

/// One step of a scan
/// 扫描的一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
  /// Real frame starting at `offset`
  /// 起始于 `offset` 的数据帧
  Data { offset: u64, payload: Vec<u8> },
  /// Clean end: EOF, zeroed tail or truncated frame
  /// 正常结束：EOF、零填充尾部或被截断的帧
  End,
}

/// Length prefix + payload
pub fn encode(payload: &[u8]) -> Vec<u8> {
  let mut buf = Vec::with_capacity(LEN_SIZE as usize + payload.len());
  buf.extend_from_slice(&(payload.len() as i32).to_be_bytes());
  buf.extend_from_slice(payload);
  buf
}

/// Padding frame moving `pos` to a sector boundary, `None` when aligned
/// 将 `pos` 对齐到扇区边界的填充帧，已对齐返回 `None`
///
/// If the gap cannot hold the 8 byte padding head, the frame runs to the
/// following boundary.
/// 空隙放不下 8 字节填充头时，延伸到下一个边界。
pub fn padding(pos: u64) -> Option<Vec<u8>> {
  let rem = pos % SECTOR_SIZE;
  if rem == 0 {
    return None;
  }
  let gap = SECTOR_SIZE - rem;
  let pad = if gap < PADDING_HEAD {
    SECTOR_SIZE - (PADDING_HEAD - gap)
  } else {
    gap - PADDING_HEAD
  };

  let mut buf = Vec::with_capacity((PADDING_HEAD + pad) as usize);
  buf.extend_from_slice(&PADDING_MASK.to_be_bytes());
  buf.extend_from_slice(&(pad as i32).to_be_bytes());
  buf.resize((PADDING_HEAD + pad) as usize, 0);
  Some(buf)
}
