//! Journal file header and format versions
//! 日志文件头与格式版本
//!
//! ```text
//! | magic "BKLG"(4) | version i32 BE(4) | zero fill to 512 (V5+) |
//! ```

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, byteorder::big_endian::I32};

use crate::{
  Error, Result,
  consts::{HEADER_SIZE, MAGIC, VERSION_HEADER_SIZE},
};

/// Journal format version
/// 日志格式版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u32);

impl Version {
  pub const V2: Self = Self(2);
  pub const V3: Self = Self(3);
  /// Fence entries
  pub const V4: Self = Self(4);
  /// Sector header + padding frames
  /// 扇区头 + 填充帧
  pub const V5: Self = Self(5);
  pub const V6: Self = Self(6);

  pub const MIN: Self = Self::V2;
  pub const CURRENT: Self = Self::V6;

  #[inline]
  pub fn is_supported(self) -> bool {
    (Self::MIN..=Self::CURRENT).contains(&self)
  }

  #[inline]
  pub fn has_padding(self) -> bool {
    self >= Self::V5
  }

  /// Offset of the first frame
  /// 首帧偏移
  #[inline]
  pub fn header_size(self) -> u64 {
    if self.has_padding() {
      HEADER_SIZE
    } else {
      VERSION_HEADER_SIZE
    }
  }
}

impl Default for Version {
  fn default() -> Self {
    Self::CURRENT
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "V{}", self.0)
  }
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Clone, Copy, Debug)]
struct Head {
  magic: [u8; 4],
  ver: I32,
}

/// Header bytes for a new file, zero filled to `header_size`
/// 新文件头字节，零填充至 `header_size`
pub fn build(ver: Version) -> Vec<u8> {
  let head = Head {
    magic: MAGIC,
    ver: I32::new(ver.0 as i32),
  };
  let mut buf = vec![0u8; ver.header_size() as usize];
  buf[..VERSION_HEADER_SIZE as usize].copy_from_slice(head.as_bytes());
  buf
}

/// Validate header of journal `id`, `len` is the file length
/// 校验日志 `id` 的文件头，`len` 为文件长度
pub fn parse(id: u64, buf: &[u8], len: u64) -> Result<Version> {
  let Ok((head, _)) = Head::read_from_prefix(buf) else {
    return Err(Error::format(id, "too short for header"));
  };
  if head.magic != MAGIC {
    return Err(Error::format(id, "bad magic"));
  }
  let v = head.ver.get();
  let ver = Version(u32::try_from(v).unwrap_or(0));
  if !ver.is_supported() {
    return Err(Error::format(id, format!("unsupported version {v}")));
  }
  if len < ver.header_size() {
    return Err(Error::format(id, format!("{ver} header truncated at {len}")));
  }
  Ok(ver)
}

/// No header bytes were ever written: empty, or zeros where the magic goes
/// 从未写入文件头：空，或魔数处为零
#[inline]
pub fn is_blank(buf: &[u8]) -> bool {
  buf.iter().take(VERSION_HEADER_SIZE as usize).all(|b| *b == 0)
}
