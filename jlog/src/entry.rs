//! Entry payload codec
//! 条目负载编解码
//!
//! Every payload starts with `ledger_id i64 BE | entry_id i64 BE`. Negative
//! entry ids are sentinels for meta shapes; the rest of a data entry is opaque.
//! 负载均以 `ledger_id | entry_id` 开头，负的 entry_id 为元数据哨兵，数据条目其余部分不解析。

use crate::{Error, Result};

/// Meta entry: ledger master key
pub const METAENTRY_ID_LEDGER_KEY: i64 = -0x1000;
/// Fence entry
pub const METAENTRY_ID_FENCE_KEY: i64 = -0x2000;
/// Force-ledger marker
pub const METAENTRY_ID_FORCE_LEDGER: i64 = -0x4000;
/// Explicit last-add-confirmed
pub const METAENTRY_ID_LEDGER_EXPLICITLAC: i64 = -0x8000;

const ID_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
  /// `body` = everything after the two ids
  Data {
    ledger_id: i64,
    entry_id: i64,
    body: Vec<u8>,
  },
  Meta {
    ledger_id: i64,
    master_key: Vec<u8>,
  },
  Fence {
    ledger_id: i64,
  },
  ForceLedger {
    ledger_id: i64,
  },
  ExplicitLac {
    ledger_id: i64,
    lac: Vec<u8>,
  },
}

impl Entry {
  #[inline]
  pub fn ledger_id(&self) -> i64 {
    match self {
      Self::Data { ledger_id, .. }
      | Self::Meta { ledger_id, .. }
      | Self::Fence { ledger_id }
      | Self::ForceLedger { ledger_id }
      | Self::ExplicitLac { ledger_id, .. } => *ledger_id,
    }
  }

  #[inline]
  pub fn is_fence(&self) -> bool {
    matches!(self, Self::Fence { .. })
  }

  pub fn encode(&self) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ID_SIZE + self.tail_len());
    buf.extend_from_slice(&self.ledger_id().to_be_bytes());
    match self {
      Self::Data { entry_id, body, .. } => {
        buf.extend_from_slice(&entry_id.to_be_bytes());
        buf.extend_from_slice(body);
      }
      Self::Meta { master_key, .. } => {
        buf.extend_from_slice(&METAENTRY_ID_LEDGER_KEY.to_be_bytes());
        push_bytes(&mut buf, master_key);
      }
      Self::Fence { .. } => buf.extend_from_slice(&METAENTRY_ID_FENCE_KEY.to_be_bytes()),
      Self::ForceLedger { .. } => {
        buf.extend_from_slice(&METAENTRY_ID_FORCE_LEDGER.to_be_bytes())
      }
      Self::ExplicitLac { lac, .. } => {
        buf.extend_from_slice(&METAENTRY_ID_LEDGER_EXPLICITLAC.to_be_bytes());
        push_bytes(&mut buf, lac);
      }
    }
    buf
  }

  pub fn decode(payload: &[u8]) -> Result<Self> {
    if payload.len() < ID_SIZE {
      return Err(Error::BadEntry("shorter than ids"));
    }
    let ledger_id = read_i64(&payload[..8]);
    let entry_id = read_i64(&payload[8..ID_SIZE]);
    let rest = &payload[ID_SIZE..];
    Ok(match entry_id {
      METAENTRY_ID_LEDGER_KEY => Self::Meta {
        ledger_id,
        master_key: read_bytes(rest)?,
      },
      METAENTRY_ID_FENCE_KEY => Self::Fence { ledger_id },
      METAENTRY_ID_FORCE_LEDGER => Self::ForceLedger { ledger_id },
      METAENTRY_ID_LEDGER_EXPLICITLAC => Self::ExplicitLac {
        ledger_id,
        lac: read_bytes(rest)?,
      },
      id if id < 0 => return Err(Error::BadEntry("unknown sentinel")),
      _ => Self::Data {
        ledger_id,
        entry_id,
        body: rest.to_vec(),
      },
    })
  }

  fn tail_len(&self) -> usize {
    match self {
      Self::Data { body, .. } => body.len(),
      Self::Meta { master_key, .. } => 4 + master_key.len(),
      Self::ExplicitLac { lac, .. } => 4 + lac.len(),
      Self::Fence { .. } | Self::ForceLedger { .. } => 0,
    }
  }
}

#[inline]
fn read_i64(b: &[u8]) -> i64 {
  let mut a = [0u8; 8];
  a.copy_from_slice(b);
  i64::from_be_bytes(a)
}

#[inline]
fn push_bytes(buf: &mut Vec<u8>, data: &[u8]) {
  buf.extend_from_slice(&(data.len() as i32).to_be_bytes());
  buf.extend_from_slice(data);
}

/// `len i32 BE | bytes(len)`
fn read_bytes(rest: &[u8]) -> Result<Vec<u8>> {
  let Some((len, data)) = rest.split_first_chunk::<4>() else {
    return Err(Error::BadEntry("missing length"));
  };
  let len = i32::from_be_bytes(*len);
  let Ok(len) = usize::try_from(len) else {
    return Err(Error::BadEntry("negative length"));
  };
  if data.len() < len {
    return Err(Error::BadEntry("truncated bytes"));
  }
  Ok(data[..len].to_vec())
}
