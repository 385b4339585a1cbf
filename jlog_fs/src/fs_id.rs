//! Journal file naming: lowercase hex id + extension
//! 日志文件命名：小写十六进制 id + 扩展名

use std::path::{Path, PathBuf};

/// Encode id as file name
/// 将 id 编码为文件名
#[inline(always)]
pub fn encode_id(id: u64, ext: &str) -> String {
  format!("{id:x}.{ext}")
}

/// Decode file name to id, `None` for foreign files
/// 将文件名解码为 id，非本类文件返回 `None`
pub fn decode_id(name: &str, ext: &str) -> Option<u64> {
  let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
  if stem.is_empty() || stem.len() > 16 || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
    return None;
  }
  u64::from_str_radix(stem, 16).ok()
}

/// Join dir with encoded id
/// 将目录与编码后的 id 拼接
#[inline(always)]
pub fn id_path(dir: &Path, id: u64, ext: &str) -> PathBuf {
  dir.join(encode_id(id, ext))
}
