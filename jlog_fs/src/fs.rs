//! File operations utilities
//! 文件操作工具

use std::path::Path;

use compio::{
  BufResult,
  buf::{IntoInner, IoBuf},
  io::{AsyncReadAtExt, AsyncWriteAtExt},
};
use compio_fs::File;

/// Open file for reading
/// 打开文件用于读取
#[inline]
pub async fn open_read(path: impl AsRef<Path>) -> std::io::Result<File> {
  compio_fs::OpenOptions::new().read(true).open(path).await
}

/// Open existing file for reading and writing
/// 打开已有文件用于读写
#[inline]
pub async fn open_read_write(path: impl AsRef<Path>) -> std::io::Result<File> {
  compio_fs::OpenOptions::new()
    .read(true)
    .write(true)
    .open(path)
    .await
}

/// Create a new file for reading and writing, fail if it exists
/// 新建文件用于读写，已存在则失败
#[inline]
pub async fn create_new(path: impl AsRef<Path>) -> std::io::Result<File> {
  compio_fs::OpenOptions::new()
    .read(true)
    .write(true)
    .create_new(true)
    .open(path)
    .await
}

/// Fsync a directory so entries created, renamed or removed in it survive a crash
/// fsync 目录，使其中新建、重命名或删除的条目在崩溃后仍然有效
#[inline]
pub async fn sync_dir(dir: &Path) -> std::io::Result<()> {
  open_read(dir).await?.sync_all().await
}

/// Replace `path` with `data` in one step: `<path>.tmp` + fsync + rename + fsync dir
/// 一步替换 `path` 内容：`<path>.tmp` + fsync + 重命名 + fsync 目录
///
/// Readers see either the old or the new content, never a mix.
/// 读取方只会看到旧内容或新内容，不会混合。
pub async fn atomic_write(path: &Path, data: Vec<u8>) -> std::io::Result<u64> {
  let tmp = path.with_extension("tmp");
  // No-op once renamed away
  // 重命名后为空操作
  defer_lite::defer! { let _ = std::fs::remove_file(&tmp); }

  let len = {
    let mut file = File::create(&tmp).await?;
    let BufResult(r, data) = file.write_all_at(data, 0).await;
    r?;
    file.sync_all().await?;
    data.len() as u64
  };

  compio_fs::rename(&tmp, path).await?;
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    sync_dir(dir).await?;
  }
  Ok(len)
}

/// Read entire file into Vec
/// 读取整个文件到 Vec
pub async fn read_all(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
  let file = open_read(path).await?;
  let len = file.metadata().await?.len() as usize;
  if len == 0 {
    return Ok(Vec::new());
  }

  let buf = vec![0; len];
  let res = file.read_exact_at(buf.slice(0..len), 0).await;
  res.0?;
  Ok(res.1.into_inner())
}
