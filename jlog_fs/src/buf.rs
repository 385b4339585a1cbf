//! Buffered channel over a positional file
//! 基于定位读写文件的缓冲通道
//!
//! ```text
//! | flushed (file)        | buffered (memory) |
//! 0 ............... buf_start ................ pos
//! ```
//!
//! Reads stitch both regions, so bytes are visible before they reach the file.
//! 读取会拼接两段区域，数据落盘前即可读到。

use std::io;

use compio::{
  BufResult,
  buf::{IntoInner, IoBuf},
  io::{AsyncReadAtExt, AsyncWriteAtExt},
};
use compio_fs::File;
use log::warn;

use crate::{Error, Result};

/// Buffer kept after flush is shrunk to this size
/// 刷盘后缓冲区容量上限
const MAX_BUF_SIZE: usize = 4 * 1024 * 1024;

/// Largest zero block written when reserving file space
/// 预留文件空间时写入的最大零块
const ZERO_BLOCK: u64 = 512;

/// Write buffer in front of one file
/// 单个文件前的写缓冲
pub struct BufferedChannel {
  file: Option<File>,
  buf: Vec<u8>,
  buf_start: u64,
  cap: usize,
  unpersisted_bound: u64,
  unpersisted: u64,
}

impl BufferedChannel {
  /// Bind to `file` with the logical end at `pos`
  /// 绑定文件，逻辑末尾位于 `pos`
  ///
  /// `cap` is the flush threshold and must be positive. `unpersisted_bound`
  /// forces an fsync once that many bytes were written since the last one
  /// (0 disables it).
  /// `cap` 为刷盘阈值，必须为正；`unpersisted_bound` 为未落盘字节上限（0 关闭）。
  pub fn new(file: File, pos: u64, cap: usize, unpersisted_bound: u64) -> Result<Self> {
    if cap == 0 {
      return Err(Error::InvalidCap(cap));
    }
    Ok(Self {
      file: Some(file),
      buf: Vec::with_capacity(cap.min(MAX_BUF_SIZE)),
      buf_start: pos,
      cap,
      unpersisted_bound,
      unpersisted: 0,
    })
  }

  /// Logical end offset (flushed + buffered)
  /// 逻辑末尾偏移（已刷盘 + 缓冲）
  #[inline(always)]
  pub fn pos(&self) -> u64 {
    self.buf_start + self.buf.len() as u64
  }

  /// File offset of the first buffered byte
  /// 首个缓冲字节的文件偏移
  #[inline(always)]
  pub fn buf_start(&self) -> u64 {
    self.buf_start
  }

  #[inline(always)]
  pub fn buffered(&self) -> usize {
    self.buf.len()
  }

  #[inline(always)]
  pub fn cap(&self) -> usize {
    self.cap
  }

  /// Bytes written since the last force-write
  /// 上次强制落盘后写入的字节数
  #[inline(always)]
  pub fn unpersisted(&self) -> u64 {
    self.unpersisted
  }

  #[inline(always)]
  pub fn is_open(&self) -> bool {
    self.file.is_some()
  }

  #[inline]
  fn file(&self) -> Result<&File> {
    self.file.as_ref().ok_or(Error::Closed)
  }

  /// Append bytes, flushing each time the buffer reaches capacity
  /// 追加数据，缓冲满即刷盘
  pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
    if self.file.is_none() {
      return Err(Error::Closed);
    }
    let len = data.len();
    let mut copied = 0;
    while copied < len {
      // cap > 0 and a full buffer is flushed below, so n >= 1
      let n = (len - copied).min(self.cap - self.buf.len());
      self.buf.extend_from_slice(&data[copied..copied + n]);
      copied += n;
      if self.buf.len() >= self.cap {
        self.flush().await?;
      }
    }

    if self.unpersisted_bound > 0 {
      self.unpersisted += len as u64;
      if self.unpersisted >= self.unpersisted_bound {
        self.flush_and_force_write(true).await?;
      }
    }
    Ok(len)
  }

  /// Write buffered bytes to the file at `buf_start`
  /// 将缓冲写入文件 `buf_start` 处
  pub async fn flush(&mut self) -> Result<()> {
    let Some(file) = self.file.as_mut() else {
      return Err(Error::Closed);
    };
    if self.buf.is_empty() {
      return Ok(());
    }

    let buf = std::mem::take(&mut self.buf);
    let BufResult(r, mut buf) = file.write_all_at(buf, self.buf_start).await;
    if let Err(e) = r {
      // Keep bytes so the boundary still matches the file
      // 保留数据，使边界与文件一致
      self.buf = buf;
      return Err(e.into());
    }

    self.buf_start += buf.len() as u64;
    buf.clear();
    if buf.capacity() > MAX_BUF_SIZE {
      buf.shrink_to(MAX_BUF_SIZE);
    }
    self.buf = buf;
    Ok(())
  }

  /// Flush, then fsync when `force`
  /// 刷盘，`force` 时再 fsync
  pub async fn flush_and_force_write(&mut self, force: bool) -> Result<()> {
    self.flush().await?;
    if force {
      self.file()?.sync_data().await?;
      self.unpersisted = 0;
    }
    Ok(())
  }

  #[inline]
  pub async fn sync(&mut self) -> Result<()> {
    self.flush_and_force_write(true).await
  }

  /// Read up to `len` bytes at `pos` into `dest`, return bytes copied
  /// 从 `pos` 读取至多 `len` 字节到 `dest`，返回复制字节数
  ///
  /// The range is clamped to `pos()`. `dest` shorter than `len` is rejected
  /// before anything is copied.
  /// 范围截断到 `pos()`；`dest` 小于 `len` 时直接拒绝。
  pub async fn read(&self, dest: &mut [u8], pos: u64, len: usize) -> Result<usize> {
    if len == 0 {
      return Ok(0);
    }
    if dest.len() < len {
      return Err(Error::InvalidArg {
        want: len,
        cap: dest.len(),
      });
    }
    let file = self.file()?;
    let end = self.pos();
    if pos >= end {
      return Ok(0);
    }
    let n = (len as u64).min(end - pos) as usize;

    let mut done = 0;
    if pos < self.buf_start {
      let from_file = ((self.buf_start - pos) as usize).min(n);
      let tmp = vec![0u8; from_file];
      let BufResult(r, tmp) = file.read_exact_at(tmp.slice(0..from_file), pos).await;
      if let Err(e) = r {
        return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
          Error::ShortRead {
            pos,
            want: from_file,
          }
        } else {
          e.into()
        });
      }
      dest[..from_file].copy_from_slice(&tmp.into_inner());
      done = from_file;
    }

    if done < n {
      let off = (pos + done as u64 - self.buf_start) as usize;
      let take = n - done;
      dest[done..n].copy_from_slice(&self.buf[off..off + take]);
    }
    Ok(n)
  }

  /// Read into a new Vec, clamped like `read`
  /// 读取到新 Vec，截断规则同 `read`
  pub async fn read_vec(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; len];
    let n = self.read(&mut out, pos, len).await?;
    out.truncate(n);
    Ok(out)
  }

  /// Materialise file length `len` by writing a zero block that ends there
  /// 写入以 `len` 结尾的零块，使文件长度达到 `len`
  ///
  /// The block never starts below `pos()`, so written or buffered bytes stay intact.
  /// 零块起点不低于 `pos()`，已写入或缓冲的数据不受影响。
  pub async fn reserve(&mut self, len: u64) -> Result<()> {
    let pos = self.pos();
    if len <= pos {
      return Ok(());
    }
    let n = (len - pos).min(ZERO_BLOCK);
    let Some(file) = self.file.as_mut() else {
      return Err(Error::Closed);
    };
    file.write_all_at(vec![0u8; n as usize], len - n).await.0?;
    Ok(())
  }

  /// Current file length on disk
  /// 磁盘上的文件长度
  pub async fn file_len(&self) -> Result<u64> {
    Ok(self.file()?.metadata().await?.len())
  }

  /// Flush, fsync and release the file
  /// 刷盘、fsync 并释放文件
  pub async fn close(&mut self) -> Result<()> {
    if self.file.is_none() {
      return Ok(());
    }
    self.flush_and_force_write(true).await?;
    self.file = None;
    Ok(())
  }
}

impl Drop for BufferedChannel {
  fn drop(&mut self) {
    if !self.buf.is_empty() {
      warn!(
        "BufferedChannel dropped with {} unflushed bytes at {}",
        self.buf.len(),
        self.buf_start
      );
    }
  }
}
