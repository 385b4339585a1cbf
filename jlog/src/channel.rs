//! One journal file: header, preallocation, framing and padding
//! 单个日志文件：文件头、预分配、分帧与填充

use std::{
  io,
  path::{Path, PathBuf},
};

use jlog_fs::{
  BufferedChannel,
  fs::{create_new, open_read, sync_dir},
  fs_id::id_path,
};
use log::debug;

use crate::{
  Conf, Error, Result,
  conf::JournalConf,
  consts::{
    EXT, FRAME_MAX, HEADER_SIZE, LEN_SIZE, PADDING_HEAD, PADDING_MASK, SECTOR_SIZE,
    VERSION_HEADER_SIZE,
  },
  frame::{self, Frame},
  header::{self, Version},
};

/// Journal file bound to a buffered channel
/// 绑定缓冲通道的日志文件
pub struct JournalChannel {
  id: u64,
  ver: Version,
  path: PathBuf,
  bc: BufferedChannel,
  prealloc: u64,
  prealloc_size: u64,
}

#[inline]
fn be_i32(b: &[u8]) -> Option<i32> {
  Some(i32::from_be_bytes(b.try_into().ok()?))
}

impl JournalChannel {
  /// Create file `<id>.txn` in `dir` and write its header
  /// 在 `dir` 中创建 `<id>.txn` 并写入文件头
  pub async fn create(dir: &Path, id: u64, conf: &[Conf]) -> Result<Self> {
    Self::create_with(dir, id, &JournalConf::new(conf)?).await
  }

  pub(crate) async fn create_with(dir: &Path, id: u64, conf: &JournalConf) -> Result<Self> {
    let path = id_path(dir, id, EXT);
    let file = create_new(&path).await?;
    let bc = BufferedChannel::new(file, 0, conf.buf_cap, conf.unpersisted_bound)?;
    let ver = conf.ver;
    let mut ch = Self {
      id,
      ver,
      path,
      bc,
      prealloc: 0,
      prealloc_size: conf.prealloc_size,
    };

    // Header is durable before any zero block lands in the file
    // 文件头先落盘，再写入预分配零块
    ch.bc.write(&header::build(ver)).await?;
    ch.bc.sync().await?;
    sync_dir(dir).await?;
    ch.pre_alloc_if_needed(0).await?;
    debug!("journal {id:x} created, {ver}");
    Ok(ch)
  }

  async fn open_file(path: &Path, id: u64) -> Result<(BufferedChannel, u64)> {
    let file = match open_read(path).await {
      Ok(file) => file,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::NotFound(id)),
      Err(e) => return Err(e.into()),
    };
    let len = file.metadata().await?.len();
    Ok((BufferedChannel::new(file, len, SECTOR_SIZE as usize, 0)?, len))
  }

  /// Open `<id>.txn` for scanning and validate its header
  /// 打开 `<id>.txn` 用于扫描并校验文件头
  pub async fn open_read(dir: &Path, id: u64) -> Result<Self> {
    let path = id_path(dir, id, EXT);
    let (bc, len) = Self::open_file(&path, id).await?;
    let head = bc.read_vec(0, HEADER_SIZE as usize).await?;
    let ver = header::parse(id, &head, len)?;
    debug!("journal {id:x} opened for read, {ver}, {len} bytes");
    Ok(Self {
      id,
      ver,
      path,
      bc,
      prealloc: len,
      prealloc_size: 0,
    })
  }

  /// `<id>.txn` exists but its header was never written: empty or zeroed
  /// `<id>.txn` 存在但文件头从未写入：空文件或全零
  pub async fn header_blank(dir: &Path, id: u64) -> Result<bool> {
    let (bc, _) = Self::open_file(&id_path(dir, id, EXT), id).await?;
    let head = bc.read_vec(0, VERSION_HEADER_SIZE as usize).await?;
    Ok(header::is_blank(&head))
  }

  #[inline]
  pub fn id(&self) -> u64 {
    self.id
  }

  #[inline]
  pub fn ver(&self) -> Version {
    self.ver
  }

  #[inline]
  pub fn header_size(&self) -> u64 {
    self.ver.header_size()
  }

  /// Write position
  /// 写入位置
  #[inline]
  pub fn pos(&self) -> u64 {
    self.bc.pos()
  }

  #[inline]
  pub fn prealloc(&self) -> u64 {
    self.prealloc
  }

  #[inline]
  pub fn path(&self) -> &Path {
    &self.path
  }

  #[inline]
  pub fn buffered(&self) -> usize {
    self.bc.buffered()
  }

  /// Channels from `open_read` have no growth step
  /// `open_read` 打开的通道没有扩展步长
  #[inline]
  fn writable(&self) -> Result<()> {
    if self.prealloc_size == 0 {
      return Err(Error::ReadOnly(self.id));
    }
    Ok(())
  }

  /// Grow the file by whole chunks until `size` more bytes fit
  /// 按整块扩展文件，直至能容纳 `size` 字节
  pub async fn pre_alloc_if_needed(&mut self, size: u64) -> Result<()> {
    let need = self.bc.pos() + size;
    if need <= self.prealloc {
      return Ok(());
    }
    self.writable()?;
    let chunks = (need - self.prealloc).div_ceil(self.prealloc_size);
    let next = self.prealloc + chunks * self.prealloc_size;
    self.bc.reserve(next).await?;
    self.prealloc = next;
    Ok(())
  }

  /// Append one frame, return its start offset
  /// 追加一帧，返回起始偏移
  pub async fn write_frame(&mut self, payload: &[u8]) -> Result<u64> {
    self.writable()?;
    if payload.is_empty() {
      // Length 0 reads back as the end of data
      return Err(Error::Empty);
    }
    if payload.len() > FRAME_MAX {
      return Err(Error::TooLarge(payload.len(), FRAME_MAX));
    }
    let offset = self.bc.pos();
    let frame = frame::encode(payload);
    self.pre_alloc_if_needed(frame.len() as u64).await?;
    self.bc.write(&frame).await?;
    if self.ver.has_padding() {
      self.write_padding().await?;
    }
    Ok(offset)
  }

  /// Pad the write position to the next sector boundary
  /// 将写入位置填充到下一个扇区边界
  pub async fn write_padding(&mut self) -> Result<()> {
    if let Some(pad) = frame::padding(self.bc.pos()) {
      self.pre_alloc_if_needed(pad.len() as u64).await?;
      self.bc.write(&pad).await?;
    }
    Ok(())
  }

  /// Frame at `pos` and the offset after it, padding skipped
  /// 读取 `pos` 处的帧及其后的偏移，跳过填充
  ///
  /// `pos` inside the header reads the first frame. `Frame::End` comes with
  /// the offset where valid data stops.
  /// `pos` 位于文件头内时读取首帧；`Frame::End` 附带有效数据结束的偏移。
  pub async fn read_frame_at(&self, pos: u64) -> Result<(Frame, u64)> {
    let end = self.bc.pos();
    let mut pos = pos.max(self.header_size());
    loop {
      let head = self.bc.read_vec(pos, LEN_SIZE as usize).await?;
      let Some(len) = be_i32(&head) else {
        return Ok((Frame::End, pos));
      };

      if len == PADDING_MASK && self.ver.has_padding() {
        let raw = self.bc.read_vec(pos + LEN_SIZE, LEN_SIZE as usize).await?;
        let Some(pad) = be_i32(&raw) else {
          return Ok((Frame::End, pos));
        };
        if pad < 0 || pad as u64 >= SECTOR_SIZE {
          return Err(self.corrupt(pos, pad));
        }
        let next = pos + PADDING_HEAD + pad as u64;
        if next > end {
          return Ok((Frame::End, pos));
        }
        pos = next;
        continue;
      }

      if len == 0 {
        return Ok((Frame::End, pos));
      }
      if len < 0 || len as usize > FRAME_MAX {
        return Err(self.corrupt(pos, len));
      }
      let next = pos + LEN_SIZE + len as u64;
      if next > end {
        return Ok((Frame::End, pos));
      }
      let payload = self.bc.read_vec(pos + LEN_SIZE, len as usize).await?;
      if payload.len() < len as usize {
        return Ok((Frame::End, pos));
      }
      return Ok((Frame::Data { offset: pos, payload }, next));
    }
  }

  #[inline]
  fn corrupt(&self, offset: u64, len: i32) -> Error {
    Error::Corrupt {
      id: self.id,
      offset,
      len: len as i64,
    }
  }

  /// Flush, fsync when `force`
  /// 刷盘，`force` 时 fsync
  #[inline]
  pub async fn sync(&mut self, force: bool) -> Result<()> {
    self.bc.flush_and_force_write(force).await?;
    Ok(())
  }

  pub async fn close(&mut self) -> Result<()> {
    self.bc.close().await?;
    debug!("journal {:x} closed at {}", self.id, self.bc.pos());
    Ok(())
  }
}
