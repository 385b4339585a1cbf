//! Append, force and roll
//! 追加、强制落盘与滚动

use log::debug;

use super::Journal;
use crate::{Entry, Result, channel::JournalChannel, ckp::LogMark};

#[inline]
fn now_millis() -> u64 {
  coarsetime::Clock::now_since_epoch().as_millis()
}

impl Journal {
  /// Append one frame, return the mark just after it
  /// 追加一帧，返回其后的标记
  ///
  /// The returned mark is durable only after `force`.
  /// 返回的标记需 `force` 后才落盘。
  pub async fn append(&mut self, payload: &[u8]) -> Result<LogMark> {
    let cur = match self.cur.take() {
      Some(cur) => cur,
      None => self.new_channel().await?,
    };
    let cur = self.cur.insert(cur);
    cur.write_frame(payload).await?;
    let mark = LogMark::new(cur.id(), cur.pos());
    if mark.offset > self.conf.max_size {
      self.roll().await?;
    }
    Ok(mark)
  }

  #[inline]
  pub async fn append_entry(&mut self, entry: &Entry) -> Result<LogMark> {
    self.append(&entry.encode()).await
  }

  async fn new_channel(&mut self) -> Result<JournalChannel> {
    let id = now_millis().max(self.last_id + 1);
    let ch = JournalChannel::create_with(&self.dir, id, &self.conf).await?;
    self.last_id = id;
    Ok(ch)
  }

  /// Flush + fsync the active file, return the durable mark
  /// 刷盘并 fsync 当前文件，返回已落盘标记
  pub async fn force(&mut self) -> Result<LogMark> {
    if let Some(cur) = self.cur.as_mut() {
      cur.sync(true).await?;
      self.durable = self.durable.max(LogMark::new(cur.id(), cur.pos()));
    }
    Ok(self.durable)
  }

  /// Force and close the active file; the next append opens a new one
  /// 强制落盘并关闭当前文件，下次追加打开新文件
  pub async fn roll(&mut self) -> Result<()> {
    let Some(mut cur) = self.cur.take() else {
      return Ok(());
    };
    cur.sync(true).await?;
    self.durable = self.durable.max(LogMark::new(cur.id(), cur.pos()));
    cur.close().await?;
    debug!("journal {:x} rolled at {}", cur.id(), cur.pos());
    Ok(())
  }

  pub async fn close(mut self) -> Result<LogMark> {
    self.roll().await?;
    Ok(self.durable)
  }
}
