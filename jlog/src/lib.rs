#![cfg_attr(docsrs, feature(doc_cfg))]

//! jlog - Write-ahead journal with checkpoints and replay
//! 带检查点与回放的预写日志
//!
//! ```text
//! Journal::append -> JournalChannel::write_frame -> BufferedChannel::write -> file
//! Journal::replay -> JournalChannel::read_frame_at -> BufferedChannel::read -> Scanner
//! ```

pub mod channel;
pub mod ckp;
mod conf;
pub mod consts;
pub mod entry;
pub mod error;
pub mod frame;
pub mod header;
pub mod journal;
pub mod scan;

pub use channel::JournalChannel;
pub use ckp::{Checkpoint, LogMark};
pub use conf::Conf;
pub use entry::Entry;
pub use error::{Error, Result};
pub use frame::Frame;
pub use header::Version;
pub use journal::{Journal, Replay, ScanState, list_journal_ids, replay_all};
pub use scan::{LedgerIndex, LedgerState, LogScanner, Scanner, Validator};
