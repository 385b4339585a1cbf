#![cfg_attr(docsrs, feature(doc_cfg))]

//! jlog_fs - Buffered channel and file operations for jlog
//! jlog 缓冲通道与文件操作

pub mod buf;
pub mod error;
pub mod fs;
pub mod fs_id;

pub use buf::BufferedChannel;
pub use error::{Error, Result};
