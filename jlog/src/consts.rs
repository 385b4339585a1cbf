/// Sector size, frames of padded formats start on this boundary
/// 扇区大小，带填充格式的帧从此边界开始
pub const SECTOR_SIZE: u64 = 512;

/// Magic at offset 0 of every journal file
pub const MAGIC: [u8; 4] = *b"BKLG";

/// Magic + version
pub const VERSION_HEADER_SIZE: u64 = 8;

/// Header of padded formats occupies a whole sector
/// 带填充格式的文件头占满一个扇区
pub const HEADER_SIZE: u64 = SECTOR_SIZE;

/// Length prefix size
pub const LEN_SIZE: u64 = 4;

/// Length field value marking a padding frame
/// 填充帧的长度字段值
pub const PADDING_MASK: i32 = -0x100;

/// Padding frame head: mask + padding length
pub const PADDING_HEAD: u64 = 8;

/// Largest payload accepted; longer lengths are corruption
/// 可接受的最大负载，更长视为损坏
pub const FRAME_MAX: usize = 128 * 1024 * 1024;

/// Journal file extension
pub const EXT: &str = "txn";

/// Persisted last log mark
/// 持久化的最后日志标记
pub const LAST_MARK: &str = "lastMark";

pub const DEFAULT_BUF_CAP: usize = 64 * 1024;
pub const DEFAULT_PREALLOC_SIZE: u64 = 16 * 1024 * 1024;
pub const DEFAULT_MAX_SIZE: u64 = 2 * 1024 * 1024 * 1024;
