//! Tests for Journal: roll, checkpoint, retention and replay
//! Journal 测试：滚动、检查点、回收与回放

use aok::{OK, Void};
use jlog::{
  Conf, Entry, Error, Journal, LogMark, Validator, Version, consts::EXT, list_journal_ids,
  replay_all,
};
use jlog_fs::fs_id::id_path;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

fn run(f: impl Future<Output = Void>) -> Void {
  compio::runtime::Runtime::new()?.block_on(f)
}

/// Two 600 byte entries fill one file
/// 两个 600 字节条目写满一个文件
const SMALL: &[Conf] = &[Conf::MaxSize(2048), Conf::PreallocSize(4096)];

fn big(entry_id: i64) -> Entry {
  Entry::Data {
    ledger_id: 1,
    entry_id,
    body: vec![entry_id as u8; 584],
  }
}

async fn fill(j: &mut Journal, range: std::ops::Range<i64>) -> jlog::Result<LogMark> {
  let mut mark = LogMark::default();
  for i in range {
    mark = j.append_entry(&big(i)).await?;
  }
  Ok(mark)
}

#[test]
fn test_roll_and_replay() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), SMALL).await?;
    assert!(j.cur().is_none());
    assert!(j.ids()?.is_empty());

    let mark = fill(&mut j, 0..10).await?;
    assert_eq!(mark.offset, 2560);
    // The last append rolled as well
    // 最后一次追加也触发了滚动
    assert!(j.cur().is_none());
    assert_eq!(j.durable(), mark);
    j.close().await?;

    let mut j = Journal::open(dir.path(), SMALL).await?;
    let ids = j.ids()?;
    assert_eq!(ids.len(), 5);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let mut got = Vec::new();
    let mut collect = |_: Version, _: u64, p: &[u8]| -> jlog::Result<()> {
      got.push(Entry::decode(p)?);
      Ok(())
    };
    let r = j.replay(&mut collect).await?;
    assert_eq!(r.scanned, ids);
    assert_eq!(r.entries, 10);
    assert_eq!(r.end, LogMark::new(ids[4], 2560));
    assert_eq!(got, (0..10).map(big).collect::<Vec<_>>());
    assert_eq!(j.durable(), r.end);

    // New files keep ascending
    // 新文件 id 继续递增
    let next = j.append_entry(&big(10)).await?;
    assert!(next.log_id > ids[4]);
    j.close().await?;
    OK
  })
}

#[test]
fn test_checkpoint_removes_old() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), SMALL).await?;
    let mark = fill(&mut j, 0..7).await?;
    let ids = j.ids()?;
    assert_eq!(ids.len(), 4);
    assert_eq!(mark.log_id, ids[3]);

    let ckp = j.new_checkpoint().await?;
    assert_eq!(ckp.mark(), mark);
    let removed = j.checkpoint_complete(ckp, true).await?;
    assert_eq!(removed, ids[..3]);
    assert_eq!(j.ids()?, ids[3..]);
    assert_eq!(j.last_mark(), mark);
    j.close().await?;
    OK
  })
}

#[test]
fn test_max_backup() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let conf = [SMALL, &[Conf::MaxBackup(1)]].concat();
    let mut j = Journal::open(dir.path(), &conf).await?;
    fill(&mut j, 0..7).await?;
    let ids = j.ids()?;

    let ckp = j.new_checkpoint().await?;
    assert_eq!(j.checkpoint_complete(ckp, true).await?, ids[..2]);
    assert_eq!(j.ids()?, ids[2..]);
    j.close().await?;
    OK
  })
}

#[test]
fn test_checkpoint_without_compact() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), SMALL).await?;
    fill(&mut j, 0..7).await?;
    let ids = j.ids()?;

    let ckp = j.new_checkpoint().await?;
    let mark = ckp.mark();
    assert!(j.checkpoint_complete(ckp, false).await?.is_empty());
    assert_eq!(j.ids()?, ids);
    assert_eq!(j.last_mark(), mark);
    j.close().await?;
    OK
  })
}

#[test]
fn test_older_checkpoint_kept_back() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), &[]).await?;
    j.append_entry(&big(0)).await?;
    let old = j.new_checkpoint().await?;
    j.append_entry(&big(1)).await?;
    let new = j.new_checkpoint().await?;
    let new_mark = new.mark();
    assert!(old.mark() < new_mark);

    j.checkpoint_complete(new, false).await?;
    j.checkpoint_complete(old, false).await?;
    assert_eq!(j.last_mark(), new_mark);
    j.close().await?;
    OK
  })
}

#[test]
fn test_replay_after_checkpoint() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), &[]).await?;

    // Nothing written yet
    // 尚未写入
    assert_eq!(j.new_checkpoint().await?.mark(), LogMark::default());

    fill(&mut j, 0..2).await?;
    let ckp = j.new_checkpoint().await?;
    let mark = ckp.mark();
    j.checkpoint_complete(ckp, true).await?;
    let last = fill(&mut j, 2..5).await?;
    j.close().await?;

    let mut j = Journal::open(dir.path(), &[]).await?;
    assert_eq!(j.last_mark(), mark);
    assert_eq!(j.new_checkpoint().await?.mark(), mark);

    let mut v = Validator::default();
    let r = j.replay(&mut v).await?;
    assert_eq!(v.data, 3);
    assert_eq!(r.scanned, [mark.log_id]);
    assert_eq!(r.end, last);
    assert_eq!(j.durable(), last);
    OK
  })
}

#[test]
fn test_scan_active_sees_buffer() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), &[]).await?;
    let mark = fill(&mut j, 0..2).await?;
    assert!(j.cur().is_some_and(|c| c.buffered() > 0));
    // Not forced yet
    // 尚未强制落盘
    assert_eq!(j.durable(), LogMark::default());

    let mut v = Validator::default();
    assert_eq!(j.scan_journal(mark.log_id, 0, &mut v).await?, mark.offset);
    assert_eq!(v.data, 2);

    assert_eq!(j.force().await?, mark);
    assert_eq!(j.cur().map(|c| c.buffered()), Some(0));
    j.close().await?;
    OK
  })
}

#[test]
fn test_replay_all() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let a = dir.path().join("a");
    let b = dir.path().join("b");

    let mut j = Journal::open(&a, &[]).await?;
    fill(&mut j, 0..2).await?;
    j.close().await?;
    let mut j = Journal::open(&b, &[]).await?;
    fill(&mut j, 0..3).await?;
    j.close().await?;

    let mut js = vec![Journal::open(&a, &[]).await?, Journal::open(&b, &[]).await?];
    let mut v = Validator::default();
    let rs = replay_all(&mut js, &mut v).await?;
    assert_eq!(rs.iter().map(|r| r.entries).collect::<Vec<_>>(), [2, 3]);
    assert_eq!(v.data, 5);
    OK
  })
}

#[test]
fn test_list_journal_ids() -> Void {
  let dir = tempfile::tempdir()?;
  for name in ["a.txn", "zz.txn", "10.txn", "1f.txn.tmp", "lastMark", ".txn", "+1.txn"] {
    std::fs::write(dir.path().join(name), b"")?;
  }
  assert_eq!(list_journal_ids(dir.path(), |_| true)?, [0xa, 0x10]);
  assert_eq!(list_journal_ids(dir.path(), |id| id > 0xa)?, [0x10]);
  assert!(list_journal_ids(&dir.path().join("missing"), |_| true)?.is_empty());
  OK
}

#[test]
fn test_bad_conf() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let r = Journal::open(dir.path(), &[Conf::BufCap(0)]).await;
    assert!(matches!(r, Err(Error::Conf(_))));
    OK
  })
}

#[test]
fn test_replay_torn_create() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), &[]).await?;
    let mark = fill(&mut j, 0..3).await?;
    j.close().await?;

    // Crash between creating the next file and syncing its header
    // 新文件创建后、文件头落盘前崩溃
    let torn: [&[u8]; 3] = [b"", &[0; 4096], &[0; 5]];
    for (i, bytes) in torn.into_iter().enumerate() {
      let id = mark.log_id + 1 + i as u64;
      let path = id_path(dir.path(), id, EXT);
      std::fs::write(&path, bytes)?;

      let mut j = Journal::open(dir.path(), &[]).await?;
      let mut v = Validator::default();
      let r = j.replay(&mut v).await?;
      assert_eq!(v.data, 3);
      assert_eq!(r.scanned, [mark.log_id]);
      assert_eq!(r.end, mark);
      assert!(!path.exists());

      let next = j.append_entry(&big(3)).await?;
      assert!(next.log_id > id);
      j.close().await?;
      std::fs::remove_file(id_path(dir.path(), next.log_id, EXT))?;
    }
    OK
  })
}

#[test]
fn test_replay_bad_header_fails() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), &[]).await?;
    let mark = fill(&mut j, 0..1).await?;
    j.close().await?;

    // Newest file with a foreign magic is not a torn create
    // 魔数错误的最新文件不属于未完成的创建
    let bad = mark.log_id + 1;
    std::fs::write(id_path(dir.path(), bad, EXT), b"XXXX\0\0\0\x06")?;
    let mut j = Journal::open(dir.path(), &[]).await?;
    let r = j.replay(&mut Validator::default()).await;
    assert!(matches!(r, Err(Error::Format { id, .. }) if id == bad));

    // A blank file followed by a newer one is not a torn create either
    // 之后还有更新文件的空白文件同样不属于未完成的创建
    let blank = mark.log_id + 1;
    std::fs::write(id_path(dir.path(), blank, EXT), b"")?;
    let mut j2 = Journal::open(dir.path(), &[]).await?;
    j2.append_entry(&big(1)).await?;
    j2.close().await?;
    let mut j = Journal::open(dir.path(), &[]).await?;
    let r = j.replay(&mut Validator::default()).await;
    assert!(matches!(r, Err(Error::Format { id, .. }) if id == blank));
    assert!(id_path(dir.path(), blank, EXT).exists());
    OK
  })
}

#[test]
fn test_scan_stops_at_corruption() -> Void {
  run(async {
    let dir = tempfile::tempdir()?;
    let mut j = Journal::open(dir.path(), &[Conf::Version(4)]).await?;
    let mark = fill(&mut j, 0..3).await?;
    j.close().await?;

    // Second frame gets a negative length, the third stays intact
    // 第二帧长度改为负数，第三帧保持完整
    let path = id_path(dir.path(), mark.log_id, EXT);
    let mut disk = std::fs::read(&path)?;
    disk[612..616].copy_from_slice(&(-7i32).to_be_bytes());
    std::fs::write(&path, disk)?;

    let mut j = Journal::open(dir.path(), &[]).await?;
    let mut seen = Vec::new();
    let mut collect = |_: Version, off: u64, _: &[u8]| -> jlog::Result<()> {
      seen.push(off);
      Ok(())
    };
    let r = j.scan_journal(mark.log_id, 0, &mut collect).await;
    assert!(matches!(
      r,
      Err(Error::Corrupt {
        offset: 612,
        len: -7,
        ..
      })
    ));
    assert_eq!(seen, [8]);

    seen.clear();
    let mut collect = |_: Version, off: u64, _: &[u8]| -> jlog::Result<()> {
      seen.push(off);
      Ok(())
    };
    let r = j.replay(&mut collect).await;
    assert!(matches!(r, Err(Error::Corrupt { offset: 612, .. })));
    assert_eq!(seen, [8]);
    OK
  })
}
