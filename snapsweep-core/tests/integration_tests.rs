use anyhow::Result;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use snapsweep_core::{
    DeletionList, FileStore, FsPhotoLibrary, LibraryConfig, PhotoFeed, PhotoSweeper,
    StatisticsLedger, SweepConfig,
};

/// 创建一张指定大小的测试照片
fn create_photo(dir: &Path, name: &str, bytes: usize) -> Result<()> {
    fs::write(dir.join(name), "x".repeat(bytes))?;
    Ok(())
}

/// 按时间先后创建一组测试照片，返回照片目录
fn create_photo_dir(root: &Path, names_and_sizes: &[(&str, usize)]) -> Result<std::path::PathBuf> {
    let photos_dir = root.join("photos");
    fs::create_dir_all(&photos_dir)?;
    for (name, bytes) in names_and_sizes {
        create_photo(&photos_dir, name, *bytes)?;
        // 保证创建时间有区分度
        thread::sleep(Duration::from_millis(5));
    }
    Ok(photos_dir)
}

#[test]
fn test_end_to_end_review_and_sweep() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let photos_dir = create_photo_dir(
        temp_dir.path(),
        &[
            ("oldest.jpg", 100),
            ("middle.jpg", 200),
            ("newest.jpg", 300),
        ],
    )?;

    let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
    assert_eq!(library.len(), 3);

    // 分页浏览，最新的在前面
    let mut feed = PhotoFeed::new(2);
    feed.load(&library, false)?;
    assert_eq!(feed.len(), 2);
    assert!(feed.has_more());
    assert_eq!(feed.assets()[0].file_name(), "newest.jpg");

    feed.load(&library, true)?;
    assert_eq!(feed.len(), 3);
    assert!(!feed.has_more());

    // 标记两张待删除，重复标记是no-op
    let mut marklist = DeletionList::new();
    marklist.mark(feed.assets()[0].clone());
    marklist.mark(feed.assets()[1].clone());
    marklist.mark(feed.assets()[0].clone());
    assert_eq!(marklist.len(), 2);

    // 先dry run，什么都不变
    let store = FileStore::open(temp_dir.path().join("store"))?;
    let mut ledger = StatisticsLedger::load(store.clone());

    let preview = PhotoSweeper::new(SweepConfig {
        dry_run: true,
        ..Default::default()
    });
    let result = preview.sweep(&mut library, marklist.assets(), &mut ledger)?;
    assert!(result.dry_run);
    assert_eq!(result.bytes_freed, 500); // 300 + 200
    assert_eq!(library.len(), 3);
    assert!(ledger.sessions().is_empty());

    // 真正执行删除
    let sweeper = PhotoSweeper::default();
    let result = sweeper.sweep(&mut library, marklist.assets(), &mut ledger)?;
    assert_eq!(result.photos_deleted, 2);
    assert_eq!(result.bytes_freed, 500);

    assert!(!photos_dir.join("newest.jpg").exists());
    assert!(!photos_dir.join("middle.jpg").exists());
    assert!(photos_dir.join("oldest.jpg").exists());
    assert_eq!(library.len(), 1);

    // 账本记录了会话
    assert_eq!(ledger.sessions().len(), 1);
    assert_eq!(ledger.total_photos_deleted(), 2);
    assert_eq!(ledger.total_space_freed(), 500);

    marklist.clear();
    assert!(marklist.is_empty());

    Ok(())
}

#[test]
fn test_ledger_accumulates_across_sweeps_and_reloads() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let photos_dir = create_photo_dir(
        temp_dir.path(),
        &[("a.jpg", 1000), ("b.jpg", 500), ("c.jpg", 250)],
    )?;

    let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
    let store = FileStore::open(temp_dir.path().join("store"))?;
    let mut ledger = StatisticsLedger::load(store.clone());
    let sweeper = PhotoSweeper::default();

    let mut feed = PhotoFeed::new(10);
    feed.load_all(&library)?;
    let assets: Vec<_> = feed.assets().to_vec();

    // 第一批删除一张
    sweeper.sweep(&mut library, &assets[0..1], &mut ledger)?;
    // 第二批删除两张
    sweeper.sweep(&mut library, &assets[1..3], &mut ledger)?;

    assert_eq!(ledger.sessions().len(), 2);
    assert_eq!(ledger.total_photos_deleted(), 3);
    assert_eq!(ledger.total_space_freed(), 1750);
    // 最新的会话在前面
    assert_eq!(ledger.sessions()[0].photos_deleted, 2);

    // 重新加载后聚合值一致（累计值是读取时重算的，不单独存储）
    let reloaded = StatisticsLedger::load(store);
    assert_eq!(reloaded.total_photos_deleted(), 3);
    assert_eq!(reloaded.total_space_freed(), 1750);

    Ok(())
}

#[test]
fn test_failed_sweep_leaves_everything_intact() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let photos_dir = create_photo_dir(temp_dir.path(), &[("a.jpg", 100)])?;

    let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
    let mut feed = PhotoFeed::new(10);
    feed.load_all(&library)?;

    // 库外资产导致删除整体失败
    let mut marked = feed.assets().to_vec();
    let mut bogus = marked[0].clone();
    bogus.id = "not-in-library".to_string();
    marked.push(bogus);

    let store = FileStore::open(temp_dir.path().join("store"))?;
    let mut ledger = StatisticsLedger::load(store);

    let sweeper = PhotoSweeper::default();
    assert!(sweeper.sweep(&mut library, &marked, &mut ledger).is_err());

    // 没有部分成功的记账
    assert!(photos_dir.join("a.jpg").exists());
    assert!(ledger.sessions().is_empty());
    assert_eq!(ledger.total_photos_deleted(), 0);

    Ok(())
}
