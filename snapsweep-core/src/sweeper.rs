use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::asset::Asset;
use crate::estimator::{BatchSizeEstimator, EstimatorConfig};
use crate::format_bytes;
use crate::library::PhotoLibrary;
use crate::stats::StatisticsLedger;

/// 批量删除配置
#[derive(Debug, Clone, Default)]
pub struct SweepConfig {
    /// 只预览不删除
    pub dry_run: bool,
    /// 大小估算配置
    pub estimator: EstimatorConfig,
}

/// 一次批量删除的结果统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResult {
    pub photos_deleted: usize,
    pub bytes_freed: u64,
    /// 大小估算是否因超时而部分外推
    pub size_timed_out: bool,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl SweepResult {
    pub fn format_size(&self) -> String {
        format_bytes(self.bytes_freed)
    }
}

/// Confirmed-batch deletion flow
///
/// Estimates the batch size, deletes through the library all-or-nothing
/// and records a statistics session on success. Deletion failures
/// propagate to the caller and nothing is recorded.
pub struct PhotoSweeper {
    config: SweepConfig,
}

impl PhotoSweeper {
    /// 创建新的清理器
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// 执行一次已确认的批量删除
    pub fn sweep<L>(
        &self,
        library: &mut L,
        marked: &[Asset],
        ledger: &mut StatisticsLedger,
    ) -> Result<SweepResult>
    where
        L: PhotoLibrary,
    {
        let start = Instant::now();

        if marked.is_empty() {
            debug!("删除列表为空，跳过");
            return Ok(SweepResult {
                dry_run: self.config.dry_run,
                ..Default::default()
            });
        }

        // 大小必须在删除前估算，删除后文件就无法stat了
        let estimator = BatchSizeEstimator::new(self.config.estimator.clone());
        let estimate = estimator.estimate_batch(marked, library);

        if self.config.dry_run {
            info!(
                "DRY RUN: 将删除 {} 张照片，释放 {}",
                marked.len(),
                format_bytes(estimate.total_bytes)
            );
            return Ok(SweepResult {
                photos_deleted: marked.len(),
                bytes_freed: estimate.total_bytes,
                size_timed_out: estimate.timed_out,
                dry_run: true,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let ids: Vec<String> = marked.iter().map(|a| a.id.clone()).collect();
        if let Err(e) = library.delete(&ids) {
            // 删除按全有或全无处理，失败时不记录会话
            error!("批量删除失败: {}", e);
            return Err(e);
        }

        ledger.add_session(marked.len() as u64, estimate.total_bytes);

        let result = SweepResult {
            photos_deleted: marked.len(),
            bytes_freed: estimate.total_bytes,
            size_timed_out: estimate.timed_out,
            dry_run: false,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "删除完成: {} 张照片，释放 {}，耗时 {}ms",
            result.photos_deleted,
            result.format_size(),
            result.duration_ms
        );

        Ok(result)
    }
}

impl Default for PhotoSweeper {
    fn default() -> Self {
        Self::new(SweepConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{FsPhotoLibrary, LibraryConfig, PageRequest};
    use crate::storage::FileStore;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_photo(dir: &Path, name: &str, bytes: usize) {
        fs::write(dir.join(name), "x".repeat(bytes)).unwrap();
    }

    fn open_ledger(dir: &Path) -> StatisticsLedger {
        StatisticsLedger::load(FileStore::open(dir.join("store")).unwrap())
    }

    #[test]
    fn test_sweep_empty_marklist() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let photos_dir = temp_dir.path().join("photos");
        fs::create_dir_all(&photos_dir)?;

        let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
        let mut ledger = open_ledger(temp_dir.path());

        let sweeper = PhotoSweeper::default();
        let result = sweeper.sweep(&mut library, &[], &mut ledger)?;

        assert_eq!(result.photos_deleted, 0);
        assert_eq!(result.bytes_freed, 0);
        assert!(ledger.sessions().is_empty());

        Ok(())
    }

    #[test]
    fn test_sweep_dry_run_deletes_nothing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let photos_dir = temp_dir.path().join("photos");
        fs::create_dir_all(&photos_dir)?;
        create_photo(&photos_dir, "a.jpg", 100);
        create_photo(&photos_dir, "b.jpg", 200);

        let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
        let marked = library.fetch_page(&PageRequest::first(10))?.assets;
        let mut ledger = open_ledger(temp_dir.path());

        let sweeper = PhotoSweeper::new(SweepConfig {
            dry_run: true,
            ..Default::default()
        });
        let result = sweeper.sweep(&mut library, &marked, &mut ledger)?;

        assert!(result.dry_run);
        assert_eq!(result.photos_deleted, 2);
        assert_eq!(result.bytes_freed, 300);

        // 文件仍然存在，账本没有记录
        assert!(photos_dir.join("a.jpg").exists());
        assert!(photos_dir.join("b.jpg").exists());
        assert!(ledger.sessions().is_empty());

        Ok(())
    }

    #[test]
    fn test_sweep_deletes_and_records_session() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let photos_dir = temp_dir.path().join("photos");
        fs::create_dir_all(&photos_dir)?;
        create_photo(&photos_dir, "a.jpg", 150);
        create_photo(&photos_dir, "b.jpg", 250);
        create_photo(&photos_dir, "kept.jpg", 50);

        let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
        let marked: Vec<_> = library
            .fetch_page(&PageRequest::first(10))?
            .assets
            .into_iter()
            .filter(|a| a.file_name() != "kept.jpg")
            .collect();
        let mut ledger = open_ledger(temp_dir.path());

        let sweeper = PhotoSweeper::default();
        let result = sweeper.sweep(&mut library, &marked, &mut ledger)?;

        assert!(!result.dry_run);
        assert_eq!(result.photos_deleted, 2);
        assert_eq!(result.bytes_freed, 400); // 权威大小之和

        assert!(!photos_dir.join("a.jpg").exists());
        assert!(!photos_dir.join("b.jpg").exists());
        assert!(photos_dir.join("kept.jpg").exists());

        assert_eq!(ledger.sessions().len(), 1);
        assert_eq!(ledger.total_photos_deleted(), 2);
        assert_eq!(ledger.total_space_freed(), 400);

        Ok(())
    }

    #[test]
    fn test_sweep_failure_records_nothing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let photos_dir = temp_dir.path().join("photos");
        fs::create_dir_all(&photos_dir)?;
        create_photo(&photos_dir, "a.jpg", 100);

        let mut library = FsPhotoLibrary::open(&photos_dir, &LibraryConfig::default())?;
        let mut marked = library.fetch_page(&PageRequest::first(10))?.assets;
        // 混入一个库不认识的资产，删除应该整体失败
        let mut bogus = marked[0].clone();
        bogus.id = "bogus-id".to_string();
        marked.push(bogus);

        let mut ledger = open_ledger(temp_dir.path());
        let sweeper = PhotoSweeper::default();
        let result = sweeper.sweep(&mut library, &marked, &mut ledger);

        assert!(result.is_err());
        assert!(photos_dir.join("a.jpg").exists());
        assert!(ledger.sessions().is_empty());

        Ok(())
    }
}
