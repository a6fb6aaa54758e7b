pub mod asset;
pub mod estimator;
pub mod feed;
pub mod filter;
pub mod library;
pub mod marklist;
pub mod purchase;
pub mod stats;
pub mod storage;
pub mod sweeper;

pub use asset::Asset;
pub use estimator::{BatchSizeEstimator, EstimatorConfig, SizeEstimate, SizeLookup};
pub use feed::PhotoFeed;
pub use filter::{AssetFilter, FilterConfig};
pub use library::{AssetPage, FsPhotoLibrary, LibraryConfig, PageRequest, PhotoLibrary};
pub use marklist::DeletionList;
pub use purchase::{
    PremiumState, Product, PurchaseClient, PurchaseError, purchase_premium, restore_premium,
};
pub use stats::{DeletionSession, StatisticsLedger};
pub use storage::FileStore;
pub use sweeper::{PhotoSweeper, SweepConfig, SweepResult};

/// 格式化字节大小为人类可读格式
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }
}
