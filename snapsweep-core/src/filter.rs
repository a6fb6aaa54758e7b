use anyhow::Result;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::asset::Asset;
use crate::estimator::{BatchSizeEstimator, EstimatorConfig, SizeLookup};

/// 资产过滤条件
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// 只保留拍摄时间早于N天前的照片
    pub older_than_days: Option<u32>,
    /// 只保留大小不小于该字节数的照片
    pub larger_than: Option<u64>,
}

/// 资产过滤器
pub struct AssetFilter {
    config: FilterConfig,
    estimator: BatchSizeEstimator,
}

impl AssetFilter {
    /// 创建新的过滤器
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            // 大小条件在权威查询失败时退回几何估计
            estimator: BatchSizeEstimator::new(EstimatorConfig::default()),
        }
    }

    /// 是否没有配置任何过滤条件
    pub fn is_empty(&self) -> bool {
        self.config.older_than_days.is_none() && self.config.larger_than.is_none()
    }

    /// 过滤资产列表
    pub fn filter_assets<L>(&self, assets: Vec<Asset>, lookup: &L) -> Vec<Asset>
    where
        L: SizeLookup + ?Sized,
    {
        if self.is_empty() {
            return assets;
        }

        let original_count = assets.len();
        let kept: Vec<Asset> = assets
            .into_iter()
            .filter(|asset| self.should_keep(asset, lookup))
            .collect();

        let removed_count = original_count - kept.len();
        if removed_count > 0 {
            info!(
                "过滤器排除了 {} 张照片，保留 {} 张",
                removed_count,
                kept.len()
            );
        }

        kept
    }

    fn should_keep<L>(&self, asset: &Asset, lookup: &L) -> bool
    where
        L: SizeLookup + ?Sized,
    {
        if !self.check_age(asset) {
            debug!("照片 {} 被时间条件排除", asset.id);
            return false;
        }

        if !self.check_size(asset, lookup) {
            debug!("照片 {} 被大小条件排除", asset.id);
            return false;
        }

        true
    }

    /// 检查时间条件
    fn check_age(&self, asset: &Asset) -> bool {
        let Some(days) = self.config.older_than_days else {
            return true;
        };

        let threshold = Duration::from_secs(u64::from(days) * 24 * 60 * 60);
        match SystemTime::now().duration_since(asset.created) {
            Ok(elapsed) => elapsed >= threshold,
            // 创建时间在未来，保守起见排除
            Err(_) => false,
        }
    }

    /// 检查大小条件
    fn check_size<L>(&self, asset: &Asset, lookup: &L) -> bool
    where
        L: SizeLookup + ?Sized,
    {
        let Some(min_bytes) = self.config.larger_than else {
            return true;
        };

        let size = match lookup.size_of(asset) {
            Ok(Some(bytes)) => bytes,
            _ => self.estimator.geometric_estimate(asset),
        };

        size >= min_bytes
    }

    /// 解析大小字符串（如 "10MB", "1GB", "500KB"）
    pub fn parse_size_string(size_str: &str) -> Result<u64> {
        let size_str = size_str.trim().to_uppercase();

        // 提取数字部分和单位部分
        let (number_part, unit_part) =
            if let Some(pos) = size_str.find(|c: char| c.is_alphabetic()) {
                (&size_str[..pos], &size_str[pos..])
            } else {
                (size_str.as_str(), "")
            };

        let number: f64 = number_part
            .parse()
            .map_err(|_| anyhow::anyhow!("无效的数字: {}", number_part))?;

        let multiplier = match unit_part {
            "" | "B" => 1,
            "KB" | "K" => 1_000,
            "KIB" => 1_024,
            "MB" | "M" => 1_000_000,
            "MIB" => 1_024 * 1_024,
            "GB" | "G" => 1_000_000_000,
            "GIB" => 1_024 * 1_024 * 1_024,
            "TB" | "T" => 1_000_000_000_000,
            "TIB" => 1_024_u64.pow(4),
            _ => return Err(anyhow::anyhow!("不支持的单位: {}", unit_part)),
        };

        Ok((number * multiplier as f64) as u64)
    }
}
