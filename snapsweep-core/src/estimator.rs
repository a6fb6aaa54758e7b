use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::asset::Asset;

/// 权威文件大小查询（平台文件信息查询的抽象）
///
/// Returns `Ok(Some(bytes))` when the underlying file exists and its size
/// is known, `Ok(None)` when it is absent. Lookup errors are recovered
/// locally by the estimator and never surfaced.
pub trait SizeLookup {
    fn size_of(&self, asset: &Asset) -> Result<Option<u64>>;
}

/// 估算器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// 时间预算（毫秒），超出后停止逐个查询并外推剩余部分
    pub budget_ms: u64,
    /// 每像素字节数，近似压缩照片的存储密度
    pub bytes_per_pixel: f64,
    /// 缺少尺寸信息时使用的默认宽度
    pub default_width: u32,
    /// 缺少尺寸信息时使用的默认高度
    pub default_height: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            budget_ms: 5000,
            // 原始3字节/像素会严重高估压缩格式的大小，0.3更接近实际密度
            bytes_per_pixel: 0.3,
            default_width: 1920,
            default_height: 1080,
        }
    }
}

/// 批量估算结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// 总字节数（精确值、几何估计与外推的混合）
    pub total_bytes: u64,
    /// 通过权威查询得到精确大小的资产数量
    pub exact_count: usize,
    /// 使用几何估计的资产数量
    pub estimated_count: usize,
    /// 是否因超出时间预算而外推了剩余部分
    pub timed_out: bool,
}

impl SizeEstimate {
    /// 已逐个处理的资产数量
    pub fn processed_count(&self) -> usize {
        self.exact_count + self.estimated_count
    }
}

/// Batch file-size estimator
///
/// Maps a list of assets to a single total byte count, preferring an
/// authoritative per-file lookup and falling back to a geometric estimate
/// per asset. Wall-clock time is bounded by the configured budget: once it
/// is exceeded the remaining assets are extrapolated from the running
/// average. Processing is strictly sequential.
pub struct BatchSizeEstimator {
    config: EstimatorConfig,
}

impl BatchSizeEstimator {
    /// 创建新的估算器
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Estimate the total byte size of a batch of assets. Never fails.
    pub fn estimate_batch<L>(&self, assets: &[Asset], lookup: &L) -> SizeEstimate
    where
        L: SizeLookup + ?Sized,
    {
        let deadline = Instant::now() + Duration::from_millis(self.config.budget_ms);
        self.estimate_until(assets, lookup, deadline)
    }

    // deadline单独传入，便于测试固定时间点
    fn estimate_until<L>(&self, assets: &[Asset], lookup: &L, deadline: Instant) -> SizeEstimate
    where
        L: SizeLookup + ?Sized,
    {
        if assets.is_empty() {
            return SizeEstimate::default();
        }

        let mut total = 0f64;
        let mut exact_count = 0usize;
        let mut estimated_count = 0usize;
        let mut timed_out = false;

        for asset in assets {
            let processed = exact_count + estimated_count;

            // 每个资产处理前检查预算，超时后按已观察到的平均值外推
            if Instant::now() > deadline {
                let remaining = assets.len() - processed;
                if processed > 0 {
                    let average = total / processed as f64;
                    total += average * remaining as f64;
                }
                warn!(
                    "大小估算在处理 {}/{} 个资产后超出预算，剩余部分使用外推值",
                    processed,
                    assets.len()
                );
                timed_out = true;
                break;
            }

            match lookup.size_of(asset) {
                Ok(Some(bytes)) => {
                    total += bytes as f64;
                    exact_count += 1;
                }
                Ok(None) => {
                    debug!("资产文件不存在，使用几何估计: {}", asset.id);
                    total += self.geometric_estimate(asset) as f64;
                    estimated_count += 1;
                }
                Err(e) => {
                    // 单个查询失败在这里就地恢复，不向上传播
                    debug!("大小查询失败 {}: {}，使用几何估计", asset.id, e);
                    total += self.geometric_estimate(asset) as f64;
                    estimated_count += 1;
                }
            }
        }

        SizeEstimate {
            total_bytes: total.max(0.0).floor() as u64,
            exact_count,
            estimated_count,
            timed_out,
        }
    }

    /// 几何估计：宽 × 高 × 每像素字节数，缺少尺寸时使用默认值
    pub fn geometric_estimate(&self, asset: &Asset) -> u64 {
        let width = asset.width.unwrap_or(self.config.default_width);
        let height = asset.height.unwrap_or(self.config.default_height);
        (f64::from(width) * f64::from(height) * self.config.bytes_per_pixel).floor() as u64
    }
}

impl Default for BatchSizeEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
