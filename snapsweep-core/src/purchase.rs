use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::storage::FileStore;

/// 高级版标志在存储中的键
pub const PURCHASE_STATE_KEY: &str = "purchase_state";

/// 购买失败的分类
///
/// Each class carries a distinct user-facing message; anything the SDK
/// seam cannot classify lands in `Other` as the generic fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PurchaseError {
    #[error("purchase was cancelled")]
    Cancelled,
    #[error("this product is currently unavailable")]
    ItemUnavailable,
    #[error("purchase failed: {0}")]
    Other(String),
}

/// 商店中的商品信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: String,
}

/// Purchase SDK seam
///
/// The real vendor SDK lives behind this trait; the core only depends on
/// the classified outcomes.
pub trait PurchaseClient {
    /// 按商品id查询商品，商店中未配置时返回None
    fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, PurchaseError>;

    /// 发起一次性内购
    fn request_purchase(&mut self, product_id: &str) -> Result<(), PurchaseError>;

    /// 查询历史购买，返回是否存在可恢复的购买
    fn restore_purchases(&mut self) -> Result<bool, PurchaseError>;
}

/// Persisted premium flag
///
/// Stored as the literal strings `"true"`/`"false"`; any other content
/// reads as not premium.
#[derive(Debug, Clone)]
pub struct PremiumState {
    store: FileStore,
}

impl PremiumState {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// 当前是否已解锁高级版
    pub fn is_premium(&self) -> bool {
        self.store
            .get(PURCHASE_STATE_KEY)
            .map(|v| v.trim() == "true")
            .unwrap_or(false)
    }

    /// 更新并持久化高级版标志。写入失败只记录日志
    pub fn set_premium(&self, premium: bool) {
        let value = if premium { "true" } else { "false" };
        if let Err(e) = self.store.set(PURCHASE_STATE_KEY, value) {
            error!("保存购买状态失败: {}", e);
        }
    }
}

/// 完成一次性内购并解锁高级版
///
/// 商品未配置时报告`ItemUnavailable`；只有购买成功才更新标志。
pub fn purchase_premium<C>(
    client: &mut C,
    state: &PremiumState,
    product_id: &str,
) -> Result<(), PurchaseError>
where
    C: PurchaseClient + ?Sized,
{
    let product = client
        .fetch_product(product_id)?
        .ok_or(PurchaseError::ItemUnavailable)?;
    debug!("发起购买: {} ({})", product.title, product.id);

    client.request_purchase(&product.id)?;
    state.set_premium(true);
    info!("高级版已解锁");

    Ok(())
}

/// 恢复历史购买，返回是否有可恢复的购买
pub fn restore_premium<C>(client: &mut C, state: &PremiumState) -> Result<bool, PurchaseError>
where
    C: PurchaseClient + ?Sized,
{
    let restored = client.restore_purchases()?;
    if restored {
        state.set_premium(true);
        info!("已恢复历史购买");
    }
    Ok(restored)
}
