use tracing::debug;

use crate::asset::Asset;

/// In-memory set of photos pending deletion for the current session
///
/// Membership is keyed by asset id and insertion order is preserved for
/// display. The list is never persisted: it represents an uncommitted
/// user selection and is intentionally lost on process exit.
#[derive(Debug, Clone, Default)]
pub struct DeletionList {
    marked: Vec<Asset>,
}

impl DeletionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记一张照片待删除。重复标记同一id是no-op，返回是否新增
    pub fn mark(&mut self, asset: Asset) -> bool {
        if self.contains(&asset.id) {
            debug!("照片 {} 已在删除列表中", asset.id);
            return false;
        }
        self.marked.push(asset);
        true
    }

    /// 按id取消标记，返回是否移除了条目
    pub fn unmark(&mut self, id: &str) -> bool {
        let before = self.marked.len();
        self.marked.retain(|a| a.id != id);
        before != self.marked.len()
    }

    /// 清空删除列表
    pub fn clear(&mut self) {
        self.marked.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.marked.iter().any(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// 已标记的照片，按标记顺序
    pub fn assets(&self) -> &[Asset] {
        &self.marked
    }

    /// 已标记照片的id列表
    pub fn ids(&self) -> Vec<String> {
        self.marked.iter().map(|a| a.id.clone()).collect()
    }
}
