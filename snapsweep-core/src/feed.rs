use anyhow::Result;
use tracing::debug;

use crate::asset::Asset;
use crate::library::{PageRequest, PhotoLibrary};

/// Paginated in-memory view over a photo library
///
/// Tracks the opaque continuation cursor and an end-of-data flag. Each
/// `load` either replaces or appends the asset list depending on the
/// load-more flag. A failed fetch propagates to the caller unchanged, no
/// retry or backoff.
#[derive(Debug, Clone)]
pub struct PhotoFeed {
    page_size: usize,
    assets: Vec<Asset>,
    cursor: Option<String>,
    has_more: bool,
}

impl PhotoFeed {
    /// 创建指定页大小的分页视图
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            assets: Vec::new(),
            cursor: None,
            has_more: true,
        }
    }

    /// 当前已加载的资产
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// 后面是否还有未加载的资产
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// 加载一页。`load_more`为false时替换当前列表，为true时在末尾追加
    pub fn load<L>(&mut self, library: &L, load_more: bool) -> Result<&[Asset]>
    where
        L: PhotoLibrary + ?Sized,
    {
        let request = if load_more {
            match &self.cursor {
                Some(cursor) => PageRequest::after(self.page_size, cursor.clone()),
                // 还没加载过任何页时从头开始
                None if self.assets.is_empty() => PageRequest::first(self.page_size),
                // 已经到达末尾，追加加载是no-op
                None => {
                    debug!("已到达照片列表末尾");
                    self.has_more = false;
                    return Ok(&self.assets);
                }
            }
        } else {
            PageRequest::first(self.page_size)
        };

        let page = library.fetch_page(&request)?;
        debug!(
            "加载了 {} 张照片，has_more={}",
            page.assets.len(),
            page.has_more
        );

        if load_more {
            self.assets.extend(page.assets);
        } else {
            self.assets = page.assets;
        }
        self.cursor = page.next_cursor;
        self.has_more = page.has_more;

        Ok(&self.assets)
    }

    /// 加载剩余的所有页
    pub fn load_all<L>(&mut self, library: &L) -> Result<&[Asset]>
    where
        L: PhotoLibrary + ?Sized,
    {
        self.load(library, false)?;
        while self.has_more {
            self.load(library, true)?;
        }
        Ok(&self.assets)
    }
}
