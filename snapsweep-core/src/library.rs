use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::asset::{self, Asset};
use crate::estimator::SizeLookup;

/// 分页查询请求
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 每页资产数量
    pub page_size: usize,
    /// 上一页返回的游标，首页为None
    pub cursor: Option<String>,
}

impl PageRequest {
    /// 首页请求
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            cursor: None,
        }
    }

    /// 从指定游标继续的请求
    pub fn after(page_size: usize, cursor: impl Into<String>) -> Self {
        Self {
            page_size,
            cursor: Some(cursor.into()),
        }
    }
}

/// 单页查询结果
#[derive(Debug, Clone)]
pub struct AssetPage {
    /// 本页资产，按创建时间倒序
    pub assets: Vec<Asset>,
    /// 继续查询用的游标，对调用方不透明
    pub next_cursor: Option<String>,
    /// 后面是否还有更多资产
    pub has_more: bool,
}

/// Platform photo store abstraction
///
/// Implementations serve assets sorted by creation time descending and
/// delete batches all-or-nothing: a failure part-way through is reported
/// as an error with no partial-success accounting.
pub trait PhotoLibrary {
    /// 按创建时间倒序分页查询资产
    fn fetch_page(&self, request: &PageRequest) -> Result<AssetPage>;

    /// 按id批量删除资产
    fn delete(&mut self, ids: &[String]) -> Result<()>;

    /// 查询资产对应文件的实际大小，文件不存在时返回None
    fn file_size(&self, asset: &Asset) -> Result<Option<u64>>;
}

// 任何照片库都可以直接作为估算器的权威大小来源
impl<T: PhotoLibrary + ?Sized> SizeLookup for T {
    fn size_of(&self, asset: &Asset) -> Result<Option<u64>> {
        self.file_size(asset)
    }
}

/// 照片库扫描配置
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub ignore_hidden: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(10), // 默认最大深度10层
            follow_links: false,
            ignore_hidden: true,
        }
    }
}

/// Directory-backed photo library
///
/// Scans a root directory once on open, keeps the listing in memory
/// sorted newest first, and serves opaque offset cursors from it.
pub struct FsPhotoLibrary {
    root: PathBuf,
    assets: Vec<Asset>,
}

impl FsPhotoLibrary {
    /// 打开并扫描照片目录
    pub fn open<P: AsRef<Path>>(root: P, config: &LibraryConfig) -> Result<Self> {
        let root = root.as_ref();
        info!("开始扫描照片目录: {:?}", root);

        if !root.exists() {
            anyhow::bail!("路径不存在: {:?}", root);
        }

        if !root.is_dir() {
            anyhow::bail!("路径不是目录: {:?}", root);
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .follow_links(config.follow_links)
            .git_ignore(false)
            .hidden(config.ignore_hidden);

        if let Some(depth) = config.max_depth {
            builder.max_depth(Some(depth));
        }

        let mut assets = Vec::new();
        for entry in builder.build() {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !path.is_file() || !asset::is_image_file(path) {
                        continue;
                    }
                    match Asset::from_path(path) {
                        Ok(found) => {
                            debug!("发现照片: {:?}", path);
                            assets.push(found);
                        }
                        Err(e) => {
                            warn!("解析资产失败 {:?}: {}", path, e);
                        }
                    }
                }
                Err(e) => {
                    warn!("扫描错误: {}", e);
                }
            }
        }

        // 创建时间倒序，最新的在前面
        assets.sort_by(|a, b| b.created.cmp(&a.created));

        info!("找到 {} 张照片", assets.len());

        Ok(Self {
            root: root.to_path_buf(),
            assets,
        })
    }

    /// 照片根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 库中照片总数
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    // 游标是列表偏移量的字符串形式，只在这里解释
    fn parse_cursor(cursor: Option<&str>) -> Result<usize> {
        match cursor {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("无效的分页游标: {raw}")),
            None => Ok(0),
        }
    }
}

impl PhotoLibrary for FsPhotoLibrary {
    fn fetch_page(&self, request: &PageRequest) -> Result<AssetPage> {
        let offset = Self::parse_cursor(request.cursor.as_deref())?;
        let end = offset.saturating_add(request.page_size).min(self.assets.len());

        let assets = self
            .assets
            .get(offset..end)
            .unwrap_or_default()
            .to_vec();

        let has_more = end < self.assets.len();
        let next_cursor = has_more.then(|| end.to_string());

        debug!(
            "返回第 {}..{} 条，共 {} 条，has_more={}",
            offset,
            end,
            self.assets.len(),
            has_more
        );

        Ok(AssetPage {
            assets,
            next_cursor,
            has_more,
        })
    }

    fn delete(&mut self, ids: &[String]) -> Result<()> {
        // 先解析所有id，未知id在删除任何文件之前就报错
        let mut doomed = Vec::with_capacity(ids.len());
        for id in ids {
            let found = self
                .assets
                .iter()
                .find(|a| &a.id == id)
                .ok_or_else(|| anyhow::anyhow!("未知的资产id: {}", id))?;
            doomed.push(found.path.clone());
        }

        for path in &doomed {
            fs::remove_file(path).with_context(|| format!("删除文件失败: {path:?}"))?;
        }

        // 从缓存列表中移除已删除的资产
        self.assets.retain(|a| !ids.contains(&a.id));

        info!("已删除 {} 张照片", doomed.len());
        Ok(())
    }

    fn file_size(&self, asset: &Asset) -> Result<Option<u64>> {
        match fs::metadata(&asset.path) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("读取文件大小失败: {:?}", asset.path))
            }
        }
    }
}
