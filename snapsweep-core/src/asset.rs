use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// 支持的图片扩展名
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "tiff", "tif",
];

/// Photo asset metadata
///
/// Immutable once fetched from the library; the pagination layer owns the
/// fetched copies for the duration of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub path: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created: SystemTime,
}

impl Asset {
    /// Create an `Asset` from an image file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata =
            fs::metadata(&path).with_context(|| format!("读取文件元数据失败: {path:?}"))?;

        if !metadata.is_file() {
            anyhow::bail!("不是普通文件: {:?}", path);
        }

        // 优先使用创建时间，文件系统不支持时退回修改时间
        let created = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        // 尺寸只读图片头，读取失败时留空，由估算器使用默认尺寸
        let (width, height) = match image::image_dimensions(&path) {
            Ok((w, h)) => (Some(w), Some(h)),
            Err(e) => {
                debug!("无法读取图片尺寸 {:?}: {}", path, e);
                (None, None)
            }
        };

        Ok(Asset {
            id: path.to_string_lossy().into_owned(),
            path,
            width,
            height,
            created,
        })
    }

    /// 像素总数（缺少尺寸信息时为None）
    pub fn pixel_count(&self) -> Option<u64> {
        Some(u64::from(self.width?) * u64::from(self.height?))
    }

    /// Get the file name for display purposes
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Get relative path from a base directory
    pub fn relative_path(&self, base: &Path) -> PathBuf {
        self.path
            .strip_prefix(base)
            .unwrap_or(&self.path)
            .to_path_buf()
    }
}

/// 按扩展名判断路径是否为支持的图片文件
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
