use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key-value store backed by one file per key
///
/// Keys must be valid file names. Reads never fail: missing or unreadable
/// entries are reported as absent so callers can fall back to defaults.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// 打开指定目录的存储，目录不存在时创建
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("创建存储目录失败: {dir:?}"))?;
        Ok(Self { dir })
    }

    /// 默认存储目录（系统数据目录下的snapsweep子目录）
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("snapsweep"))
    }

    /// 在默认目录打开存储
    pub fn open_default() -> Result<Self> {
        let dir = Self::default_dir().context("无法确定系统数据目录")?;
        Self::open(dir)
    }

    /// 存储目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// 读取一个键，缺失或读取失败时返回None
    pub fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("读取存储键 {} 失败: {}", key, e);
                None
            }
        }
    }

    /// 写入一个键
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        fs::write(&path, value).with_context(|| format!("写入存储键失败: {key}"))?;
        debug!("已写入存储键: {}", key);
        Ok(())
    }

    /// 删除一个键，键不存在时是no-op
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("删除存储键失败: {key}"))?;
            debug!("已删除存储键: {}", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::open(temp_dir.path())?;

        assert_eq!(store.get("missing"), None);
        Ok(())
    }

    #[test]
    fn test_set_and_get_roundtrip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::open(temp_dir.path())?;

        store.set("flag", "true")?;
        assert_eq!(store.get("flag"), Some("true".to_string()));

        // 覆盖写入
        store.set("flag", "false")?;
        assert_eq!(store.get("flag"), Some("false".to_string()));

        Ok(())
    }

    #[test]
    fn test_remove() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::open(temp_dir.path())?;

        store.set("key", "value")?;
        store.remove("key")?;
        assert_eq!(store.get("key"), None);

        // 重复删除是no-op
        store.remove("key")?;

        Ok(())
    }

    #[test]
    fn test_open_creates_nested_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let nested = temp_dir.path().join("a").join("b");

        let store = FileStore::open(&nested)?;
        assert!(nested.exists());
        assert_eq!(store.dir(), nested);

        Ok(())
    }

    #[test]
    fn test_default_dir_mentions_app_name() {
        if let Some(dir) = FileStore::default_dir() {
            assert!(dir.to_string_lossy().contains("snapsweep"));
        }
    }
}
