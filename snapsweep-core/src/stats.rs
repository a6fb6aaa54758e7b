use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::storage::FileStore;

/// 统计数据在存储中的键
pub const STATISTICS_KEY: &str = "deletion_statistics";

/// One completed batch-deletion event
///
/// Created once per confirmed batch and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionSession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub photos_deleted: u64,
    pub space_freed: u64,
}

/// Durable, append-only record of completed deletion sessions
///
/// Sessions are stored newest first as a JSON array under a single
/// key-value entry. Lifetime totals are reductions over the stored
/// sequence, recomputed on read and never cached.
pub struct StatisticsLedger {
    store: FileStore,
    sessions: Vec<DeletionSession>,
}

impl StatisticsLedger {
    /// 从存储加载账本。缺失或损坏的数据按空数据处理，不报错
    pub fn load(store: FileStore) -> Self {
        let sessions = match store.get(STATISTICS_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<DeletionSession>>(&raw) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!("统计数据损坏，按空数据处理: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self { store, sessions }
    }

    /// 所有会话，最新的在前面
    pub fn sessions(&self) -> &[DeletionSession] {
        &self.sessions
    }

    /// 累计删除的照片数
    pub fn total_photos_deleted(&self) -> u64 {
        self.sessions.iter().map(|s| s.photos_deleted).sum()
    }

    /// 累计释放的字节数
    pub fn total_space_freed(&self) -> u64 {
        self.sessions.iter().map(|s| s.space_freed).sum()
    }

    /// 记录一次已确认的删除批次并持久化整个序列
    ///
    /// 持久化失败只记录日志，内存状态保留新会话，等待下次成功写入。
    pub fn add_session(&mut self, photos_deleted: u64, space_freed: u64) -> &DeletionSession {
        let now = Utc::now();
        let session = DeletionSession {
            // 毫秒时间戳作为本地唯一id，单设备单用户场景下冲突可以忽略
            id: now.timestamp_millis().to_string(),
            date: now,
            photos_deleted,
            space_freed,
        };

        self.sessions.insert(0, session);
        self.persist();

        &self.sessions[0]
    }

    /// 清空所有会话记录
    pub fn clear_history(&mut self) {
        self.sessions.clear();
        if let Err(e) = self.store.remove(STATISTICS_KEY) {
            error!("清除统计数据失败: {}", e);
        }
    }

    fn persist(&self) {
        match serde_json::to_string(&self.sessions) {
            Ok(raw) => {
                if let Err(e) = self.store.set(STATISTICS_KEY, &raw) {
                    error!("保存统计数据失败: {}", e);
                }
            }
            Err(e) => {
                error!("序列化统计数据失败: {}", e);
            }
        }
    }
}
