//! 内存存储实现
//!
//! 适用于单实例部署或测试环境。多实例部署应实现 [`SecretStore`] 对接共享的
//! TTL 键值服务。

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{SecretEntry, SecretNamespace, SecretStore};
use crate::error::Result;
use crate::random::constant_time_compare_str;

/// 内存 secret 存储
///
/// 通过 [`Arc`] 廉价克隆，所有克隆共享同一份数据。过期记录在读取时视为不存在，
/// 并由 [`cleanup_expired`](SecretStore::cleanup_expired) 或后台清理任务删除。
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    /// `{namespace}:{subject}` -> 记录
    entries: Arc<RwLock<HashMap<String, SecretEntry>>>,
}

impl InMemorySecretStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前存储的记录数量（包括尚未清理的过期记录）
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 启动后台清理任务
    ///
    /// 每隔 `interval` 删除一次过期记录。任务在 [`SweeperHandle::shutdown`]
    /// 被调用或句柄被丢弃时退出。必须在 tokio 运行时内调用。
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        let store = self.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.changed() => {
                        return;
                    }
                }

                let removed = store.remove_expired();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired secrets");
                }
            }
        });

        SweeperHandle { shutdown_tx, task }
    }

    fn remove_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn put(
        &self,
        namespace: SecretNamespace,
        subject: &str,
        secret_hash: &str,
        ttl: Duration,
    ) -> Result<()> {
        let entry = SecretEntry {
            namespace,
            subject: subject.to_string(),
            secret_hash: secret_hash.to_string(),
            created_at: Utc::now(),
            ttl,
        };
        self.entries.write().insert(namespace.key(subject), entry);
        Ok(())
    }

    async fn get(&self, namespace: SecretNamespace, subject: &str) -> Result<Option<SecretEntry>> {
        let entries = self.entries.read();
        Ok(entries
            .get(&namespace.key(subject))
            .filter(|entry| !entry.is_expired())
            .cloned())
    }

    async fn expire_now(&self, namespace: SecretNamespace, subject: &str) -> Result<()> {
        self.entries.write().remove(&namespace.key(subject));
        Ok(())
    }

    async fn compare_and_invalidate(
        &self,
        namespace: SecretNamespace,
        subject: &str,
        expected_hash: &str,
    ) -> Result<bool> {
        let key = namespace.key(subject);
        let mut entries = self.entries.write();

        let matches = entries.get(&key).is_some_and(|entry| {
            !entry.is_expired() && constant_time_compare_str(&entry.secret_hash, expected_hash)
        });
        if matches {
            entries.remove(&key);
        }
        Ok(matches)
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        Ok(self.remove_expired())
    }
}

/// 后台清理任务句柄
///
/// 丢弃句柄会关闭通知通道，任务随之退出。
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// 停止清理任务并等待其退出
    pub async fn shutdown(self) {
        // 接收端可能已经退出
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("secret sweeper task ended abnormally: {}", e);
        }
    }

    /// 任务是否已经结束
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
