//! 临时 secret 存储模块
//!
//! 保存一次性 secret 的哈希，每个键带有独立的过期时间。
//!
//! ## 键空间
//!
//! 存储键为 `{namespace}:{subject}`。验证码与魔法链接使用不同的命名空间，
//! 同一邮箱同时请求两者时互不覆盖、互不失效。同一键上的新写入会覆盖旧记录
//! 并重置 TTL（后写者胜）。
//!
//! ## 一次性使用
//!
//! 验证成功后调用 [`SecretStore::compare_and_invalidate`]：只有记录仍然存活且哈希
//! 与验证时读到的一致时才删除并返回 `true`。两个并发验证同一个 secret 时至多
//! 一个成功。
//!
//! ## 示例
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use sesame::store::{InMemorySecretStore, SecretNamespace, SecretStore};
//! use std::time::Duration;
//!
//! let store = InMemorySecretStore::new();
//! store
//!     .put(SecretNamespace::Otp, "user@example.com", "$2b$04$hash", Duration::from_secs(300))
//!     .await
//!     .unwrap();
//!
//! let entry = store.get(SecretNamespace::Otp, "user@example.com").await.unwrap();
//! assert_eq!(entry.unwrap().secret_hash, "$2b$04$hash");
//!
//! // 魔法链接命名空间不受影响
//! assert!(store.get(SecretNamespace::MagicLink, "user@example.com").await.unwrap().is_none());
//! # });
//! ```

mod memory;

pub use memory::{InMemorySecretStore, SweeperHandle};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

// ============================================================================
// 命名空间
// ============================================================================

/// secret 命名空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretNamespace {
    /// 一次性验证码
    Otp,
    /// 魔法链接
    MagicLink,
}

impl SecretNamespace {
    /// 命名空间前缀
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretNamespace::Otp => "otp",
            SecretNamespace::MagicLink => "magic_link",
        }
    }

    /// 构建存储键
    pub fn key(&self, subject: &str) -> String {
        format!("{}:{}", self.as_str(), subject)
    }
}

impl std::fmt::Display for SecretNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// 数据结构
// ============================================================================

/// 存储中的 secret 记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEntry {
    /// 命名空间
    pub namespace: SecretNamespace,

    /// 绑定的邮箱
    pub subject: String,

    /// secret 的不可逆哈希
    pub secret_hash: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 有效期
    pub ttl: Duration,
}

impl SecretEntry {
    /// 过期时间
    pub fn expires_at(&self) -> DateTime<Utc> {
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => self.created_at + ttl,
            Err(_) => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// 检查是否已过期
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// 检查在给定时刻是否已过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

// ============================================================================
// 存储接口
// ============================================================================

/// 临时 secret 存储接口
///
/// 实现此 trait 以提供自定义的存储后端（如 Redis 等带 TTL 的键值服务）。
/// 每个方法对单个键必须是原子的；不同 subject 之间互不干扰。
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// 写入 secret 哈希，覆盖已有记录并重置 TTL
    async fn put(
        &self,
        namespace: SecretNamespace,
        subject: &str,
        secret_hash: &str,
        ttl: Duration,
    ) -> Result<()>;

    /// 读取存活的记录，过期或不存在返回 `None`
    async fn get(&self, namespace: SecretNamespace, subject: &str) -> Result<Option<SecretEntry>>;

    /// 立即删除记录
    async fn expire_now(&self, namespace: SecretNamespace, subject: &str) -> Result<()>;

    /// 当记录存活且哈希等于 `expected_hash` 时原子删除
    ///
    /// 返回本次调用是否删除了记录。
    async fn compare_and_invalidate(
        &self,
        namespace: SecretNamespace,
        subject: &str,
        expected_hash: &str,
    ) -> Result<bool>;

    /// 清理过期记录，返回清理数量
    async fn cleanup_expired(&self) -> Result<usize>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    async fn put(
        &self,
        namespace: SecretNamespace,
        subject: &str,
        secret_hash: &str,
        ttl: Duration,
    ) -> Result<()> {
        (**self).put(namespace, subject, secret_hash, ttl).await
    }

    async fn get(&self, namespace: SecretNamespace, subject: &str) -> Result<Option<SecretEntry>> {
        (**self).get(namespace, subject).await
    }

    async fn expire_now(&self, namespace: SecretNamespace, subject: &str) -> Result<()> {
        (**self).expire_now(namespace, subject).await
    }

    async fn compare_and_invalidate(
        &self,
        namespace: SecretNamespace,
        subject: &str,
        expected_hash: &str,
    ) -> Result<bool> {
        (**self)
            .compare_and_invalidate(namespace, subject, expected_hash)
            .await
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        (**self).cleanup_expired().await
    }
}
