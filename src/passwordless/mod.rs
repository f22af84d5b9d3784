//! 无密码认证模块
//!
//! 提供两种一次性凭证：一次性验证码 (OTP) 和魔法链接 (Magic Link)。
//!
//! ## 设计原则
//!
//! 本模块只负责 secret 的生成和验证，**不包含**实际的邮件发送功能，
//! 投递由 [`Notifier`](crate::notify::Notifier) 完成。
//!
//! ## 示例
//!
//! ### 一次性验证码
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use sesame::hashing::SecretHasher;
//! use sesame::passwordless::{OtpConfig, OtpService};
//!
//! let service = OtpService::new(OtpConfig::default())
//!     .with_hasher(SecretHasher::default().with_bcrypt_cost(4));
//!
//! let otp = service.generate("user@example.com").await.unwrap();
//! assert_eq!(otp.code.len(), 8);
//!
//! // 发送验证码（应用层负责）
//! // notifier.deliver("user@example.com", "Your One Time Password", ...);
//!
//! assert!(service.verify("user@example.com", &otp.code).await.unwrap());
//! // 一次性使用
//! assert!(!service.verify("user@example.com", &otp.code).await.unwrap());
//! # });
//! ```
//!
//! ### 魔法链接
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use sesame::hashing::SecretHasher;
//! use sesame::passwordless::{MagicLinkConfig, MagicLinkService};
//!
//! let service = MagicLinkService::new(MagicLinkConfig::default().with_host("https://app.example.com/login"))
//!     .with_hasher(SecretHasher::default().with_bcrypt_cost(4));
//!
//! let link = service.generate("user@example.com").await.unwrap();
//! assert!(link.url.starts_with("https://app.example.com/login?secret="));
//!
//! assert!(service.verify("user@example.com", &link.token).await.unwrap());
//! # });
//! ```
//!
//! ## 安全考虑
//!
//! - secret 使用密码学安全的随机数生成
//! - 存储中只有加盐慢哈希，明文只返回给调用方用于投递
//! - 不存在的记录同样消耗一次哈希的时间
//! - 验证成功后原子失效（一次性使用）

pub mod magic_link;
pub mod otp;

pub use magic_link::{MagicLinkConfig, MagicLinkData, MagicLinkService};
pub use otp::{OtpConfig, OtpData, OtpService};

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hashing::SecretHasher;
use crate::store::{SecretNamespace, SecretStore};

/// 一次 secret 写入的时间信息
#[derive(Debug, Clone, Copy)]
pub(crate) struct Issued {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// 某个命名空间下一次性 secret 的生命周期管理
///
/// OTP 与魔法链接共用同一套机制，只是命名空间和 secret 形态不同。
pub(crate) struct OneTimeSecrets<S> {
    store: S,
    hasher: SecretHasher,
    namespace: SecretNamespace,
    ttl: Duration,
}

impl<S: SecretStore> OneTimeSecrets<S> {
    pub fn new(store: S, namespace: SecretNamespace, ttl: Duration) -> Self {
        Self {
            store,
            hasher: SecretHasher::default(),
            namespace,
            ttl,
        }
    }

    pub fn set_hasher(&mut self, hasher: SecretHasher) {
        self.hasher = hasher;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 哈希并保存 secret，覆盖同一 subject 的旧记录
    pub async fn issue(&self, subject: &str, plaintext: &str) -> Result<Issued> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        let secret_hash = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| Error::internal(format!("hashing task failed: {}", e)))??;

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::internal(format!("secret ttl out of range: {}", e)))?;
        let created_at = Utc::now();

        self.store
            .put(self.namespace, subject, &secret_hash, self.ttl)
            .await?;

        tracing::info!(namespace = %self.namespace, subject, "issued one-time secret");

        Ok(Issued {
            created_at,
            expires_at: created_at + ttl,
        })
    }

    /// 验证 secret，成功时原子失效
    ///
    /// 不存在、过期、错误以及并发竞争失败都返回 `false`。
    pub async fn redeem(&self, subject: &str, candidate: &str) -> Result<bool> {
        let entry = self.store.get(self.namespace, subject).await?;

        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();
        let stored_hash = entry.map(|e| e.secret_hash);
        let check_hash = stored_hash.clone();

        let matched = tokio::task::spawn_blocking(move || match check_hash {
            Some(hash) => hasher.verify(&candidate, &hash),
            None => {
                hasher.burn(&candidate);
                Ok(false)
            }
        })
        .await
        .map_err(|e| Error::internal(format!("hashing task failed: {}", e)))??;

        let Some(hash) = stored_hash.filter(|_| matched) else {
            tracing::debug!(namespace = %self.namespace, subject, "one-time secret rejected");
            return Ok(false);
        };

        let invalidated = self
            .store
            .compare_and_invalidate(self.namespace, subject, &hash)
            .await?;
        if !invalidated {
            tracing::debug!(
                namespace = %self.namespace,
                subject,
                "one-time secret consumed or replaced concurrently"
            );
        }
        Ok(invalidated)
    }

    /// 撤销 subject 的待用 secret
    pub async fn revoke(&self, subject: &str) -> Result<()> {
        self.store.expire_now(self.namespace, subject).await
    }
}
