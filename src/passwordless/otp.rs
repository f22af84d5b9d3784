//! OTP (One-Time Password) 实现
//!
//! 服务端生成随机字母数字验证码，通过邮件发送给用户。
//!
//! ## 工作流程
//!
//! 1. 用户请求登录（输入邮箱）
//! 2. 系统生成 8 位字母数字验证码，哈希后写入 `otp` 命名空间，5 分钟过期
//! 3. 应用层将明文验证码通过邮件发送给用户
//! 4. 用户输入收到的验证码
//! 5. 系统验证哈希，成功后验证码立即失效
//!
//! 同一邮箱重新请求时旧验证码被覆盖。错误输入不会使验证码失效，
//! 也没有尝试次数限制。
//!
//! ## 自定义配置
//!
//! ```rust
//! use sesame::passwordless::OtpConfig;
//! use std::time::Duration;
//!
//! let config = OtpConfig::default()
//!     .with_code_length(10)
//!     .with_ttl(Duration::from_secs(120));
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::OneTimeSecrets;
use crate::error::Result;
use crate::hashing::SecretHasher;
use crate::random::generate_random_alphanumeric;
use crate::store::{InMemorySecretStore, SecretNamespace, SecretStore};

// ============================================================================
// 配置
// ============================================================================

/// OTP 配置
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// 验证码长度（字符数）
    pub code_length: usize,

    /// 验证码有效期
    pub ttl: Duration,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 8,
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl OtpConfig {
    /// 创建新配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置验证码长度
    ///
    /// # Panics
    ///
    /// 长度不在 6-32 之间时 panic
    pub fn with_code_length(mut self, length: usize) -> Self {
        assert!(
            (6..=32).contains(&length),
            "code length must be between 6 and 32"
        );
        self.code_length = length;
        self
    }

    /// 设置有效期
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

// ============================================================================
// 数据结构
// ============================================================================

/// 生成的 OTP
///
/// `code` 是唯一的明文副本，只用于投递。
#[derive(Debug, Clone)]
pub struct OtpData {
    /// 生成的验证码
    pub code: String,

    /// 关联的邮箱
    pub identifier: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl OtpData {
    /// 检查是否已过期
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// 获取剩余有效时间（秒）
    pub fn remaining_seconds(&self) -> i64 {
        let remaining = self.expires_at - Utc::now();
        remaining.num_seconds().max(0)
    }
}

// ============================================================================
// OTP 服务
// ============================================================================

/// OTP 服务
///
/// 负责生成和验证一次性验证码。
pub struct OtpService<S: SecretStore = InMemorySecretStore> {
    secrets: OneTimeSecrets<S>,
    config: OtpConfig,
}

impl OtpService<InMemorySecretStore> {
    /// 使用默认内存存储创建服务
    pub fn new(config: OtpConfig) -> Self {
        Self::with_store(InMemorySecretStore::new(), config)
    }
}

impl<S: SecretStore> OtpService<S> {
    /// 使用自定义存储创建服务
    pub fn with_store(store: S, config: OtpConfig) -> Self {
        Self {
            secrets: OneTimeSecrets::new(store, SecretNamespace::Otp, config.ttl),
            config,
        }
    }

    /// 替换哈希器
    pub fn with_hasher(mut self, hasher: SecretHasher) -> Self {
        self.secrets.set_hasher(hasher);
        self
    }

    /// 为邮箱生成验证码
    ///
    /// 覆盖该邮箱尚未使用的旧验证码。
    pub async fn generate(&self, identifier: impl Into<String>) -> Result<OtpData> {
        let identifier = identifier.into();
        let code = generate_random_alphanumeric(self.config.code_length);

        let issued = self.secrets.issue(&identifier, &code).await?;

        Ok(OtpData {
            code,
            identifier,
            created_at: issued.created_at,
            expires_at: issued.expires_at,
        })
    }

    /// 验证验证码
    ///
    /// 正确且未过期时返回 `true` 并使验证码失效；其余情况一律返回 `false`，
    /// 不区分“从未请求”与“输入错误”。
    pub async fn verify(&self, identifier: &str, code: &str) -> Result<bool> {
        self.secrets.redeem(identifier, code).await
    }

    /// 撤销验证码
    pub async fn revoke(&self, identifier: &str) -> Result<()> {
        self.secrets.revoke(identifier).await
    }

    /// 获取配置
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// 获取底层存储
    pub fn store(&self) -> &S {
        self.secrets.store()
    }
}
