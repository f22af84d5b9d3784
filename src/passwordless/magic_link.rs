//! Magic Link（魔法链接）实现
//!
//! 提供基于 URL 内嵌一次性 secret 的无密码登录功能。
//!
//! ## 工作流程
//!
//! 1. 用户输入邮箱请求登录链接
//! 2. 系统生成至少 32 字节熵的 URL 安全 secret，哈希后写入 `magic_link`
//!    命名空间，5 分钟过期
//! 3. 链接形如 `{host}?secret={secret}`，由应用层发送到用户邮箱
//! 4. 用户点击链接，前端把邮箱和 secret 一起提交
//! 5. 验证成功后 secret 失效
//!
//! 魔法链接与验证码使用独立的命名空间，二者互不影响。
//!
//! ## 自定义配置
//!
//! ```rust
//! use sesame::passwordless::MagicLinkConfig;
//! use std::time::Duration;
//!
//! let config = MagicLinkConfig::default()
//!     .with_host("https://app.example.com/magic")
//!     .with_token_length(48)
//!     .with_ttl(Duration::from_secs(600));
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::OneTimeSecrets;
use crate::error::Result;
use crate::hashing::SecretHasher;
use crate::random::generate_random_base64_url;
use crate::store::{InMemorySecretStore, SecretNamespace, SecretStore};

/// secret 熵的最小字节数
pub const MIN_TOKEN_LENGTH: usize = 32;

// ============================================================================
// 配置
// ============================================================================

/// Magic Link 配置
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// 链接基础地址
    pub host: String,

    /// secret 熵（字节数，Base64 编码后会更长）
    pub token_length: usize,

    /// secret 有效期
    pub ttl: Duration,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            token_length: MIN_TOKEN_LENGTH, // 256 bits
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl MagicLinkConfig {
    /// 创建新配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置链接基础地址
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// 设置 secret 熵字节数
    ///
    /// # Panics
    ///
    /// 小于 32 字节时 panic
    pub fn with_token_length(mut self, length: usize) -> Self {
        assert!(
            length >= MIN_TOKEN_LENGTH,
            "magic link secret needs at least 32 bytes of entropy"
        );
        self.token_length = length;
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

/// 生成的魔法链接
#[derive(Debug, Clone)]
pub struct MagicLinkData {
    /// 明文 secret
    pub token: String,

    /// 完整链接
    pub url: String,

    /// 关联的邮箱
    pub identifier: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl MagicLinkData {
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
// Magic Link 服务
// ============================================================================

/// Magic Link 服务
///
/// 负责生成和验证魔法链接 secret。
pub struct MagicLinkService<S: SecretStore = InMemorySecretStore> {
    secrets: OneTimeSecrets<S>,
    config: MagicLinkConfig,
}

impl MagicLinkService<InMemorySecretStore> {
    /// 使用默认内存存储创建服务
    pub fn new(config: MagicLinkConfig) -> Self {
        Self::with_store(InMemorySecretStore::new(), config)
    }
}

impl<S: SecretStore> MagicLinkService<S> {
    /// 使用自定义存储创建服务
    pub fn with_store(store: S, config: MagicLinkConfig) -> Self {
        Self {
            secrets: OneTimeSecrets::new(store, SecretNamespace::MagicLink, config.ttl),
            config,
        }
    }

    /// 替换哈希器
    pub fn with_hasher(mut self, hasher: SecretHasher) -> Self {
        self.secrets.set_hasher(hasher);
        self
    }

    /// 为邮箱生成魔法链接
    ///
    /// 覆盖该邮箱尚未使用的旧链接。
    pub async fn generate(&self, identifier: impl Into<String>) -> Result<MagicLinkData> {
        let identifier = identifier.into();
        let token = generate_random_base64_url(self.config.token_length)?;

        let issued = self.secrets.issue(&identifier, &token).await?;
        let url = self.link_for(&token);

        Ok(MagicLinkData {
            token,
            url,
            identifier,
            created_at: issued.created_at,
            expires_at: issued.expires_at,
        })
    }

    /// 验证链接中的 secret
    ///
    /// 正确且未过期时返回 `true` 并使 secret 失效。
    pub async fn verify(&self, identifier: &str, secret: &str) -> Result<bool> {
        self.secrets.redeem(identifier, secret).await
    }

    /// 撤销链接
    pub async fn revoke(&self, identifier: &str) -> Result<()> {
        self.secrets.revoke(identifier).await
    }

    /// 构建链接，secret 为 base64url 字符，无需转义
    pub fn link_for(&self, token: &str) -> String {
        format!("{}?secret={}", self.config.host, token)
    }

    /// 获取配置
    pub fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// 获取底层存储
    pub fn store(&self) -> &S {
        self.secrets.store()
    }
}
