//! 会话 Token 服务
//!
//! 唯一能签发会话 token 的组件。token 自包含 `sub` 和 `exp`，
//! 有效性只取决于签名和过期时间，服务端没有会话表。
//!
//! ## 示例
//!
//! ```rust
//! use sesame::token::SessionTokenService;
//! use std::time::Duration;
//!
//! let service = SessionTokenService::new(
//!     b"a-long-random-server-secret-value",
//!     Duration::from_secs(30 * 60),
//! )
//! .unwrap();
//!
//! let session = service.issue_default("user@example.com").unwrap();
//! assert_eq!(service.validate(&session.token).unwrap(), "user@example.com");
//!
//! // 占位符密钥是致命配置错误
//! assert!(SessionTokenService::new(b"GENERATE_A_KEY", Duration::from_secs(60)).is_err());
//! ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::jwt::{JwtBuilder, JwtValidator};
use crate::error::{ConfigError, Error, Result, TokenError};

/// 未替换的示例密钥
pub const PLACEHOLDER_SECRET: &str = "GENERATE_A_KEY";

/// 默认会话有效期（30 分钟）
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// 已签发的会话 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// 签名后的 token
    pub token: String,

    /// 主题（邮箱）
    pub subject: String,

    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// 检查是否已过期
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// 会话 Token 服务
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    validator: JwtValidator,
    default_ttl: Duration,
}

impl std::fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionTokenService {
    /// 使用服务端密钥创建服务
    ///
    /// # Errors
    ///
    /// 密钥为空或仍是占位符时返回致命的 [`ConfigError`]。
    pub fn new(secret: &[u8], default_ttl: Duration) -> Result<Self> {
        check_signing_secret(secret)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            validator: JwtValidator::from_key(DecodingKey::from_secret(secret)),
            default_ttl,
        })
    }

    /// 默认有效期
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// 签发会话 token
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<SessionToken> {
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| {
            Error::Token(TokenError::InvalidClaim(
                "session ttl out of range".to_string(),
            ))
        })?;

        let builder = JwtBuilder::new()
            .subject(subject)
            .expires_in_seconds(ttl_secs);
        let expires_at = builder
            .expiration()
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or_else(|| {
                Error::Token(TokenError::InvalidClaim(
                    "session ttl out of range".to_string(),
                ))
            })?;
        let token = builder.build(&self.encoding_key)?;

        tracing::info!(subject, ttl_secs, "issued session token");

        Ok(SessionToken {
            token,
            subject: subject.to_string(),
            expires_at,
        })
    }

    /// 使用默认有效期签发
    pub fn issue_default(&self, subject: &str) -> Result<SessionToken> {
        self.issue(subject, self.default_ttl)
    }

    /// 验证 token 并返回主题
    ///
    /// 签名错误、算法不符、结构错误、过期一律返回 [`Error::Unauthorized`]。
    pub fn validate(&self, token: &str) -> Result<String> {
        self.validator.validate(token).map(|claims| claims.sub)
    }
}

/// 拒绝空密钥和占位符密钥
pub(crate) fn check_signing_secret(secret: &[u8]) -> Result<()> {
    if secret.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::Config(ConfigError::MissingRequired(
            "SECRET_KEY".to_string(),
        )));
    }
    if secret == PLACEHOLDER_SECRET.as_bytes() {
        return Err(Error::Config(ConfigError::Placeholder(
            "SECRET_KEY".to_string(),
        )));
    }
    Ok(())
}
