//! JWT (JSON Web Token) 实现模块
//!
//! 会话 token 的底层编解码。算法固定为 **HS256**（HMAC-SHA256），
//! 验证时只接受 HS256，`none` 和其它任何算法都会被拒绝。
//!
//! ## 示例
//!
//! ```rust
//! use sesame::token::jwt::{JwtBuilder, JwtValidator};
//!
//! let secret = b"my-secret-key-at-least-32-bytes!";
//! let token = JwtBuilder::new()
//!     .subject("user@example.com")
//!     .expires_in_minutes(30)
//!     .build_with_secret(secret)
//!     .unwrap();
//!
//! let validator = JwtValidator::new(secret);
//! let claims = validator.validate(&token).unwrap();
//! assert_eq!(claims.sub, "user@example.com");
//! ```

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, TokenError};

/// 会话签名算法
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// 会话 Claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 主题（邮箱）
    pub sub: String,

    /// 过期时间（Unix 时间戳）
    pub exp: i64,

    /// 签发时间（Unix 时间戳）
    #[serde(default)]
    pub iat: i64,
}

impl SessionClaims {
    /// 检查 token 是否已过期
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// JWT 构建器
///
/// 使用 Builder 模式创建会话 token
#[derive(Debug, Clone)]
pub struct JwtBuilder {
    sub: Option<String>,
    exp: Option<i64>,
    exp_overflow: bool,
    iat: i64,
}

impl Default for JwtBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JwtBuilder {
    /// 创建新的 JWT 构建器，签发时间为当前时刻
    pub fn new() -> Self {
        Self {
            sub: None,
            exp: None,
            exp_overflow: false,
            iat: Utc::now().timestamp(),
        }
    }

    /// 设置主题（Subject）
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// 设置过期时间（秒数，从签发时刻开始）
    ///
    /// 溢出时 [`build`](Self::build) 返回 [`TokenError::InvalidClaim`]。
    pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
        self.exp = self.iat.checked_add(seconds);
        self.exp_overflow = self.exp.is_none();
        self
    }

    /// 设置过期时间（分钟数，从签发时刻开始）
    pub fn expires_in_minutes(self, minutes: i64) -> Self {
        match minutes.checked_mul(60) {
            Some(seconds) => self.expires_in_seconds(seconds),
            None => Self {
                exp: None,
                exp_overflow: true,
                ..self
            },
        }
    }

    /// 设置绝对过期时间（Unix 时间戳）
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self.exp_overflow = false;
        self
    }

    /// 签发时间（Unix 时间戳）
    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    /// 已设置的过期时间（Unix 时间戳）
    pub fn expiration(&self) -> Option<i64> {
        self.exp
    }

    /// 使用密钥构建 JWT
    pub fn build_with_secret(self, secret: &[u8]) -> Result<String> {
        self.build(&EncodingKey::from_secret(secret))
    }

    /// 使用已有的编码密钥构建 JWT
    pub fn build(self, key: &EncodingKey) -> Result<String> {
        let sub = self
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Token(TokenError::InvalidClaim("empty subject".to_string())))?;
        if self.exp_overflow {
            return Err(Error::Token(TokenError::InvalidClaim(
                "exp out of range".to_string(),
            )));
        }
        let exp = self
            .exp
            .ok_or_else(|| Error::Token(TokenError::InvalidClaim("missing exp".to_string())))?;

        let claims = SessionClaims {
            sub,
            exp,
            iat: self.iat,
        };

        encode(&Header::new(SESSION_ALGORITHM), &claims, key).map_err(|e| {
            Error::Token(TokenError::EncodingFailed(format!(
                "failed to encode JWT: {}",
                e
            )))
        })
    }
}

/// JWT 验证器
///
/// 只接受 HS256，强制要求 `exp` 与 `sub`，时钟偏差容忍度为 0。
/// 所有失败都折叠为 [`Error::Unauthorized`]，具体原因只写入 debug 日志。
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// 使用密钥创建验证器
    pub fn new(secret: &[u8]) -> Self {
        Self::from_key(DecodingKey::from_secret(secret))
    }

    /// 使用已有的解码密钥创建验证器
    pub fn from_key(decoding_key: DecodingKey) -> Self {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.algorithms = vec![SESSION_ALGORITHM];
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key,
            validation,
        }
    }

    /// 验证并解码 JWT
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "session token rejected");
                Error::Unauthorized
            })?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            tracing::debug!("session token rejected: empty subject");
            return Err(Error::Unauthorized);
        }
        Ok(claims)
    }
}
