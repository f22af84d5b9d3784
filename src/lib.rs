//! # Sesame
//!
//! 无密码认证核心：用邮件投递的一次性验证码或魔法链接证明邮箱归属，
//! 成功后签发短期有效的 HS256 会话 token。
//!
//! ## 功能特性
//!
//! - **临时 secret 存储**: 只保存哈希，每个键独立过期，原子的一次性消费
//! - **一次性验证码**: 8 位字母数字，5 分钟有效
//! - **魔法链接**: 至少 256 位熵的 URL 安全 secret，5 分钟有效
//! - **会话 Token**: HS256 签名，只接受 HS256，过期即失效
//! - **凭证提取**: 从 cookie 中取出会话 token，缺失即拒绝
//! - **认证编排**: 串联用户目录、通知通道与上述组件
//!
//! ## Features
//!
//! - `bcrypt` - 使用 bcrypt 哈希一次性 secret（默认启用）
//! - `argon2` - 使用 Argon2id 哈希一次性 secret
//! - `mailgun` - 启用 Mailgun 通知通道（默认启用）
//! - `full` - 启用所有功能
//!
//! ## 验证码登录示例
//!
#![cfg_attr(feature = "bcrypt", doc = "```rust")]
#![cfg_attr(not(feature = "bcrypt"), doc = "```rust,ignore")]
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use sesame::passwordless::{OtpConfig, OtpService};
//! use sesame::SecretHasher;
//!
//! let otp = OtpService::new(OtpConfig::default())
//!     .with_hasher(SecretHasher::default().with_bcrypt_cost(4));
//!
//! let issued = otp.generate("user@example.com").await.unwrap();
//! assert!(otp.verify("user@example.com", &issued.code).await.unwrap());
//!
//! // 验证码只能使用一次
//! assert!(!otp.verify("user@example.com", &issued.code).await.unwrap());
//! # });
//! ```
//!
//! ## 会话 Token 示例
//!
//! ```rust
//! use sesame::token::SessionTokenService;
//! use std::time::Duration;
//!
//! let tokens = SessionTokenService::new(b"server-secret", Duration::from_secs(1800)).unwrap();
//! let session = tokens.issue_default("user@example.com").unwrap();
//! assert_eq!(tokens.validate(&session.token).unwrap(), "user@example.com");
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod hashing;
pub mod notify;
pub mod passwordless;
pub mod random;
pub mod security;
pub mod service;
pub mod store;
pub mod token;

pub use error::{Error, Result};

// ============================================================================
// 配置与编排
// ============================================================================

pub use config::AuthConfig;
pub use service::{AuthService, EnumerationPolicy, IssuedSession, LoginFlow, LoginRequested};

// ============================================================================
// 存储与一次性 secret
// ============================================================================

pub use hashing::{Algorithm, SecretHasher};
pub use passwordless::{
    MagicLinkConfig, MagicLinkData, MagicLinkService, OtpConfig, OtpData, OtpService,
};
pub use store::{InMemorySecretStore, SecretEntry, SecretNamespace, SecretStore, SweeperHandle};

// ============================================================================
// 会话与凭证
// ============================================================================

pub use security::{CookieCredentialScheme, CookieJar, CredentialCarrier, SameSite, SessionCookie};
pub use token::{SessionToken, SessionTokenService};

// ============================================================================
// 外部接口
// ============================================================================

pub use directory::{InMemoryUserDirectory, UserDirectory, UserRecord};
#[cfg(feature = "mailgun")]
pub use notify::{MailgunConfig, MailgunNotifier};
pub use notify::{Message, Notifier};
