//! Token 模块
//!
//! 会话 token 的签发与验证。
//!
//! ## 子模块
//!
//! - **jwt**: HS256 JWT 的编解码
//! - **session**: 会话 Token 服务，唯一能签发会话 token 的组件
//!
//! ## 示例
//!
//! ```rust
//! use sesame::token::SessionTokenService;
//! use std::time::Duration;
//!
//! let service = SessionTokenService::new(
//!     b"my-secret-key-at-least-32-bytes!",
//!     Duration::from_secs(30 * 60),
//! )
//! .unwrap();
//!
//! let session = service.issue("user@example.com", Duration::from_secs(60)).unwrap();
//! let subject = service.validate(&session.token).unwrap();
//! assert_eq!(subject, "user@example.com");
//!
//! assert!(service.validate("garbage").is_err());
//! ```

pub mod jwt;
pub mod session;

pub use jwt::{JwtBuilder, JwtValidator, SessionClaims};
pub use session::{DEFAULT_SESSION_TTL, PLACEHOLDER_SECRET, SessionToken, SessionTokenService};
