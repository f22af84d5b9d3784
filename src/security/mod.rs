//! 请求凭证模块
//!
//! ## 子模块
//!
//! - **credential**: 从请求中提取会话 token
//! - **cookie**: 生成会话 cookie 与清除 cookie
//!
//! ## 示例
//!
//! ```rust
//! use sesame::security::{CookieCredentialScheme, CookieJar, SessionCookie};
//!
//! let set_cookie = SessionCookie::new("token", "signed-token").to_header_value();
//! assert!(set_cookie.starts_with("token=signed-token"));
//!
//! // 浏览器回传
//! let jar = CookieJar::parse("token=signed-token");
//! let token = CookieCredentialScheme::default().extract(&jar).unwrap();
//! assert_eq!(token, "signed-token");
//! ```

pub mod cookie;
pub mod credential;

pub use cookie::{SameSite, SessionCookie};
pub use credential::{
    CookieCredentialScheme, CookieJar, CredentialCarrier, DEFAULT_CREDENTIAL_NAME,
};
