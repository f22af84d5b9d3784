//! 会话 Cookie 模块
//!
//! 生成承载会话 token 的 `Set-Cookie` 头，以及登出时的清除头。
//! token 本身已经签名，cookie 不再做额外签名。
//!
//! ## 使用示例
//!
//! ```rust
//! use sesame::security::cookie::{SameSite, SessionCookie};
//! use std::time::Duration;
//!
//! let cookie = SessionCookie::new("token", "eyJhbGciOi...")
//!     .max_age(Duration::from_secs(1800));
//!
//! let header = cookie.to_header_value();
//! assert!(header.starts_with("token=eyJhbGciOi..."));
//! assert!(header.contains("HttpOnly"));
//! assert!(header.contains("Secure"));
//! assert!(header.contains("SameSite=Lax"));
//! assert!(header.contains("Max-Age=1800"));
//!
//! // 登出
//! let cleared = SessionCookie::clearing("token").to_header_value();
//! assert!(cleared.contains("Max-Age=0"));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 清除 cookie 时使用的过期时间
const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// SameSite Cookie 属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    /// 严格模式：Cookie 只在同站请求时发送
    Strict,
    /// 宽松模式：允许顶级导航的跨站请求（点击邮件中的链接属于此类）
    #[default]
    Lax,
    /// 无限制：所有请求都发送 Cookie（需要 Secure 属性）
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// 会话 Cookie
///
/// 默认 `HttpOnly`、`Secure`、`SameSite=Lax`、`Path=/`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie 名称
    pub name: String,
    /// Cookie 值
    pub value: String,
    /// HttpOnly 属性
    pub http_only: bool,
    /// Secure 属性
    pub secure: bool,
    /// SameSite 属性
    pub same_site: SameSite,
    /// Max-Age 属性
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,
    /// Path 属性
    pub path: String,
    /// Domain 属性
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    cleared: bool,
}

impl SessionCookie {
    /// 创建会话 Cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            max_age: None,
            path: "/".to_string(),
            domain: None,
            cleared: false,
        }
    }

    /// 创建清除 Cookie（空值，`Max-Age=0`）
    pub fn clearing(name: impl Into<String>) -> Self {
        let mut cookie = Self::new(name, "").max_age(Duration::ZERO);
        cookie.cleared = true;
        cookie
    }

    /// 设置 HttpOnly 属性
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// 设置 Secure 属性
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// 设置 SameSite 属性
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// 设置 Max-Age 属性
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// 设置 Path 属性
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// 设置 Domain 属性
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// 是否为清除 Cookie
    pub fn is_clearing(&self) -> bool {
        self.cleared
    }

    /// 生成 Set-Cookie 头值
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];

        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        if self.secure {
            parts.push("Secure".to_string());
        }

        parts.push(format!("SameSite={}", self.same_site));

        if let Some(ref max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age.as_secs()));
        }

        if self.cleared {
            parts.push(format!("Expires={}", EPOCH_EXPIRES));
        }

        parts.push(format!("Path={}", self.path));

        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain={}", domain));
        }

        parts.join("; ")
    }
}

impl std::fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_defaults() {
        let cookie = SessionCookie::new("token", "abc123");

        assert!(cookie.http_only);
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSite::Lax);
        assert_eq!(cookie.path, "/");
        assert!(!cookie.is_clearing());
    }

    #[test]
    fn test_to_header_value() {
        let header = SessionCookie::new("token", "abc123")
            .max_age(Duration::from_secs(1800))
            .to_header_value();

        assert_eq!(
            header,
            "token=abc123; HttpOnly; Secure; SameSite=Lax; Max-Age=1800; Path=/"
        );
    }

    #[test]
    fn test_insecure_for_local_development() {
        let header = SessionCookie::new("token", "abc123")
            .secure(false)
            .to_header_value();

        assert!(header.contains("HttpOnly"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_clearing_cookie() {
        let cookie = SessionCookie::clearing("token").domain("example.com");
        let header = cookie.to_string();

        assert!(cookie.is_clearing());
        assert!(header.starts_with("token=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(header.contains("Domain=example.com"));
    }

    #[test]
    fn test_same_site_display() {
        assert_eq!(format!("{}", SameSite::Strict), "Strict");
        assert_eq!(format!("{}", SameSite::Lax), "Lax");
        assert_eq!(format!("{}", SameSite::None), "None");
    }
}
