//! 凭证提取模块
//!
//! 从入站请求中取出会话 token。请求只需要实现 [`CredentialCarrier`]：
//! 能按名字返回一个不透明字符串即可。缺失或为空的凭证一律视为未认证。
//!
//! ## 示例
//!
//! ```rust
//! use sesame::security::credential::{CookieCredentialScheme, CookieJar};
//!
//! let jar = CookieJar::parse("theme=dark; token=eyJhbGciOi...");
//! let scheme = CookieCredentialScheme::default();
//!
//! assert_eq!(scheme.extract(&jar).unwrap(), "eyJhbGciOi...");
//! assert!(scheme.extract(&CookieJar::parse("theme=dark")).is_err());
//! ```

use std::collections::HashMap;

use crate::error::{Error, Result};

/// 默认凭证名称
pub const DEFAULT_CREDENTIAL_NAME: &str = "token";

// ============================================================================
// 凭证载体
// ============================================================================

/// 能携带命名凭证的请求
pub trait CredentialCarrier {
    /// 按名字读取凭证
    fn credential(&self, name: &str) -> Option<&str>;
}

impl CredentialCarrier for HashMap<String, String> {
    fn credential(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<T: CredentialCarrier + ?Sized> CredentialCarrier for &T {
    fn credential(&self, name: &str) -> Option<&str> {
        (**self).credential(name)
    }
}

/// 解析后的 `Cookie` 请求头
///
/// 同名 cookie 出现多次时取第一个。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// 创建空的 cookie 集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 `Cookie` 头的值（`a=1; b=2`）
    ///
    /// 没有 `=` 的片段被忽略；值两端的双引号会被去掉。
    pub fn parse(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Self { cookies }
    }

    /// 添加一个 cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// 读取 cookie 值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// cookie 数量
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl CredentialCarrier for CookieJar {
    fn credential(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

// ============================================================================
// 提取方案
// ============================================================================

/// 基于 cookie 的凭证提取方案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieCredentialScheme {
    name: String,
}

impl Default for CookieCredentialScheme {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIAL_NAME)
    }
}

impl CookieCredentialScheme {
    /// 使用指定的凭证名称创建
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// 凭证名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 取出 token，缺失或为空时返回 [`Error::Unauthorized`]
    pub fn extract<'a, C>(&self, request: &'a C) -> Result<&'a str>
    where
        C: CredentialCarrier + ?Sized,
    {
        match request.credential(&self.name) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => {
                tracing::debug!(credential = %self.name, "no credential on request");
                Err(Error::Unauthorized)
            }
        }
    }
}
