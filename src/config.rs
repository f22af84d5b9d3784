//! 配置模块
//!
//! [`AuthConfig`] 汇总认证核心的全部可调参数。可以用 `with_*` 方法逐项构建，
//! 也可以从环境变量加载（先读取 `.env` 文件）。
//!
//! | 变量 | 默认值 | 含义 |
//! | --- | --- | --- |
//! | `SECRET_KEY` | 必填 | 会话 token 签名密钥 |
//! | `ACCESS_TOKEN_EXPIRE_MINUTES` | 30 | 会话有效期（分钟） |
//! | `SECRET_ENTRY_TTL_MINUTES` | 5 | 验证码与登录链接有效期（分钟） |
//! | `HOSTNAME` | `localhost` | 登录链接基础地址 |
//! | `DEBUG` | false | 开启后 cookie 不带 `Secure` |
//! | `TOKEN_COOKIE_NAME` | `token` | 会话 cookie 名称 |
//! | `BCRYPT_COST` | 12 | 哈希成本因子 |
//! | `MAILGUN_KEY` / `MAILGUN_DOMAIN` / `MAIL_FROM` | 无 | Mailgun 通知通道 |
//!
//! ## 示例
//!
//! ```rust
//! use sesame::config::AuthConfig;
//! use std::time::Duration;
//!
//! let config = AuthConfig::new("a-long-random-server-secret")
//!     .with_host("https://app.example.com/magic")
//!     .with_session_ttl(Duration::from_secs(60 * 60))
//!     .with_debug(true);
//! assert!(config.validate().is_ok());
//!
//! // 占位符密钥无法通过校验
//! assert!(AuthConfig::new("GENERATE_A_KEY").validate().is_err());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Error, Result};
use crate::hashing::{DEFAULT_BCRYPT_COST, SecretHasher};
use crate::passwordless::{MagicLinkConfig, OtpConfig};
use crate::security::{CookieCredentialScheme, DEFAULT_CREDENTIAL_NAME, SessionCookie};
use crate::token::session::{DEFAULT_SESSION_TTL, check_signing_secret};

#[cfg(feature = "mailgun")]
use crate::notify::{MailgunConfig, MailgunNotifier};

/// 默认的一次性 secret 有效期（5 分钟）
pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(5 * 60);

/// 会话有效期上限（一年）
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// 默认的登录链接基础地址
pub const DEFAULT_HOST: &str = "localhost";

/// 认证核心配置
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// 会话 token 签名密钥
    pub secret_key: SecretString,

    /// 会话有效期
    pub session_ttl: Duration,

    /// 验证码与登录链接有效期
    pub secret_ttl: Duration,

    /// 登录链接基础地址
    pub host: String,

    /// 调试模式
    pub debug: bool,

    /// 会话 cookie 名称
    pub cookie_name: String,

    /// bcrypt 成本因子
    pub bcrypt_cost: u32,

    /// Mailgun 通知通道
    #[cfg(feature = "mailgun")]
    pub mailgun: Option<MailgunConfig>,
}

impl AuthConfig {
    /// 使用签名密钥创建配置，其余取默认值
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::from(secret_key.into()),
            session_ttl: DEFAULT_SESSION_TTL,
            secret_ttl: DEFAULT_SECRET_TTL,
            host: DEFAULT_HOST.to_string(),
            debug: false,
            cookie_name: DEFAULT_CREDENTIAL_NAME.to_string(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            #[cfg(feature = "mailgun")]
            mailgun: None,
        }
    }

    /// 从环境变量加载
    ///
    /// 存在 `.env` 文件时先载入它，已设置的环境变量优先。
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = get("SECRET_KEY")
            .ok_or_else(|| ConfigError::MissingRequired("SECRET_KEY".to_string()))?;

        let mut config = Self::new(secret_key);

        if let Some(minutes) = get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            config.session_ttl = minutes_from("ACCESS_TOKEN_EXPIRE_MINUTES", &minutes)?;
        }
        if let Some(minutes) = get("SECRET_ENTRY_TTL_MINUTES") {
            config.secret_ttl = minutes_from("SECRET_ENTRY_TTL_MINUTES", &minutes)?;
        }
        if let Some(host) = get("HOSTNAME") {
            config.host = host;
        }
        if let Some(debug) = get("DEBUG") {
            config.debug = parse_bool("DEBUG", &debug)?;
        }
        if let Some(name) = get("TOKEN_COOKIE_NAME") {
            config.cookie_name = name;
        }
        if let Some(cost) = get("BCRYPT_COST") {
            config.bcrypt_cost = parse_number("BCRYPT_COST", &cost)?;
        }

        #[cfg(feature = "mailgun")]
        {
            config.mailgun = match (get("MAILGUN_KEY"), get("MAILGUN_DOMAIN")) {
                (Some(key), Some(domain)) => {
                    let mailgun = MailgunConfig::new(key, domain);
                    Some(match get("MAIL_FROM") {
                        Some(from) => mailgun.with_from(from),
                        None => mailgun,
                    })
                }
                (Some(_), None) => {
                    return Err(ConfigError::MissingRequired("MAILGUN_DOMAIN".to_string()).into());
                }
                (None, Some(_)) => {
                    return Err(ConfigError::MissingRequired("MAILGUN_KEY".to_string()).into());
                }
                (None, None) => None,
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// 设置会话有效期
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// 设置验证码与登录链接有效期
    pub fn with_secret_ttl(mut self, ttl: Duration) -> Self {
        self.secret_ttl = ttl;
        self
    }

    /// 设置登录链接基础地址
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// 设置调试模式
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 设置会话 cookie 名称
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// 设置 bcrypt 成本因子
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// 设置 Mailgun 通知通道
    #[cfg(feature = "mailgun")]
    pub fn with_mailgun(mut self, mailgun: MailgunConfig) -> Self {
        self.mailgun = Some(mailgun);
        self
    }

    /// 按配置创建 Mailgun 通知器
    ///
    /// # Errors
    ///
    /// 未配置 Mailgun 时返回 [`ConfigError::MissingRequired`]
    #[cfg(feature = "mailgun")]
    pub fn mailgun_notifier(&self) -> Result<MailgunNotifier> {
        self.mailgun
            .clone()
            .map(MailgunNotifier::new)
            .ok_or_else(|| ConfigError::MissingRequired("MAILGUN_KEY".to_string()).into())
    }

    /// 校验配置
    ///
    /// # Errors
    ///
    /// 密钥缺失或为占位符、有效期为零或会话有效期超过一年、cookie 名称为空、成本因子越界时返回
    /// [`Error::Config`]。
    pub fn validate(&self) -> Result<()> {
        check_signing_secret(self.secret_key.expose_secret().as_bytes())?;

        if self.session_ttl.is_zero() {
            return Err(invalid("ACCESS_TOKEN_EXPIRE_MINUTES", "must be positive"));
        }
        if self.session_ttl > MAX_SESSION_TTL {
            return Err(invalid("ACCESS_TOKEN_EXPIRE_MINUTES", "must not exceed one year"));
        }
        if self.secret_ttl.is_zero() {
            return Err(invalid("SECRET_ENTRY_TTL_MINUTES", "must be positive"));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(invalid("TOKEN_COOKIE_NAME", "must not be empty"));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", "must be between 4 and 31"));
        }
        Ok(())
    }

    /// 验证码服务配置
    pub fn otp_config(&self) -> OtpConfig {
        OtpConfig::default().with_ttl(self.secret_ttl)
    }

    /// 登录链接服务配置
    pub fn magic_link_config(&self) -> MagicLinkConfig {
        MagicLinkConfig::default()
            .with_host(self.host.clone())
            .with_ttl(self.secret_ttl)
    }

    /// secret 哈希器
    pub fn hasher(&self) -> SecretHasher {
        let hasher = SecretHasher::default();
        #[cfg(feature = "bcrypt")]
        let hasher = hasher.with_bcrypt_cost(self.bcrypt_cost);
        hasher
    }

    /// 凭证提取方案
    pub fn credential_scheme(&self) -> CookieCredentialScheme {
        CookieCredentialScheme::new(self.cookie_name.clone())
    }

    /// 承载会话 token 的 cookie
    pub fn session_cookie(&self, token: impl Into<String>, max_age: Duration) -> SessionCookie {
        SessionCookie::new(self.cookie_name.clone(), token)
            .secure(!self.debug)
            .max_age(max_age)
    }

    /// 登出时的清除 cookie
    pub fn clearing_cookie(&self) -> SessionCookie {
        SessionCookie::clearing(self.cookie_name.clone()).secure(!self.debug)
    }
}

fn invalid(key: &str, message: &str) -> Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, &format!("'{}' is not a valid number", raw)))
}

fn minutes_from(key: &str, raw: &str) -> Result<Duration> {
    let minutes: u64 = parse_number(key, raw)?;
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(key, "value too large"))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &format!("'{}' is not a boolean", raw))),
    }
}
