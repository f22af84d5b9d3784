//! 认证编排模块
//!
//! [`AuthService`] 把用户目录、一次性 secret、通知通道和会话 token 串成两条
//! 登录流程，二者最终都签发会话：
//!
//! - **验证码流程**：`request_login` → 邮件收到验证码 → `confirm_login`
//! - **链接流程**：`request_magic_link` → 邮件收到链接 → `confirm_magic_link`
//!
//! 之后的请求通过 [`AuthService::resolve_current_user`] 从 cookie 中解析当前用户。
//!
//! ## 示例
//!
//! ```rust,no_run
//! # async fn run() -> sesame::Result<()> {
//! use sesame::config::AuthConfig;
//! use sesame::directory::{InMemoryUserDirectory, UserRecord};
//! use sesame::security::CookieJar;
//! use sesame::service::AuthService;
//!
//! let config = AuthConfig::from_env()?;
//! let directory = InMemoryUserDirectory::new();
//! directory.insert(UserRecord::new("user@example.com")?);
//!
//! let notifier = config.mailgun_notifier()?;
//! let auth = AuthService::new(config, directory, notifier)?;
//!
//! auth.request_login("user@example.com").await?;
//! let session = auth.confirm_login("user@example.com", "code-from-mail").await?;
//!
//! let jar = CookieJar::new().with_cookie("token", session.token.token.clone());
//! let user = auth.resolve_current_user(&jar).await?;
//! # Ok(())
//! # }
//! ```

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::directory::{UserDirectory, UserRecord, normalize_email, validate_email};
use crate::error::{Error, Result};
use crate::notify::{Message, Notifier};
use crate::passwordless::{MagicLinkService, OtpService};
use crate::security::{CookieCredentialScheme, CredentialCarrier, SessionCookie};
use crate::store::{InMemorySecretStore, SecretStore};
use crate::token::{SessionToken, SessionTokenService};

// ============================================================================
// 数据结构
// ============================================================================

/// 未知邮箱与禁用账户的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationPolicy {
    /// 未知邮箱返回 [`Error::NotFound`]，禁用账户返回 [`Error::AccountDisabled`]
    #[default]
    Reveal,
    /// 未知邮箱和禁用账户都返回与成功相同的确认，但不生成也不发送任何 secret
    Mask,
}

/// 登录流程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFlow {
    /// 一次性验证码
    Code,
    /// 魔法链接
    Link,
}

impl std::fmt::Display for LoginFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginFlow::Code => write!(f, "code"),
            LoginFlow::Link => write!(f, "link"),
        }
    }
}

/// 登录请求已受理
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequested {
    /// 规范化后的邮箱
    pub email: String,

    /// 登录流程
    pub flow: LoginFlow,
}

impl LoginRequested {
    fn new(email: impl Into<String>, flow: LoginFlow) -> Self {
        Self {
            email: email.into(),
            flow,
        }
    }

    /// 返回给用户的提示
    pub fn message(&self) -> &'static str {
        match self.flow {
            LoginFlow::Code => "Please check your email for a single use password.",
            LoginFlow::Link => "Please check your email for your sign in link.",
        }
    }
}

/// 已签发的会话
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// 会话 token
    pub token: SessionToken,

    /// 登录的用户
    pub user: UserRecord,

    /// 使用的登录流程
    pub flow: LoginFlow,

    /// 承载 token 的 cookie
    pub cookie: SessionCookie,
}

impl IssuedSession {
    /// `Set-Cookie` 头的值
    pub fn set_cookie(&self) -> String {
        self.cookie.to_header_value()
    }
}

// ============================================================================
// 编排服务
// ============================================================================

/// 认证编排服务
///
/// `Send + Sync`，通过 `Arc` 在请求之间共享。
pub struct AuthService<U, N, S: SecretStore = InMemorySecretStore> {
    config: AuthConfig,
    directory: U,
    notifier: N,
    otp: OtpService<S>,
    magic_links: MagicLinkService<S>,
    tokens: SessionTokenService,
    scheme: CookieCredentialScheme,
    enumeration: EnumerationPolicy,
}

impl<U, N> AuthService<U, N, InMemorySecretStore>
where
    U: UserDirectory,
    N: Notifier,
{
    /// 使用内存 secret 存储创建服务
    ///
    /// # Errors
    ///
    /// 配置无效时返回致命的 [`Error::Config`]
    pub fn new(config: AuthConfig, directory: U, notifier: N) -> Result<Self> {
        Self::with_store(InMemorySecretStore::new(), config, directory, notifier)
    }
}

impl<U, N, S> AuthService<U, N, S>
where
    U: UserDirectory,
    N: Notifier,
    S: SecretStore + Clone,
{
    /// 使用自定义 secret 存储创建服务
    ///
    /// 验证码和魔法链接共用同一个存储，靠命名空间隔离。
    pub fn with_store(store: S, config: AuthConfig, directory: U, notifier: N) -> Result<Self> {
        config.validate()?;

        let tokens = SessionTokenService::new(
            config.secret_key.expose_secret().as_bytes(),
            config.session_ttl,
        )?;
        let otp = OtpService::with_store(store.clone(), config.otp_config())
            .with_hasher(config.hasher());
        let magic_links = MagicLinkService::with_store(store, config.magic_link_config())
            .with_hasher(config.hasher());
        let scheme = config.credential_scheme();

        Ok(Self {
            config,
            directory,
            notifier,
            otp,
            magic_links,
            tokens,
            scheme,
            enumeration: EnumerationPolicy::default(),
        })
    }
}

impl<U, N, S> AuthService<U, N, S>
where
    U: UserDirectory,
    N: Notifier,
    S: SecretStore,
{
    /// 设置未知邮箱的处理策略
    pub fn with_enumeration_policy(mut self, policy: EnumerationPolicy) -> Self {
        self.enumeration = policy;
        self
    }

    // ------------------------------------------------------------------------
    // 验证码流程
    // ------------------------------------------------------------------------

    /// 请求验证码
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEmail`]：邮箱格式无效
    /// - [`Error::NotFound`]：邮箱不存在（`Reveal` 策略）
    /// - [`Error::AccountDisabled`]：账户已被禁用（`Reveal` 策略）
    /// - [`Error::DeliveryFailure`]：邮件发送失败
    pub async fn request_login(&self, email: &str) -> Result<LoginRequested> {
        let email = validate_email(email)?;
        let Some(user) = self.login_candidate(&email, LoginFlow::Code).await? else {
            return Ok(LoginRequested::new(email, LoginFlow::Code));
        };

        let otp = self.otp.generate(user.email.as_str()).await?;
        self.deliver(&user.email, Message::one_time_code(&otp.code))
            .await?;

        Ok(LoginRequested::new(user.email, LoginFlow::Code))
    }

    /// 提交验证码，成功后签发会话
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCredential`]：验证码错误、过期或已被使用
    /// - [`Error::AccountDisabled`]：账户在请求后被禁用
    pub async fn confirm_login(&self, email: &str, code: &str) -> Result<IssuedSession> {
        let email = normalize_email(email);
        if !self.otp.verify(&email, code).await? {
            tracing::debug!(email = %email, flow = %LoginFlow::Code, "login confirmation rejected");
            return Err(Error::InvalidCredential);
        }
        self.finish_login(&email, LoginFlow::Code).await
    }

    // ------------------------------------------------------------------------
    // 链接流程
    // ------------------------------------------------------------------------

    /// 请求魔法链接
    ///
    /// 错误与 [`request_login`](Self::request_login) 相同。
    pub async fn request_magic_link(&self, email: &str) -> Result<LoginRequested> {
        let email = validate_email(email)?;
        let Some(user) = self.login_candidate(&email, LoginFlow::Link).await? else {
            return Ok(LoginRequested::new(email, LoginFlow::Link));
        };

        let link = self.magic_links.generate(user.email.as_str()).await?;
        self.deliver(&user.email, Message::magic_link(&link.url))
            .await?;

        Ok(LoginRequested::new(user.email, LoginFlow::Link))
    }

    /// 提交链接中的 secret，成功后签发会话
    ///
    /// 错误与 [`confirm_login`](Self::confirm_login) 相同。
    pub async fn confirm_magic_link(&self, email: &str, secret: &str) -> Result<IssuedSession> {
        let email = normalize_email(email);
        if !self.magic_links.verify(&email, secret).await? {
            tracing::debug!(email = %email, flow = %LoginFlow::Link, "login confirmation rejected");
            return Err(Error::InvalidCredential);
        }
        self.finish_login(&email, LoginFlow::Link).await
    }

    // ------------------------------------------------------------------------
    // 会话
    // ------------------------------------------------------------------------

    /// 解析请求对应的当前用户
    ///
    /// token 缺失、无效、过期，或用户已被删除、禁用，都返回 [`Error::Unauthorized`]。
    pub async fn resolve_current_user<C>(&self, request: &C) -> Result<UserRecord>
    where
        C: CredentialCarrier + ?Sized,
    {
        let token = self.scheme.extract(request)?;
        let subject = self.tokens.validate(token)?;

        match self.directory.find_user_by_email(&subject).await? {
            Some(user) if user.is_active() => Ok(user),
            Some(_) => {
                tracing::debug!(subject = %subject, "session belongs to a disabled account");
                Err(Error::Unauthorized)
            }
            None => {
                tracing::debug!(subject = %subject, "session subject no longer exists");
                Err(Error::Unauthorized)
            }
        }
    }

    /// 登出用的清除 cookie
    pub fn sign_out_cookie(&self) -> SessionCookie {
        self.config.clearing_cookie()
    }

    // ------------------------------------------------------------------------
    // 访问器
    // ------------------------------------------------------------------------

    /// 获取配置
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// 获取会话 Token 服务
    pub fn tokens(&self) -> &SessionTokenService {
        &self.tokens
    }

    /// 获取验证码服务
    pub fn otp(&self) -> &OtpService<S> {
        &self.otp
    }

    /// 获取魔法链接服务
    pub fn magic_links(&self) -> &MagicLinkService<S> {
        &self.magic_links
    }

    /// 获取用户目录
    pub fn directory(&self) -> &U {
        &self.directory
    }

    /// 获取通知通道
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// 未知邮箱的处理策略
    pub fn enumeration_policy(&self) -> EnumerationPolicy {
        self.enumeration
    }

    // ------------------------------------------------------------------------
    // 内部
    // ------------------------------------------------------------------------

    /// 查找可以登录的用户
    ///
    /// `Mask` 策略下未知邮箱和禁用账户都返回 `Ok(None)`。
    async fn login_candidate(&self, email: &str, flow: LoginFlow) -> Result<Option<UserRecord>> {
        match self.directory.find_user_by_email(email).await? {
            Some(user) if user.disabled => {
                tracing::warn!(email, %flow, "login requested for disabled account");
                match self.enumeration {
                    EnumerationPolicy::Reveal => Err(Error::AccountDisabled),
                    EnumerationPolicy::Mask => Ok(None),
                }
            }
            Some(user) => Ok(Some(user)),
            None => {
                tracing::debug!(email, %flow, "login requested for unknown email");
                match self.enumeration {
                    EnumerationPolicy::Reveal => Err(Error::NotFound),
                    EnumerationPolicy::Mask => Ok(None),
                }
            }
        }
    }

    async fn deliver(&self, to: &str, message: Message) -> Result<()> {
        message.send(&self.notifier, to).await.map_err(|e| {
            tracing::warn!(to, error = %e, "could not deliver login message");
            match e {
                Error::DeliveryFailure(_) => e,
                other => Error::delivery(other.to_string()),
            }
        })
    }

    async fn finish_login(&self, email: &str, flow: LoginFlow) -> Result<IssuedSession> {
        let user = match self.directory.find_user_by_email(email).await? {
            Some(user) if user.disabled => {
                tracing::warn!(email, %flow, "login confirmed for disabled account");
                return Err(Error::AccountDisabled);
            }
            Some(user) => user,
            None => {
                tracing::debug!(email, %flow, "confirmed email no longer exists");
                return Err(Error::InvalidCredential);
            }
        };

        let token = self.tokens.issue_default(&user.email)?;
        let cookie = self
            .config
            .session_cookie(token.token.clone(), self.tokens.default_ttl());

        tracing::info!(email = %user.email, %flow, "session issued");

        Ok(IssuedSession {
            token,
            user,
            flow,
            cookie,
        })
    }
}
