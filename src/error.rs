//! 统一错误类型模块
//!
//! 提供 sesame 库中所有操作的错误类型定义。
//!
//! 凭证相关的错误（`InvalidCredential`、`Unauthorized`）刻意不携带细节，
//! 调用方无法据此区分“从未请求过”与“输入错误”，也无法区分签名错误与过期。

use thiserror::Error;

/// sesame 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// sesame 库的错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// 请求登录时邮箱不存在
    #[error("no user with that email")]
    NotFound,

    /// 一次性验证码或魔法链接 secret 无效（错误、过期或已被使用）
    #[error("invalid email or code")]
    InvalidCredential,

    /// 会话 token 缺失、无效或过期，或用户已不存在/被禁用
    #[error("could not validate credentials")]
    Unauthorized,

    /// 账户已被禁用
    #[error("account disabled")]
    AccountDisabled,

    /// 邮箱格式无效
    #[error("invalid email format: {0}")]
    InvalidEmail(String),

    /// 注册时邮箱已存在
    #[error("a user with that email already exists")]
    UserExists,

    /// 通知通道投递失败
    #[error("could not send email: {0}")]
    DeliveryFailure(String),

    /// 配置错误（致命，只在启动阶段出现）
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 存储错误
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 哈希错误
    #[error("secret hash error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    /// Token 编码错误
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// 加密错误
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// 内部错误
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 创建一个内部错误
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// 创建一个投递失败错误
    pub fn delivery(msg: impl Into<String>) -> Self {
        Error::DeliveryFailure(msg.into())
    }

    /// 是否为致命错误（进程应拒绝启动）
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// 对应的 HTTP 状态码，供传输层使用
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound | Error::InvalidEmail(_) | Error::UserExists => 400,
            Error::InvalidCredential | Error::Unauthorized => 401,
            Error::AccountDisabled => 403,
            Error::DeliveryFailure(_) => 502,
            Error::Config(_)
            | Error::Storage(_)
            | Error::PasswordHash(_)
            | Error::Token(_)
            | Error::Crypto(_)
            | Error::Internal(_) => 500,
        }
    }
}

/// 哈希相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// 哈希生成失败
    #[error("hash generation failed: {0}")]
    HashFailed(String),
    /// 无效的哈希格式
    #[error("invalid hash format: {0}")]
    InvalidFormat(String),
}

/// Token 相关错误
///
/// 只用于签发阶段；校验失败一律折叠为 [`Error::Unauthorized`]。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token 编码失败
    #[error("token encoding failed: {0}")]
    EncodingFailed(String),
    /// 无效的 claim 值
    #[error("invalid claim value: {0}")]
    InvalidClaim(String),
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 缺少必需的配置
    #[error("missing required configuration: {0}")]
    MissingRequired(String),
    /// 使用了占位符值
    #[error("configuration '{0}' still holds a placeholder value, generate a real one")]
    Placeholder(String),
    /// 无效的配置值
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// 存储相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// 连接失败
    #[error("storage connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作失败
    #[error("storage operation failed: {0}")]
    OperationFailed(String),
}

/// 加密相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// 随机数生成失败
    #[error("random number generation failed: {0}")]
    RngFailed(String),
}
