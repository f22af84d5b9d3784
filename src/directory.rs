//! 用户目录模块
//!
//! 认证核心只读用户记录：按邮箱查找，检查是否被禁用。
//! 用户的创建和管理属于外部系统，实现 [`UserDirectory`] 即可接入。
//!
//! ## 示例
//!
//! ```rust
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use sesame::directory::{InMemoryUserDirectory, UserDirectory, UserRecord};
//!
//! let directory = InMemoryUserDirectory::new();
//! directory.insert(UserRecord::new("alice@example.com").unwrap().with_full_name("Alice"));
//!
//! let user = directory.find_user_by_email("alice@example.com").await.unwrap();
//! assert_eq!(user.unwrap().full_name.as_deref(), Some("Alice"));
//! # });
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// 规范化邮箱：去掉两端空白并转为小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 检查邮箱格式
pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// 规范化并校验邮箱
///
/// # Errors
///
/// 格式无效时返回 [`Error::InvalidEmail`]
pub fn validate_email(email: &str) -> Result<String> {
    let normalized = normalize_email(email);
    if is_valid_email(&normalized) {
        Ok(normalized)
    } else {
        Err(Error::InvalidEmail(email.to_string()))
    }
}

// ============================================================================
// 用户记录
// ============================================================================

/// 用户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 邮箱（唯一标识）
    pub email: String,

    /// 全名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// 是否被禁用
    #[serde(default)]
    pub disabled: bool,
}

impl UserRecord {
    /// 创建用户记录，邮箱会被规范化
    pub fn new(email: &str) -> Result<Self> {
        Ok(Self {
            email: validate_email(email)?,
            full_name: None,
            disabled: false,
        })
    }

    /// 设置全名
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// 设置禁用状态
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// 是否可以登录
    pub fn is_active(&self) -> bool {
        !self.disabled
    }
}

// ============================================================================
// 目录接口
// ============================================================================

/// 用户目录接口
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 按邮箱查找用户，不存在时返回 `None`
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
}

#[async_trait]
impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        (**self).find_user_by_email(email).await
    }
}

/// 内存用户目录
///
/// 用于开发和测试。克隆后共享同一份数据。
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl InMemoryUserDirectory {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册新用户
    ///
    /// # Errors
    ///
    /// 邮箱已存在时返回 [`Error::UserExists`]
    pub fn register(&self, user: UserRecord) -> Result<UserRecord> {
        let mut users = self.users.write();
        if users.contains_key(&user.email) {
            return Err(Error::UserExists);
        }
        users.insert(user.email.clone(), user.clone());
        tracing::info!(email = %user.email, "registered user");
        Ok(user)
    }

    /// 插入或替换用户
    pub fn insert(&self, user: UserRecord) {
        self.users.write().insert(user.email.clone(), user);
    }

    /// 删除用户，返回被删除的记录
    pub fn remove(&self, email: &str) -> Option<UserRecord> {
        self.users.write().remove(&normalize_email(email))
    }

    /// 设置禁用状态，用户不存在时返回 `false`
    pub fn set_disabled(&self, email: &str, disabled: bool) -> bool {
        match self.users.write().get_mut(&normalize_email(email)) {
            Some(user) => {
                user.disabled = disabled;
                true
            }
            None => false,
        }
    }

    /// 用户数量
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(&normalize_email(email)).cloned())
    }
}
