//! 通知通道模块
//!
//! 把一次性验证码或登录链接投递到用户邮箱。核心只依赖 [`Notifier`] trait，
//! 投递失败以 [`Error::DeliveryFailure`](crate::Error::DeliveryFailure) 返回。
//!
//! ## Features
//!
//! - `mailgun` - 启用基于 Mailgun HTTP API 的 [`MailgunNotifier`]（默认启用）

#[cfg(feature = "mailgun")]
mod mailgun;

#[cfg(feature = "mailgun")]
pub use mailgun::{MAILGUN_API_BASE, MailgunConfig, MailgunNotifier};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// 通知通道接口
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 向 `to` 发送一封邮件
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        (**self).deliver(to, subject, body).await
    }
}

/// 待投递的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// 主题
    pub subject: String,
    /// 正文
    pub body: String,
}

impl Message {
    /// 验证码邮件
    pub fn one_time_code(code: &str) -> Self {
        Self {
            subject: "Your One Time Password".to_string(),
            body: format!("Your password is {}", code),
        }
    }

    /// 登录链接邮件
    pub fn magic_link(url: &str) -> Self {
        Self {
            subject: "Your magic sign in link".to_string(),
            body: format!("Click this link to sign in\n{}", url),
        }
    }

    /// 通过通知通道发送
    pub async fn send<N: Notifier + ?Sized>(&self, notifier: &N, to: &str) -> Result<()> {
        notifier.deliver(to, &self.subject, &self.body).await
    }
}
