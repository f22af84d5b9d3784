//! Mailgun 通知通道

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::Notifier;
use crate::error::{Error, Result};

/// Mailgun API 地址（美国区）
pub const MAILGUN_API_BASE: &str = "https://api.mailgun.net/v3";

/// Mailgun 配置
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// API key
    pub api_key: SecretString,

    /// 发信域名
    pub domain: String,

    /// 发件人，默认 `Passwordless <postmaster@{domain}>`
    pub from: Option<String>,

    /// API 地址
    pub api_base: String,
}

impl MailgunConfig {
    /// 创建配置
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            domain: domain.into(),
            from: None,
            api_base: MAILGUN_API_BASE.to_string(),
        }
    }

    /// 设置发件人
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// 设置 API 地址（如欧洲区 `https://api.eu.mailgun.net/v3`）
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// 实际使用的发件人
    pub fn sender(&self) -> String {
        self.from
            .clone()
            .unwrap_or_else(|| format!("Passwordless <postmaster@{}>", self.domain))
    }

    /// 消息接口地址
    pub fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_base, self.domain)
    }
}

/// 通过 Mailgun HTTP API 发送邮件
///
/// 任何非 2xx 响应都视为投递失败。
#[derive(Debug, Clone)]
pub struct MailgunNotifier {
    client: Client,
    config: MailgunConfig,
}

impl MailgunNotifier {
    /// 创建通知器
    pub fn new(config: MailgunConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// 使用已有的 HTTP 客户端创建
    pub fn with_client(client: Client, config: MailgunConfig) -> Self {
        Self { client, config }
    }

    /// 获取配置
    pub fn config(&self) -> &MailgunConfig {
        &self.config
    }
}

#[async_trait]
impl Notifier for MailgunNotifier {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let sender = self.config.sender();
        let form = [
            ("from", sender.as_str()),
            ("to", to),
            ("subject", subject),
            ("text", body),
        ];

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth("api", Some(self.config.api_key.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, to, "mailgun request failed");
                Error::delivery(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, to, "mailgun rejected message");
            return Err(Error::delivery(format!("mailgun responded with {}", status)));
        }

        tracing::debug!(to, subject, "mail delivered");
        Ok(())
    }
}
