//! 集成测试共享工具

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use sesame::directory::{InMemoryUserDirectory, UserRecord};
use sesame::{AuthConfig, AuthService, Error, Notifier, Result};

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";

/// 一封已发送的邮件
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 记录所有邮件的通知器
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Option<SentMail> {
        self.sent.lock().last().cloned()
    }

    /// 从最近一封验证码邮件中取出验证码
    pub fn last_code(&self) -> String {
        let mail = self.last().expect("no mail sent");
        mail.body
            .strip_prefix("Your password is ")
            .expect("not a code mail")
            .to_string()
    }

    /// 从最近一封链接邮件中取出 secret
    pub fn last_link_secret(&self) -> String {
        let mail = self.last().expect("no mail sent");
        let url = mail.body.lines().nth(1).expect("not a link mail");
        url.split_once("?secret=")
            .map(|(_, secret)| secret.to_string())
            .expect("link has no secret")
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// 总是失败的通知器
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
        Err(Error::delivery("mail provider unavailable"))
    }
}

/// 测试用配置（低成本哈希）
pub fn test_config() -> AuthConfig {
    AuthConfig::new("integration-test-secret-key")
        .with_bcrypt_cost(4)
        .with_host("https://app.example.com/magic")
}

/// 带两个用户的目录
pub fn directory() -> InMemoryUserDirectory {
    let directory = InMemoryUserDirectory::new();
    directory.insert(
        UserRecord::new(ALICE)
            .expect("valid email")
            .with_full_name("Alice"),
    );
    directory.insert(UserRecord::new(BOB).expect("valid email"));
    directory
}

pub type TestService = AuthService<InMemoryUserDirectory, Arc<RecordingNotifier>>;

/// 组装好的编排服务
pub struct Fixture {
    pub auth: TestService,
    pub directory: InMemoryUserDirectory,
    pub outbox: Arc<RecordingNotifier>,
}

pub fn fixture() -> Fixture {
    fixture_with(test_config())
}

pub fn fixture_with(config: AuthConfig) -> Fixture {
    let directory = directory();
    let outbox = Arc::new(RecordingNotifier::default());
    let auth = AuthService::new(config, directory.clone(), outbox.clone())
        .expect("valid configuration");

    Fixture {
        auth,
        directory,
        outbox,
    }
}
