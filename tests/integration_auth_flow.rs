//! 集成测试：完整的认证流程
//!
//! 从请求登录到解析当前用户，覆盖验证码与魔法链接两条流程。

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{ALICE, BOB, FailingNotifier, fixture, fixture_with, test_config};
use sesame::security::CookieJar;
use sesame::{AuthService, EnumerationPolicy, Error, InMemorySecretStore, LoginFlow};

// ============================================================================
// 验证码流程
// ============================================================================

/// 请求验证码 → 收到邮件 → 确认 → 用 cookie 解析用户
#[tokio::test]
async fn test_code_flow_end_to_end() {
    let fx = fixture();

    let requested = fx.auth.request_login(ALICE).await.unwrap();
    assert_eq!(requested.flow, LoginFlow::Code);
    assert_eq!(
        requested.message(),
        "Please check your email for a single use password."
    );

    let mail = fx.outbox.last().unwrap();
    assert_eq!(mail.to, ALICE);
    assert_eq!(mail.subject, "Your One Time Password");

    let code = fx.outbox.last_code();
    assert_eq!(code.len(), 8);

    let session = fx.auth.confirm_login(ALICE, &code).await.unwrap();
    assert_eq!(session.user.email, ALICE);
    assert_eq!(session.flow, LoginFlow::Code);

    let set_cookie = session.set_cookie();
    assert!(set_cookie.starts_with(&format!("token={}", session.token.token)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("Max-Age=1800"));

    // 浏览器回传 cookie
    let jar = CookieJar::parse(&format!("theme=dark; token={}", session.token.token));
    let user = fx.auth.resolve_current_user(&jar).await.unwrap();
    assert_eq!(user.email, ALICE);
    assert_eq!(user.full_name.as_deref(), Some("Alice"));
}

/// 验证码只能确认一次
#[tokio::test]
async fn test_code_cannot_be_replayed() {
    let fx = fixture();
    fx.auth.request_login(ALICE).await.unwrap();
    let code = fx.outbox.last_code();

    assert!(fx.auth.confirm_login(ALICE, &code).await.is_ok());
    assert!(matches!(
        fx.auth.confirm_login(ALICE, &code).await,
        Err(Error::InvalidCredential)
    ));
}

/// 错误验证码不会锁定流程
#[tokio::test]
async fn test_wrong_code_leaves_flow_idle() {
    let fx = fixture();
    fx.auth.request_login(ALICE).await.unwrap();
    let code = fx.outbox.last_code();

    for _ in 0..3 {
        let err = fx.auth.confirm_login(ALICE, "00000000").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));
        assert_eq!(err.status_code(), 401);
    }

    assert!(fx.auth.confirm_login(ALICE, &code).await.is_ok());
}

/// 验证码绑定邮箱
#[tokio::test]
async fn test_code_bound_to_email() {
    let fx = fixture();
    fx.auth.request_login(ALICE).await.unwrap();
    let code = fx.outbox.last_code();

    assert!(matches!(
        fx.auth.confirm_login(BOB, &code).await,
        Err(Error::InvalidCredential)
    ));
}

// ============================================================================
// 链接流程
// ============================================================================

/// 请求链接 → 点击 → 确认
#[tokio::test]
async fn test_magic_link_flow_end_to_end() {
    let fx = fixture();

    let requested = fx.auth.request_magic_link(BOB).await.unwrap();
    assert_eq!(requested.flow, LoginFlow::Link);
    assert_eq!(
        requested.message(),
        "Please check your email for your sign in link."
    );

    let mail = fx.outbox.last().unwrap();
    assert_eq!(mail.subject, "Your magic sign in link");
    assert!(
        mail.body
            .starts_with("Click this link to sign in\nhttps://app.example.com/magic?secret=")
    );

    let secret = fx.outbox.last_link_secret();

    // 错误的 secret 不会消耗链接
    assert!(matches!(
        fx.auth.confirm_magic_link(BOB, "wrong").await,
        Err(Error::InvalidCredential)
    ));

    let session = fx.auth.confirm_magic_link(BOB, &secret).await.unwrap();
    assert_eq!(session.flow, LoginFlow::Link);

    let mut request = HashMap::new();
    request.insert("token".to_string(), session.token.token.clone());
    assert_eq!(fx.auth.resolve_current_user(&request).await.unwrap().email, BOB);

    // 链接不能再次使用
    assert!(matches!(
        fx.auth.confirm_magic_link(BOB, &secret).await,
        Err(Error::InvalidCredential)
    ));
}

/// 同时请求验证码和链接，两者都可用
#[tokio::test]
async fn test_code_and_link_coexist() {
    let fx = fixture();

    fx.auth.request_login(ALICE).await.unwrap();
    let code = fx.outbox.last_code();
    fx.auth.request_magic_link(ALICE).await.unwrap();
    let secret = fx.outbox.last_link_secret();

    assert!(fx.auth.confirm_login(ALICE, &code).await.is_ok());
    assert!(fx.auth.confirm_magic_link(ALICE, &secret).await.is_ok());
}

// ============================================================================
// 用户状态
// ============================================================================

/// 未知邮箱：默认返回 NotFound，且不写入任何 secret
#[tokio::test]
async fn test_unknown_email_rejected_before_generation() {
    let store = InMemorySecretStore::new();
    let outbox = Arc::new(common::RecordingNotifier::default());
    let auth = AuthService::with_store(
        store.clone(),
        test_config(),
        common::directory(),
        outbox.clone(),
    )
    .unwrap();

    let err = auth.request_login("nobody@example.com").await.unwrap_err();
    assert!(matches!(err, Error::NotFound));
    assert_eq!(err.to_string(), "no user with that email");
    assert_eq!(err.status_code(), 400);

    assert!(store.is_empty());
    assert!(outbox.sent().is_empty());
}

/// Mask 策略：未知邮箱与已知邮箱返回相同确认
#[tokio::test]
async fn test_masked_enumeration() {
    let fx = fixture();
    let auth = fx.auth.with_enumeration_policy(EnumerationPolicy::Mask);

    let unknown = auth.request_login("nobody@example.com").await.unwrap();
    let known = auth.request_login(ALICE).await.unwrap();

    assert_eq!(unknown.message(), known.message());
    assert_eq!(fx.outbox.sent().len(), 1);
}

/// Mask 策略：禁用账户与未知邮箱无法区分
#[tokio::test]
async fn test_masked_enumeration_hides_disabled_accounts() {
    let fx = fixture();
    let auth = fx.auth.with_enumeration_policy(EnumerationPolicy::Mask);
    fx.directory.set_disabled(ALICE, true);

    let disabled = auth.request_magic_link(ALICE).await.unwrap();
    let unknown = auth.request_magic_link("nobody@example.com").await.unwrap();

    assert_eq!(disabled.message(), unknown.message());
    assert!(fx.outbox.sent().is_empty());
}

/// 被删除的用户持有的 token 失效
#[tokio::test]
async fn test_deleted_user_rejected_at_resolve() {
    let fx = fixture();
    fx.auth.request_login(ALICE).await.unwrap();
    let session = fx
        .auth
        .confirm_login(ALICE, &fx.outbox.last_code())
        .await
        .unwrap();

    fx.directory.remove(ALICE);

    let jar = CookieJar::new().with_cookie("token", session.token.token);
    assert!(matches!(
        fx.auth.resolve_current_user(&jar).await,
        Err(Error::Unauthorized)
    ));
}

/// 被禁用的用户持有的 token 失效，恢复后重新有效
#[tokio::test]
async fn test_disabled_user_rejected_at_resolve() {
    let fx = fixture();
    fx.auth.request_magic_link(ALICE).await.unwrap();
    let session = fx
        .auth
        .confirm_magic_link(ALICE, &fx.outbox.last_link_secret())
        .await
        .unwrap();
    let jar = CookieJar::new().with_cookie("token", session.token.token);

    fx.directory.set_disabled(ALICE, true);
    assert!(matches!(
        fx.auth.resolve_current_user(&jar).await,
        Err(Error::Unauthorized)
    ));

    fx.directory.set_disabled(ALICE, false);
    assert!(fx.auth.resolve_current_user(&jar).await.is_ok());
}

/// 请求后被禁用的账户无法完成登录
#[tokio::test]
async fn test_disabled_between_request_and_confirm() {
    let fx = fixture();
    fx.auth.request_login(ALICE).await.unwrap();
    let code = fx.outbox.last_code();

    fx.directory.set_disabled(ALICE, true);

    let err = fx.auth.confirm_login(ALICE, &code).await.unwrap_err();
    assert!(matches!(err, Error::AccountDisabled));
    assert_eq!(err.status_code(), 403);
}

// ============================================================================
// 会话
// ============================================================================

/// 会话过期后无法解析用户
#[tokio::test]
async fn test_session_expiry() {
    let fx = fixture_with(test_config().with_session_ttl(Duration::from_secs(1)));
    fx.auth.request_login(ALICE).await.unwrap();
    let session = fx
        .auth
        .confirm_login(ALICE, &fx.outbox.last_code())
        .await
        .unwrap();
    let jar = CookieJar::new().with_cookie("token", session.token.token);

    assert!(fx.auth.resolve_current_user(&jar).await.is_ok());

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(matches!(
        fx.auth.resolve_current_user(&jar).await,
        Err(Error::Unauthorized)
    ));
}

/// 缺少或为空的 cookie 一律拒绝
#[tokio::test]
async fn test_missing_credential() {
    let fx = fixture();

    for jar in [
        CookieJar::new(),
        CookieJar::parse("token="),
        CookieJar::parse("other=value"),
        CookieJar::parse("token=not-a-jwt"),
    ] {
        assert!(matches!(
            fx.auth.resolve_current_user(&jar).await,
            Err(Error::Unauthorized)
        ));
    }
}

/// 调试模式下 cookie 不带 Secure，登出 cookie 立即过期
#[tokio::test]
async fn test_debug_cookie_and_sign_out() {
    let fx = fixture_with(test_config().with_debug(true).with_cookie_name("session"));
    fx.auth.request_login(ALICE).await.unwrap();
    let session = fx
        .auth
        .confirm_login(ALICE, &fx.outbox.last_code())
        .await
        .unwrap();

    let set_cookie = session.set_cookie();
    assert!(set_cookie.starts_with("session="));
    assert!(!set_cookie.contains("Secure"));

    let jar = CookieJar::new().with_cookie("session", session.token.token.clone());
    assert!(fx.auth.resolve_current_user(&jar).await.is_ok());

    let sign_out = fx.auth.sign_out_cookie().to_header_value();
    assert!(sign_out.starts_with("session=;"));
    assert!(sign_out.contains("Max-Age=0"));
}

// ============================================================================
// 投递失败
// ============================================================================

/// 邮件发送失败时返回 DeliveryFailure
#[tokio::test]
async fn test_delivery_failure() {
    let auth = AuthService::new(test_config(), common::directory(), FailingNotifier).unwrap();

    let err = auth.request_login(ALICE).await.unwrap_err();
    assert!(matches!(err, Error::DeliveryFailure(_)));
    assert_eq!(err.status_code(), 502);

    let err = auth.request_magic_link(ALICE).await.unwrap_err();
    assert!(matches!(err, Error::DeliveryFailure(_)));
}

/// 服务可以在任务之间共享
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_service_shared_across_tasks() {
    let fx = fixture();
    let auth = Arc::new(fx.auth);

    let handles: Vec<_> = [ALICE, BOB]
        .into_iter()
        .map(|email| {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move { auth.request_magic_link(email).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(fx.outbox.sent().len(), 2);
}
