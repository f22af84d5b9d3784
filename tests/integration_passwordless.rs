#![cfg(feature = "bcrypt")]

//! 一次性验证码与魔法链接集成测试
//!
//! 覆盖共享存储下两个命名空间的独立性、单次使用、过期以及并发竞争。

use std::sync::Arc;
use std::time::Duration;

use sesame::passwordless::{MagicLinkConfig, MagicLinkService, OtpConfig, OtpService};
use sesame::store::{InMemorySecretStore, SecretNamespace, SecretStore};
use sesame::SecretHasher;

const EMAIL: &str = "user@example.com";

fn fast_hasher() -> SecretHasher {
    SecretHasher::default().with_bcrypt_cost(4)
}

fn services(store: InMemorySecretStore) -> (OtpService, MagicLinkService) {
    let otp = OtpService::with_store(store.clone(), OtpConfig::default()).with_hasher(fast_hasher());
    let links = MagicLinkService::with_store(store, MagicLinkConfig::default())
        .with_hasher(fast_hasher());
    (otp, links)
}

// ============================================================================
// 单次使用
// ============================================================================

/// 验证码只能成功一次
#[tokio::test]
async fn test_code_single_use() {
    let (otp, _) = services(InMemorySecretStore::new());

    let issued = otp.generate(EMAIL).await.unwrap();

    assert!(otp.verify(EMAIL, &issued.code).await.unwrap());
    assert!(!otp.verify(EMAIL, &issued.code).await.unwrap());
}

/// 登录链接只能成功一次
#[tokio::test]
async fn test_link_single_use() {
    let (_, links) = services(InMemorySecretStore::new());

    let link = links.generate(EMAIL).await.unwrap();

    assert!(links.verify(EMAIL, &link.token).await.unwrap());
    assert!(!links.verify(EMAIL, &link.token).await.unwrap());
}

// ============================================================================
// 命名空间
// ============================================================================

/// 同一邮箱的验证码和链接互不影响
#[tokio::test]
async fn test_code_and_link_are_independent() {
    let store = InMemorySecretStore::new();
    let (otp, links) = services(store.clone());

    let code = otp.generate(EMAIL).await.unwrap();
    let link = links.generate(EMAIL).await.unwrap();
    assert_eq!(store.len(), 2);

    // 消费验证码不影响链接
    assert!(otp.verify(EMAIL, &code.code).await.unwrap());
    assert!(
        store
            .get(SecretNamespace::MagicLink, EMAIL)
            .await
            .unwrap()
            .is_some()
    );
    assert!(links.verify(EMAIL, &link.token).await.unwrap());

    // secret 不能跨命名空间使用
    let code = otp.generate(EMAIL).await.unwrap();
    assert!(!links.verify(EMAIL, &code.code).await.unwrap());
    assert!(otp.verify(EMAIL, &code.code).await.unwrap());
}

/// 新请求覆盖旧请求
#[tokio::test]
async fn test_newer_link_supersedes_older() {
    let (_, links) = services(InMemorySecretStore::new());

    let first = links.generate(EMAIL).await.unwrap();
    let second = links.generate(EMAIL).await.unwrap();

    assert!(!links.verify(EMAIL, &first.token).await.unwrap());
    assert!(links.verify(EMAIL, &second.token).await.unwrap());
}

// ============================================================================
// 过期
// ============================================================================

/// 过期后验证失败，清理任务回收记录
#[tokio::test]
async fn test_expired_secrets_are_swept() {
    let store = InMemorySecretStore::new();
    let otp = OtpService::with_store(
        store.clone(),
        OtpConfig::default().with_ttl(Duration::from_millis(50)),
    )
    .with_hasher(fast_hasher());

    let sweeper = store.spawn_sweeper(Duration::from_millis(20));

    let issued = otp.generate(EMAIL).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(store.is_empty());
    assert!(!otp.verify(EMAIL, &issued.code).await.unwrap());

    sweeper.shutdown().await;
}

/// 存储里不保存明文
#[tokio::test]
async fn test_plaintext_never_stored() {
    let store = InMemorySecretStore::new();
    let (otp, links) = services(store.clone());

    let code = otp.generate(EMAIL).await.unwrap();
    let link = links.generate(EMAIL).await.unwrap();

    let code_entry = store.get(SecretNamespace::Otp, EMAIL).await.unwrap().unwrap();
    let link_entry = store
        .get(SecretNamespace::MagicLink, EMAIL)
        .await
        .unwrap()
        .unwrap();

    assert!(!code_entry.secret_hash.contains(&code.code));
    assert!(!link_entry.secret_hash.contains(&link.token));
    assert!(fast_hasher().verify(&code.code, &code_entry.secret_hash).unwrap());
}

// ============================================================================
// 并发
// ============================================================================

/// 并发验证同一个验证码时至多一个成功
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_verifications_succeed_once() {
    let otp = Arc::new(OtpService::new(OtpConfig::default()).with_hasher(fast_hasher()));

    for _ in 0..5 {
        let issued = otp.generate(EMAIL).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let otp = Arc::clone(&otp);
                let code = issued.code.clone();
                tokio::spawn(async move { otp.verify(EMAIL, &code).await.unwrap() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}

/// 不同邮箱之间互不干扰
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subjects() {
    let links = Arc::new(MagicLinkService::new(MagicLinkConfig::default()).with_hasher(fast_hasher()));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let links = Arc::clone(&links);
            tokio::spawn(async move {
                let email = format!("user{}@example.com", i);
                let link = links.generate(email.as_str()).await.unwrap();
                links.verify(&email, &link.token).await.unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert!(links.store().is_empty());
}

/// 共享存储可以用 `Arc` 包装后注入
#[tokio::test]
async fn test_arc_store_injection() {
    let store = Arc::new(InMemorySecretStore::new());
    let otp = OtpService::with_store(Arc::clone(&store), OtpConfig::default())
        .with_hasher(fast_hasher());

    let issued = otp.generate(EMAIL).await.unwrap();
    assert_eq!(store.len(), 1);

    otp.revoke(EMAIL).await.unwrap();
    assert!(store.is_empty());
    assert!(!otp.verify(EMAIL, &issued.code).await.unwrap());
}
