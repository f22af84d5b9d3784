//! 慢哈希实现
//!
//! 提供一次性 secret 的哈希、验证以及缺失记录时的等时开销。

#[cfg(feature = "argon2")]
use argon2::Argon2;

#[cfg(feature = "argon2")]
use password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};

use crate::error::{Error, PasswordHashError, Result};

/// 支持的哈希算法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// bcrypt - 默认算法
    #[cfg(feature = "bcrypt")]
    Bcrypt,

    /// Argon2id - 内存硬哈希
    #[cfg(feature = "argon2")]
    Argon2id,
}

// 编译时检查：至少需要启用一个哈希算法
#[cfg(not(any(feature = "argon2", feature = "bcrypt")))]
compile_error!("At least one secret hashing algorithm (bcrypt or argon2) must be enabled.");

#[allow(clippy::derivable_impls)]
impl Default for Algorithm {
    fn default() -> Self {
        #[cfg(feature = "bcrypt")]
        {
            Algorithm::Bcrypt
        }
        #[cfg(all(not(feature = "bcrypt"), feature = "argon2"))]
        {
            Algorithm::Argon2id
        }
    }
}

/// 默认 bcrypt cost
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// secret 哈希器
#[derive(Debug, Clone)]
pub struct SecretHasher {
    algorithm: Algorithm,

    /// bcrypt 的 cost 参数 (4-31)
    #[cfg(feature = "bcrypt")]
    bcrypt_cost: u32,
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new(Algorithm::default())
    }
}

impl SecretHasher {
    /// 创建新的哈希器
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            #[cfg(feature = "bcrypt")]
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// 设置 bcrypt 的 cost 参数
    ///
    /// # Panics
    ///
    /// 如果 cost 不在 4-31 范围内会 panic
    #[cfg(feature = "bcrypt")]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        assert!(
            (4..=31).contains(&cost),
            "bcrypt cost must be between 4 and 31"
        );
        self.bcrypt_cost = cost;
        self
    }

    /// 当前算法
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// 哈希 secret，每次调用使用新的随机盐
    pub fn hash(&self, secret: &str) -> Result<String> {
        match self.algorithm {
            #[cfg(feature = "bcrypt")]
            Algorithm::Bcrypt => self.hash_bcrypt(secret),
            #[cfg(feature = "argon2")]
            Algorithm::Argon2id => self.hash_argon2(secret),
        }
    }

    /// 验证 secret
    ///
    /// 按哈希前缀自动识别算法。正确返回 `Ok(true)`，错误返回 `Ok(false)`。
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool> {
        #[cfg(feature = "bcrypt")]
        if hash.starts_with("$2") {
            return self.verify_bcrypt(secret, hash);
        }
        #[cfg(feature = "argon2")]
        if hash.starts_with("$argon2") {
            return self.verify_argon2(secret, hash);
        }
        Err(Error::PasswordHash(PasswordHashError::InvalidFormat(
            "unknown hash format".to_string(),
        )))
    }

    /// 在没有存储记录时消耗与一次验证相当的时间
    ///
    /// 让“从未请求过”与“输入错误”在耗时上难以区分。
    pub fn burn(&self, candidate: &str) {
        if let Err(e) = self.hash(candidate) {
            tracing::debug!("decoy hash failed: {}", e);
        }
    }

    // ========================================================================
    // bcrypt 实现
    // ========================================================================

    #[cfg(feature = "bcrypt")]
    fn hash_bcrypt(&self, secret: &str) -> Result<String> {
        bcrypt::hash(secret, self.bcrypt_cost).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "bcrypt hash failed: {}",
                e
            )))
        })
    }

    #[cfg(feature = "bcrypt")]
    fn verify_bcrypt(&self, secret: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(secret, hash).map_err(|e| {
            Error::PasswordHash(PasswordHashError::InvalidFormat(format!(
                "bcrypt verify failed: {}",
                e
            )))
        })
    }

    // ========================================================================
    // Argon2 实现
    // ========================================================================

    #[cfg(feature = "argon2")]
    fn hash_argon2(&self, secret: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::fill(&mut salt_bytes).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "failed to generate random salt: {}",
                e
            )))
        })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "failed to encode salt: {}",
                e
            )))
        })?;

        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                Error::PasswordHash(PasswordHashError::HashFailed(format!(
                    "Argon2 hash failed: {}",
                    e
                )))
            })
    }

    #[cfg(feature = "argon2")]
    fn verify_argon2(&self, secret: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            Error::PasswordHash(PasswordHashError::InvalidFormat(format!(
                "invalid Argon2 hash: {}",
                e
            )))
        })?;

        Ok(Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
