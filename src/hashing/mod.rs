//! 一次性 secret 哈希模块
//!
//! 验证码和魔法链接 secret 只以加盐慢哈希的形式落入存储，明文永不持久化。
//!
//! ## 支持的算法
//!
//! - **bcrypt** (默认): cost 可调（需启用 `bcrypt` feature）
//! - **Argon2id**: 内存硬哈希算法（需启用 `argon2` feature）
//!
//! ## 示例
//!
#![cfg_attr(feature = "bcrypt", doc = "```rust")]
#![cfg_attr(not(feature = "bcrypt"), doc = "```rust,ignore")]
//! use sesame::hashing::{Algorithm, SecretHasher};
//!
//! let hasher = SecretHasher::new(Algorithm::Bcrypt).with_bcrypt_cost(4);
//! let hash = hasher.hash("aB3dE5gH").unwrap();
//!
//! assert!(hasher.verify("aB3dE5gH", &hash).unwrap());
//! assert!(!hasher.verify("wrong", &hash).unwrap());
//! ```

mod hasher;

pub use hasher::{Algorithm, DEFAULT_BCRYPT_COST, SecretHasher};
