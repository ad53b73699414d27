//! # リポジトリ実装
//!
//! 配信処理が読み書きするエンティティの永続化を担当する。
//!
//! ## 設計方針
//!
//! - **トレイト + PostgreSQL 実装**: ユースケース層はトレイトにのみ依存する
//! - **パラメータ化クエリ**: すべての値は `bind` で渡し、SQL 文字列を値で組み立てない
//! - **テスタビリティ**: `test-utils` フィーチャーでインメモリ実装（[`crate::mock`]）を提供

pub mod contact_repository;
pub mod message_repository;
pub mod provider_repository;
pub mod template_repository;
pub mod user_repository;

pub use contact_repository::{ContactRepository, PostgresContactRepository};
pub use message_repository::{MessageRepository, PostgresMessageRepository};
pub use provider_repository::{PostgresProviderRepository, ProviderRepository};
pub use template_repository::{PostgresTemplateRepository, TemplateRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
