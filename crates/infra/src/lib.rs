//! # Courier インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはユースケース層が依存するトレイト（リポジトリ、通知送信）と、
//! その具体的な実装を提供する。外部システムの詳細をカプセル化し、
//! 配信ロジックをインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: メッセージ・テンプレート・ユーザー・連絡先・キャリアの読み書き
//! - **送信プロバイダ**: SendGrid / SMTP / SES / Noop
//!
//! ## 依存関係
//!
//! ```text
//! dispatch-service → infra → domain
//!         ↘
//!          shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - 送信プロバイダ
//! - [`repository`] - リポジトリ実装
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use notification::NotificationSender;
