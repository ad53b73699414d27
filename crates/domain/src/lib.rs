//! # Courier ドメイン層
//!
//! テンプレートを使ったメッセージ配信のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: MessageRecord, MessageTemplate）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Email, MessageFields）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! dispatch-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、送信プロバイダ）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`message`] - メッセージレコード、差し込み値、チャネル
//! - [`template`] - テンプレートと差し込みフィールド
//! - [`user`] - ユーザーとメールアドレス
//! - [`contact`] - 連絡先メールアドレス、電話番号、携帯キャリア
//! - [`notification`] - プロバイダに渡すメールメッセージと送信エラー
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー

#[macro_use]
mod macros;

pub mod clock;
pub mod contact;
pub mod error;
pub mod message;
pub mod notification;
pub mod template;
pub mod user;

pub use error::DomainError;
