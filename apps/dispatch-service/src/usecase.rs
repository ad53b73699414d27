//! # ユースケース層
//!
//! Dispatch Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・送信プロバイダ・時刻を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `message`: メッセージの作成・送信・紹介メール
//! - `notification`: テンプレートのレンダリングとチャネル送信

pub mod message;
pub mod notification;

pub use message::MessageUseCaseImpl;
