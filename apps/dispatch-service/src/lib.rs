//! # Dispatch Service ライブラリ
//!
//! テンプレートの差し込みとメール・SMS 配信のユースケース、HTTP ハンドラを公開する。
//! バイナリ（`main.rs`）とテストから利用する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
