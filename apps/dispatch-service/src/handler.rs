//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - ハンドラは薄く保ち、配信ロジックはユースケースに委譲
//! - 認証は行わない（前段のゲートウェイの責務）

pub mod health;
pub mod message;

use std::sync::Arc;

use axum::{
   Router,
   routing::{get, post, put},
};
pub use health::health_check;
pub use message::{MessageState, create_message, get_message, ping, send_message, send_referral};

/// ルーターを組み立てる
pub fn router(message_state: Arc<MessageState>) -> Router {
   Router::new()
      .route("/health", get(health_check))
      .route("/message", get(get_message).post(create_message))
      .route("/message/send", put(send_message))
      .route("/message/send/referral", post(send_referral))
      .route("/message/ping", get(ping))
      .with_state(message_state)
}
