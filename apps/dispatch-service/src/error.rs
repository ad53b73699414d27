//! # Dispatch Service エラー定義
//!
//! API 層のエラーと、HTTP レスポンス（RFC 9457 Problem Details）への変換を定義する。
//!
//! | エラー | HTTP ステータス |
//! |-------|----------------|
//! | `NotFound` | 404 |
//! | `BadData` / `Validation` | 400 |
//! | `Configuration` | 500 |
//! | `ChannelsFailed` | 502 |
//! | `Database` | 500 |
//!
//! チャネルの失敗は原因で振り分ける。
//!
//! | 失敗したチャネルの原因 | エラー | HTTP ステータス |
//! |----------------------|-------|----------------|
//! | すべて関連データの欠落 | `NotFound` | 404 |
//! | すべて送信設定の不備 | `Configuration` | 500 |
//! | すべて送信日時の記録失敗 | `Database` | 500 |
//! | それ以外 | `ChannelsFailed` | 502 |

use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use courier_infra::InfraError;
use courier_shared::ErrorResponse;
use thiserror::Error;

use crate::usecase::notification::{ChannelError, DispatchError};

/// Dispatch Service の API エラー
#[derive(Debug, Error)]
pub enum ApiError {
   /// リソースが見つからない
   #[error("リソースが見つかりません: {0}")]
   NotFound(String),

   /// 差し込み値などの保存データが不正
   #[error("データ形式が不正です: {0}")]
   BadData(String),

   /// 入力値が不正
   #[error("入力値が不正です: {0}")]
   Validation(String),

   /// 送信設定が不正
   #[error("送信設定が不正です: {0}")]
   Configuration(String),

   /// 1 つ以上のチャネルで送信に失敗（プロバイダエラーを含む）
   #[error("送信に失敗しました: {0}")]
   ChannelsFailed(String),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Database(#[from] InfraError),
}

impl From<DispatchError> for ApiError {
   fn from(err: DispatchError) -> Self {
      match err {
         DispatchError::NotFound { .. } => ApiError::NotFound(err.to_string()),
         DispatchError::BadData(msg) => ApiError::BadData(msg),
         DispatchError::ChannelsFailed(report) => {
            let summary = report.failure_summary();
            if report
               .failures()
               .all(|e| matches!(e, ChannelError::MissingRelation(_)))
            {
               ApiError::NotFound(summary)
            } else if report
               .failures()
               .all(|e| matches!(e, ChannelError::Configuration(_)))
            {
               ApiError::Configuration(summary)
            } else if report
               .failures()
               .all(|e| matches!(e, ChannelError::Store(_)))
            {
               match report.into_failures().next() {
                  Some(ChannelError::Store(e)) => ApiError::Database(e),
                  _ => ApiError::ChannelsFailed(summary),
               }
            } else {
               ApiError::ChannelsFailed(summary)
            }
         }
         DispatchError::Store(e) => ApiError::Database(e),
      }
   }
}

impl IntoResponse for ApiError {
   fn into_response(self) -> Response {
      let body = match &self {
         ApiError::NotFound(msg) => ErrorResponse::not_found(msg),
         ApiError::BadData(msg) => ErrorResponse::new("bad-data", "Bad Data", 400, msg),
         ApiError::Validation(msg) => ErrorResponse::validation_error(msg),
         ApiError::Configuration(msg) => {
            tracing::error!(error.kind = "configuration", "送信設定エラー: {}", msg);
            ErrorResponse::internal_error()
         }
         ApiError::ChannelsFailed(msg) => {
            tracing::warn!(error.kind = "provider", "チャネル送信失敗: {}", msg);
            ErrorResponse::bad_gateway(msg)
         }
         ApiError::Database(e) => {
            tracing::error!(
               error.kind = "database",
               span_trace = %e.span_trace(),
               "データベースエラー: {}",
               e
            );
            ErrorResponse::internal_error()
         }
      };

      let status =
         StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(body)).into_response()
   }
}
