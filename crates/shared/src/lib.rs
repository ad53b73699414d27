//! # Courier 共有ユーティリティ
//!
//! ドメイン層・インフラ層・サービスから共通で使うユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（トレーシング関連は `observability` feature）

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
