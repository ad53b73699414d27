//! # 通知配信
//!
//! テンプレートのレンダリングと、メール・SMS の各チャネルへの送信を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - パターン置換によるテンプレート差し込み
//! - [`email_sender`] - メールチャネル（表示名のサニタイズを含む）
//! - [`sms_sender`] - メール→SMS ゲートウェイ経由の SMS チャネル
//! - [`dispatcher`] - チャネルごとの送信と送信日時の記録

pub mod dispatcher;
pub mod email_sender;
pub mod sms_sender;
pub mod template_renderer;

pub use dispatcher::{
   ChannelDelivery,
   ChannelError,
   ChannelOutcome,
   DispatchError,
   DispatchReport,
   DispatchRepositories,
   MessageDispatcher,
};
pub use email_sender::{EmailSender, display_name, sanitize_name};
pub use sms_sender::SmsSender;
pub use template_renderer::{RenderedEmail, TemplateRenderer};
