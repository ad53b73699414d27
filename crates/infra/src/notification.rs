//! # 通知送信
//!
//! メール形式のメッセージをプロバイダへ送信するインフラストラクチャモジュール。
//! SMS もキャリアのメール→SMS ゲートウェイ宛てのメールとして、このトレイト経由で送る。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **4 つの実装**: SendGrid（本番）、SMTP（Mailpit 開発用）、SES、Noop（ログのみ）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **再試行しない**: 失敗はそのまま呼び出し元へ返す。再送は新しい配信要求で行う

mod noop;
mod sendgrid;
mod ses;
mod smtp;

use async_trait::async_trait;
use courier_domain::notification::{DeliveryReceipt, EmailMessage, NotificationError};
pub use noop::NoopNotificationSender;
pub use sendgrid::{SendGridConfig, SendGridNotificationSender};
pub use ses::SesNotificationSender;
pub use smtp::SmtpNotificationSender;

/// メール送信トレイト
///
/// 配信処理の送信口。送信元・宛先・件名・HTML 本文・テキスト本文を受け取り、
/// プロバイダが受理した場合は [`DeliveryReceipt`] を返す。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<DeliveryReceipt, NotificationError>;
}
