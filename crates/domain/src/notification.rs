//! # 通知
//!
//! 送信プロバイダに渡すメールメッセージと、送信結果・送信エラーを定義する。
//!
//! ## 設計方針
//!
//! - **メール形式に統一**: SMS もキャリアのメール→SMS ゲートウェイ宛てのメールとして送る。
//!   プロバイダに渡すのは常に [`EmailMessage`]
//! - **表示名とアドレスの分離**: 表示名は [`Mailbox::display_name`] にのみ入り、
//!   アドレス部分には影響しない

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// プロバイダが送信を拒否した、または通信に失敗した
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// 宛先・送信元アドレスが不正
    #[error("アドレスが不正: {0}")]
    InvalidAddress(String),

    /// プロバイダの設定（API キー、ゲートウェイドメインなど）が不足している
    #[error("送信設定が不正: {0}")]
    Configuration(String),
}

/// 表示名付きメールアドレス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub address:      String,
    pub display_name: Option<String>,
}

impl Mailbox {
    /// 表示名なしのアドレス
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address:      address.into(),
            display_name: None,
        }
    }

    /// 表示名付きのアドレス
    pub fn with_name(address: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            address:      address.into(),
            display_name: Some(display_name.into()),
        }
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// メールメッセージ
///
/// チャネル送信処理の出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元
    pub from:      Mailbox,
    /// 送信先
    pub to:        Mailbox,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 送信受付結果
///
/// プロバイダが送信を受け付けたことを表す。
/// プロバイダがメッセージ ID を返した場合のみ `provider_message_id` が入る。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReceipt {
    pub provider_message_id: Option<String>,
}

impl DeliveryReceipt {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            provider_message_id: Some(id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_表示名付きアドレスの文字列表現() {
        let mailbox = Mailbox::with_name("ann@example.com", "Ann Lee");
        assert_eq!(mailbox.to_string(), "Ann Lee <ann@example.com>");
    }

    #[test]
    fn test_表示名なしアドレスの文字列表現() {
        let mailbox = Mailbox::new("5551234567@txt.att.net");
        assert_eq!(mailbox.to_string(), "5551234567@txt.att.net");
    }
}
