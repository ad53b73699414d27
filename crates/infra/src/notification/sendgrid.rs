//! SendGrid 通知送信実装
//!
//! SendGrid v3 Web API（`POST /v3/mail/send`）を reqwest で呼び出す。
//! 本番環境の標準トランスポート。
//!
//! - 認証は Bearer API キー
//! - タイムアウトは [`SendGridConfig::timeout`] のみで制御し、再試行はしない
//! - 2xx 以外の応答は [`NotificationError::SendFailed`]
//! - 応答ヘッダ `X-Message-Id` を [`DeliveryReceipt`] の ID とする

use std::time::Duration;

use async_trait::async_trait;
use courier_domain::notification::{DeliveryReceipt, EmailMessage, Mailbox, NotificationError};
use serde::Serialize;

use super::NotificationSender;

const MAIL_SEND_PATH: &str = "/v3/mail/send";
const MESSAGE_ID_HEADER: &str = "x-message-id";

/// SendGrid 接続設定
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// API キー
    pub api_key:  String,
    /// API のベース URL（例: `https://api.sendgrid.com`）
    pub base_url: String,
    /// リクエストタイムアウト
    pub timeout:  Duration,
}

/// SendGrid 通知送信
#[derive(Debug, Clone)]
pub struct SendGridNotificationSender {
    client:   reqwest::Client,
    api_key:  String,
    endpoint: String,
}

impl SendGridNotificationSender {
    /// 新しい SendGrid 送信インスタンスを作成
    ///
    /// API キーが空の場合や HTTP クライアントを構築できない場合は
    /// [`NotificationError::Configuration`] を返す。
    pub fn new(config: SendGridConfig) -> Result<Self, NotificationError> {
        if config.api_key.trim().is_empty() {
            return Err(NotificationError::Configuration(
                "SendGrid API キーが設定されていません".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                NotificationError::Configuration(format!("HTTP クライアント構築失敗: {e}"))
            })?;

        Ok(Self {
            client,
            api_key: config.api_key,
            endpoint: format!(
                "{}{MAIL_SEND_PATH}",
                config.base_url.trim_end_matches('/')
            ),
        })
    }
}

// ===== リクエストボディ =====

#[derive(Debug, Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name:  Option<&'a str>,
}

impl<'a> From<&'a Mailbox> for SendGridAddress<'a> {
    fn from(mailbox: &'a Mailbox) -> Self {
        Self {
            email: &mailbox.address,
            name:  mailbox.display_name.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<SendGridAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value:        &'a str,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from:             SendGridAddress<'a>,
    subject:          &'a str,
    content:          Vec<Content<'a>>,
}

impl<'a> From<&'a EmailMessage> for MailSendRequest<'a> {
    fn from(email: &'a EmailMessage) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![SendGridAddress::from(&email.to)],
            }],
            from:             SendGridAddress::from(&email.from),
            subject:          &email.subject,
            // SendGrid は text/plain が text/html より先にあることを要求する
            content:          vec![
                Content {
                    content_type: "text/plain",
                    value:        &email.text_body,
                },
                Content {
                    content_type: "text/html",
                    value:        &email.html_body,
                },
            ],
        }
    }
}

#[async_trait]
impl NotificationSender for SendGridNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&MailSendRequest::from(email))
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SendGrid 通信失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::SendFailed(format!(
                "SendGrid がエラーを返しました: {status} {body}"
            )));
        }

        let receipt = response
            .headers()
            .get(MESSAGE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(DeliveryReceipt::with_id)
            .unwrap_or_default();

        Ok(receipt)
    }
}
