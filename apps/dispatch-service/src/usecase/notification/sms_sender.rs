//! # SMS チャネル送信
//!
//! キャリアのメール→SMS ゲートウェイを使って SMS を送る。
//! ネイティブの SMS API は使わず、`<数字のみの番号>@<ゲートウェイドメイン>` 宛ての
//! 通常のメールとしてプロバイダに渡す。
//!
//! - 件名: `Sent to {名} {姓}`（姓名はサニタイズ済み）
//! - HTML 本文・テキスト本文: どちらもレンダリング済みの SMS 本文
//! - 送信元: 設定された SMS 用アドレス（表示名なし）

use std::sync::Arc;

use courier_domain::{
   contact::{PhoneNumber, Provider},
   notification::{DeliveryReceipt, EmailMessage, Mailbox, NotificationError},
   user::User,
};
use courier_infra::notification::NotificationSender;

use super::email_sender::sanitize_name;

/// SMS チャネルの送信処理
#[derive(Clone)]
pub struct SmsSender {
   sender:       Arc<dyn NotificationSender>,
   from_address: String,
}

impl SmsSender {
   pub fn new(sender: Arc<dyn NotificationSender>, from_address: impl Into<String>) -> Self {
      Self {
         sender,
         from_address: from_address.into(),
      }
   }

   /// ゲートウェイ宛てのアドレスを組み立てる
   ///
   /// 番号に数字が 1 つもない場合は `InvalidAddress`、
   /// キャリアのゲートウェイドメインが空の場合は `Configuration` を返す。
   pub fn gateway_address(
      phone: &PhoneNumber,
      provider: &Provider,
   ) -> Result<String, NotificationError> {
      let domain = provider.sms_email_domain.trim();
      if domain.is_empty() {
         return Err(NotificationError::Configuration(format!(
            "キャリア {} のゲートウェイドメインが設定されていません",
            provider.name
         )));
      }

      let digits = phone.digits();
      if digits.is_empty() {
         return Err(NotificationError::InvalidAddress(format!(
            "電話番号 {} に数字が含まれていません",
            phone.id
         )));
      }

      Ok(format!("{digits}@{domain}"))
   }

   /// SMS を送信する
   pub async fn send(
      &self,
      phone: &PhoneNumber,
      provider: &Provider,
      to: &User,
      body: &str,
   ) -> Result<DeliveryReceipt, NotificationError> {
      let address = Self::gateway_address(phone, provider)?;

      let email = EmailMessage {
         from:      Mailbox::new(self.from_address.clone()),
         to:        Mailbox::new(address),
         subject:   format!(
            "Sent to {} {}",
            sanitize_name(to.first_name()),
            sanitize_name(to.last_name())
         ),
         html_body: body.to_string(),
         text_body: body.to_string(),
      };

      self.sender.send_email(&email).await
   }
}
