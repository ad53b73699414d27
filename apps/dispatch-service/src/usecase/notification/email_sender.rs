//! # メールチャネル送信
//!
//! レンダリング済みのメール本文から送信用メッセージを組み立て、プロバイダに渡す。
//!
//! ## 表示名
//!
//! 送信元・宛先の表示名はユーザーの姓名から作る。姓・名それぞれから
//! 記号（`@ & ' ( ) < > # ; : , { } [ ] ^ % $ ! ? /`）を取り除き、半角スペースで連結する。
//! 取り除くのは表示名だけで、アドレスには手を加えない。

use std::sync::Arc;

use courier_domain::{
   notification::{DeliveryReceipt, EmailMessage, Mailbox, NotificationError},
   user::User,
};
use courier_infra::notification::NotificationSender;

use super::RenderedEmail;

/// 表示名から取り除く文字（`'` に加えて `‘` U+2018 も対象）
const DISPLAY_NAME_BLACKLIST: &[char] = &[
   '@', '&', '\'', '\u{2018}', '(', ')', '<', '>', '#', ';', ':', ',', '{', '}', '[', ']', '^',
   '%', '$', '!', '?', '/',
];

/// 名前の構成要素（姓または名）から禁止記号を取り除く
///
/// ```rust
/// use courier_dispatch_service::usecase::notification::sanitize_name;
///
/// assert_eq!(sanitize_name("O'Brien <Jr>"), "OBrien Jr");
/// ```
pub fn sanitize_name(component: &str) -> String {
   component
      .chars()
      .filter(|c| !DISPLAY_NAME_BLACKLIST.contains(c))
      .collect()
}

/// ユーザーの表示名（`"{名} {姓}"`、各要素はサニタイズ済み）
pub fn display_name(user: &User) -> String {
   format!(
      "{} {}",
      sanitize_name(user.first_name()),
      sanitize_name(user.last_name())
   )
}

/// メールチャネルの送信処理
#[derive(Clone)]
pub struct EmailSender {
   sender:       Arc<dyn NotificationSender>,
   from_address: String,
}

impl EmailSender {
   /// # 引数
   ///
   /// - `sender`: 送信プロバイダ
   /// - `from_address`: 送信元アドレス（表示名は送信者ユーザーの姓名）
   pub fn new(sender: Arc<dyn NotificationSender>, from_address: impl Into<String>) -> Self {
      Self {
         sender,
         from_address: from_address.into(),
      }
   }

   /// メールを送信する
   ///
   /// 送信元は設定済みのアドレスに `from` の表示名を付けたもの。
   /// 宛先 `to` の表示名は呼び出し側で決める（紹介メールは表示名なし）。
   pub async fn send(
      &self,
      from: &User,
      to: Mailbox,
      content: &RenderedEmail,
   ) -> Result<DeliveryReceipt, NotificationError> {
      let email = EmailMessage {
         from: Mailbox::with_name(self.from_address.clone(), display_name(from)),
         to,
         subject: content.subject.clone(),
         html_body: content.html_body.clone(),
         text_body: content.text_body.clone(),
      };

      self.sender.send_email(&email).await
   }
}
