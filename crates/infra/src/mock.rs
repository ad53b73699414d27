//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのリポジトリと通知送信。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! courier-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_domain::{
   contact::{ContactAddress, ContactEmailId, PhoneNumber, PhoneNumberId, Provider, ProviderId},
   message::{Channel, MessageId, MessageRecord, NewMessage},
   notification::{DeliveryReceipt, EmailMessage, NotificationError},
   template::{MessageTemplate, TemplateId},
   user::{User, UserId},
};

use crate::{
   error::InfraError,
   notification::NotificationSender,
   repository::{
      ContactRepository,
      MessageRepository,
      ProviderRepository,
      TemplateRepository,
      UserRepository,
   },
};

// ===== MockMessageRepository =====

/// 送信日時の更新呼び出し
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTimestampUpdate {
   pub id:      MessageId,
   pub channel: Channel,
   pub sent_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MockMessageRepository {
   messages: Arc<Mutex<Vec<MessageRecord>>>,
   updates:  Arc<Mutex<Vec<SentTimestampUpdate>>>,
}

impl MockMessageRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_message(&self, message: MessageRecord) {
      self.messages.lock().unwrap().push(message);
   }

   /// 保存されているメッセージを取得する
   pub fn get(&self, id: MessageId) -> Option<MessageRecord> {
      self
         .messages
         .lock()
         .unwrap()
         .iter()
         .find(|m| m.id == id)
         .cloned()
   }

   pub fn messages(&self) -> Vec<MessageRecord> {
      self.messages.lock().unwrap().clone()
   }

   /// `update_sent_timestamp` の呼び出し履歴
   pub fn sent_timestamp_updates(&self) -> Vec<SentTimestampUpdate> {
      self.updates.lock().unwrap().clone()
   }
}

#[async_trait]
impl MessageRepository for MockMessageRepository {
   async fn find_by_id(&self, id: MessageId) -> Result<Option<MessageRecord>, InfraError> {
      Ok(self.get(id))
   }

   async fn insert(&self, message: &NewMessage) -> Result<MessageRecord, InfraError> {
      let mut messages = self.messages.lock().unwrap();
      let next_id = messages.iter().map(|m| m.id.as_i64()).max().unwrap_or(0) + 1;
      let record = message.clone().into_record(MessageId::new(next_id));
      messages.push(record.clone());
      Ok(record)
   }

   async fn update_sent_timestamp(
      &self,
      id: MessageId,
      channel: Channel,
      sent_at: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      let mut messages = self.messages.lock().unwrap();
      let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
         return Err(InfraError::unexpected(format!(
            "送信日時を更新するメッセージが存在しません: {id}"
         )));
      };
      message.record_sent(channel, sent_at);
      self.updates.lock().unwrap().push(SentTimestampUpdate {
         id,
         channel,
         sent_at,
      });
      Ok(())
   }
}

// ===== MockTemplateRepository =====

#[derive(Clone, Default)]
pub struct MockTemplateRepository {
   templates: Arc<Mutex<Vec<MessageTemplate>>>,
}

impl MockTemplateRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_template(&self, template: MessageTemplate) {
      self.templates.lock().unwrap().push(template);
   }
}

#[async_trait]
impl TemplateRepository for MockTemplateRepository {
   async fn find_by_id(&self, id: TemplateId) -> Result<Option<MessageTemplate>, InfraError> {
      Ok(self
         .templates
         .lock()
         .unwrap()
         .iter()
         .find(|t| t.id() == id)
         .cloned())
   }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
   users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_user(&self, user: User) {
      self.users.lock().unwrap().push(user);
   }
}

#[async_trait]
impl UserRepository for MockUserRepository {
   async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfraError> {
      Ok(self
         .users
         .lock()
         .unwrap()
         .iter()
         .find(|u| u.id() == id)
         .cloned())
   }
}

// ===== MockContactRepository =====

#[derive(Clone, Default)]
pub struct MockContactRepository {
   emails: Arc<Mutex<Vec<ContactAddress>>>,
   phones: Arc<Mutex<Vec<PhoneNumber>>>,
}

impl MockContactRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_email(&self, email: ContactAddress) {
      self.emails.lock().unwrap().push(email);
   }

   pub fn add_phone(&self, phone: PhoneNumber) {
      self.phones.lock().unwrap().push(phone);
   }
}

#[async_trait]
impl ContactRepository for MockContactRepository {
   async fn find_email_by_id(
      &self,
      id: ContactEmailId,
   ) -> Result<Option<ContactAddress>, InfraError> {
      Ok(self
         .emails
         .lock()
         .unwrap()
         .iter()
         .find(|e| e.id == id)
         .cloned())
   }

   async fn find_phone_by_id(&self, id: PhoneNumberId) -> Result<Option<PhoneNumber>, InfraError> {
      Ok(self
         .phones
         .lock()
         .unwrap()
         .iter()
         .find(|p| p.id == id)
         .cloned())
   }
}

// ===== MockProviderRepository =====

#[derive(Clone, Default)]
pub struct MockProviderRepository {
   providers: Arc<Mutex<Vec<Provider>>>,
}

impl MockProviderRepository {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn add_provider(&self, provider: Provider) {
      self.providers.lock().unwrap().push(provider);
   }
}

#[async_trait]
impl ProviderRepository for MockProviderRepository {
   async fn find_by_id(&self, id: ProviderId) -> Result<Option<Provider>, InfraError> {
      Ok(self
         .providers
         .lock()
         .unwrap()
         .iter()
         .find(|p| p.id == id)
         .cloned())
   }
}

// ===== MockNotificationSender =====

/// 送信内容を記録するモック送信
///
/// [`fail_for`](MockNotificationSender::fail_for) で指定した宛先への送信は
/// `SendFailed` を返し、記録もしない。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
   sent:       Arc<Mutex<Vec<EmailMessage>>>,
   failing_to: Arc<Mutex<Vec<String>>>,
}

impl MockNotificationSender {
   pub fn new() -> Self {
      Self::default()
   }

   /// 指定した宛先アドレスへの送信を失敗させる
   pub fn fail_for(&self, address: impl Into<String>) {
      self.failing_to.lock().unwrap().push(address.into());
   }

   /// 送信に成功したメッセージ
   pub fn sent_emails(&self) -> Vec<EmailMessage> {
      self.sent.lock().unwrap().clone()
   }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
   async fn send_email(&self, email: &EmailMessage) -> Result<DeliveryReceipt, NotificationError> {
      if self
         .failing_to
         .lock()
         .unwrap()
         .iter()
         .any(|address| *address == email.to.address)
      {
         return Err(NotificationError::SendFailed(format!(
            "モックが送信を拒否しました: {}",
            email.to.address
         )));
      }

      let mut sent = self.sent.lock().unwrap();
      sent.push(email.clone());
      Ok(DeliveryReceipt::with_id(format!("mock-{}", sent.len())))
   }
}

#[cfg(test)]
mod tests {
   use courier_domain::{message::SendFlag, notification::Mailbox};

   use super::*;

   #[tokio::test]
   async fn test_insertは連番のidを採番する() {
      let repo = MockMessageRepository::new();
      let new_message = NewMessage {
         send_email: SendFlag::Yes,
         ..Default::default()
      };

      let first = repo.insert(&new_message).await.unwrap();
      let second = repo.insert(&new_message).await.unwrap();

      assert_eq!(first.id, MessageId::new(1));
      assert_eq!(second.id, MessageId::new(2));
      assert_eq!(repo.messages().len(), 2);
   }

   #[tokio::test]
   async fn test_存在しないメッセージの送信日時更新はエラーになる() {
      let repo = MockMessageRepository::new();

      let result = repo
         .update_sent_timestamp(MessageId::new(99), Channel::Email, Utc::now())
         .await;

      assert!(result.is_err());
      assert!(repo.sent_timestamp_updates().is_empty());
   }

   #[tokio::test]
   async fn test_fail_forで指定した宛先だけ失敗する() {
      let sender = MockNotificationSender::new();
      sender.fail_for("bad@example.com");

      let email = |to: &str| EmailMessage {
         from:      Mailbox::new("noreply@example.com"),
         to:        Mailbox::new(to),
         subject:   "件名".to_string(),
         html_body: String::new(),
         text_body: String::new(),
      };

      assert!(sender.send_email(&email("bad@example.com")).await.is_err());
      assert!(sender.send_email(&email("ok@example.com")).await.is_ok());
      assert_eq!(sender.sent_emails().len(), 1);
   }
}
