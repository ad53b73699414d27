//! # メッセージ配信
//!
//! 保存済みメッセージを読み込み、要求されたチャネル（メール → SMS の順）で送信し、
//! 成功したチャネルの送信日時を記録する。
//!
//! ## 設計方針
//!
//! - **全体の中断は送信前だけ**: メッセージ・テンプレートの欠落（`NotFound`）と
//!   差し込み値の解析失敗（`BadData`）はどのチャネルも送信せずに中断する
//! - **チャネルは独立**: 一方のチャネルの失敗（関連データの欠落、プロバイダエラー、
//!   送信日時の記録失敗）は他方の送信を妨げない。結果は [`DispatchReport`] に
//!   チャネルごとに残し、呼び出し側が [`DispatchReport::into_result`] でエラーにする
//! - **再送ガードなし**: `email_sent` / `sms_sent` は参照しない。同じメッセージを
//!   再度配信すると再送し、送信日時を上書きする
//! - **排他なし**: 同じメッセージへの並行した配信呼び出しを直列化しない

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use courier_domain::{
   clock::Clock,
   contact::{ContactAddress, PhoneNumber},
   message::{Channel, MessageFields, MessageId, MessageRecord},
   notification::{DeliveryReceipt, Mailbox, NotificationError},
   template::MessageTemplate,
   user::{Email, User, UserId},
};
use courier_infra::{
   InfraError,
   repository::{
      ContactRepository,
      MessageRepository,
      ProviderRepository,
      TemplateRepository,
      UserRepository,
   },
};
use courier_shared::{
   event_log::{error as log_error, event},
   log_business_event,
};
use thiserror::Error;

use super::{EmailSender, SmsSender, TemplateRenderer, display_name};

/// 配信処理が参照するリポジトリ群
#[derive(Clone)]
pub struct DispatchRepositories {
   pub messages:  Arc<dyn MessageRepository>,
   pub templates: Arc<dyn TemplateRepository>,
   pub users:     Arc<dyn UserRepository>,
   pub contacts:  Arc<dyn ContactRepository>,
   pub providers: Arc<dyn ProviderRepository>,
}

/// チャネル単位のエラー
///
/// 該当チャネルの送信だけを失敗させる。
#[derive(Debug, Error)]
pub enum ChannelError {
   /// チャネルに必要な関連データが存在しない
   #[error("{0} が見つかりません")]
   MissingRelation(&'static str),

   /// 送信設定が不正（キャリアの未設定など）
   #[error("送信設定が不正です: {0}")]
   Configuration(String),

   /// プロバイダが送信を拒否した、または宛先が不正
   #[error(transparent)]
   Provider(NotificationError),

   /// 関連データの読み込みや送信日時の記録に失敗
   #[error("データベースエラー: {0}")]
   Store(#[from] InfraError),
}

impl From<NotificationError> for ChannelError {
   fn from(err: NotificationError) -> Self {
      match err {
         NotificationError::Configuration(msg) => Self::Configuration(msg),
         other => Self::Provider(other),
      }
   }
}

impl ChannelError {
   fn log_category(&self) -> &'static str {
      match self {
         Self::Store(_) => log_error::category::INFRASTRUCTURE,
         _ => log_error::category::EXTERNAL_SERVICE,
      }
   }

   fn log_kind(&self) -> &'static str {
      match self {
         Self::MissingRelation(_) => log_error::kind::BAD_DATA,
         Self::Configuration(_) => log_error::kind::CONFIGURATION,
         Self::Provider(_) => log_error::kind::PROVIDER,
         Self::Store(_) => log_error::kind::DATABASE,
      }
   }
}

/// 送信に成功したチャネルの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDelivery {
   /// 記録した送信日時
   pub sent_at: DateTime<Utc>,
   /// プロバイダの受付結果
   pub receipt: DeliveryReceipt,
}

/// 1 チャネル分の配信結果
#[derive(Debug)]
pub struct ChannelOutcome {
   pub channel: Channel,
   pub result:  Result<ChannelDelivery, ChannelError>,
}

/// 1 回の配信呼び出しの結果
///
/// 要求されたチャネルごとに 1 つの [`ChannelOutcome`] を持つ。
/// どちらのチャネルも要求されていなければ空で、成功として扱う。
#[derive(Debug)]
pub struct DispatchReport {
   message_id: MessageId,
   outcomes:   Vec<ChannelOutcome>,
}

impl DispatchReport {
   pub(crate) fn new(message_id: MessageId, outcomes: Vec<ChannelOutcome>) -> Self {
      Self {
         message_id,
         outcomes,
      }
   }

   pub fn message_id(&self) -> MessageId {
      self.message_id
   }

   pub fn outcomes(&self) -> &[ChannelOutcome] {
      &self.outcomes
   }

   /// 指定チャネルの結果（要求されていなければ `None`）
   pub fn outcome(&self, channel: Channel) -> Option<&ChannelOutcome> {
      self.outcomes.iter().find(|o| o.channel == channel)
   }

   /// 失敗したチャネルのエラー
   pub fn failures(&self) -> impl Iterator<Item = &ChannelError> {
      self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
   }

   /// 失敗したチャネルのエラーを取り出す
   pub fn into_failures(self) -> impl Iterator<Item = ChannelError> {
      self.outcomes.into_iter().filter_map(|o| o.result.err())
   }

   pub fn is_success(&self) -> bool {
      self.failures().next().is_none()
   }

   /// 失敗したチャネルの要約（`"sms: ..."` を `; ` で連結）
   pub fn failure_summary(&self) -> String {
      self
         .outcomes
         .iter()
         .filter_map(|o| o.result.as_ref().err().map(|e| format!("{}: {}", o.channel, e)))
         .collect::<Vec<_>>()
         .join("; ")
   }

   /// 1 つでも失敗したチャネルがあれば `ChannelsFailed` にする
   pub fn into_result(self) -> Result<Self, DispatchError> {
      if self.is_success() {
         Ok(self)
      } else {
         Err(DispatchError::ChannelsFailed(self))
      }
   }
}

impl fmt::Display for DispatchReport {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "message {}: ", self.message_id)?;
      if self.outcomes.is_empty() {
         return write!(f, "送信要求なし");
      }
      let parts: Vec<String> = self
         .outcomes
         .iter()
         .map(|o| match &o.result {
            Ok(_) => format!("{}=ok", o.channel),
            Err(_) => format!("{}=failed", o.channel),
         })
         .collect();
      write!(f, "{}", parts.join(", "))
   }
}

/// 配信全体のエラー
#[derive(Debug, Error)]
pub enum DispatchError {
   /// メッセージまたはテンプレートが存在しない
   #[error("{entity} が見つかりません: {id}")]
   NotFound { entity: &'static str, id: String },

   /// 差し込み値を解析できない
   #[error("差し込み値が不正です: {0}")]
   BadData(String),

   /// 1 つ以上のチャネルで送信に失敗
   #[error("送信に失敗しました（{0}）")]
   ChannelsFailed(DispatchReport),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Store(#[from] InfraError),
}

/// メッセージ配信
pub struct MessageDispatcher {
   repos:        DispatchRepositories,
   renderer:     TemplateRenderer,
   email_sender: EmailSender,
   sms_sender:   SmsSender,
   clock:        Arc<dyn Clock>,
}

/// 送信前に解決しておく、配信全体で共通のデータ
struct Prepared {
   message:  MessageRecord,
   template: MessageTemplate,
   values:   MessageFields,
}

impl MessageDispatcher {
   pub fn new(
      repos: DispatchRepositories,
      email_sender: EmailSender,
      sms_sender: SmsSender,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         repos,
         renderer: TemplateRenderer::new(),
         email_sender,
         sms_sender,
         clock,
      }
   }

   /// 保存済みメッセージを要求されたチャネルで配信する
   ///
   /// チャネルの失敗は `Ok(DispatchReport)` の中に残る。
   /// `Err` になるのは送信前に中断した場合だけ。
   #[tracing::instrument(skip_all, fields(message_id = %id))]
   pub async fn dispatch(&self, id: MessageId) -> Result<DispatchReport, DispatchError> {
      let Prepared {
         message,
         template,
         values,
      } = self.prepare(id).await?;

      let mut outcomes = Vec::with_capacity(2);

      if message.send_email.is_requested() {
         let delivery = self.deliver_email(&message, &template, &values).await;
         outcomes.push(self.complete(id, Channel::Email, delivery).await);
      }

      if message.send_text.is_requested() {
         let delivery = self.deliver_sms(&message, &template, &values).await;
         outcomes.push(self.complete(id, Channel::Sms, delivery).await);
      }

      let report = DispatchReport::new(id, outcomes);
      tracing::debug!(%report, "配信完了");
      Ok(report)
   }

   /// 呼び出し側が指定したアドレスへメールだけを配信する（紹介メール）
   ///
   /// 保存済みの宛先（`to_email_id`）と送信フラグは参照しない。
   /// 宛先の表示名は付けない。
   #[tracing::instrument(skip_all, fields(message_id = %id))]
   pub async fn dispatch_referral(
      &self,
      id: MessageId,
      to: &Email,
   ) -> Result<DispatchReport, DispatchError> {
      let Prepared {
         message,
         template,
         values,
      } = self.prepare(id).await?;

      let delivery = self.deliver_referral(&message, &template, &values, to).await;
      let outcome = self.complete(id, Channel::Email, delivery).await;
      let report = DispatchReport::new(id, vec![outcome]);

      tracing::debug!(%report, "紹介メール配信完了");
      Ok(report)
   }

   async fn prepare(&self, id: MessageId) -> Result<Prepared, DispatchError> {
      let message = self
         .repos
         .messages
         .find_by_id(id)
         .await?
         .ok_or_else(|| DispatchError::NotFound {
            entity: "message",
            id:     id.to_string(),
         })?;

      let template_id = message.template_id.ok_or_else(|| DispatchError::NotFound {
         entity: "template",
         id:     format!("(message {id} にテンプレートが設定されていません)"),
      })?;
      let template = self
         .repos
         .templates
         .find_by_id(template_id)
         .await?
         .ok_or_else(|| DispatchError::NotFound {
            entity: "template",
            id:     template_id.to_string(),
         })?;

      let values = message.parse_fields().map_err(|e| {
         tracing::warn!(error.kind = log_error::kind::BAD_DATA, "差し込み値を解析できません: {}", e);
         DispatchError::BadData(e.to_string())
      })?;

      Ok(Prepared {
         message,
         template,
         values,
      })
   }

   async fn deliver_email(
      &self,
      message: &MessageRecord,
      template: &MessageTemplate,
      values: &MessageFields,
   ) -> Result<DeliveryReceipt, ChannelError> {
      let from = self.require_user(message.from_user_id, "from_user").await?;
      let to = self.require_user(message.to_user_id, "to_user").await?;
      let to_email = self.require_email(message).await?;

      let content = self.renderer.render_email(template, values);
      let to_mailbox = Mailbox::with_name(to_email.email_address, display_name(&to));

      Ok(self.email_sender.send(&from, to_mailbox, &content).await?)
   }

   async fn deliver_referral(
      &self,
      message: &MessageRecord,
      template: &MessageTemplate,
      values: &MessageFields,
      to: &Email,
   ) -> Result<DeliveryReceipt, ChannelError> {
      let from = self.require_user(message.from_user_id, "from_user").await?;
      let content = self.renderer.render_email(template, values);

      Ok(self
         .email_sender
         .send(&from, Mailbox::new(to.as_str()), &content)
         .await?)
   }

   async fn deliver_sms(
      &self,
      message: &MessageRecord,
      template: &MessageTemplate,
      values: &MessageFields,
   ) -> Result<DeliveryReceipt, ChannelError> {
      let to = self.require_user(message.to_user_id, "to_user").await?;
      let phone = self.require_phone(message).await?;

      let Some(provider_id) = phone.provider_id else {
         return Err(ChannelError::Configuration(format!(
            "電話番号 {} にキャリアが設定されていません",
            phone.id
         )));
      };
      let provider = self
         .repos
         .providers
         .find_by_id(provider_id)
         .await?
         .ok_or(ChannelError::MissingRelation("provider"))?;

      let body = self.renderer.render_sms(template, values);

      Ok(self.sms_sender.send(&phone, &provider, &to, &body).await?)
   }

   async fn require_user(
      &self,
      id: Option<UserId>,
      relation: &'static str,
   ) -> Result<User, ChannelError> {
      let Some(id) = id else {
         return Err(ChannelError::MissingRelation(relation));
      };
      self
         .repos
         .users
         .find_by_id(id)
         .await?
         .ok_or(ChannelError::MissingRelation(relation))
   }

   async fn require_email(&self, message: &MessageRecord) -> Result<ContactAddress, ChannelError> {
      let Some(id) = message.to_email_id else {
         return Err(ChannelError::MissingRelation("to_email"));
      };
      self
         .repos
         .contacts
         .find_email_by_id(id)
         .await?
         .ok_or(ChannelError::MissingRelation("to_email"))
   }

   async fn require_phone(&self, message: &MessageRecord) -> Result<PhoneNumber, ChannelError> {
      let Some(id) = message.to_phone_id else {
         return Err(ChannelError::MissingRelation("to_phone"));
      };
      self
         .repos
         .contacts
         .find_phone_by_id(id)
         .await?
         .ok_or(ChannelError::MissingRelation("to_phone"))
   }

   /// 送信結果を確定する
   ///
   /// 送信に成功した場合だけ現在時刻を送信日時として記録する。
   async fn complete(
      &self,
      id: MessageId,
      channel: Channel,
      delivery: Result<DeliveryReceipt, ChannelError>,
   ) -> ChannelOutcome {
      let result = match delivery {
         Ok(receipt) => {
            let sent_at = self.clock.now();
            self
               .repos
               .messages
               .update_sent_timestamp(id, channel, sent_at)
               .await
               .map(|()| ChannelDelivery { sent_at, receipt })
               .map_err(ChannelError::from)
         }
         Err(e) => Err(e),
      };

      log_outcome(id, channel, &result);
      ChannelOutcome { channel, result }
   }
}

fn log_outcome(id: MessageId, channel: Channel, result: &Result<ChannelDelivery, ChannelError>) {
   let channel_name: &'static str = channel.into();
   match result {
      Ok(delivery) => log_business_event!(
         event.category = event::category::NOTIFICATION,
         event.action = event::action::NOTIFICATION_SENT,
         event.entity_type = event::entity_type::MESSAGE,
         event.entity_id = %id,
         event.result = event::result::SUCCESS,
         notification.channel = channel_name,
         notification.provider_message_id = delivery.receipt.provider_message_id.as_deref().unwrap_or(""),
         "通知を送信しました"
      ),
      Err(e) => log_business_event!(
         event.category = event::category::NOTIFICATION,
         event.action = event::action::NOTIFICATION_FAILED,
         event.entity_type = event::entity_type::MESSAGE,
         event.entity_id = %id,
         event.result = event::result::FAILURE,
         notification.channel = channel_name,
         error.category = e.log_category(),
         error.kind = e.log_kind(),
         error.message = %e,
         "通知の送信に失敗しました"
      ),
   }
}
