//! メッセージユースケース
//!
//! メッセージの作成、保存済みメッセージの送信、紹介メールの作成と送信を扱う。

use std::sync::Arc;

use courier_domain::{
   message::{MessageId, MessageRecord, NewMessage},
   template::REFERRAL_TEMPLATE_ID,
   user::Email,
};
use courier_infra::repository::MessageRepository;
use courier_shared::{event_log::event, log_business_event};

use super::notification::MessageDispatcher;
use crate::error::ApiError;

/// メッセージユースケース
pub struct MessageUseCaseImpl {
   message_repository: Arc<dyn MessageRepository>,
   dispatcher:         MessageDispatcher,
}

impl MessageUseCaseImpl {
   pub fn new(message_repository: Arc<dyn MessageRepository>, dispatcher: MessageDispatcher) -> Self {
      Self {
         message_repository,
         dispatcher,
      }
   }

   /// 保存済みメッセージを取得する
   pub async fn get_message(&self, id: MessageId) -> Result<MessageRecord, ApiError> {
      self.reload(id).await
   }

   /// メッセージを作成する（送信はしない）
   pub async fn create_message(&self, input: NewMessage) -> Result<MessageRecord, ApiError> {
      let record = self.message_repository.insert(&input).await?;

      log_business_event!(
         event.category = event::category::MESSAGE,
         event.action = event::action::MESSAGE_CREATED,
         event.entity_type = event::entity_type::MESSAGE,
         event.entity_id = %record.id,
         event.result = event::result::SUCCESS,
         "メッセージを作成しました"
      );

      Ok(record)
   }

   /// 保存済みメッセージを送信し、送信日時を反映したレコードを返す
   ///
   /// いずれかのチャネルが失敗した場合はエラーを返す。
   /// 成功したチャネルの送信日時は記録済みのまま残る。
   pub async fn send_message(&self, id: MessageId) -> Result<MessageRecord, ApiError> {
      self.dispatcher.dispatch(id).await?.into_result()?;
      self.reload(id).await
   }

   /// 紹介メールを作成して指定アドレスへ送信する
   ///
   /// 1. 宛先アドレスを検証
   /// 2. テンプレートを紹介用テンプレートに固定して作成
   /// 3. 指定アドレスへメールだけを送信
   ///
   /// 送信に失敗しても作成済みのメッセージは残る。
   pub async fn send_referral(
      &self,
      mut input: NewMessage,
      email: &str,
   ) -> Result<MessageRecord, ApiError> {
      let to = Email::new(email).map_err(|e| ApiError::Validation(e.to_string()))?;

      input.template_id = Some(REFERRAL_TEMPLATE_ID);
      let record = self.message_repository.insert(&input).await?;

      log_business_event!(
         event.category = event::category::MESSAGE,
         event.action = event::action::REFERRAL_CREATED,
         event.entity_type = event::entity_type::MESSAGE,
         event.entity_id = %record.id,
         event.result = event::result::SUCCESS,
         "紹介メッセージを作成しました"
      );

      self
         .dispatcher
         .dispatch_referral(record.id, &to)
         .await?
         .into_result()?;
      self.reload(record.id).await
   }

   async fn reload(&self, id: MessageId) -> Result<MessageRecord, ApiError> {
      self
         .message_repository
         .find_by_id(id)
         .await?
         .ok_or_else(|| ApiError::NotFound(format!("message が見つかりません: {id}")))
   }
}
