//! # MessageRepository
//!
//! メッセージレコードの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **送信日時の個別更新**: 配信処理が書き換えるのは `email_sent` / `sms_sent` のみ。
//!   チャネルごとに 1 列だけを UPDATE し、他方のチャネルの結果を上書きしない
//! - **ID は DB が採番**: `insert` は `RETURNING` で採番済みレコードを返す
//! - **ロックなし**: 同一メッセージへの同時配信は排他しない（後勝ちで送信日時が上書きされる）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_domain::{
   contact::{ContactEmailId, PhoneNumberId},
   message::{Channel, MessageId, MessageRecord, NewMessage, SendFlag},
   template::TemplateId,
   user::UserId,
};
use sqlx::PgPool;

use crate::error::InfraError;

/// メッセージリポジトリトレイト
#[async_trait]
pub trait MessageRepository: Send + Sync {
   /// ID でメッセージを検索
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some(record))`: メッセージが見つかった場合
   /// - `Ok(None)`: メッセージが見つからない場合
   /// - `Err(_)`: データベースエラー
   async fn find_by_id(&self, id: MessageId) -> Result<Option<MessageRecord>, InfraError>;

   /// メッセージを作成し、採番済みのレコードを返す
   ///
   /// 送信日時は常に未設定、既読フラグは `false` で作成される。
   async fn insert(&self, message: &NewMessage) -> Result<MessageRecord, InfraError>;

   /// 指定チャネルの送信日時を更新する
   ///
   /// 既に値が入っていても上書きする。
   async fn update_sent_timestamp(
      &self,
      id: MessageId,
      channel: Channel,
      sent_at: DateTime<Utc>,
   ) -> Result<(), InfraError>;
}

/// `messages` テーブルの行
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
   id:           i64,
   template_id:  Option<i64>,
   from_user_id: Option<i64>,
   to_user_id:   Option<i64>,
   to_email_id:  Option<i64>,
   to_phone_id:  Option<i64>,
   send_email:   Option<String>,
   send_text:    Option<String>,
   fields:       Option<String>,
   email_sent:   Option<DateTime<Utc>>,
   sms_sent:     Option<DateTime<Utc>>,
   is_active:    bool,
   has_read:     bool,
}

impl From<MessageRow> for MessageRecord {
   fn from(row: MessageRow) -> Self {
      Self {
         id:           MessageId::new(row.id),
         template_id:  row.template_id.map(TemplateId::new),
         from_user_id: row.from_user_id.map(UserId::new),
         to_user_id:   row.to_user_id.map(UserId::new),
         to_email_id:  row.to_email_id.map(ContactEmailId::new),
         to_phone_id:  row.to_phone_id.map(PhoneNumberId::new),
         send_email:   SendFlag::from_db(row.send_email.as_deref()),
         send_text:    SendFlag::from_db(row.send_text.as_deref()),
         fields:       row.fields,
         email_sent:   row.email_sent,
         sms_sent:     row.sms_sent,
         is_active:    row.is_active,
         has_read:     row.has_read,
      }
   }
}

const SELECT_COLUMNS: &str = r#"
   id, template_id, from_user_id, to_user_id, to_email_id, to_phone_id,
   send_email, send_text, fields, email_sent, sms_sent, is_active, has_read
"#;

/// 送信日時を更新する列名
fn sent_column(channel: Channel) -> &'static str {
   match channel {
      Channel::Email => "email_sent",
      Channel::Sms => "sms_sent",
   }
}

/// PostgreSQL 実装の MessageRepository
#[derive(Debug, Clone)]
pub struct PostgresMessageRepository {
   pool: PgPool,
}

impl PostgresMessageRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id(&self, id: MessageId) -> Result<Option<MessageRecord>, InfraError> {
      let sql = format!("SELECT {SELECT_COLUMNS} FROM messages WHERE id = $1");
      let row = sqlx::query_as::<_, MessageRow>(&sql)
         .bind(id.as_i64())
         .fetch_optional(&self.pool)
         .await?;

      Ok(row.map(MessageRecord::from))
   }

   #[tracing::instrument(skip_all, level = "debug")]
   async fn insert(&self, message: &NewMessage) -> Result<MessageRecord, InfraError> {
      let sql = format!(
         r#"
         INSERT INTO messages (
            template_id, from_user_id, to_user_id, to_email_id, to_phone_id,
            send_email, send_text, fields, is_active, has_read
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE)
         RETURNING {SELECT_COLUMNS}
         "#
      );
      let row = sqlx::query_as::<_, MessageRow>(&sql)
         .bind(message.template_id.map(|id| id.as_i64()))
         .bind(message.from_user_id.map(|id| id.as_i64()))
         .bind(message.to_user_id.map(|id| id.as_i64()))
         .bind(message.to_email_id.map(|id| id.as_i64()))
         .bind(message.to_phone_id.map(|id| id.as_i64()))
         .bind(message.send_email.as_db())
         .bind(message.send_text.as_db())
         .bind(message.fields.as_deref())
         .bind(message.is_active)
         .fetch_one(&self.pool)
         .await?;

      Ok(row.into())
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id, %channel))]
   async fn update_sent_timestamp(
      &self,
      id: MessageId,
      channel: Channel,
      sent_at: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      // 列名は Channel から静的に決まるため、値のみバインドする
      let sql = format!("UPDATE messages SET {} = $1 WHERE id = $2", sent_column(channel));
      let result = sqlx::query(&sql)
         .bind(sent_at)
         .bind(id.as_i64())
         .execute(&self.pool)
         .await?;

      if result.rows_affected() == 0 {
         return Err(InfraError::unexpected(format!(
            "送信日時を更新するメッセージが存在しません: {id}"
         )));
      }

      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn トレイトはsendとsyncを実装している() {
      fn assert_send_sync<T: Send + Sync>() {}
      assert_send_sync::<PostgresMessageRepository>();
   }

   #[test]
   fn test_チャネルごとに別の列を更新する() {
      assert_eq!(sent_column(Channel::Email), "email_sent");
      assert_eq!(sent_column(Channel::Sms), "sms_sent");
   }

   #[test]
   fn test_行からレコードへ変換するとsend_flagが復元される() {
      let row = MessageRow {
         id:           7,
         template_id:  Some(4),
         from_user_id: Some(1),
         to_user_id:   Some(2),
         to_email_id:  None,
         to_phone_id:  Some(3),
         send_email:   Some("Y".to_string()),
         send_text:    Some("N".to_string()),
         fields:       Some(r#"{"name":"Ann"}"#.to_string()),
         email_sent:   None,
         sms_sent:     None,
         is_active:    true,
         has_read:     false,
      };

      let record = MessageRecord::from(row);

      assert_eq!(record.id, MessageId::new(7));
      assert_eq!(record.template_id, Some(TemplateId::new(4)));
      assert_eq!(record.to_email_id, None);
      assert_eq!(record.to_phone_id, Some(PhoneNumberId::new(3)));
      assert_eq!(record.send_email, SendFlag::Yes);
      assert_eq!(record.send_text, SendFlag::No);
   }
}
