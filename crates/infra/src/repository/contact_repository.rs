//! # ContactRepository
//!
//! 宛先メールアドレスと電話番号の読み出しを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **アドレスは検証しない**: 保存値をそのまま返し、送信可否はプロバイダに委ねる
//! - **電話番号は生の表記で返す**: 数字以外の除去は [`PhoneNumber::digits`] の責務

use async_trait::async_trait;
use courier_domain::{
   contact::{ContactAddress, ContactEmailId, PhoneNumber, PhoneNumberId, ProviderId},
   user::UserId,
};
use sqlx::PgPool;

use crate::error::InfraError;

/// 連絡先リポジトリトレイト
#[async_trait]
pub trait ContactRepository: Send + Sync {
   /// ID で宛先メールアドレスを検索
   async fn find_email_by_id(
      &self,
      id: ContactEmailId,
   ) -> Result<Option<ContactAddress>, InfraError>;

   /// ID で電話番号を検索
   async fn find_phone_by_id(&self, id: PhoneNumberId) -> Result<Option<PhoneNumber>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ContactEmailRow {
   id:            i64,
   user_id:       Option<i64>,
   email_address: String,
}

impl From<ContactEmailRow> for ContactAddress {
   fn from(row: ContactEmailRow) -> Self {
      Self {
         id:            ContactEmailId::new(row.id),
         user_id:       row.user_id.map(UserId::new),
         email_address: row.email_address,
      }
   }
}

#[derive(Debug, sqlx::FromRow)]
struct PhoneNumberRow {
   id:          i64,
   user_id:     Option<i64>,
   telephone:   String,
   provider_id: Option<i64>,
}

impl From<PhoneNumberRow> for PhoneNumber {
   fn from(row: PhoneNumberRow) -> Self {
      Self {
         id:          PhoneNumberId::new(row.id),
         user_id:     row.user_id.map(UserId::new),
         telephone:   row.telephone,
         provider_id: row.provider_id.map(ProviderId::new),
      }
   }
}

/// PostgreSQL 実装の ContactRepository
#[derive(Debug, Clone)]
pub struct PostgresContactRepository {
   pool: PgPool,
}

impl PostgresContactRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_email_by_id(
      &self,
      id: ContactEmailId,
   ) -> Result<Option<ContactAddress>, InfraError> {
      let row = sqlx::query_as::<_, ContactEmailRow>(
         r#"
         SELECT id, user_id, email_address
         FROM contact_emails
         WHERE id = $1
         "#,
      )
      .bind(id.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      Ok(row.map(ContactAddress::from))
   }

   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_phone_by_id(&self, id: PhoneNumberId) -> Result<Option<PhoneNumber>, InfraError> {
      let row = sqlx::query_as::<_, PhoneNumberRow>(
         r#"
         SELECT id, user_id, telephone, provider_id
         FROM phone_numbers
         WHERE id = $1
         "#,
      )
      .bind(id.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      Ok(row.map(PhoneNumber::from))
   }
}
