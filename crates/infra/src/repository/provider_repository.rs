//! # ProviderRepository
//!
//! 携帯キャリアとメール→SMS ゲートウェイドメインの対応を読み出すリポジトリ。

use async_trait::async_trait;
use courier_domain::contact::{Provider, ProviderId};
use sqlx::PgPool;

use crate::error::InfraError;

/// キャリアリポジトリトレイト
#[async_trait]
pub trait ProviderRepository: Send + Sync {
   /// ID でキャリアを検索
   async fn find_by_id(&self, id: ProviderId) -> Result<Option<Provider>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ProviderRow {
   id:               i64,
   name:             String,
   sms_email_domain: String,
}

/// PostgreSQL 実装の ProviderRepository
#[derive(Debug, Clone)]
pub struct PostgresProviderRepository {
   pool: PgPool,
}

impl PostgresProviderRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl ProviderRepository for PostgresProviderRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id(&self, id: ProviderId) -> Result<Option<Provider>, InfraError> {
      let row = sqlx::query_as::<_, ProviderRow>(
         r#"
         SELECT id, name, sms_email_domain
         FROM providers
         WHERE id = $1
         "#,
      )
      .bind(id.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      Ok(row.map(|r| Provider {
         id:               ProviderId::new(r.id),
         name:             r.name,
         sms_email_domain: r.sms_email_domain,
      }))
   }
}
