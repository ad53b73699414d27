//! # UserRepository
//!
//! 送信者・受信者の氏名を読み出すリポジトリ。
//!
//! 配信処理では表示名の組み立てにのみ使用する。

use async_trait::async_trait;
use courier_domain::user::{User, UserId};
use sqlx::PgPool;

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
   /// ID でユーザーを検索
   async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
   id:         i64,
   first_name: String,
   last_name:  String,
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
   pool: PgPool,
}

impl PostgresUserRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id(&self, id: UserId) -> Result<Option<User>, InfraError> {
      let row = sqlx::query_as::<_, UserRow>(
         r#"
         SELECT id, first_name, last_name
         FROM users
         WHERE id = $1
         "#,
      )
      .bind(id.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      Ok(row.map(|r| User::new(UserId::new(r.id), r.first_name, r.last_name)))
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn トレイトはsendとsyncを実装している() {
      fn assert_send_sync<T: Send + Sync>() {}
      assert_send_sync::<PostgresUserRepository>();
   }
}
