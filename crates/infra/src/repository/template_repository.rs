//! # TemplateRepository
//!
//! メッセージテンプレートと差し込みフィールドの読み出しを担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **宣言順の保証**: 差し込みは順序に依存するため、フィールドは `ORDER BY id` で取得する
//! - **読み取り専用**: テンプレートの作成・編集は配信サービスの責務ではない

use async_trait::async_trait;
use courier_domain::template::{
   MessageTemplate,
   TemplateBodies,
   TemplateField,
   TemplateFieldId,
   TemplateId,
};
use sqlx::PgPool;

use crate::error::InfraError;

/// テンプレートリポジトリトレイト
#[async_trait]
pub trait TemplateRepository: Send + Sync {
   /// ID でテンプレートを検索
   ///
   /// 差し込みフィールドは宣言順に並んだ状態で返す。
   async fn find_by_id(&self, id: TemplateId) -> Result<Option<MessageTemplate>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
   id:            i64,
   name:          String,
   email_subject: String,
   html_body:     String,
   text_body:     String,
   sms_body:      String,
}

#[derive(Debug, sqlx::FromRow)]
struct TemplateFieldRow {
   id:            i64,
   pattern:       String,
   field_name:    String,
   default_value: String,
}

/// 行データからテンプレートを組み立てる
///
/// 空パターンや重複パターンなどドメインの不変条件を満たさない場合は
/// `InvalidData` を返す。
fn build_template(
   row: TemplateRow,
   field_rows: Vec<TemplateFieldRow>,
) -> Result<MessageTemplate, InfraError> {
   let fields = field_rows
      .into_iter()
      .map(|f| {
         TemplateField::new(
            TemplateFieldId::new(f.id),
            f.pattern,
            f.field_name,
            f.default_value,
         )
      })
      .collect::<Result<Vec<_>, _>>()?;

   let bodies = TemplateBodies {
      email_subject: row.email_subject,
      html_body:     row.html_body,
      text_body:     row.text_body,
      sms_body:      row.sms_body,
   };

   Ok(MessageTemplate::new(
      TemplateId::new(row.id),
      row.name,
      bodies,
      fields,
   )?)
}

/// PostgreSQL 実装の TemplateRepository
#[derive(Debug, Clone)]
pub struct PostgresTemplateRepository {
   pool: PgPool,
}

impl PostgresTemplateRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
   #[tracing::instrument(skip_all, level = "debug", fields(%id))]
   async fn find_by_id(&self, id: TemplateId) -> Result<Option<MessageTemplate>, InfraError> {
      let row = sqlx::query_as::<_, TemplateRow>(
         r#"
         SELECT id, name, email_subject, html_body, text_body, sms_body
         FROM message_templates
         WHERE id = $1
         "#,
      )
      .bind(id.as_i64())
      .fetch_optional(&self.pool)
      .await?;

      let Some(row) = row else {
         return Ok(None);
      };

      let field_rows = sqlx::query_as::<_, TemplateFieldRow>(
         r#"
         SELECT id, pattern, field_name, default_value
         FROM message_template_fields
         WHERE template_id = $1
         ORDER BY id
         "#,
      )
      .bind(id.as_i64())
      .fetch_all(&self.pool)
      .await?;

      build_template(row, field_rows).map(Some)
   }
}
