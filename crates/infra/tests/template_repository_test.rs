//! TemplateRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://localhost/courier cargo test -p courier-infra --test template_repository_test
//! ```

use courier_domain::template::{REFERRAL_TEMPLATE_ID, TemplateId};
use courier_infra::repository::{PostgresTemplateRepository, TemplateRepository};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

/// フィールドを id の降順で INSERT したテンプレートを作成する
async fn setup_template(pool: &PgPool) -> TemplateId {
   let template_id: i64 = sqlx::query_scalar(
      r#"
      INSERT INTO message_templates (name, email_subject, html_body, text_body, sms_body)
      VALUES ('Welcome', 'Welcome {{A}}', '<p>{{A}} {{B}}</p>', '{{A}} {{B}}', '{{C}}')
      RETURNING id
      "#,
   )
   .fetch_one(pool)
   .await
   .expect("テンプレート作成に失敗");

   for (id, pattern, field_name) in [
      (103_i64, "{{C}}", "c"),
      (101, "{{A}}", "a"),
      (102, "{{B}}", "b"),
   ] {
      sqlx::query(
         r#"
         INSERT INTO message_template_fields (id, template_id, pattern, field_name, default_value)
         VALUES ($1, $2, $3, $4, '')
         "#,
      )
      .bind(id)
      .bind(template_id)
      .bind(pattern)
      .bind(field_name)
      .execute(pool)
      .await
      .expect("フィールド作成に失敗");
   }

   TemplateId::new(template_id)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_フィールドはid順で取得される(pool: PgPool) {
   let id = setup_template(&pool).await;
   let repo = PostgresTemplateRepository::new(pool);

   let template = repo.find_by_id(id).await.unwrap().unwrap();

   let patterns: Vec<&str> = template.fields().iter().map(|f| f.pattern()).collect();
   assert_eq!(patterns, vec!["{{A}}", "{{B}}", "{{C}}"]);
   assert_eq!(template.name(), "Welcome");
   assert_eq!(template.html_body(), "<p>{{A}} {{B}}</p>");
   assert_eq!(template.sms_body(), "{{C}}");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_紹介テンプレートがシードされている(pool: PgPool) {
   let repo = PostgresTemplateRepository::new(pool);

   let template = repo.find_by_id(REFERRAL_TEMPLATE_ID).await.unwrap().unwrap();

   let names: Vec<&str> = template.fields().iter().map(|f| f.field_name()).collect();
   assert_eq!(names, vec!["fromName", "note"]);
   assert_eq!(template.fields()[0].default_value(), "A friend");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_フィールドのないテンプレートも取得できる(pool: PgPool) {
   let id: i64 = sqlx::query_scalar(
      "INSERT INTO message_templates (name) VALUES ('Empty') RETURNING id",
   )
   .fetch_one(&pool)
   .await
   .unwrap();
   let repo = PostgresTemplateRepository::new(pool);

   let template = repo.find_by_id(TemplateId::new(id)).await.unwrap().unwrap();

   assert!(template.fields().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しないテンプレートはnoneを返す(pool: PgPool) {
   let repo = PostgresTemplateRepository::new(pool);

   let found = repo.find_by_id(TemplateId::new(999_999)).await.unwrap();

   assert!(found.is_none());
}
