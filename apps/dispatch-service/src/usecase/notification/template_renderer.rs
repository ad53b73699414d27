//! # テンプレートレンダラー
//!
//! テンプレート本文のパターンを差し込み値で置き換える。
//!
//! ## 設計方針
//!
//! - **宣言順に適用**: フィールドはテンプレートの宣言順に 1 つずつ置換する
//! - **エスケープなし**: 置換結果に別フィールドのパターンが含まれていれば、
//!   後続のフィールドがそれも置換する
//! - **既定値**: 差し込み値にフィールド名がない場合はフィールドの既定値で置換する

use courier_domain::{
   message::MessageFields,
   template::{MessageTemplate, TemplateField},
};

/// メールチャネル向けのレンダリング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
   pub subject:   String,
   pub html_body: String,
   pub text_body: String,
}

/// テンプレートレンダラー
///
/// 状態を持たない。件名・HTML・テキスト・SMS の各本文に同じ差し込み値を
/// 独立して適用する。
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
   pub fn new() -> Self {
      Self
   }

   /// 1 つの本文に差し込みを適用する
   ///
   /// ```rust
   /// use std::collections::HashMap;
   ///
   /// use courier_dispatch_service::usecase::notification::TemplateRenderer;
   /// use courier_domain::{
   ///     message::MessageFields,
   ///     template::{TemplateField, TemplateFieldId},
   /// };
   ///
   /// let fields = [TemplateField::new(TemplateFieldId::new(1), "{{NAME}}", "name", "Friend").unwrap()];
   /// let values = MessageFields::new(HashMap::from([("name".to_string(), "Ann".to_string())]));
   ///
   /// let renderer = TemplateRenderer::new();
   /// assert_eq!(renderer.render("Hi {{NAME}}", &values, &fields), "Hi Ann");
   /// assert_eq!(renderer.render("Hi {{NAME}}", &MessageFields::default(), &fields), "Hi Friend");
   /// ```
   pub fn render(&self, body: &str, values: &MessageFields, fields: &[TemplateField]) -> String {
      fields.iter().fold(body.to_string(), |rendered, field| {
         let replacement = values
            .get(field.field_name())
            .unwrap_or_else(|| field.default_value());
         rendered.replace(field.pattern(), replacement)
      })
   }

   /// 件名・HTML 本文・テキスト本文をレンダリングする
   pub fn render_email(&self, template: &MessageTemplate, values: &MessageFields) -> RenderedEmail {
      let fields = template.fields();
      RenderedEmail {
         subject:   self.render(template.email_subject(), values, fields),
         html_body: self.render(template.html_body(), values, fields),
         text_body: self.render(template.text_body(), values, fields),
      }
   }

   /// SMS 本文をレンダリングする
   pub fn render_sms(&self, template: &MessageTemplate, values: &MessageFields) -> String {
      self.render(template.sms_body(), values, template.fields())
   }
}

#[cfg(test)]
mod tests {
   use std::collections::HashMap;

   use courier_domain::template::{TemplateBodies, TemplateFieldId, TemplateId};
   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;

   fn field(id: i64, pattern: &str, name: &str, default: &str) -> TemplateField {
      TemplateField::new(TemplateFieldId::new(id), pattern, name, default).unwrap()
   }

   fn values(pairs: &[(&str, &str)]) -> MessageFields {
      MessageFields::new(
         pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<HashMap<_, _>>(),
      )
   }

   #[rstest]
   #[case(&[("name", "Ann")], "Hi Ann")]
   #[case(&[], "Hi Friend")]
   #[case(&[("other", "x")], "Hi Friend")]
   #[case(&[("name", "")], "Hi ")]
   fn test_値があれば値で_なければ既定値で置換する(
      #[case] pairs: &[(&str, &str)],
      #[case] expected: &str,
   ) {
      let fields = [field(1, "{{NAME}}", "name", "Friend")];

      let rendered = TemplateRenderer::new().render("Hi {{NAME}}", &values(pairs), &fields);

      assert_eq!(rendered, expected);
   }

   #[test]
   fn test_パターンのすべての出現を置換する() {
      let fields = [field(1, "{{NAME}}", "name", "")];

      let rendered =
         TemplateRenderer::new().render("{{NAME}}, {{NAME}}!", &values(&[("name", "Ann")]), &fields);

      assert_eq!(rendered, "Ann, Ann!");
   }

   #[test]
   fn test_先のフィールドの値に含まれる後のパターンも置換される() {
      // A の値に B のパターンが含まれる → 宣言順に適用すると B でさらに置換される
      let fields = [field(1, "{{A}}", "a", ""), field(2, "{{B}}", "b", "")];
      let values = values(&[("a", "<{{B}}>"), ("b", "bee")]);

      let rendered = TemplateRenderer::new().render("{{A}} {{B}}", &values, &fields);

      assert_eq!(rendered, "<bee> bee");
   }

   #[test]
   fn test_後のフィールドの値に含まれる先のパターンは置換されない() {
      let fields = [field(1, "{{A}}", "a", ""), field(2, "{{B}}", "b", "")];
      let values = values(&[("a", "ay"), ("b", "<{{A}}>")]);

      let rendered = TemplateRenderer::new().render("{{A}} {{B}}", &values, &fields);

      assert_eq!(rendered, "ay <{{A}}>");
   }

   #[test]
   fn test_宣言順を入れ替えると結果が変わる() {
      let values = values(&[("a", "<{{B}}>"), ("b", "bee")]);
      let a = field(1, "{{A}}", "a", "");
      let b = field(2, "{{B}}", "b", "");

      let renderer = TemplateRenderer::new();
      let a_first = renderer.render("{{A}}", &values, &[a.clone(), b.clone()]);
      let b_first = renderer.render("{{A}}", &values, &[b, a]);

      assert_eq!(a_first, "<bee>");
      assert_eq!(b_first, "<{{B}}>");
   }

   #[test]
   fn test_html本文の値はエスケープされない() {
      let fields = [field(1, "{{NOTE}}", "note", "")];

      let rendered = TemplateRenderer::new().render(
         "<p>{{NOTE}}</p>",
         &values(&[("note", "<b>&</b>")]),
         &fields,
      );

      assert_eq!(rendered, "<p><b>&</b></p>");
   }

   #[test]
   fn test_render_emailとrender_smsは同じ差し込み値を各本文に適用する() {
      let template = MessageTemplate::new(
         TemplateId::new(1),
         "Welcome",
         TemplateBodies {
            email_subject: "Welcome {{NAME}}".to_string(),
            html_body:     "<h1>{{NAME}}</h1>".to_string(),
            text_body:     "Hello {{NAME}}".to_string(),
            sms_body:      "Hey {{NAME}}".to_string(),
         },
         vec![field(1, "{{NAME}}", "name", "Friend")],
      )
      .unwrap();
      let values = values(&[("name", "Ann")]);
      let renderer = TemplateRenderer::new();

      assert_eq!(
         renderer.render_email(&template, &values),
         RenderedEmail {
            subject:   "Welcome Ann".to_string(),
            html_body: "<h1>Ann</h1>".to_string(),
            text_body: "Hello Ann".to_string(),
         }
      );
      assert_eq!(renderer.render_sms(&template, &values), "Hey Ann");
   }
}
