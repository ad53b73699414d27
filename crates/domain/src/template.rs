//! # メッセージテンプレート
//!
//! チャネルごとの本文と、差し込みフィールドの置換ルールを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`MessageTemplate`] | テンプレート | 件名・HTML 本文・テキスト本文・SMS 本文の 4 つの本文 |
//! | [`TemplateField`] | 差し込みフィールド | パターン（本文中のリテラル）、フィールド名、デフォルト値 |
//!
//! ## 不変条件
//!
//! - パターンは空文字列ではない
//! - 1 つのテンプレート内でパターンは重複しない
//! - フィールドは宣言順を保持する（置換はこの順で行われる）

use serde::{Deserialize, Serialize};

use crate::DomainError;

define_id! {
    /// テンプレート ID
    pub struct TemplateId;
}

define_id! {
    /// 差し込みフィールド ID
    pub struct TemplateFieldId;
}

/// 紹介メール用のテンプレート ID
///
/// 紹介送信では、リクエストで指定されたテンプレートに関わらずこの ID を使う。
pub const REFERRAL_TEMPLATE_ID: TemplateId = TemplateId::new(4);

/// 差し込みフィールド
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    id:            TemplateFieldId,
    pattern:       String,
    field_name:    String,
    default_value: String,
}

impl TemplateField {
    /// 差し込みフィールドを作成する
    ///
    /// 空のパターンは本文のすべての文字間に一致してしまうため拒否する。
    pub fn new(
        id: TemplateFieldId,
        pattern: impl Into<String>,
        field_name: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(DomainError::Validation(format!(
                "差し込みフィールド {id} のパターンが空です"
            )));
        }

        Ok(Self {
            id,
            pattern,
            field_name: field_name.into(),
            default_value: default_value.into(),
        })
    }

    pub fn id(&self) -> TemplateFieldId {
        self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }
}

/// テンプレートの本文
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateBodies {
    pub email_subject: String,
    pub html_body:     String,
    pub text_body:     String,
    pub sms_body:      String,
}

/// メッセージテンプレート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    id:     TemplateId,
    name:   String,
    bodies: TemplateBodies,
    fields: Vec<TemplateField>,
}

impl MessageTemplate {
    /// テンプレートを作成する
    ///
    /// `fields` は宣言順に渡すこと。パターンが重複している場合はエラーとする。
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        bodies: TemplateBodies,
        fields: Vec<TemplateField>,
    ) -> Result<Self, DomainError> {
        for (index, field) in fields.iter().enumerate() {
            if fields[..index]
                .iter()
                .any(|earlier| earlier.pattern() == field.pattern())
            {
                return Err(DomainError::Validation(format!(
                    "テンプレート {id} でパターン {} が重複しています",
                    field.pattern()
                )));
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            bodies,
            fields,
        })
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email_subject(&self) -> &str {
        &self.bodies.email_subject
    }

    pub fn html_body(&self) -> &str {
        &self.bodies.html_body
    }

    pub fn text_body(&self) -> &str {
        &self.bodies.text_body
    }

    pub fn sms_body(&self) -> &str {
        &self.bodies.sms_body
    }

    /// 差し込みフィールド（宣言順）
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn field(id: i64, pattern: &str, name: &str) -> TemplateField {
        TemplateField::new(TemplateFieldId::new(id), pattern, name, "").unwrap()
    }

    #[test]
    fn test_空のパターンは拒否される() {
        let result = TemplateField::new(TemplateFieldId::new(1), "", "name", "Friend");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_重複したパターンを持つテンプレートは作成できない() {
        let result = MessageTemplate::new(
            TemplateId::new(1),
            "welcome",
            TemplateBodies::default(),
            vec![field(1, "{{NAME}}", "name"), field(2, "{{NAME}}", "nickname")],
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_フィールドは宣言順で保持される() {
        let template = MessageTemplate::new(
            TemplateId::new(1),
            "welcome",
            TemplateBodies::default(),
            vec![
                field(3, "{{B}}", "b"),
                field(1, "{{A}}", "a"),
                field(2, "{{C}}", "c"),
            ],
        )
        .unwrap();

        let patterns: Vec<&str> = template.fields().iter().map(|f| f.pattern()).collect();
        assert_eq!(patterns, vec!["{{B}}", "{{A}}", "{{C}}"]);
    }

    #[test]
    fn test_紹介テンプレートidは4() {
        assert_eq!(REFERRAL_TEMPLATE_ID.as_i64(), 4);
    }
}
