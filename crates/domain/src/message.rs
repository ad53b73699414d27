//! # メッセージ
//!
//! 配信対象となるメッセージレコードと、その差し込み値を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`MessageRecord`] | メッセージ | テンプレート・送受信者・宛先・送信要求フラグ・送信日時 |
//! | [`SendFlag`] | 送信要求フラグ | `"Y"` のときだけそのチャネルで送信する |
//! | [`MessageFields`] | 差し込み値 | フィールド名 → 値の文字列マッピング |
//! | [`Channel`] | チャネル | メール / SMS（メール→SMS ゲートウェイ経由） |
//!
//! ## ライフサイクル
//!
//! メッセージは作成 API で登録された後に配信される。配信処理が変更するのは
//! `email_sent` / `sms_sent` の 2 つの送信日時だけで、送信に成功した後にのみ設定される。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    contact::{ContactEmailId, PhoneNumberId},
    template::TemplateId,
    user::UserId,
};

define_id! {
    /// メッセージ ID
    pub struct MessageId;
}

/// 配信チャネル
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

/// 送信要求フラグ（3 値）
///
/// 保存値は `"Y"` / `"N"` / NULL。`"Y"` 以外の値はすべて「送信しない」として扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum SendFlag {
    Yes,
    No,
    #[default]
    Unset,
}

impl SendFlag {
    /// 保存値から復元する
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("Y") => Self::Yes,
            Some("N") => Self::No,
            _ => Self::Unset,
        }
    }

    /// 保存値に変換する
    pub fn as_db(&self) -> Option<&'static str> {
        match self {
            Self::Yes => Some("Y"),
            Self::No => Some("N"),
            Self::Unset => None,
        }
    }

    /// このチャネルでの送信が要求されているか
    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<Option<String>> for SendFlag {
    fn from(value: Option<String>) -> Self {
        Self::from_db(value.as_deref())
    }
}

impl From<SendFlag> for Option<String> {
    fn from(flag: SendFlag) -> Self {
        flag.as_db().map(str::to_string)
    }
}

/// 差し込み値
///
/// フィールド名から値への文字列マッピング。メッセージには JSON 文字列として保存される。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageFields(HashMap<String, String>);

impl MessageFields {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self(values)
    }

    /// 保存された JSON 文字列を解釈する
    ///
    /// 文字列→文字列のオブジェクト以外（配列、数値を含むオブジェクト、NULL、空文字列など）は
    /// すべて `DomainError::BadData` とする。部分的な解釈は行わない。
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::BadData("差し込み値が設定されていません".to_string()))?;

        serde_json::from_str::<HashMap<String, String>>(raw)
            .map(Self)
            .map_err(|e| DomainError::BadData(format!("差し込み値を解釈できません: {e}")))
    }

    pub fn get(&self, field_name: &str) -> Option<&str> {
        self.0.get(field_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// メッセージレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id:           MessageId,
    pub template_id:  Option<TemplateId>,
    pub from_user_id: Option<UserId>,
    pub to_user_id:   Option<UserId>,
    pub to_email_id:  Option<ContactEmailId>,
    pub to_phone_id:  Option<PhoneNumberId>,
    pub send_email:   SendFlag,
    pub send_text:    SendFlag,
    /// 差し込み値（JSON 文字列のまま保持）
    pub fields:       Option<String>,
    pub email_sent:   Option<DateTime<Utc>>,
    pub sms_sent:     Option<DateTime<Utc>>,
    pub is_active:    bool,
    pub has_read:     bool,
}

impl MessageRecord {
    /// 差し込み値を解釈する
    pub fn parse_fields(&self) -> Result<MessageFields, DomainError> {
        MessageFields::parse(self.fields.as_deref())
    }

    /// チャネルの送信日時
    pub fn sent_at(&self, channel: Channel) -> Option<DateTime<Utc>> {
        match channel {
            Channel::Email => self.email_sent,
            Channel::Sms => self.sms_sent,
        }
    }

    /// チャネルの送信日時を記録する
    pub fn record_sent(&mut self, channel: Channel, at: DateTime<Utc>) {
        match channel {
            Channel::Email => self.email_sent = Some(at),
            Channel::Sms => self.sms_sent = Some(at),
        }
    }
}

/// メッセージ作成の入力
///
/// ID と送信日時はストアが管理するため含まない。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewMessage {
    pub template_id:  Option<TemplateId>,
    pub from_user_id: Option<UserId>,
    pub to_user_id:   Option<UserId>,
    pub to_email_id:  Option<ContactEmailId>,
    pub to_phone_id:  Option<PhoneNumberId>,
    #[serde(default)]
    pub send_email:   SendFlag,
    #[serde(default)]
    pub send_text:    SendFlag,
    pub fields:       Option<String>,
    #[serde(default = "default_active")]
    pub is_active:    bool,
}

fn default_active() -> bool {
    true
}

impl NewMessage {
    /// 採番済み ID からメッセージレコードを組み立てる
    pub fn into_record(self, id: MessageId) -> MessageRecord {
        MessageRecord {
            id,
            template_id: self.template_id,
            from_user_id: self.from_user_id,
            to_user_id: self.to_user_id,
            to_email_id: self.to_email_id,
            to_phone_id: self.to_phone_id,
            send_email: self.send_email,
            send_text: self.send_text,
            fields: self.fields,
            email_sent: None,
            sms_sent: None,
            is_active: self.is_active,
            has_read: false,
        }
    }
}
