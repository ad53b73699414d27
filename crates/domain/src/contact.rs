//! # 連絡先
//!
//! メッセージの宛先として参照される連絡先エンティティを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`ContactAddress`] | 連絡先メールアドレス | メールチャネルの宛先 |
//! | [`PhoneNumber`] | 電話番号 | SMS チャネルの宛先（携帯キャリアを参照） |
//! | [`Provider`] | 携帯キャリア | 電話番号をメール→SMS ゲートウェイのドメインに対応付ける |

use serde::{Deserialize, Serialize};

use crate::user::UserId;

define_id! {
    /// 連絡先メールアドレス ID
    pub struct ContactEmailId;
}

define_id! {
    /// 電話番号 ID
    pub struct PhoneNumberId;
}

define_id! {
    /// 携帯キャリア ID
    pub struct ProviderId;
}

/// 連絡先メールアドレス
///
/// アドレスは保存値をそのまま保持する。形式の検証は送信プロバイダに委ねる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAddress {
    pub id:            ContactEmailId,
    pub user_id:       Option<UserId>,
    pub email_address: String,
}

/// 電話番号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id:          PhoneNumberId,
    pub user_id:     Option<UserId>,
    /// 入力されたままの表記（"(555) 123-4567" など）
    pub telephone:   String,
    pub provider_id: Option<ProviderId>,
}

impl PhoneNumber {
    /// 数字以外を取り除いた番号を返す
    ///
    /// ```rust
    /// use courier_domain::contact::{PhoneNumber, PhoneNumberId};
    ///
    /// let phone = PhoneNumber {
    ///     id:          PhoneNumberId::new(1),
    ///     user_id:     None,
    ///     telephone:   "+1 (555) 123-4567".to_string(),
    ///     provider_id: None,
    /// };
    /// assert_eq!(phone.digits(), "15551234567");
    /// ```
    pub fn digits(&self) -> String {
        self.telephone.chars().filter(char::is_ascii_digit).collect()
    }
}

/// 携帯キャリア
///
/// `sms_email_domain` 宛てのメールは、キャリアによって SMS に変換されて端末に届く。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id:               ProviderId,
    pub name:             String,
    pub sms_email_domain: String,
}
