//! # Dispatch Service 設定
//!
//! 環境変数から配信サービスの設定を読み込む。
//!
//! 設定は起動時に一度だけ組み立て、送信処理の構築時に明示的に渡す。
//! 送信元アドレスや API キーをグローバルに保持しない。

use std::{env, time::Duration};

use strum::{EnumString, IntoStaticStr};
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
   /// 必須の環境変数が未設定
   #[error("{0} が設定されていません")]
   Missing(&'static str),

   /// 値を解釈できない
   #[error("{name} の値が不正です: {value}")]
   Invalid { name: &'static str, value: String },

   /// 未知の送信バックエンド
   #[error("NOTIFICATION_BACKEND の値が不正です（sendgrid | smtp | ses | noop）: {0}")]
   UnknownBackend(String),
}

/// 送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationBackend {
   /// SendGrid Web API（本番）
   SendGrid,
   /// SMTP（Mailpit 開発用）
   Smtp,
   /// Amazon SES v2
   Ses,
   /// 送信しない（ログ出力のみ）
   Noop,
}

/// Dispatch Service サーバーの設定
#[derive(Debug, Clone)]
pub struct DispatchConfig {
   /// バインドアドレス
   pub host:         String,
   /// ポート番号
   pub port:         u16,
   /// データベース接続 URL
   pub database_url: String,
   /// 通知設定
   pub notification: NotificationConfig,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える。
#[derive(Debug, Clone)]
pub struct NotificationConfig {
   /// 送信バックエンド
   pub backend:           NotificationBackend,
   /// メールチャネルの送信元アドレス
   pub from_address:      String,
   /// SMS（メール→SMS ゲートウェイ）の送信元アドレス
   pub sms_from_address:  String,
   /// SendGrid API キー（backend=sendgrid の場合は必須）
   pub sendgrid_api_key:  Option<String>,
   /// SendGrid API のベース URL
   pub sendgrid_base_url: String,
   /// プロバイダ呼び出しのタイムアウト
   pub timeout:           Duration,
   /// SMTP ホスト（backend=smtp の場合に使用）
   pub smtp_host:         String,
   /// SMTP ポート（backend=smtp の場合に使用）
   pub smtp_port:         u16,
}

impl DispatchConfig {
   /// 環境変数から設定を読み込む
   pub fn from_env() -> Result<Self, ConfigError> {
      Self::from_lookup(|name| env::var(name).ok())
   }

   /// 任意の参照関数から設定を読み込む
   ///
   /// 空文字列は未設定として扱う。
   pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
      let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

      let port = get("DISPATCH_PORT").ok_or(ConfigError::Missing("DISPATCH_PORT"))?;

      Ok(Self {
         host:         get("DISPATCH_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
         port:         parse_number("DISPATCH_PORT", &port)?,
         database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
         notification: NotificationConfig::from_lookup(&get)?,
      })
   }
}

impl NotificationConfig {
   fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
      let backend = match get("NOTIFICATION_BACKEND") {
         Some(value) => value
            .trim()
            .to_ascii_lowercase()
            .parse::<NotificationBackend>()
            .map_err(|_| ConfigError::UnknownBackend(value))?,
         None => NotificationBackend::Noop,
      };

      let sendgrid_api_key = get("SENDGRID_API_KEY");
      if backend == NotificationBackend::SendGrid && sendgrid_api_key.is_none() {
         return Err(ConfigError::Missing("SENDGRID_API_KEY"));
      }

      let timeout_secs = match get("NOTIFICATION_TIMEOUT_SECS") {
         Some(value) => parse_number("NOTIFICATION_TIMEOUT_SECS", &value)?,
         None => 10,
      };

      let smtp_port = match get("SMTP_PORT") {
         Some(value) => parse_number("SMTP_PORT", &value)?,
         None => 1025,
      };

      Ok(Self {
         backend,
         from_address: get("NOTIFICATION_FROM_ADDRESS")
            .unwrap_or_else(|| "noreply@courier.example.com".to_string()),
         sms_from_address: get("NOTIFICATION_SMS_FROM_ADDRESS")
            .unwrap_or_else(|| "admin@courier.example.com".to_string()),
         sendgrid_api_key,
         sendgrid_base_url: get("SENDGRID_BASE_URL")
            .unwrap_or_else(|| "https://api.sendgrid.com".to_string()),
         timeout: Duration::from_secs(timeout_secs),
         smtp_host: get("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
         smtp_port,
      })
   }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
   value.trim().parse().map_err(|_| ConfigError::Invalid {
      name,
      value: value.to_string(),
   })
}
