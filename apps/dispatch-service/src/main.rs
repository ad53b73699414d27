//! # Dispatch Service サーバー
//!
//! 保存済みメッセージをテンプレートで描画し、メールと SMS（メール→SMS ゲートウェイ）で
//! 配信する内部サービス。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DISPATCH_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `DISPATCH_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `sendgrid` / `smtp` / `ses` / `noop`（デフォルト: `noop`） |
//! | `SENDGRID_API_KEY` | backend=sendgrid のとき | SendGrid API キー |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! その他の項目は [`courier_dispatch_service::config`] を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! DISPATCH_PORT=13010 DATABASE_URL=postgres://localhost/courier \
//!   cargo run -p courier-dispatch-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use courier_dispatch_service::{
   config::{DispatchConfig, NotificationBackend, NotificationConfig},
   handler::{MessageState, router},
   usecase::{
      MessageUseCaseImpl,
      notification::{DispatchRepositories, EmailSender, MessageDispatcher, SmsSender},
   },
};
use courier_domain::clock::SystemClock;
use courier_infra::{
   NotificationSender,
   db,
   notification::{
      NoopNotificationSender,
      SendGridConfig,
      SendGridNotificationSender,
      SesNotificationSender,
      SmtpNotificationSender,
   },
   repository::{
      PostgresContactRepository,
      PostgresMessageRepository,
      PostgresProviderRepository,
      PostgresTemplateRepository,
      PostgresUserRepository,
   },
};
use courier_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
   dotenvy::dotenv().ok();

   init_tracing(TracingConfig::from_env("dispatch-service"));

   let config = DispatchConfig::from_env().context("設定の読み込みに失敗しました")?;

   tracing::info!(
      "Dispatch Service サーバーを起動します: {}:{}",
      config.host,
      config.port
   );

   let pool = db::create_pool(&config.database_url)
      .await
      .context("データベース接続に失敗しました")?;
   db::run_migrations(&pool)
      .await
      .context("マイグレーションの適用に失敗しました")?;
   tracing::info!("データベースに接続しました");

   let sender = build_sender(&config.notification).await?;

   let message_repository = Arc::new(PostgresMessageRepository::new(pool.clone()));
   let dispatcher = MessageDispatcher::new(
      DispatchRepositories {
         messages:  message_repository.clone(),
         templates: Arc::new(PostgresTemplateRepository::new(pool.clone())),
         users:     Arc::new(PostgresUserRepository::new(pool.clone())),
         contacts:  Arc::new(PostgresContactRepository::new(pool.clone())),
         providers: Arc::new(PostgresProviderRepository::new(pool.clone())),
      },
      EmailSender::new(sender.clone(), config.notification.from_address.clone()),
      SmsSender::new(sender, config.notification.sms_from_address.clone()),
      Arc::new(SystemClock),
   );
   let message_state = Arc::new(MessageState {
      usecase: MessageUseCaseImpl::new(message_repository, dispatcher),
   });

   let app = router(message_state).layer(TraceLayer::new_for_http());

   let addr: SocketAddr = format!("{}:{}", config.host, config.port)
      .parse()
      .context("アドレスのパースに失敗しました")?;

   let listener = TcpListener::bind(addr).await?;
   tracing::info!("Dispatch Service サーバーが起動しました: {}", addr);

   axum::serve(listener, app).await?;

   Ok(())
}

/// 設定された送信バックエンドを構築する
async fn build_sender(config: &NotificationConfig) -> anyhow::Result<Arc<dyn NotificationSender>> {
   let backend: &'static str = config.backend.into();
   tracing::info!(backend, "送信バックエンドを初期化します");

   let sender: Arc<dyn NotificationSender> = match config.backend {
      NotificationBackend::SendGrid => {
         let api_key = config
            .sendgrid_api_key
            .clone()
            .context("SENDGRID_API_KEY が設定されていません")?;
         Arc::new(SendGridNotificationSender::new(SendGridConfig {
            api_key,
            base_url: config.sendgrid_base_url.clone(),
            timeout: config.timeout,
         })?)
      }
      NotificationBackend::Smtp => Arc::new(SmtpNotificationSender::new(
         &config.smtp_host,
         config.smtp_port,
      )),
      NotificationBackend::Ses => {
         let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
         Arc::new(SesNotificationSender::new(aws_sdk_sesv2::Client::new(
            &aws_config,
         )))
      }
      NotificationBackend::Noop => Arc::new(NoopNotificationSender),
   };

   Ok(sender)
}
