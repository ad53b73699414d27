//! # メッセージハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /message?id=` - メッセージ取得
//! - `POST /message` - メッセージ作成（送信はしない）
//! - `PUT /message/send?id=` - 保存済みメッセージの送信
//! - `POST /message/send/referral?email=` - 紹介メールの作成と送信
//! - `GET /message/ping?pingText=` - 疎通確認（文字列を反転して返す）

use std::sync::Arc;

use axum::{
   Json,
   extract::{Query, State},
   http::StatusCode,
   response::IntoResponse,
};
use courier_domain::message::{MessageId, NewMessage};
use courier_shared::ApiResponse;
use serde::Deserialize;

use crate::{error::ApiError, usecase::MessageUseCaseImpl};

/// メッセージ API の共有状態
pub struct MessageState {
   pub usecase: MessageUseCaseImpl,
}

/// 取得・送信対象のメッセージ ID
#[derive(Debug, Deserialize)]
pub struct MessageIdQuery {
   pub id: i64,
}

/// 紹介メールの宛先
#[derive(Debug, Deserialize)]
pub struct ReferralQuery {
   pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingQuery {
   pub ping_text: String,
}

/// GET /message?id=
pub async fn get_message(
   State(state): State<Arc<MessageState>>,
   Query(query): Query<MessageIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
   let record = state
      .usecase
      .get_message(MessageId::new(query.id))
      .await?;
   Ok((StatusCode::OK, Json(ApiResponse::new(record))))
}

/// POST /message
pub async fn create_message(
   State(state): State<Arc<MessageState>>,
   Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
   let record = state.usecase.create_message(body).await?;
   Ok((StatusCode::CREATED, Json(ApiResponse::new(record))))
}

/// PUT /message/send?id=
///
/// 要求されたチャネルで送信し、送信日時を反映したメッセージを返す。
pub async fn send_message(
   State(state): State<Arc<MessageState>>,
   Query(query): Query<MessageIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
   let record = state
      .usecase
      .send_message(MessageId::new(query.id))
      .await?;
   Ok((StatusCode::OK, Json(ApiResponse::new(record))))
}

/// POST /message/send/referral?email=
///
/// 本文のテンプレート指定は無視し、紹介用テンプレートで作成してから送信する。
pub async fn send_referral(
   State(state): State<Arc<MessageState>>,
   Query(query): Query<ReferralQuery>,
   Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
   let record = state.usecase.send_referral(body, &query.email).await?;
   Ok((StatusCode::OK, Json(ApiResponse::new(record))))
}

/// GET /message/ping?pingText=
pub async fn ping(Query(query): Query<PingQuery>) -> impl IntoResponse {
   let reversed: String = query.ping_text.chars().rev().collect();
   Json(ApiResponse::new(reversed))
}

#[cfg(test)]
mod tests {
   use axum::{
      Router,
      body::Body,
      http::{Method, Request},
   };
   use chrono::{DateTime, TimeZone, Utc};
   use courier_domain::{
      clock::FixedClock,
      contact::{ContactAddress, ContactEmailId},
      message::{MessageRecord, SendFlag},
      template::{MessageTemplate, REFERRAL_TEMPLATE_ID, TemplateBodies},
      user::{User, UserId},
   };
   use courier_infra::mock::{
      MockContactRepository,
      MockMessageRepository,
      MockNotificationSender,
      MockProviderRepository,
      MockTemplateRepository,
      MockUserRepository,
   };
   use courier_shared::ErrorResponse;
   use pretty_assertions::assert_eq;
   use tower::ServiceExt;

   use super::*;
   use crate::{
      handler::router,
      usecase::notification::{DispatchRepositories, EmailSender, MessageDispatcher, SmsSender},
   };

   fn t0() -> DateTime<Utc> {
      Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
   }

   fn create_test_app(messages: MockMessageRepository, sender: MockNotificationSender) -> Router {
      let templates = MockTemplateRepository::new();
      templates.add_template(
         MessageTemplate::new(
            REFERRAL_TEMPLATE_ID,
            "Referral",
            TemplateBodies {
               email_subject: "Join me".to_string(),
               html_body:     "<p>Join me</p>".to_string(),
               text_body:     "Join me".to_string(),
               sms_body:      "Join me".to_string(),
            },
            vec![],
         )
         .unwrap(),
      );
      let users = MockUserRepository::new();
      users.add_user(User::new(UserId::new(1), "Bob", "Smith"));
      users.add_user(User::new(UserId::new(2), "Ann", "Lee"));
      let contacts = MockContactRepository::new();
      contacts.add_email(ContactAddress {
         id:            ContactEmailId::new(10),
         user_id:       Some(UserId::new(2)),
         email_address: "ann@example.com".to_string(),
      });

      let sender = Arc::new(sender);
      let dispatcher = MessageDispatcher::new(
         DispatchRepositories {
            messages:  Arc::new(messages.clone()),
            templates: Arc::new(templates),
            users:     Arc::new(users),
            contacts:  Arc::new(contacts),
            providers: Arc::new(MockProviderRepository::new()),
         },
         EmailSender::new(sender.clone(), "noreply@courier.example.com"),
         SmsSender::new(sender, "admin@courier.example.com"),
         Arc::new(FixedClock::new(t0())),
      );

      router(Arc::new(MessageState {
         usecase: MessageUseCaseImpl::new(Arc::new(messages), dispatcher),
      }))
   }

   async fn response_body<T: serde::de::DeserializeOwned>(
      response: axum::http::Response<Body>,
   ) -> T {
      let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      serde_json::from_slice(&bytes).unwrap()
   }

   fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
      Request::builder()
         .method(method)
         .uri(uri)
         .header("content-type", "application/json")
         .body(Body::from(body.to_string()))
         .unwrap()
   }

   fn email_message(messages: &MockMessageRepository) -> MessageId {
      let id = MessageId::new(7);
      messages.add_message(
         NewMessage {
            template_id: Some(REFERRAL_TEMPLATE_ID),
            from_user_id: Some(UserId::new(1)),
            to_user_id: Some(UserId::new(2)),
            to_email_id: Some(ContactEmailId::new(10)),
            send_email: SendFlag::Yes,
            fields: Some("{}".to_string()),
            ..Default::default()
         }
         .into_record(id),
      );
      id
   }

   #[tokio::test]
   async fn test_post_messageで作成したメッセージを返す() {
      // Given
      let messages = MockMessageRepository::new();
      let sut = create_test_app(messages.clone(), MockNotificationSender::new());
      let request = json_request(
         Method::POST,
         "/message",
         serde_json::json!({
            "template_id": 4,
            "from_user_id": 1,
            "send_email": "Y",
            "send_text": "N",
            "fields": "{\"note\":\"hi\"}"
         }),
      );

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::CREATED);
      let body: ApiResponse<MessageRecord> = response_body(response).await;
      assert_eq!(body.data.id, MessageId::new(1));
      assert_eq!(body.data.send_email, SendFlag::Yes);
      assert_eq!(body.data.send_text, SendFlag::No);
      assert_eq!(messages.messages().len(), 1);
   }

   #[tokio::test]
   async fn test_get_messageで保存済みメッセージを返す() {
      // Given
      let messages = MockMessageRepository::new();
      let id = email_message(&messages);
      let sender = MockNotificationSender::new();
      let sut = create_test_app(messages, sender.clone());
      let request = Request::builder()
         .method(Method::GET)
         .uri(format!("/message?id={id}"))
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::OK);
      let body: ApiResponse<MessageRecord> = response_body(response).await;
      assert_eq!(body.data.id, id);
      assert_eq!(body.data.to_email_id, Some(ContactEmailId::new(10)));
      assert_eq!(body.data.email_sent, None);
      assert!(sender.sent_emails().is_empty());
   }

   #[tokio::test]
   async fn test_get_messageで存在しないメッセージは404() {
      // Given
      let sut = create_test_app(MockMessageRepository::new(), MockNotificationSender::new());
      let request = Request::builder()
         .method(Method::GET)
         .uri("/message?id=999")
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::NOT_FOUND);
      let body: ErrorResponse = response_body(response).await;
      assert!(body.detail.contains("999"));
   }

   #[tokio::test]
   async fn test_put_message_sendで送信日時付きのメッセージを返す() {
      // Given
      let messages = MockMessageRepository::new();
      let id = email_message(&messages);
      let sender = MockNotificationSender::new();
      let sut = create_test_app(messages, sender.clone());
      let request = Request::builder()
         .method(Method::PUT)
         .uri(format!("/message/send?id={id}"))
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::OK);
      let body: ApiResponse<MessageRecord> = response_body(response).await;
      assert_eq!(body.data.email_sent, Some(t0()));
      assert_eq!(sender.sent_emails().len(), 1);
   }

   #[tokio::test]
   async fn test_put_message_sendでプロバイダが拒否すると502() {
      // Given
      let messages = MockMessageRepository::new();
      let id = email_message(&messages);
      let sender = MockNotificationSender::new();
      sender.fail_for("ann@example.com");
      let sut = create_test_app(messages, sender);
      let request = Request::builder()
         .method(Method::PUT)
         .uri(format!("/message/send?id={id}"))
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
      let body: ErrorResponse = response_body(response).await;
      assert!(body.detail.contains("email"));
   }

   #[tokio::test]
   async fn test_put_message_sendで存在しないメッセージは404() {
      // Given
      let sut = create_test_app(MockMessageRepository::new(), MockNotificationSender::new());
      let request = Request::builder()
         .method(Method::PUT)
         .uri("/message/send?id=999")
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::NOT_FOUND);
   }

   #[tokio::test]
   async fn test_差し込み値が壊れたメッセージの送信は400() {
      // Given
      let messages = MockMessageRepository::new();
      messages.add_message(
         NewMessage {
            template_id: Some(REFERRAL_TEMPLATE_ID),
            send_email: SendFlag::Yes,
            fields: Some("[1, 2]".to_string()),
            ..Default::default()
         }
         .into_record(MessageId::new(3)),
      );
      let sender = MockNotificationSender::new();
      let sut = create_test_app(messages, sender.clone());
      let request = Request::builder()
         .method(Method::PUT)
         .uri("/message/send?id=3")
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      assert!(sender.sent_emails().is_empty());
   }

   #[tokio::test]
   async fn test_紹介メールを指定アドレスへ送信する() {
      // Given
      let sender = MockNotificationSender::new();
      let sut = create_test_app(MockMessageRepository::new(), sender.clone());
      let request = json_request(
         Method::POST,
         "/message/send/referral?email=friend%40example.org",
         serde_json::json!({ "from_user_id": 1, "fields": "{}" }),
      );

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::OK);
      let body: ApiResponse<MessageRecord> = response_body(response).await;
      assert_eq!(body.data.template_id, Some(REFERRAL_TEMPLATE_ID));
      assert_eq!(body.data.email_sent, Some(t0()));
      assert_eq!(sender.sent_emails()[0].to.address, "friend@example.org");
   }

   #[tokio::test]
   async fn test_紹介メールの宛先が不正なら400() {
      // Given
      let sut = create_test_app(MockMessageRepository::new(), MockNotificationSender::new());
      let request = json_request(
         Method::POST,
         "/message/send/referral?email=nobody",
         serde_json::json!({ "from_user_id": 1, "fields": "{}" }),
      );

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
   }

   #[tokio::test]
   async fn test_pingは文字列を反転して返す() {
      // Given
      let sut = create_test_app(MockMessageRepository::new(), MockNotificationSender::new());
      let request = Request::builder()
         .uri("/message/ping?pingText=courier")
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::OK);
      let body: ApiResponse<String> = response_body(response).await;
      assert_eq!(body.data, "reiruoc");
   }

   #[tokio::test]
   async fn test_healthはhealthyを返す() {
      // Given
      let sut = create_test_app(MockMessageRepository::new(), MockNotificationSender::new());
      let request = Request::builder()
         .uri("/health")
         .body(Body::empty())
         .unwrap();

      // When
      let response = sut.oneshot(request).await.unwrap();

      // Then
      assert_eq!(response.status(), StatusCode::OK);
      let body: serde_json::Value = response_body(response).await;
      assert_eq!(body["status"], "healthy");
   }
}
