//! End-to-end send flows over the mock transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use integrations_office365::errors::{AuthenticationError, RequestError, UploadError};
use integrations_office365::mocks::{MockAuthProvider, MockResponse, MockTransport, TestFixtures};
use integrations_office365::prelude::*;
use integrations_office365::services::AttachmentDelivery;
use integrations_office365::transport::{HttpMethod, HttpRequest};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

const MIB: usize = 1024 * 1024;
const DRAFT_ID: &str = "AAMkADraft01=";

async fn client_with(responses: Vec<MockResponse>) -> (Office365Client, Arc<MockTransport>) {
    let config = Office365Config::builder()
        .auth_provider(MockAuthProvider::bearer("graph-token"))
        .build()
        .unwrap();
    let transport = Arc::new(MockTransport::with_responses(responses));
    let client = Office365Client::with_transport(config, transport.clone())
        .await
        .unwrap();
    (client, transport)
}

fn path(request: &HttpRequest) -> &str {
    request.url.path()
}

fn json_body(request: &HttpRequest) -> Value {
    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
}

#[tokio::test]
async fn test_small_message_single_send_mail() {
    let (client, transport) = client_with(vec![MockResponse::accepted()]).await;

    let message = TestFixtures::message_with(vec![TestFixtures::attachment("notes.txt", 2048)]);
    let sent = client.send(&message).await.unwrap();

    assert_eq!(sent.strategy, SendStrategy::Simple);
    assert_eq!(sent.draft_id, None);
    assert!(sent.estimated_size_mb < 0.01);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(path(&requests[0]), "/v1.0/users/sender@contoso.com/sendMail");
    assert_eq!(requests[0].header("authorization"), Some("Bearer graph-token"));

    let body = json_body(&requests[0]);
    let to: Vec<&str> = body["message"]["toRecipients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["emailAddress"]["address"].as_str().unwrap())
        .collect();
    assert_eq!(to, vec!["alice@contoso.com", "bob@contoso.com"]);
    assert_eq!(body["message"]["bccRecipients"], Value::Array(vec![]));

    let attachments = body["message"]["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    let decoded = STANDARD
        .decode(attachments[0]["contentBytes"].as_str().unwrap())
        .unwrap();
    assert_eq!(decoded, message.attachments[0].content.to_vec());
}

#[tokio::test]
async fn test_no_attachments_no_draft() {
    let (client, transport) = client_with(vec![MockResponse::accepted()]).await;

    let sent = client.send(&TestFixtures::sample_message()).await.unwrap();

    assert_eq!(sent.strategy, SendStrategy::Simple);
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(json_body(&requests[0])["message"].get("attachments").is_none());
}

#[tokio::test]
async fn test_ten_mib_attachment_uses_upload_session() {
    let (client, transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        TestFixtures::upload_session(),
        TestFixtures::fragment_accepted(4 * MIB as u64),
        TestFixtures::fragment_accepted(8 * MIB as u64),
        TestFixtures::fragment_completed(),
        MockResponse::accepted(),
    ])
    .await;

    let message = TestFixtures::message_with(vec![TestFixtures::attachment("video.mp4", 10 * MIB)]);
    let sent = client.send(&message).await.unwrap();

    assert_eq!(sent.strategy, SendStrategy::Large);
    assert_eq!(sent.draft_id.as_deref(), Some(DRAFT_ID));

    let requests = transport.requests();
    assert_eq!(requests.len(), 6);

    // Draft without attachments, unwrapped.
    assert_eq!(path(&requests[0]), "/v1.0/users/sender@contoso.com/messages");
    let draft = json_body(&requests[0]);
    assert!(draft.get("message").is_none());
    assert!(draft.get("attachments").is_none());
    assert_eq!(draft["subject"], "Fixture");

    assert_eq!(
        path(&requests[1]),
        format!(
            "/v1.0/users/sender@contoso.com/messages/{}/attachments/createUploadSession",
            DRAFT_ID
        )
    );
    assert_eq!(
        json_body(&requests[1]),
        serde_json::json!({
            "AttachmentItem": { "attachmentType": "file", "name": "video.mp4", "size": 10485760 }
        })
    );

    let puts = &requests[2..5];
    let ranges: Vec<&str> = puts.iter().map(|r| r.header("content-range").unwrap()).collect();
    assert_eq!(
        ranges,
        vec![
            "bytes 0-4194303/10485760",
            "bytes 4194304-8388607/10485760",
            "bytes 8388608-10485759/10485760",
        ]
    );
    let lengths: Vec<&str> = puts.iter().map(|r| r.header("content-length").unwrap()).collect();
    assert_eq!(lengths, vec!["4194304", "4194304", "2097152"]);

    for put in puts {
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(put.url.as_str(), TestFixtures::UPLOAD_URL);
        assert!(put.header("authorization").is_none());
        assert!(!put.follow_redirects);
        assert_eq!(put.timeout, Some(std::time::Duration::from_secs(1000)));
    }

    let uploaded: Vec<u8> = puts
        .iter()
        .flat_map(|r| r.body.clone().unwrap_or_else(Bytes::new).to_vec())
        .collect();
    assert_eq!(uploaded, message.attachments[0].content.to_vec());

    assert_eq!(
        path(&requests[5]),
        format!("/v1.0/users/sender@contoso.com/messages/{}/send", DRAFT_ID)
    );
    assert!(requests[5].body.is_none());
}

#[tokio::test]
async fn test_mixed_attachments_keep_order() {
    let (client, transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        TestFixtures::attachment_created("small.bin"),
        TestFixtures::upload_session(),
        TestFixtures::fragment_accepted(4 * MIB as u64),
        TestFixtures::fragment_completed(),
        TestFixtures::attachment_created("exact.bin"),
        MockResponse::accepted(),
    ])
    .await;

    let message = TestFixtures::message_with(vec![
        TestFixtures::attachment("small.bin", MIB),
        TestFixtures::attachment("large.bin", 5 * MIB),
        TestFixtures::attachment("exact.bin", 3 * MIB),
    ]);
    let sent = client.send(&message).await.unwrap();

    let paths: Vec<String> = transport
        .requests()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    let base = format!("/v1.0/users/sender@contoso.com/messages/{}", DRAFT_ID);
    assert_eq!(
        paths,
        vec![
            "/v1.0/users/sender@contoso.com/messages".to_string(),
            format!("{}/attachments", base),
            format!("{}/attachments/createUploadSession", base),
            "/api/v2.0/Users('sender')/Messages('draft')/AttachmentSessions('s1')".to_string(),
            "/api/v2.0/Users('sender')/Messages('draft')/AttachmentSessions('s1')".to_string(),
            format!("{}/attachments", base),
            format!("{}/send", base),
        ]
    );

    let inline = json_body(&transport.requests()[1]);
    assert_eq!(inline["@odata.type"], "#microsoft.graph.fileAttachment");
    assert_eq!(inline["name"], "small.bin");
    let content_id = inline["contentId"].as_str().unwrap();
    assert_eq!(content_id.len(), 10);
    assert!(content_id.chars().all(|c| c.is_ascii_alphanumeric()));
    let decoded = STANDARD.decode(inline["contentBytes"].as_str().unwrap()).unwrap();
    assert_eq!(decoded, message.attachments[0].content.to_vec());

    let last_id = json_body(&transport.requests()[5])["contentId"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        sent.deliveries,
        vec![
            AttachmentDelivery::Inline {
                content_id: content_id.to_string()
            },
            AttachmentDelivery::Uploaded { fragments: 2 },
            AttachmentDelivery::Inline {
                content_id: last_id
            },
        ]
    );
}

#[tokio::test]
async fn test_just_over_inline_limit_is_uploaded() {
    let (client, transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        TestFixtures::upload_session(),
        TestFixtures::fragment_completed(),
        MockResponse::accepted(),
    ])
    .await;

    let message =
        TestFixtures::message_with(vec![TestFixtures::attachment("scan.pdf", 3 * MIB + 1)]);
    let sent = client.send(&message).await.unwrap();

    assert_eq!(sent.strategy, SendStrategy::Large);
    assert_eq!(sent.deliveries, vec![AttachmentDelivery::Uploaded { fragments: 1 }]);

    let requests = transport.requests();
    let puts: Vec<&HttpRequest> = requests
        .iter()
        .filter(|r| r.method == HttpMethod::Put)
        .collect();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].header("content-range"), Some("bytes 0-3145728/3145729"));
    assert_eq!(puts[0].header("content-length"), Some("3145729"));
}

#[tokio::test]
async fn test_upload_session_tracks_progress() {
    let (client, transport) = client_with(vec![
        TestFixtures::upload_session(),
        TestFixtures::fragment_accepted(4 * MIB as u64),
        TestFixtures::fragment_completed(),
    ])
    .await;

    let attachment = TestFixtures::attachment("video.mp4", 6 * MIB);
    let uploader = AttachmentUploader::new(client.executor().clone());
    let mut session = uploader
        .create_upload_session(TestFixtures::SENDER, DRAFT_ID, &attachment)
        .await
        .unwrap();

    assert_eq!(session.upload_url(), TestFixtures::UPLOAD_URL);
    assert_eq!(session.total_size(), 6 * MIB as u64);
    assert_eq!(session.bytes_uploaded(), 0);

    let fragments = session.upload(&attachment.content).await.unwrap();

    assert_eq!(fragments, 2);
    assert_eq!(session.bytes_uploaded(), session.total_size());
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_upload_session_progress_stops_at_failure() {
    let (client, _transport) = client_with(vec![
        TestFixtures::upload_session(),
        TestFixtures::fragment_accepted(4 * MIB as u64),
        MockResponse::network_error("connection reset by peer"),
    ])
    .await;

    let attachment = TestFixtures::attachment("video.mp4", 6 * MIB);
    let uploader = AttachmentUploader::new(client.executor().clone());
    let mut session = uploader
        .create_upload_session(TestFixtures::SENDER, DRAFT_ID, &attachment)
        .await
        .unwrap();

    let error = session.upload(&attachment.content).await.unwrap_err();

    assert!(matches!(
        error,
        Office365Error::Upload(UploadError::FragmentFailed { index: 1, .. })
    ));
    assert_eq!(session.bytes_uploaded(), 4 * MIB as u64);
}

#[tokio::test]
async fn test_fragment_failure_stops_send() {
    let (client, transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        TestFixtures::upload_session(),
        TestFixtures::fragment_accepted(4 * MIB as u64),
        MockResponse::network_error("connection reset by peer"),
        MockResponse::accepted(),
    ])
    .await;

    let message = TestFixtures::message_with(vec![TestFixtures::attachment("video.mp4", 10 * MIB)]);
    let error = client.send(&message).await.unwrap_err();

    assert_eq!(error.orphaned_draft_id(), Some(DRAFT_ID));
    match error {
        Office365Error::Delivery(delivery) => {
            assert_eq!(delivery.state, DraftState::Attaching);
            match *delivery.source {
                Office365Error::Upload(UploadError::FragmentFailed {
                    index,
                    ref range,
                    status,
                    ..
                }) => {
                    assert_eq!(index, 1);
                    assert_eq!(range, "bytes 4194304-8388607/10485760");
                    assert_eq!(status, None);
                }
                ref other => panic!("unexpected source: {:?}", other),
            }
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Draft, session, two PUTs; no third fragment, no send.
    assert_eq!(transport.request_count(), 4);
    assert_eq!(transport.pending_responses(), 1);
}

#[tokio::test]
async fn test_rejected_fragment_reports_status() {
    let (client, _transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        TestFixtures::upload_session(),
        MockResponse::new(StatusCode::REQUEST_TIMEOUT),
    ])
    .await;

    let message = TestFixtures::message_with(vec![TestFixtures::attachment("video.mp4", 5 * MIB)]);
    let error = client.send(&message).await.unwrap_err();

    assert_eq!(error.status_code(), Some(StatusCode::REQUEST_TIMEOUT));
}

#[tokio::test]
async fn test_draft_failure_is_not_wrapped() {
    let (client, transport) = client_with(vec![TestFixtures::graph_error(
        StatusCode::BAD_REQUEST,
        "ErrorInvalidRecipients",
        "At least one recipient is not valid",
    )])
    .await;

    let message = TestFixtures::message_with(vec![TestFixtures::attachment("big.bin", 4 * MIB)]);
    let error = client.send(&message).await.unwrap_err();

    assert!(matches!(
        error,
        Office365Error::Request(RequestError::InvalidAddress(_))
    ));
    assert_eq!(error.orphaned_draft_id(), None);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_final_send_failure_leaves_attached_draft() {
    let (client, _transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        TestFixtures::attachment_created("exact.bin"),
        TestFixtures::graph_error(StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable", "retry later")
            .with_header("Retry-After", "30"),
    ])
    .await;

    let message = TestFixtures::message_with(vec![TestFixtures::attachment("exact.bin", 3 * MIB)]);
    let error = client.send(&message).await.unwrap_err();

    match &error {
        Office365Error::Delivery(delivery) => assert_eq!(delivery.state, DraftState::Attached),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(error.retry_after(), Some(std::time::Duration::from_secs(30)));
}

#[tokio::test]
async fn test_expired_token_fails_without_requests() {
    let token = AccessToken::new(
        "stale",
        "Bearer",
        Some(Utc::now() - chrono::Duration::seconds(5)),
    );
    let config = Office365Config::builder()
        .auth_provider(MockAuthProvider::new(token))
        .build()
        .unwrap();
    let transport = Arc::new(MockTransport::with_default(MockResponse::accepted()));
    let client = Office365Client::with_transport(config, transport.clone())
        .await
        .unwrap();

    let error = client.send(&TestFixtures::sample_message()).await.unwrap_err();

    assert!(matches!(
        error,
        Office365Error::Authentication(AuthenticationError::ExpiredToken(_))
    ));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_services_directly() {
    let (client, transport) = client_with(vec![
        TestFixtures::draft_created(DRAFT_ID),
        MockResponse::accepted(),
    ])
    .await;

    let mail = client.mail();
    let message = TestFixtures::sample_message();
    let draft = mail.create_draft(&message).await.unwrap();
    assert_eq!(draft.id, DRAFT_ID);
    assert_eq!(draft.state, DraftState::Created);

    mail.send_draft(&draft.mailbox, &draft.id).await.unwrap();
    assert_eq!(transport.request_count(), 2);
}
