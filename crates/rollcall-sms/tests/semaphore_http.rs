//! HTTP-level tests for the Semaphore transport
//!
//! Each test starts a throwaway responder on a local port that captures the
//! request and answers with a canned response.
//!
//! Run with: cargo test --package rollcall-sms --test semaphore_http

use rollcall_core::SmsStatus;
use rollcall_sms::{SemaphoreTransport, SmsClientConfig, SmsSettings, SmsTransport};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Request as seen by the responder
struct CapturedRequest {
    head: String,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }
}

/// Answer one request with `status` and `reply`, returning the base URL.
async fn respond_once(
    status: &'static str,
    reply: &'static str,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().unwrap_or(0))
            })
            .unwrap_or(0);

        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
            reply.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let _ = tx.send(CapturedRequest { head, body });
    });

    (format!("http://{addr}"), rx)
}

fn transport(account_url: &str) -> SemaphoreTransport {
    SemaphoreTransport::new(
        SmsClientConfig::default()
            .timeout(Duration::from_secs(5))
            .account_url(account_url),
    )
    .unwrap()
}

fn settings(base: &str) -> SmsSettings {
    SmsSettings::new("test-key", format!("{base}/api/v4/messages"), "SCHOOL")
}

#[tokio::test]
async fn test_send_posts_json_with_token() {
    let (base, captured) = respond_once(
        "200 OK",
        r#"[{"message_id":555,"status":"Queued","message":"Your child","recipient":"639171234567"}]"#,
    )
    .await;

    let result = transport(&format!("{base}/account"))
        .send(&settings(&base), "0917-123-4567", "Your child arrived")
        .await;

    assert!(result.success);
    assert_eq!(result.status, SmsStatus::Sent);
    assert_eq!(result.message_id.as_deref(), Some("555"));

    let request = captured.await.unwrap();
    assert_eq!(request.request_line(), "POST /api/v4/messages HTTP/1.1");
    assert_eq!(request.header("authorization").as_deref(), Some("Token test-key"));
    assert!(
        request
            .header("content-type")
            .is_some_and(|v| v.starts_with("application/json"))
    );

    let payload: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(payload["number"], "+639171234567");
    assert_eq!(payload["message"], "Your child arrived");
    assert_eq!(payload["sendername"], "SCHOOL");
}

#[tokio::test]
async fn test_http_error_status() {
    let (base, _captured) = respond_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;

    let result = transport(&format!("{base}/account"))
        .send(&settings(&base), "09171234567", "Hi")
        .await;

    assert!(!result.success);
    assert_eq!(result.status, SmsStatus::Failed);
    assert_eq!(
        result.error_text(),
        r#"HTTP Error: 401 - {"error":"bad key"}"#
    );
}

#[tokio::test]
async fn test_provider_rejection_uses_its_message() {
    let (base, _captured) =
        respond_once("200 OK", r#"{"status":"Failed","message":"Sender name not approved"}"#)
            .await;

    let result = transport(&format!("{base}/account"))
        .send(&settings(&base), "09171234567", "Hi")
        .await;

    assert!(!result.success);
    assert_eq!(result.error_text(), "Sender name not approved");
}

#[tokio::test]
async fn test_unreachable_gateway_is_exception() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = transport(&format!("{base}/account"))
        .send(&settings(&base), "09171234567", "Hi")
        .await;

    assert!(!result.success);
    assert!(result.error_text().starts_with("Exception: "));
}

#[tokio::test]
async fn test_connection_and_balance() {
    let (base, captured) = respond_once(
        "200 OK",
        r#"{"account_id":1,"account_name":"Sample School","status":"Active","credit_balance":"1250.5"}"#,
    )
    .await;
    let client = transport(&format!("{base}/account"));
    assert!(client.test_connection(&settings(&base)).await);

    let request = captured.await.unwrap();
    assert_eq!(request.request_line(), "GET /account HTTP/1.1");
    assert_eq!(request.header("authorization").as_deref(), Some("Token test-key"));

    let (base, _captured) =
        respond_once("200 OK", r#"{"account_name":"Sample School","credit_balance":42}"#).await;
    let client = transport(&format!("{base}/account"));
    assert_eq!(client.balance(&settings(&base)).await.unwrap(), 42.0);
}

#[tokio::test]
async fn test_connection_fails_without_account_name() {
    let (base, _captured) = respond_once("200 OK", r#"{"credit_balance":0}"#).await;
    assert!(
        !transport(&format!("{base}/account"))
            .test_connection(&settings(&base))
            .await
    );
}
