use std::time::Duration;

use parley_http_transport::{HttpTransport, HttpTransportConfigBuilder};
use parley_model::{
    ChatRequest, ErrorKind, RequestConfig, Transcript, Transport,
    TransportError, Turn,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    let config = HttpTransportConfigBuilder::with_base_url(server.uri())
        .with_force_https(false)
        .with_timeout(Duration::from_secs(5))
        .build();
    HttpTransport::new(config)
}

fn request() -> ChatRequest {
    ChatRequest {
        transcript: Transcript::from(vec![
            Turn::system("Hello, how may I assist you today?"),
            Turn::user("Get METAR for KJFK"),
        ]),
        config: RequestConfig::default(),
    }
}

#[tokio::test]
async fn test_successful_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "messages": [
                {
                    "role": "system",
                    "content": "Hello, how may I assist you today?"
                },
                { "role": "user", "content": "Get METAR for KJFK" }
            ],
            "configurable": { "user_id": "default-user", "model": "gpt-4o" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "METAR KJFK 121251Z" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = transport(&server).send(&request()).await.unwrap();
    assert_eq!(reply.reply_text, "METAR KJFK 121251Z");
}

#[tokio::test]
async fn test_error_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Internal server error: graph failed"
        })))
        .mount(&server)
        .await;

    let err = transport(&server).send(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(err.message(), "Internal server error: graph failed");
}

#[tokio::test]
async fn test_error_without_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = transport(&server).send(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
    assert_eq!(err.message(), "HTTP error! status: 502");
}

#[tokio::test]
async fn test_malformed_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "messages": ["not what we want"] })),
        )
        .mount(&server)
        .await;

    let err = transport(&server).send(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_unexpected_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>maintenance</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = transport(&server).send(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "too late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = HttpTransportConfigBuilder::with_base_url(server.uri())
        .with_force_https(false)
        .with_timeout(Duration::from_millis(100))
        .build();
    let err = HttpTransport::new(config)
        .send(&request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config =
        HttpTransportConfigBuilder::with_base_url(format!("http://{addr}"))
            .with_force_https(false)
            .build();
    let err = HttpTransport::new(config)
        .send(&request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
