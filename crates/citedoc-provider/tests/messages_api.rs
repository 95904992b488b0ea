//! Drives `AnthropicClient` against a local mock of the Messages API.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use base64::Engine;
use serde_json::{json, Value};

use citedoc_core::Error;
use citedoc_provider::prompts::{CONFIRMATION_INSTRUCTION, NO_CONTEXT_PLACEHOLDER};
use citedoc_provider::{AnthropicClient, DocumentProvider};

const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF";

struct MockApi {
    status: StatusCode,
    reply: String,
    requests: Mutex<Vec<(HeaderMap, Value)>>,
}

impl MockApi {
    fn last_request(&self) -> (HeaderMap, Value) {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

async fn messages(
    State(mock): State<Arc<MockApi>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    mock.requests.lock().unwrap().push((headers, parsed));
    (
        mock.status,
        [(header::CONTENT_TYPE, "application/json")],
        mock.reply.clone(),
    )
}

async fn spawn_mock(status: StatusCode, reply: impl Into<String>) -> (AnthropicClient, Arc<MockApi>) {
    let mock = Arc::new(MockApi {
        status,
        reply: reply.into(),
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = AnthropicClient::new(&format!("http://{}", addr), "sk-test", "claude-3-5-sonnet-20241022");
    (client, mock)
}

fn text_reply(text: &str, citations: Value) -> String {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-sonnet-20241022",
        "content": [{"type": "text", "text": text, "citations": citations}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 2100, "output_tokens": 87}
    })
    .to_string()
}

#[tokio::test]
async fn test_confirmation_request_shape() {
    let (client, mock) = spawn_mock(
        StatusCode::OK,
        text_reply("The document has been processed.", Value::Null),
    )
    .await;

    let text = client.submit_document_for_confirmation(PDF_BYTES).await.unwrap();
    assert_eq!(text, "The document has been processed.");

    let (headers, body) = mock.last_request();
    assert_eq!(headers["x-api-key"], "sk-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");

    assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], "user");

    let content = &body["messages"][0]["content"];
    assert_eq!(content[0]["type"], "document");
    assert_eq!(content[0]["source"]["media_type"], "application/pdf");
    assert_eq!(content[0]["citations"]["enabled"], true);
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(content[0]["source"]["data"].as_str().unwrap())
        .unwrap();
    assert_eq!(decoded, PDF_BYTES);
    assert_eq!(content[1]["type"], "text");
    assert_eq!(content[1]["text"], CONFIRMATION_INSTRUCTION);
}

#[tokio::test]
async fn test_answer_with_citations() {
    let citations = json!([
        {"type": "page_location", "cited_text": "Net income rose to $4.2M", "document_index": 0,
         "document_title": null, "start_page_number": 2, "end_page_number": 3},
        {"type": "page_location", "cited_text": "compared to $3.1M in 2022", "document_index": 0,
         "document_title": null, "start_page_number": 2, "end_page_number": 3},
        {"type": "page_location", "cited_text": "Outlook remains positive", "document_index": 0,
         "document_title": null, "start_page_number": 9, "end_page_number": 10}
    ]);
    let (client, mock) = spawn_mock(
        StatusCode::OK,
        text_reply("Net income grew by about 35%.", citations),
    )
    .await;

    let answer = client
        .answer_with_citations(PDF_BYTES, "How did net income change?")
        .await
        .unwrap();

    assert_eq!(answer.answer_text, "Net income grew by about 35%.");
    let cited: Vec<&str> = answer.citations.iter().map(|c| c.source_text.as_str()).collect();
    assert_eq!(
        cited,
        vec![
            "Net income rose to $4.2M",
            "compared to $3.1M in 2022",
            "Outlook remains positive"
        ]
    );
    assert_eq!(answer.citations[2].location["start_page_number"], 9);
    assert_eq!(answer.text_blocks.len(), 1);
    assert_eq!(answer.usage["input_tokens"], 2100);

    let (_, body) = mock.last_request();
    assert_eq!(body["max_tokens"], 1500);
    let prompt = body["messages"][0]["content"][1]["text"].as_str().unwrap();
    assert!(prompt.contains("How did net income change?"));
    assert!(prompt.contains("page references"));
}

#[tokio::test]
async fn test_answer_simple_uses_placeholder() {
    let (client, mock) = spawn_mock(StatusCode::OK, text_reply("4", Value::Null)).await;

    let answer = client.answer_simple("What is 2+2?", None).await.unwrap();
    assert_eq!(answer.answer_text, "4");
    assert_eq!(answer.usage["output_tokens"], 87);

    let (_, body) = mock.last_request();
    assert_eq!(body["max_tokens"], 1000);
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains(NO_CONTEXT_PLACEHOLDER));
    assert!(prompt.contains("Question: What is 2+2?"));
}

#[tokio::test]
async fn test_answer_simple_with_context() {
    let (client, mock) = spawn_mock(StatusCode::OK, text_reply("1648", Value::Null)).await;

    client
        .answer_simple("When?", Some("The Peace of Westphalia was signed in 1648."))
        .await
        .unwrap();

    let (_, body) = mock.last_request();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.starts_with("Context: The Peace of Westphalia was signed in 1648."));
    assert!(!prompt.contains(NO_CONTEXT_PLACEHOLDER));
}

#[tokio::test]
async fn test_provider_error_carries_message() {
    let (client, _mock) = spawn_mock(
        StatusCode::from_u16(529).unwrap(),
        r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
    )
    .await;

    let err = client.answer_simple("ping", None).await.unwrap_err();
    match err {
        Error::Provider(msg) => assert_eq!(msg, "529 Overloaded"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_response() {
    let (client, _mock) = spawn_mock(StatusCode::OK, "<html>gateway</html>").await;

    let err = client.submit_document_for_confirmation(PDF_BYTES).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ref m) if m.starts_with("Malformed provider response")));
}

#[tokio::test]
async fn test_empty_content_is_error() {
    let (client, _mock) = spawn_mock(
        StatusCode::OK,
        json!({"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}).to_string(),
    )
    .await;

    let err = client.answer_with_citations(PDF_BYTES, "anything?").await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}

#[tokio::test]
async fn test_transport_failure() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AnthropicClient::new(&format!("http://{}", addr), "sk-test", "claude-test");
    let err = client.answer_simple("ping", None).await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}
