// Gemini client against a throwaway local HTTP server
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use img_master::editor::{EditMode, EditRequest};
use img_master::error::AppError;
use img_master::image_handler::ImagePayload;
use img_master::remote::{GeminiClient, GeminiConfig, ImageEditor, RemoteError};

/// 读取完整请求（头部 + Content-Length 指定的正文）。
fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).expect("read request failed");
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}

/// 启动只应答一次的服务器，返回 endpoint 与捕获请求的线程句柄。
fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let addr = listener.local_addr().expect("read local addr failed");

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let request = read_request(&mut stream);

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .expect("write response failed");
        stream.flush().expect("flush failed");
        request
    });

    (format!("http://{}/v1beta", addr), server)
}

fn client(endpoint: String) -> GeminiClient {
    let mut config = GeminiConfig::new("test-key");
    config.model = "test-model".to_string();
    config.endpoint = endpoint;
    config.request_timeout_secs = 10;

    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client build failed");
    GeminiClient::with_http_client(config, http).expect("client init failed")
}

fn try_on_request() -> EditRequest {
    EditRequest {
        mode: EditMode::TryOn,
        images: vec![
            ImagePayload::uploaded(vec![1_u8, 2, 3], "image/jpeg"),
            ImagePayload::uploaded(vec![4_u8, 5, 6], "image/png"),
        ],
        instruction: "Place the clothing.".to_string(),
    }
}

#[tokio::test]
async fn posts_ordered_parts_and_returns_first_inline_image() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"role":"model","parts":[
            {"text":"Here is the edited image."},
            {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}},
            {"inlineData":{"mimeType":"image/png","data":"SECOND"}}
        ]},"finishReason":"STOP"}]}"#,
    );

    let edited = client(endpoint)
        .edit_image(&try_on_request())
        .await
        .expect("edit should succeed");
    assert_eq!(edited.data_uri(), "data:image/png;base64,iVBORw0KGgo=");

    let raw = server.join().expect("server thread panicked");
    let (head, body) = raw.split_once("\r\n\r\n").expect("request has body");
    let head = head.to_lowercase();
    assert!(head.starts_with("post /v1beta/models/test-model:generatecontent "));
    assert!(head.contains("x-goog-api-key: test-key"));
    assert!(!head.contains("key=test-key"));

    let json: serde_json::Value = serde_json::from_str(body).expect("request body is json");
    let parts = json["contents"][0]["parts"]
        .as_array()
        .expect("parts array");
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["inlineData"]["data"], "AQID");
    assert_eq!(parts[1]["inlineData"]["data"], "BAUG");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[2]["text"], "Place the clothing.");
    assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
}

#[tokio::test]
async fn http_error_carries_service_message() {
    let (endpoint, server) = serve_once(
        "400 Bad Request",
        r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
    );

    let result = client(endpoint).edit_image(&try_on_request()).await;
    let _ = server.join();

    match result {
        Err(RemoteError::Status { code, message }) => {
            assert_eq!(code, 400);
            assert_eq!(message, "API key not valid. Please pass a valid API key.");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn response_without_image_is_empty() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"I cannot do that."}]}}]}"#,
    );

    let result = client(endpoint).edit_image(&try_on_request()).await;
    let _ = server.join();

    assert!(matches!(result, Err(RemoteError::EmptyResponse)));
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    // 绑定后立即释放端口，连接将被拒绝
    let addr = TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("bind failed");

    let result = client(format!("http://{}/v1beta", addr))
        .edit_image(&try_on_request())
        .await;

    assert!(matches!(result, Err(RemoteError::Network(_))));
}

#[test]
fn blank_credential_is_rejected_at_construction() {
    let result = GeminiClient::new(GeminiConfig::new("   "));
    assert!(matches!(
        result,
        Err(AppError::Remote(RemoteError::MissingCredential))
    ));
}
