//! HTTP boundary.
//!
//! [`Transport`] is the only place the client touches the network, which keeps
//! the signer and decoder pure and lets tests count or script calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use tracing::warn;

use crate::error::{Result, UcsError};
use crate::types::FormData;

/// A fully signed request, ready to send.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Attached as the body only when present
    pub form: Option<FormData>,
}

/// Status and body of a UCS response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse>;
}

/// Production transport backed by a pooled [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Both connection establishment and the whole request are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| UcsError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Use an existing client, e.g. one shared with the rest of the service.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        let mut headers = request.headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = self.client.request(request.method, &request.url);
        if let Some(form) = request.form.as_ref().filter(|f| !f.is_empty()) {
            builder = builder.form(form);
        }
        // `headers` replaces, so the JSON content type wins over the form default
        let response = builder.headers(headers).send().await.map_err(|e| {
            warn!(error = %e, url = %request.url, "UCS request failed");
            UcsError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, url = %request.url, "Failed to read UCS response body");
            UcsError::Transport(e.to_string())
        })?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one connection, answer with `status` and `body`, return the raw request.
    async fn serve_once(listener: TcpListener, status: &'static str, body: &'static str) -> String {
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

        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();

        String::from_utf8_lossy(&buf).into_owned()
    }

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    fn outbound(method: Method, url: String, form: Option<FormData>) -> OutboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert("accesscode", HeaderValue::from_static("a1"));
        OutboundRequest {
            method,
            url,
            headers,
            form,
        }
    }

    /// Lowercased head and raw body of a captured request.
    fn split(raw: &str) -> (String, String) {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        (head.to_lowercase(), body.to_string())
    }

    #[tokio::test]
    async fn test_form_body_keeps_json_content_type() {
        let (listener, url) = listener().await;
        let server = tokio::spawn(serve_once(listener, "200 OK", r#"{"code":"0"}"#));

        let mut form = FormData::new();
        form.insert("code".into(), "X Y".into());
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .send(outbound(Method::POST, format!("{}/check", url), Some(form)))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, r#"{"code":"0"}"#);

        let (head, body) = split(&server.await.unwrap());
        assert!(head.starts_with("post /check http/1.1"));
        assert!(head.contains("content-type: application/json"));
        assert!(!head.contains("x-www-form-urlencoded"));
        assert!(head.contains("accesscode: a1"));
        assert_eq!(body, "code=X+Y");
    }

    #[tokio::test]
    async fn test_empty_form_sends_no_body() {
        let (listener, url) = listener().await;
        let server = tokio::spawn(serve_once(listener, "200 OK", "{}"));

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        transport
            .send(outbound(Method::POST, url, Some(FormData::new())))
            .await
            .unwrap();

        let (head, body) = split(&server.await.unwrap());
        assert!(head.contains("content-type: application/json"));
        assert!(body.is_empty());
        if let Some(length) = head.lines().find_map(|l| l.strip_prefix("content-length:")) {
            assert_eq!(length.trim(), "0");
        }
    }

    #[tokio::test]
    async fn test_non_200_is_returned_as_response() {
        let (listener, url) = listener().await;
        let server = tokio::spawn(serve_once(listener, "500 Internal Server Error", "boom"));

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport.send(outbound(Method::GET, url, None)).await.unwrap();
        server.await.unwrap();

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "boom");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let (listener, url) = listener().await;
        drop(listener);

        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport
            .send(outbound(Method::GET, url, None))
            .await
            .unwrap_err();

        assert!(matches!(err, UcsError::Transport(_)));
    }
}
