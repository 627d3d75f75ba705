//! Single-attempt HTTP page fetching.
//!
//! No retry happens here; the pool owns the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use newsbrief_shared::{NewsBriefError, Result};
use reqwest::Client;
use tracing::debug;

/// Maximum response size we accept for an article page (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fetch the raw markup behind a URL.
///
/// Every failure (connection error, non-2xx status, timeout) is reported as
/// `NewsBriefError::Network`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    max_body_bytes: u64,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| NewsBriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: MAX_RESPONSE_SIZE,
        })
    }

    /// Override the response body cap (defaults to 10 MB).
    pub fn with_max_body_bytes(mut self, max: u64) -> Self {
        self.max_body_bytes = max;
        self
    }

    fn too_large(&self, url: &str, len: u64) -> NewsBriefError {
        NewsBriefError::Network(format!(
            "{url}: response too large ({len} bytes, max {})",
            self.max_body_bytes
        ))
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!(%url, timeout_ms = timeout.as_millis() as u64, "fetching page");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsBriefError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes {
                return Err(self.too_large(url, len));
            }
        }

        // Content-Length may be absent or wrong; count what actually arrives.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| request_error(url, timeout, e))?;
            let len = (body.len() + chunk.len()) as u64;
            if len > self.max_body_bytes {
                return Err(self.too_large(url, len));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn request_error(url: &str, timeout: Duration, e: reqwest::Error) -> NewsBriefError {
    if e.is_timeout() {
        NewsBriefError::Network(format!("{url}: timed out after {}ms", timeout.as_millis()))
    } else {
        NewsBriefError::Network(format!("{url}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsbrief_shared::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> ReqwestFetcher {
        ReqwestFetcher::new("NewsBrief-test").expect("client")
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/article", server.uri()), Duration::from_secs(5))
            .await
            .expect("fetch");
        assert_eq!(body, "<p>hello</p>");
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/down", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/slow", server.uri()), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn oversized_declared_length_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&server)
            .await;

        let err = fetcher()
            .with_max_body_bytes(1024)
            .fetch(&format!("{}/big", server.uri()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn oversized_chunked_body_is_rejected() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Chunked responses carry no Content-Length, so only the streamed
        // byte count can catch them.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n")
                .await;
            let chunk = "y".repeat(512);
            for _ in 0..8 {
                let frame = format!("{:x}\r\n{chunk}\r\n", chunk.len());
                if socket.write_all(frame.as_bytes()).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });

        let err = fetcher()
            .with_max_body_bytes(1024)
            .fetch(&format!("http://{addr}/stream"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        // Port 9 (discard) is essentially never listening on test hosts.
        let err = fetcher()
            .fetch("http://127.0.0.1:9/", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
