//! IPFS HTTP API client.
//!
//! Tries each configured API endpoint in order (local daemon first, public
//! node second) and returns the first successful `cat`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use url::Url;

use crate::config::ContentConfig;
use crate::content::{ContentError, ContentStore};

#[derive(Clone)]
pub struct IpfsClient {
    endpoints: Vec<Url>,
    http: reqwest::Client,
    timeout_duration: Duration,
    max_payload_bytes: usize,
}

impl IpfsClient {
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        let mut endpoints = Vec::new();
        for api_url in &config.api_urls {
            match cat_endpoint(api_url) {
                Ok(url) => endpoints.push(url),
                Err(e) => tracing::warn!(url = %api_url, error = %e, "Ignoring invalid IPFS API URL"),
            }
        }
        if endpoints.is_empty() {
            return Err(ContentError::Config("no usable IPFS API endpoints".to_string()));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ContentError::Config(e.to_string()))?;

        Ok(Self {
            endpoints,
            http,
            timeout_duration: Duration::from_secs(config.timeout_secs),
            max_payload_bytes: config.max_payload_bytes,
        })
    }

    async fn cat(&self, endpoint: &Url, reference: &str) -> Result<Vec<u8>, ContentError> {
        let request = self.http.post(endpoint.clone()).query(&[("arg", reference)]);
        let response = timeout(self.timeout_duration, request.send())
            .await
            .map_err(|_| ContentError::Timeout(self.timeout_duration.as_secs()))?
            .map_err(|e| ContentError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ContentError::Status(response.status().as_u16()));
        }
        if let Some(len) = response.content_length() {
            if len as usize > self.max_payload_bytes {
                return Err(ContentError::TooLarge {
                    limit: self.max_payload_bytes,
                });
            }
        }

        timeout(self.timeout_duration, self.read_limited(response))
            .await
            .map_err(|_| ContentError::Timeout(self.timeout_duration.as_secs()))?
    }

    /// Read the body chunk by chunk, stopping as soon as it passes the limit.
    async fn read_limited(&self, mut response: reqwest::Response) -> Result<Vec<u8>, ContentError> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ContentError::Http(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_payload_bytes {
                return Err(ContentError::TooLarge {
                    limit: self.max_payload_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// `<api_url>/api/v0/cat`, keeping any path prefix on the base URL.
fn cat_endpoint(api_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(api_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/v0/cat")
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ContentError> {
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match self.cat(endpoint, reference).await {
                Ok(body) => return Ok(body),
                // Oversized content is the same everywhere.
                Err(e @ ContentError::TooLarge { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(endpoint_idx = i, %reference, error = %e, "IPFS fetch failed, trying next endpoint");
                }
            }
        }
        Err(ContentError::Unavailable(reference.to_string()))
    }
}

impl std::fmt::Debug for IpfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsClient")
            .field("endpoints", &self.endpoints)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(urls: Vec<String>) -> ContentConfig {
        ContentConfig {
            api_urls: urls,
            timeout_secs: 5,
            max_payload_bytes: 64,
        }
    }

    #[tokio::test]
    async fn test_cat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/cat"))
            .and(query_param("arg", "QmRecord"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"type":"A","data":"203.0.113.5"}"#))
            .mount(&server)
            .await;

        let client = IpfsClient::new(&config(vec![server.uri()])).unwrap();
        let body = client.fetch("QmRecord").await.unwrap();
        assert_eq!(body, br#"{"type":"A","data":"203.0.113.5"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_failover_to_second_endpoint() {
        let down = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&down)
            .await;
        let up = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&up)
            .await;

        let client = IpfsClient::new(&config(vec![down.uri(), up.uri()])).unwrap();
        assert_eq!(client.fetch("QmX").await.unwrap(), b"ok".to_vec());
    }

    #[tokio::test]
    async fn test_oversized_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(65)))
            .mount(&server)
            .await;

        let client = IpfsClient::new(&config(vec![server.uri()])).unwrap();
        assert!(matches!(
            client.fetch("QmBig").await,
            Err(ContentError::TooLarge { limit: 64 })
        ));
    }

    #[tokio::test]
    async fn test_all_endpoints_down() {
        let client = IpfsClient::new(&config(vec!["http://127.0.0.1:9".into()])).unwrap();
        assert!(matches!(
            client.fetch("QmX").await,
            Err(ContentError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_streamed_payload_stops_at_limit() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // Chunked body with no Content-Length that never finishes on its own.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n";
            socket.write_all(head.as_bytes()).await.unwrap();
            let chunk = format!("80\r\n{}\r\n", "x".repeat(128));
            socket.write_all(chunk.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let mut content = config(vec![format!("http://{addr}")]);
        content.timeout_secs = 30;
        let client = IpfsClient::new(&content).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), client.fetch("QmStream"))
            .await
            .expect("oversized stream should be rejected without reading to the end");
        assert!(matches!(result, Err(ContentError::TooLarge { limit: 64 })));
    }

    #[tokio::test]
    async fn test_api_url_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ipfs-api/api/v0/cat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = IpfsClient::new(&config(vec![format!("{}/ipfs-api", server.uri())])).unwrap();
        assert_eq!(client.fetch("QmX").await.unwrap(), b"ok".to_vec());
    }

    #[test]
    fn test_cat_endpoint() {
        assert_eq!(
            cat_endpoint("http://127.0.0.1:5001").unwrap().as_str(),
            "http://127.0.0.1:5001/api/v0/cat"
        );
        assert_eq!(
            cat_endpoint("http://gw/ipfs-api").unwrap().as_str(),
            "http://gw/ipfs-api/api/v0/cat"
        );
        assert_eq!(
            cat_endpoint("http://gw/ipfs-api/").unwrap().as_str(),
            "http://gw/ipfs-api/api/v0/cat"
        );
    }

    #[test]
    fn test_no_valid_endpoints() {
        assert!(matches!(
            IpfsClient::new(&config(vec!["::bad::".into()])),
            Err(ContentError::Config(_))
        ));
    }
}
