// tempmail-client/src/http/reqwest.rs
use super::{HttpClient, HttpError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Direct connections with the default 30 s timeout
    pub fn new() -> Result<Self, HttpError> {
        Self::with_options(None, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit timeout and an optional proxy URL
    /// (e.g. `socks5h://127.0.0.1:9050`).
    pub fn with_options(proxy_url: Option<&str>, timeout: Duration) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout);

        if let Some(proxy) = proxy_url {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| HttpError::transport(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        } else {
            builder = builder.no_proxy();
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::transport(e.to_string()))?;
        Ok(Self { inner })
    }

    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<Vec<u8>, HttpError> {
        let resp = req.send().await.map_err(|e| HttpError::transport(e.to_string()))?;

        let status = resp.status();
        let is_success = status.is_success();
        let status_code = status.as_u16();
        debug!(status = status_code, "mailbox api response");

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| HttpError {
                status: Some(status_code),
                message: e.to_string(),
            })?
            .to_vec();

        if !is_success {
            return Err(HttpError {
                status: Some(status_code),
                message: String::from_utf8_lossy(&bytes).to_string(),
            });
        }

        Ok(bytes)
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<Vec<u8>, HttpError> {
        let mut req = self.inner.get(url).header("accept", "application/json");

        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        self.execute(req).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: Vec<u8>,
        bearer: Option<&str>,
    ) -> Result<Vec<u8>, HttpError> {
        let mut req = self.inner.post(url);

        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        let req = req
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body(body);

        self.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_direct_client() {
        assert!(ReqwestClient::new().is_ok());
    }

    #[test]
    fn test_invalid_proxy_is_transport_error() {
        let err = ReqwestClient::with_options(Some("not a url"), DEFAULT_TIMEOUT)
            .err()
            .unwrap();
        assert_eq!(err.status, None);
        assert!(err.message.contains("invalid proxy"));
    }
}
