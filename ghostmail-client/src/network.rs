// ghostmail-client/src/network.rs
use crate::error::{Error, Result};
use std::time::Duration;
use tempmail_client::{MailboxApiConfig, MailboxClient, ReqwestClient};

/// How outbound connections are made for one process run.
///
/// Built once and handed to every client, so no socket-level global state
/// is ever touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPolicy {
    proxy: Option<String>,
    timeout: Duration,
}

impl NetworkPolicy {
    pub fn direct(timeout: Duration) -> Self {
        Self {
            proxy: None,
            timeout,
        }
    }

    /// Route through a SOCKS5 proxy given as `host:port` (a `socks5://` or
    /// `socks5h://` prefix is accepted and dropped)
    pub fn via_proxy(proxy: &str, timeout: Duration) -> Self {
        let addr = proxy
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(proxy)
            .trim_end_matches('/')
            .to_string();
        Self {
            proxy: Some(addr),
            timeout,
        }
    }

    /// Proxy address as `host:port`
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Proxy URL for HTTP clients. `socks5h` keeps DNS resolution on the
    /// proxy side.
    pub fn http_proxy_url(&self) -> Option<String> {
        self.proxy.as_ref().map(|addr| format!("socks5h://{}", addr))
    }

    pub fn mailbox_client(&self, api: MailboxApiConfig) -> Result<MailboxClient<ReqwestClient>> {
        let proxy_url = self.http_proxy_url();
        let http = ReqwestClient::with_options(proxy_url.as_deref(), self.timeout)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(MailboxClient::new(http, api))
    }
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self::direct(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_socks5_proxy;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_direct_has_no_proxy_url() {
        let policy = NetworkPolicy::direct(Duration::from_secs(5));
        assert_eq!(policy.http_proxy_url(), None);
    }

    #[test]
    fn test_proxy_scheme_is_normalized() {
        let timeout = Duration::from_secs(5);
        let plain = NetworkPolicy::via_proxy("127.0.0.1:9050", timeout);
        let prefixed = NetworkPolicy::via_proxy("socks5://127.0.0.1:9050", timeout);

        assert_eq!(plain, prefixed);
        assert_eq!(plain.proxy(), Some("127.0.0.1:9050"));
        assert_eq!(
            plain.http_proxy_url().as_deref(),
            Some("socks5h://127.0.0.1:9050")
        );
    }

    #[test]
    fn test_mailbox_client_builds_with_proxy() {
        let policy = NetworkPolicy::via_proxy("127.0.0.1:9050", Duration::from_secs(5));
        let client = policy.mailbox_client(MailboxApiConfig::default()).unwrap();
        assert_eq!(client.api().base_url, "https://api.mail.tm");
    }

    #[tokio::test]
    async fn test_mailbox_requests_go_through_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hydra:member": [{"domain": "example.com", "isActive": true}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let (proxy, seen) = spawn_socks5_proxy().await;

        let policy = NetworkPolicy::via_proxy(&proxy.to_string(), Duration::from_secs(5));
        let client = policy
            .mailbox_client(MailboxApiConfig::with_base_url(server.uri()))
            .unwrap();

        assert_eq!(client.list_domains().await.unwrap(), vec!["example.com"]);
        assert_eq!(*seen.lock().unwrap(), vec![server.address().to_string()]);
    }

    #[tokio::test]
    async fn test_dead_proxy_is_never_bypassed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let closed = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let policy = NetworkPolicy::via_proxy(&closed.to_string(), Duration::from_secs(5));
        let client = policy
            .mailbox_client(MailboxApiConfig::with_base_url(server.uri()))
            .unwrap();

        assert!(client.list_domains().await.is_err());
    }
}
