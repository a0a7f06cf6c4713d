// ghostmail-client/src/sender/mod.rs
pub mod compose;
pub mod relay;

pub use compose::{
    compose, prepare_attachment, AttachmentOutcome, AttachmentWarning, ComposedMessage,
    OutboundMessage, PreparedAttachment,
};
pub use relay::{Endpoint, LettreRelay, SmtpAuth, SmtpRelay};

use crate::error::Result;
use crate::network::NetworkPolicy;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Port on which SMTP speaks TLS from the first byte
pub const SMTPS_PORT: u16 = 465;

/// Transport security of the relay connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    ImplicitTls,
    StartTls,
    /// Credentials and body cross the network unencrypted
    Plain,
}

impl Security {
    pub fn select(port: u16, use_tls: bool) -> Self {
        if port == SMTPS_PORT {
            Security::ImplicitTls
        } else if use_tls {
            Security::StartTls
        } else {
            Security::Plain
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    /// No credentials means no AUTH
    pub auth: Option<SmtpAuth>,
    pub use_tls: bool,
    /// EHLO name
    pub hello_name: String,
}

#[derive(Debug, Clone)]
pub struct SendRequest {
    pub smtp: SmtpSettings,
    pub message: OutboundMessage,
    pub strip_image_metadata: bool,
}

#[derive(Debug, Serialize)]
pub struct SendReport {
    pub recipients: Vec<String>,
    pub attached: Vec<String>,
    pub warnings: Vec<String>,
    pub security: Security,
}

/// Send through the real relay, honoring the network policy
pub async fn send(request: &SendRequest, network: &NetworkPolicy) -> Result<SendReport> {
    let mut relay = LettreRelay::new(network.clone(), &request.smtp.hello_name);
    send_with(&mut relay, request).await
}

/// Compose and deliver over `relay`. One attempt; the first relay error is
/// returned as is.
pub async fn send_with<R>(relay: &mut R, request: &SendRequest) -> Result<SendReport>
where
    R: SmtpRelay + ?Sized,
{
    let composed = compose(&request.message, request.strip_image_metadata)?;
    for warning in &composed.warnings {
        warn!("{}", warning);
    }

    let endpoint = Endpoint {
        host: request.smtp.server.clone(),
        port: request.smtp.port,
    };
    let security = Security::select(endpoint.port, request.smtp.use_tls);
    debug!(%endpoint, ?security, "opening relay session");

    match security {
        Security::ImplicitTls => relay.connect_implicit_tls(&endpoint).await?,
        Security::StartTls => {
            relay.connect_plain(&endpoint).await?;
            relay.starttls(&endpoint).await?;
        }
        Security::Plain => {
            warn!(%endpoint, "TLS disabled: credentials and message are sent in the clear");
            relay.connect_plain(&endpoint).await?;
        }
    }

    if let Some(auth) = &request.smtp.auth {
        relay.authenticate(auth).await?;
    }

    let envelope = composed.message.envelope().clone();
    relay.transmit(&envelope, &composed.message.formatted()).await?;

    if let Err(e) = relay.quit().await {
        debug!(error = %e, "QUIT after delivery failed");
    }

    info!(
        recipients = composed.recipients.len(),
        attachments = composed.attached.len(),
        "message delivered to relay"
    );

    Ok(SendReport {
        recipients: composed.recipients,
        attached: composed.attached.into_iter().map(|a| a.filename).collect(),
        warnings: composed.warnings.iter().map(|w| w.to_string()).collect(),
        security,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use lettre::address::Envelope;
    use std::fs;
    use std::path::PathBuf;

    /// Records the session steps instead of talking to a server
    #[derive(Default)]
    struct RecordingRelay {
        calls: Vec<String>,
        sent: Option<Vec<u8>>,
        fail_auth: bool,
    }

    #[async_trait]
    impl SmtpRelay for RecordingRelay {
        async fn connect_implicit_tls(&mut self, endpoint: &Endpoint) -> Result<()> {
            self.calls.push(format!("implicit_tls {}", endpoint));
            Ok(())
        }

        async fn connect_plain(&mut self, endpoint: &Endpoint) -> Result<()> {
            self.calls.push(format!("plain {}", endpoint));
            Ok(())
        }

        async fn starttls(&mut self, _endpoint: &Endpoint) -> Result<()> {
            self.calls.push("starttls".to_string());
            Ok(())
        }

        async fn authenticate(&mut self, auth: &SmtpAuth) -> Result<()> {
            self.calls.push(format!("auth {}", auth.username));
            if self.fail_auth {
                return Err(Error::Send("535 authentication failed".to_string()));
            }
            Ok(())
        }

        async fn transmit(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
            self.calls.push(format!("transmit {}", envelope.to().len()));
            self.sent = Some(message.to_vec());
            Ok(())
        }

        async fn quit(&mut self) -> Result<()> {
            self.calls.push("quit".to_string());
            Ok(())
        }
    }

    fn request(port: u16, use_tls: bool, attachments: Vec<PathBuf>) -> SendRequest {
        SendRequest {
            smtp: SmtpSettings {
                server: "smtp.example.com".to_string(),
                port,
                auth: Some(SmtpAuth {
                    username: "user".to_string(),
                    password: "pass".to_string(),
                }),
                use_tls,
                hello_name: "localhost".to_string(),
            },
            message: OutboundMessage {
                from: "user@example.com".to_string(),
                to: vec!["a@example.org".to_string(), "b@example.org".to_string()],
                subject: "hello".to_string(),
                body: "body".to_string(),
                attachments,
            },
            strip_image_metadata: true,
        }
    }

    #[test]
    fn test_security_selection() {
        assert_eq!(Security::select(465, false), Security::ImplicitTls);
        assert_eq!(Security::select(465, true), Security::ImplicitTls);
        assert_eq!(Security::select(587, true), Security::StartTls);
        assert_eq!(Security::select(25, false), Security::Plain);
    }

    #[tokio::test]
    async fn test_port_465_uses_implicit_tls() {
        let mut relay = RecordingRelay::default();
        let report = send_with(&mut relay, &request(465, true, vec![])).await.unwrap();

        assert_eq!(report.security, Security::ImplicitTls);
        assert_eq!(
            relay.calls,
            vec![
                "implicit_tls smtp.example.com:465",
                "auth user",
                "transmit 2",
                "quit"
            ]
        );
    }

    #[tokio::test]
    async fn test_port_587_upgrades_with_starttls() {
        let mut relay = RecordingRelay::default();
        send_with(&mut relay, &request(587, true, vec![])).await.unwrap();

        assert_eq!(
            relay.calls,
            vec![
                "plain smtp.example.com:587",
                "starttls",
                "auth user",
                "transmit 2",
                "quit"
            ]
        );
    }

    #[tokio::test]
    async fn test_tls_disabled_never_upgrades() {
        let mut relay = RecordingRelay::default();
        let report = send_with(&mut relay, &request(2525, false, vec![])).await.unwrap();

        assert_eq!(report.security, Security::Plain);
        assert!(!relay.calls.iter().any(|c| c.contains("tls")));
        assert_eq!(relay.calls[0], "plain smtp.example.com:2525");
    }

    #[tokio::test]
    async fn test_no_credentials_skips_auth() {
        let mut relay = RecordingRelay::default();
        let mut req = request(587, true, vec![]);
        req.smtp.auth = None;

        send_with(&mut relay, &req).await.unwrap();
        assert!(!relay.calls.iter().any(|c| c.starts_with("auth")));
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_before_transmit() {
        let mut relay = RecordingRelay {
            fail_auth: true,
            ..Default::default()
        };

        let err = send_with(&mut relay, &request(587, true, vec![])).await.unwrap_err();
        assert!(matches!(err, Error::Send(_)));
        assert!(relay.sent.is_none());
        assert!(!relay.calls.iter().any(|c| c.starts_with("transmit")));
    }

    #[tokio::test]
    async fn test_missing_attachment_does_not_abort_send() {
        let dir = tempfile::tempdir().unwrap();
        let valid = dir.path().join("report.csv");
        fs::write(&valid, "a,b\n1,2\n").unwrap();
        let missing = dir.path().join("ghost.docx");

        let mut relay = RecordingRelay::default();
        let report = send_with(&mut relay, &request(587, true, vec![missing, valid]))
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("ghost.docx"));
        assert_eq!(report.attached, vec!["report.csv"]);

        let sent = String::from_utf8_lossy(relay.sent.as_deref().unwrap()).into_owned();
        assert!(sent.contains("report.csv"));
        assert!(!sent.contains("ghost.docx"));
    }
}
