// ghostmail-client/src/sender/relay.rs
use crate::error::{Error, Result};
use crate::network::NetworkPolicy;
use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, AsyncTokioStream, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use rustls::pki_types::ServerName;
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_socks::tcp::Socks5Stream;
use tracing::debug;

/// Where the relay lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// One SMTP session, driven step by step by the sender.
///
/// Every failure is reported as `Error::Send`.
#[async_trait]
pub trait SmtpRelay: Send {
    /// Connect with TLS from the first byte (SMTPS)
    async fn connect_implicit_tls(&mut self, endpoint: &Endpoint) -> Result<()>;
    /// Connect in the clear
    async fn connect_plain(&mut self, endpoint: &Endpoint) -> Result<()>;
    /// Upgrade a plain session with STARTTLS
    async fn starttls(&mut self, endpoint: &Endpoint) -> Result<()>;
    async fn authenticate(&mut self, auth: &SmtpAuth) -> Result<()>;
    /// Hand the message to the relay in a single transaction
    async fn transmit(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()>;
    async fn quit(&mut self) -> Result<()>;
}

trait RawStream: AsyncRead + AsyncWrite + Send + Sync + Unpin + fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Send + Sync + Unpin + fmt::Debug> RawStream for T {}

/// Byte stream to the relay: direct TCP, SOCKS5 tunnel, optionally inside TLS
#[derive(Debug)]
struct RelayStream {
    inner: Box<dyn RawStream>,
    peer: SocketAddr,
}

impl RelayStream {
    fn new(inner: impl RawStream + 'static, peer: SocketAddr) -> Self {
        Self {
            inner: Box::new(inner),
            peer,
        }
    }
}

impl AsyncRead for RelayStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for RelayStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl AsyncTokioStream for RelayStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.peer)
    }
}

/// Relay session on top of lettre's SMTP client.
///
/// The socket is opened here so it can go through the proxy from the
/// network policy; the SMTP dialogue itself is lettre's.
pub struct LettreRelay {
    network: NetworkPolicy,
    hello: ClientId,
    connection: Option<AsyncSmtpConnection>,
}

impl LettreRelay {
    pub fn new(network: NetworkPolicy, hello_name: &str) -> Self {
        Self {
            network,
            hello: ClientId::Domain(hello_name.to_string()),
            connection: None,
        }
    }

    /// Run one step under the policy timeout
    async fn bounded<T, F>(&self, step: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.network.timeout(), fut)
            .await
            .map_err(|_| Error::Send(format!("{} timed out", step)))?
    }

    async fn open_stream(&self, endpoint: &Endpoint) -> Result<RelayStream> {
        match self.network.proxy() {
            Some(proxy) => {
                debug!(%endpoint, proxy, "connecting through SOCKS5 proxy");
                let stream = Socks5Stream::connect(proxy, (endpoint.host.as_str(), endpoint.port))
                    .await
                    .map_err(|e| Error::Send(format!("proxy connect to {}: {}", endpoint, e)))?;
                let peer = stream.peer_addr().map_err(Error::send)?;
                Ok(RelayStream::new(stream, peer))
            }
            None => {
                debug!(%endpoint, "connecting directly");
                let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
                    .await
                    .map_err(|e| Error::Send(format!("connect to {}: {}", endpoint, e)))?;
                let peer = stream.peer_addr().map_err(Error::send)?;
                Ok(RelayStream::new(stream, peer))
            }
        }
    }

    async fn wrap_tls(&self, stream: RelayStream, endpoint: &Endpoint) -> Result<RelayStream> {
        let peer = stream.peer;
        let server_name = ServerName::try_from(endpoint.host.clone())
            .map_err(|e| Error::Send(format!("invalid server name '{}': {}", endpoint.host, e)))?;

        let tls = tls_connector()?
            .connect(server_name, stream)
            .await
            .map_err(|e| Error::Send(format!("TLS handshake with {}: {}", endpoint, e)))?;
        Ok(RelayStream::new(tls, peer))
    }

    async fn greet(&mut self, stream: RelayStream) -> Result<()> {
        let connection = AsyncSmtpConnection::connect_with_transport(Box::new(stream), &self.hello)
            .await
            .map_err(Error::send)?;
        self.connection = Some(connection);
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut AsyncSmtpConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| Error::Send("not connected".to_string()))
    }
}

fn tls_connector() -> Result<TlsConnector> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::aws_lc_rs::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(Error::send)?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

#[async_trait]
impl SmtpRelay for LettreRelay {
    async fn connect_implicit_tls(&mut self, endpoint: &Endpoint) -> Result<()> {
        let stream = self
            .bounded("connect", async {
                let stream = self.open_stream(endpoint).await?;
                self.wrap_tls(stream, endpoint).await
            })
            .await?;
        let timeout = self.network.timeout();
        tokio::time::timeout(timeout, self.greet(stream))
            .await
            .map_err(|_| Error::Send("greeting timed out".to_string()))?
    }

    async fn connect_plain(&mut self, endpoint: &Endpoint) -> Result<()> {
        let stream = self.bounded("connect", self.open_stream(endpoint)).await?;
        let timeout = self.network.timeout();
        tokio::time::timeout(timeout, self.greet(stream))
            .await
            .map_err(|_| Error::Send("greeting timed out".to_string()))?
    }

    async fn starttls(&mut self, endpoint: &Endpoint) -> Result<()> {
        let timeout = self.network.timeout();
        let hello = self.hello.clone();
        let params = TlsParameters::new(endpoint.host.clone()).map_err(Error::send)?;
        let connection = self.connection()?;

        if !connection.can_starttls() {
            return Err(Error::Send(format!("{} does not offer STARTTLS", endpoint)));
        }

        tokio::time::timeout(timeout, connection.starttls(params, &hello))
            .await
            .map_err(|_| Error::Send("STARTTLS timed out".to_string()))?
            .map_err(Error::send)
    }

    async fn authenticate(&mut self, auth: &SmtpAuth) -> Result<()> {
        let timeout = self.network.timeout();
        let credentials = Credentials::new(auth.username.clone(), auth.password.clone());
        let connection = self.connection()?;

        tokio::time::timeout(
            timeout,
            connection.auth(&[Mechanism::Plain, Mechanism::Login], &credentials),
        )
        .await
        .map_err(|_| Error::Send("authentication timed out".to_string()))?
        .map(|_| ())
        .map_err(|e| Error::Send(format!("authentication rejected: {}", e)))
    }

    async fn transmit(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let timeout = self.network.timeout();
        let connection = self.connection()?;

        tokio::time::timeout(timeout, connection.send(envelope, message))
            .await
            .map_err(|_| Error::Send("transmission timed out".to_string()))?
            .map(|_| ())
            .map_err(Error::send)
    }

    async fn quit(&mut self) -> Result<()> {
        let timeout = self.network.timeout();
        if let Some(mut connection) = self.connection.take() {
            tokio::time::timeout(timeout, connection.quit())
                .await
                .map_err(|_| Error::Send("QUIT timed out".to_string()))?
                .map_err(Error::send)?;
        }
        Ok(())
    }
}
