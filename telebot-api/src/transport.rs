//! Byte transport capability and its tokio implementation.
//!
//! [`Transport`] is the connect / write / read-with-deadline / close contract the request client
//! runs on. [`TcpTransport`] provides it over TCP, optionally wrapped in rustls TLS.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use telebot_core::TransportError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{self, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    self, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

const READ_CHUNK: usize = 2048;

/// Connection-oriented byte stream. One connection at a time; the client closes after each call.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Waits for the next bytes. `deadline == None` waits indefinitely.
    /// Returns an empty vector when the peer has closed, [`TransportError::Timeout`] when the
    /// deadline passes first.
    async fn read_available(
        &mut self,
        deadline: Option<Instant>,
    ) -> Result<Vec<u8>, TransportError>;

    /// Drops the connection. Safe to call when not connected.
    async fn close(&mut self);
}

/// Certificate handling for [`TcpTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain TCP (local API mirrors, tests).
    Disabled,
    /// TLS validated against the bundled webpki roots.
    VerifyRoots,
    /// TLS without certificate validation, like a device with no clock or CA store.
    AcceptAny,
}

enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Stream {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf).await,
            Stream::Tls(s) => s.read(buf).await,
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Stream::Plain(s) => {
                s.write_all(bytes).await?;
                s.flush().await
            }
            Stream::Tls(s) => {
                s.write_all(bytes).await?;
                s.flush().await
            }
        }
    }

    async fn shutdown(&mut self) -> std::io::Result<()> {
        match self {
            Stream::Plain(s) => s.shutdown().await,
            Stream::Tls(s) => s.shutdown().await,
        }
    }
}

/// TCP transport with optional TLS.
pub struct TcpTransport {
    connector: Option<TlsConnector>,
    connect_timeout: Duration,
    stream: Option<Stream>,
}

impl TcpTransport {
    pub fn new(mode: TlsMode) -> Result<Self, TransportError> {
        let connector = match mode {
            TlsMode::Disabled => None,
            mode => Some(TlsConnector::from(Arc::new(tls_config(mode)?))),
        };
        Ok(Self {
            connector,
            connect_timeout: Duration::from_secs(10),
            stream: None,
        })
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        self.close().await;

        let connect_err = |reason: String| TransportError::Connect {
            host: host.to_string(),
            port,
            reason,
        };

        let tcp = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| connect_err("connect timed out".to_string()))?
            .map_err(|e| connect_err(e.to_string()))?;
        let _ = tcp.set_nodelay(true);

        let stream = match &self.connector {
            None => Stream::Plain(tcp),
            Some(connector) => {
                let server_name = ServerName::try_from(host.to_string())
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                let tls = timeout(self.connect_timeout, connector.connect(server_name, tcp))
                    .await
                    .map_err(|_| TransportError::Tls("handshake timed out".to_string()))?
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                Stream::Tls(Box::new(tls))
            }
        };

        debug!(host = %host, port, tls = self.connector.is_some(), "transport connected");
        self.stream = Some(stream);
        Ok(())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(bytes).await?;
        Ok(())
    }

    async fn read_available(
        &mut self,
        deadline: Option<Instant>,
    ) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let mut buf = vec![0u8; READ_CHUNK];
        let n = match deadline {
            Some(deadline) => timeout_at(deadline, stream.read(&mut buf))
                .await
                .map_err(|_| TransportError::Timeout)??,
            None => stream.read(&mut buf).await?,
        };
        buf.truncate(n);
        Ok(buf)
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "transport shutdown failed");
            }
        }
    }
}

fn tls_config(mode: TlsMode) -> Result<ClientConfig, TransportError> {
    let provider = Arc::new(crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    let config = if mode == TlsMode::AcceptAny {
        warn!("TLS certificate validation disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth()
    } else {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder.with_root_certificates(roots).with_no_client_auth()
    };
    Ok(config)
}

/// Accepts any server certificate; handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        let algorithms = &self.0.signature_verification_algorithms;
        crypto::verify_tls12_signature(message, cert, dss, algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        let algorithms = &self.0.signature_verification_algorithms;
        crypto::verify_tls13_signature(message, cert, dss, algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
