//! Server module for running Terraform providers
//!
//! Performs the go-plugin handshake: verifies the magic cookie, binds a
//! loopback port, sets up mutual TLS against the certificate Terraform
//! passed in `PLUGIN_CLIENT_CERT`, prints the handshake line on stdout and
//! serves the provider, controller and health services until Terraform asks
//! the plugin to shut down.

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::proto::controller::{self, GrpcController, GrpcControllerServer};
use crate::proto::health::{self, Health, HealthServer};
use crate::proto::ProviderServer;
use crate::provider::Provider;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";
pub const CLIENT_CERT_ENV: &str = "PLUGIN_CLIENT_CERT";

const CORE_PROTOCOL_VERSION: u32 = 1;
const PLUGIN_PROTOCOL_VERSION: u32 = 6;

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Fixed certificate instead of a generated one
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Timeout for graceful shutdown
    pub shutdown_timeout: Duration,
    /// Skip the magic cookie check (tests and debuggers)
    pub skip_handshake_check: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: None,
            key_path: None,
            max_message_size: 256 << 20, // 256MB
            shutdown_timeout: Duration::from_secs(30),
            skip_handshake_check: false,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve with a certificate loaded from disk
    pub fn with_certificate(mut self, cert_path: PathBuf, key_path: PathBuf) -> Self {
        self.cert_path = Some(cert_path);
        self.key_path = Some(key_path);
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn without_handshake_check(mut self) -> Self {
        self.skip_handshake_check = true;
        self
    }
}

/// PEM certificate and key the server presents, plus the DER form
/// advertised in the handshake line.
pub struct ServerCertificate {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: Vec<u8>,
}

/// Generate a self-signed certificate for localhost usable as both server
/// and client certificate, the same shape go-plugin generates.
pub fn generate_certificate() -> Result<ServerCertificate> {
    let mut params = CertificateParams::new(vec!["localhost".to_string()])?;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "localhost");
    dn.push(DnType::OrganizationName, "HashiCorp");
    params.distinguished_name = dn;

    let key = KeyPair::generate()?;
    let cert = params.self_signed(&key)?;

    Ok(ServerCertificate {
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
        cert_der: cert.der().to_vec(),
    })
}

async fn load_certificate(config: &ServerConfig) -> Result<ServerCertificate> {
    let (Some(cert_path), Some(key_path)) = (&config.cert_path, &config.key_path) else {
        return generate_certificate();
    };

    let cert_pem = tokio::fs::read_to_string(cert_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read certificate: {}", e)))?;
    let key_pem = tokio::fs::read_to_string(key_path)
        .await
        .map_err(|e| TfplugError::TlsError(format!("Failed to read key: {}", e)))?;
    let cert_der = pem_to_der(&cert_pem)?;

    Ok(ServerCertificate {
        cert_pem,
        key_pem,
        cert_der,
    })
}

fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    let body: String = pem
        .lines()
        .skip_while(|l| !l.starts_with("-----BEGIN CERTIFICATE"))
        .skip(1)
        .take_while(|l| !l.starts_with("-----END CERTIFICATE"))
        .collect();
    if body.is_empty() {
        return Err(TfplugError::TlsError(
            "no certificate found in PEM file".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(body.trim())
        .map_err(|e| TfplugError::TlsError(format!("invalid PEM certificate: {}", e)))
}

/// The line go-plugin reads from stdout to find the server.
pub fn handshake_line(addr: std::net::SocketAddr, cert_der: &[u8]) -> String {
    format!(
        "{}|{}|tcp|{}|grpc|{}",
        CORE_PROTOCOL_VERSION,
        PLUGIN_PROTOCOL_VERSION,
        addr,
        STANDARD_NO_PAD.encode(cert_der)
    )
}

fn check_magic_cookie() -> Result<()> {
    match std::env::var(MAGIC_COOKIE_KEY) {
        Ok(value) if value == MAGIC_COOKIE_VALUE => Ok(()),
        _ => Err(TfplugError::Handshake(
            "This binary is a plugin. These are not meant to be executed directly. \
             Please execute the program that consumes these plugins, which will \
             load any plugins automatically"
                .to_string(),
        )),
    }
}

/// GRPCController: Terraform calls Shutdown once it is done with the plugin.
struct ControllerService {
    shutdown: Arc<Notify>,
}

#[tonic::async_trait]
impl GrpcController for ControllerService {
    async fn shutdown(
        &self,
        _request: Request<controller::Empty>,
    ) -> std::result::Result<Response<controller::Empty>, Status> {
        debug!("shutdown requested by terraform");
        self.shutdown.notify_one();
        Ok(Response::new(controller::Empty {}))
    }
}

struct HealthService;

#[tonic::async_trait]
impl Health for HealthService {
    async fn check(
        &self,
        _request: Request<health::HealthCheckRequest>,
    ) -> std::result::Result<Response<health::HealthCheckResponse>, Status> {
        Ok(Response::new(health::HealthCheckResponse {
            status: health::health_check_response::ServingStatus::Serving as i32,
        }))
    }
}

/// Main entry point for running a provider
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    if !config.skip_handshake_check {
        check_magic_cookie()?;
    }

    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let certificate = load_certificate(&config).await?;
    let identity = Identity::from_pem(&certificate.cert_pem, &certificate.key_pem);
    let mut tls_config = ServerTlsConfig::new().identity(identity);
    match std::env::var(CLIENT_CERT_ENV) {
        Ok(client_pem) if !client_pem.trim().is_empty() => {
            tls_config = tls_config.client_ca_root(Certificate::from_pem(client_pem));
        }
        _ => warn!("{} not set, serving without client verification", CLIENT_CERT_ENV),
    }

    let grpc_server = GrpcProviderServer::new(provider);
    let root = grpc_server.root_context();
    let provider_service = ProviderServer::new(grpc_server)
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let shutdown = Arc::new(Notify::new());
    let controller_service = GrpcControllerServer::new(ControllerService {
        shutdown: shutdown.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = Server::builder()
        .tls_config(tls_config)?
        .add_service(provider_service)
        .add_service(controller_service)
        .add_service(HealthServer::new(HealthService));

    // Stdout carries only the handshake
    println!("{}", handshake_line(addr, &certificate.cert_der));
    info!(%addr, "provider server listening");

    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    let (stopping_tx, mut stopping_rx) = tokio::sync::watch::channel(false);
    let signal = async move {
        tokio::select! {
            _ = shutdown.notified() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        info!("shutting down provider server");
        root.cancel();
        let _ = stopping_tx.send(true);
    };

    let serve = server.serve_with_incoming_shutdown(incoming, signal);
    tokio::pin!(serve);
    let shutdown_timeout = config.shutdown_timeout;
    tokio::select! {
        res = &mut serve => res?,
        _ = async {
            let _ = stopping_rx.wait_for(|stopping| *stopping).await;
            tokio::time::sleep(shutdown_timeout).await;
        } => warn!("in-flight requests did not finish within {:?}", shutdown_timeout),
    }

    Ok(())
}
