use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ProtocolVersion, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::HTTP_TIMEOUT;

/// Negotiate TLS with the host on port 443 using default certificate
/// validation and report the protocol version, or the failure description
/// verbatim. Certificate errors surface here as the recorded string.
pub async fn tls_version(host: &str) -> String {
    match handshake(host).await {
        Ok(version) => version,
        Err(description) => description,
    }
}

async fn handshake(host: &str) -> Result<String, String> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    // name the provider explicitly; reqwest's rustls may enable a second one
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| e.to_string())?
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));
    let server_name =
        ServerName::try_from(host.to_string()).map_err(|e| e.to_string())?;

    let attempt = async {
        let stream = TcpStream::connect((host, 443))
            .await
            .map_err(|e| e.to_string())?;
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| e.to_string())?;
        let (_, connection) = tls.get_ref();
        Ok(protocol_name(connection.protocol_version()))
    };
    tokio::time::timeout(HTTP_TIMEOUT, attempt)
        .await
        .map_err(|_| format!("TLS handshake with {host} timed out"))?
}

fn protocol_name(version: Option<ProtocolVersion>) -> String {
    match version {
        Some(ProtocolVersion::TLSv1_3) => "TLSv1.3".to_string(),
        Some(ProtocolVersion::TLSv1_2) => "TLSv1.2".to_string(),
        Some(ProtocolVersion::TLSv1_1) => "TLSv1.1".to_string(),
        Some(ProtocolVersion::TLSv1_0) => "TLSv1".to_string(),
        Some(other) => format!("{other:?}"),
        None => "unknown".to_string(),
    }
}
