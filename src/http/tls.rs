//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load TLS configuration from certificate and key files.
///
/// The certificate chain is pre-parsed so a bad PEM fails startup with a
/// readable message instead of a handshake-time surprise.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    for path in [cert_path, key_path] {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("TLS file not found: {path:?}"),
            ));
        }
    }

    let mut reader = BufReader::new(File::open(cert_path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("no certificates found in {cert_path:?}"),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
