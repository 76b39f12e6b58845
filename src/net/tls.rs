//! TLS 证书检查（openssl，阻塞握手放到 spawn_blocking）

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use chrono::{DateTime, Utc};
use openssl::asn1::Asn1Time;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslVerifyMode};
use openssl::x509::{X509NameRef, X509VerifyResult};
use thiserror::Error;
use tracing::debug;

pub const TLS_PORT: u16 = 443;

/// 证书检查失败类型，Display 即面向用户的诊断文本
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TlsProbeError {
    #[error("Certificate verification failed: {0}")]
    Verification(String),
    #[error("SSL connection timed out")]
    Timeout,
    #[error("Could not resolve hostname")]
    Resolve,
    #[error("Connection refused on port 443")]
    Refused,
    #[error("SSL check error: {0}")]
    Other(String),
}

/// 握手成功后读取到的证书与会话信息
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateDetails {
    pub issuer: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub protocol_version: Option<String>,
    pub cipher_suite: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TlsInspector {
    timeout: Duration,
}

impl TlsInspector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// verify=false 时关闭链校验与主机名校验，只为读取证书信息
    pub async fn inspect(&self, host: &str, verify: bool) -> Result<CertificateDetails, TlsProbeError> {
        let host = host.to_string();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || inspect_blocking(&host, timeout, verify))
            .await
            .map_err(|e| TlsProbeError::Other(e.to_string()))?
    }
}

fn inspect_blocking(host: &str, timeout: Duration, verify: bool) -> Result<CertificateDetails, TlsProbeError> {
    let addr = (host, TLS_PORT)
        .to_socket_addrs()
        .map_err(|_| TlsProbeError::Resolve)?
        .next()
        .ok_or(TlsProbeError::Resolve)?;

    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(classify_io)?;
    stream.set_read_timeout(Some(timeout)).map_err(classify_io)?;
    stream.set_write_timeout(Some(timeout)).map_err(classify_io)?;

    let mut builder = SslConnector::builder(SslMethod::tls()).map_err(|e| TlsProbeError::Other(e.to_string()))?;
    if !verify {
        builder.set_verify(SslVerifyMode::NONE);
    }
    let connector = builder.build();
    let mut config = connector
        .configure()
        .map_err(|e| TlsProbeError::Other(e.to_string()))?;
    if !verify {
        config.set_verify_hostname(false);
    }

    let tls = config.connect(host, stream).map_err(classify_handshake)?;
    let ssl = tls.ssl();

    let cert = ssl
        .peer_certificate()
        .ok_or_else(|| TlsProbeError::Other("no peer certificate".to_string()))?;

    let now = Asn1Time::days_from_now(0).map_err(|e| TlsProbeError::Other(e.to_string()))?;
    let diff = now
        .diff(cert.not_after())
        .map_err(|e| TlsProbeError::Other(e.to_string()))?;
    let remaining = chrono::Duration::days(diff.days as i64) + chrono::Duration::seconds(diff.secs as i64);

    debug!("TLS handshake with {} ok (verify={})", host, verify);

    Ok(CertificateDetails {
        issuer: format_name(cert.issuer_name()),
        subject: format_name(cert.subject_name()),
        expires_at: Utc::now() + remaining,
        days_until_expiry: floor_days(diff.days as i64, diff.secs as i64),
        protocol_version: Some(ssl.version_str().to_string()),
        cipher_suite: ssl.current_cipher().map(|c| c.name().to_string()),
    })
}

/// 向下取整到整天（已过期不足一天记为 -1）
fn floor_days(days: i64, secs: i64) -> i64 {
    if secs < 0 { days - 1 } else { days }
}

/// "commonName=example.com, organizationName=Example"
fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .filter_map(|entry| {
            let key = entry.object().nid().long_name().ok()?;
            let value = entry.data().as_utf8().ok()?;
            Some(format!("{}={}", key, value))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn classify_io(err: io::Error) -> TlsProbeError {
    classify_io_kind(err.kind(), || err.to_string())
}

fn classify_io_kind(kind: io::ErrorKind, message: impl FnOnce() -> String) -> TlsProbeError {
    match kind {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TlsProbeError::Timeout,
        io::ErrorKind::ConnectionRefused => TlsProbeError::Refused,
        _ => TlsProbeError::Other(message()),
    }
}

fn classify_handshake(err: HandshakeError<TcpStream>) -> TlsProbeError {
    match err {
        HandshakeError::SetupFailure(e) => TlsProbeError::Other(e.to_string()),
        HandshakeError::WouldBlock(_) => TlsProbeError::Timeout,
        HandshakeError::Failure(mid) => {
            let verify_result = mid.ssl().verify_result();
            if verify_result != X509VerifyResult::OK {
                return TlsProbeError::Verification(verify_result.error_string().to_string());
            }
            match mid.error().io_error() {
                Some(io_err) => classify_io_kind(io_err.kind(), || io_err.to_string()),
                None => TlsProbeError::Other(mid.error().to_string()),
            }
        }
    }
}
