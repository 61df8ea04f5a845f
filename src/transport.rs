// File: transport.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use hyper::ext::ReasonPhrase;
use log::trace;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE, HOST, USER_AGENT,
};
use reqwest::{Method, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::{rustls, TlsConnector};

use crate::config::{ProbeConfig, TransportKind};
use crate::error::{ProbeError, ProbeResult, TransportError};
use crate::headers::render_head;

const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Response head as delivered by a transport: the parsed multi-value table
/// plus the wire-format block it was parsed from.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub status: String,
    pub raw_head: String,
    pub headers: HeaderMap,
}

pub trait Transport: Send + Sync + 'static {
    /// Performs one request. Must not retry on its own.
    fn execute(&self, url: &str) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

fn parse_method(method: &str) -> ProbeResult<Method> {
    Method::from_bytes(method.as_bytes()).map_err(|_| ProbeError::InvalidMethod(method.to_string()))
}

fn timeout_of(config: &ProbeConfig) -> Option<Duration> {
    match config.timeout() {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

fn status_text(code: u16, reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!("{} {}", code, reason),
        _ => code.to_string(),
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Transport backed by `reqwest`. Redirects are followed.
///
/// The client normalises header names to lowercase, so the head handed to the
/// extractor is rendered with canonical names (`Content-Type`).
#[derive(Debug, Clone)]
pub struct ClientTransport {
    client: reqwest::Client,
    method: Method,
    authorization: String,
    cookie: String,
    host: String,
    user_agent: String,
}

impl ClientTransport {
    pub fn new(config: &ProbeConfig) -> ProbeResult<Self> {
        let method = parse_method(config.method())?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout_of(config) {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProbeError::Client(error_chain(&e)))?;

        Ok(Self {
            client,
            method,
            authorization: config.authorization().to_string(),
            cookie: config.cookie().to_string(),
            host: config.host().to_string(),
            user_agent: config.user_agent().to_string(),
        })
    }

    fn classify(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_builder() {
            TransportError::InvalidRequest(error_chain(&error))
        } else {
            TransportError::Other(error_chain(&error))
        }
    }
}

impl Transport for ClientTransport {
    async fn execute(&self, url: &str) -> Result<RawResponse, TransportError> {
        let target = reqwest::Url::parse(url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", url, e)))?;

        let mut request = self.client.request(self.method.clone(), target);
        if !self.authorization.is_empty() {
            request = request.header(AUTHORIZATION, &self.authorization);
        }
        if !self.cookie.is_empty() {
            request = request.header(COOKIE, &self.cookie);
        }
        if !self.user_agent.is_empty() {
            request = request.header(USER_AGENT, &self.user_agent);
        }
        if !self.host.is_empty() {
            request = request.header(HOST, &self.host);
        }

        let response = request.send().await.map_err(Self::classify)?;
        let code: StatusCode = response.status();
        // hyper only records the phrase when it differs from the canonical one
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
            .or_else(|| code.canonical_reason());
        let status = status_text(code.as_u16(), reason);
        let status_line = format!("{:?} {}", response.version(), status);
        let headers = response.headers().clone();

        Ok(RawResponse {
            status_code: response.status().as_u16(),
            raw_head: render_head(&status_line, &headers),
            status,
            headers,
        })
    }
}

/// Transport speaking HTTP/1.1 directly over TCP or TLS. Only the response
/// head is read; names, case and interleaving are kept exactly as received.
#[derive(Clone)]
pub struct WireTransport {
    method: Method,
    authorization: String,
    cookie: String,
    host: String,
    user_agent: String,
    timeout: Option<Duration>,
    tls: TlsConnector,
}

impl std::fmt::Debug for WireTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireTransport")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl WireTransport {
    pub fn new(config: &ProbeConfig) -> ProbeResult<Self> {
        let method = parse_method(config.method())?;

        for value in [
            config.authorization(),
            config.cookie(),
            config.host(),
            config.user_agent(),
        ] {
            if value.contains('\r') || value.contains('\n') {
                return Err(ProbeError::Client(format!(
                    "header value contains a line break: {:?}",
                    value
                )));
            }
        }

        let mut root_store = rustls::RootCertStore::empty();
        root_store.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
            rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
                ta.subject,
                ta.spki,
                ta.name_constraints,
            )
        }));
        let tls_config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Self {
            method,
            authorization: config.authorization().to_string(),
            cookie: config.cookie().to_string(),
            host: config.host().to_string(),
            user_agent: config.user_agent().to_string(),
            timeout: timeout_of(config),
            tls: TlsConnector::from(Arc::new(tls_config)),
        })
    }

    fn build_request(&self, target: &url::Url) -> Result<String, TransportError> {
        let authority = match (self.host.is_empty(), target.host_str()) {
            (false, _) => self.host.clone(),
            (true, Some(host)) => match target.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            },
            (true, None) => {
                return Err(TransportError::InvalidRequest(format!(
                    "no host in {}",
                    target
                )))
            }
        };

        let mut path = target.path().to_string();
        if let Some(query) = target.query() {
            path.push('?');
            path.push_str(query);
        }

        let mut request = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", self.method, path, authority);
        if !self.user_agent.is_empty() {
            request.push_str(&format!("User-Agent: {}\r\n", self.user_agent));
        }
        if !self.authorization.is_empty() {
            request.push_str(&format!("Authorization: {}\r\n", self.authorization));
        }
        if !self.cookie.is_empty() {
            request.push_str(&format!("Cookie: {}\r\n", self.cookie));
        }
        request.push_str("Accept: */*\r\nConnection: close\r\n\r\n");
        Ok(request)
    }

    async fn send(&self, url: &str) -> Result<RawResponse, TransportError> {
        let target = url::Url::parse(url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", url, e)))?;
        let use_tls = match target.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(TransportError::InvalidRequest(format!(
                    "unsupported scheme {} in {}",
                    other, url
                )))
            }
        };
        let connect_host = match target.host() {
            Some(url::Host::Domain(domain)) => domain.to_string(),
            Some(url::Host::Ipv4(addr)) => addr.to_string(),
            Some(url::Host::Ipv6(addr)) => addr.to_string(),
            None => {
                return Err(TransportError::InvalidRequest(format!("no host in {}", url)))
            }
        };
        let port = target
            .port_or_known_default()
            .unwrap_or(if use_tls { 443 } else { 80 });
        let request = self.build_request(&target)?;
        trace!("raw request to {}:\n{}", url, request);

        let tcp_stream = TcpStream::connect((connect_host.as_str(), port))
            .await
            .map_err(|e| TransportError::Other(format!("connection failed: {}", e)))?;

        let head = if use_tls {
            let domain = rustls::ServerName::try_from(connect_host.as_str())
                .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", connect_host, e)))?;
            let tls_stream = self
                .tls
                .connect(domain, tcp_stream)
                .await
                .map_err(|e| TransportError::Other(format!("TLS handshake failed: {}", e)))?;
            exchange(tls_stream, &request).await?
        } else {
            exchange(tcp_stream, &request).await?
        };

        parse_head(&head)
    }
}

impl Transport for WireTransport {
    async fn execute(&self, url: &str) -> Result<RawResponse, TransportError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.send(url))
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => self.send(url).await,
        }
    }
}

/// Writes `request` and reads until the end of the response head.
async fn exchange<S>(mut stream: S, request: &str) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| TransportError::Other(format!("write failed: {}", e)))?;

    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| TransportError::Other(format!("read failed: {}", e)))?;
        if n == 0 {
            break;
        }
        let scan_from = buffer.len().saturating_sub(3);
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(end) = head_end(&buffer[scan_from..]) {
            buffer.truncate(scan_from + end);
            return Ok(buffer);
        }
        if buffer.len() > MAX_HEAD_SIZE {
            return Err(TransportError::Other("response head too large".to_string()));
        }
    }

    if buffer.is_empty() {
        return Err(TransportError::Other("connection closed without response".to_string()));
    }
    Ok(buffer)
}

fn head_end(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
        .or_else(|| data.windows(2).position(|w| w == b"\n\n").map(|p| p + 2))
}

/// Parses a response head into status and header table.
pub fn parse_head(raw: &[u8]) -> Result<RawResponse, TransportError> {
    let head = String::from_utf8_lossy(raw).into_owned();
    let mut lines = head.split('\n').map(|l| l.trim_end_matches('\r'));

    let status_line = lines
        .next()
        .ok_or_else(|| TransportError::Other("no status line in response".to_string()))?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(TransportError::Other(format!(
            "invalid status line: {:?}",
            status_line
        )));
    }
    let status_code: u16 = parts
        .next()
        .and_then(|code| code.trim().parse().ok())
        .ok_or_else(|| {
            TransportError::Other(format!("invalid status line: {:?}", status_line))
        })?;
    let reason = parts.next().map(str::trim);

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let malformed = || TransportError::Other(format!("malformed header line: {:?}", line));
        let (name, value) = line.split_once(':').ok_or_else(malformed)?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| malformed())?;
        let value = HeaderValue::from_bytes(value.trim().as_bytes()).map_err(|_| malformed())?;
        headers.append(name, value);
    }

    Ok(RawResponse {
        status_code,
        status: status_text(status_code, reason),
        raw_head: head,
        headers,
    })
}

/// Transport picked at runtime from `ProbeConfig::transport`.
#[derive(Debug, Clone)]
pub enum HttpTransport {
    Client(ClientTransport),
    Wire(WireTransport),
}

impl HttpTransport {
    pub fn from_config(config: &ProbeConfig) -> ProbeResult<Self> {
        match config.transport() {
            TransportKind::Client => Ok(Self::Client(ClientTransport::new(config)?)),
            TransportKind::Wire => Ok(Self::Wire(WireTransport::new(config)?)),
        }
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, url: &str) -> Result<RawResponse, TransportError> {
        match self {
            Self::Client(transport) => transport.execute(url).await,
            Self::Wire(transport) => transport.execute(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::extract_headers;

    #[test]
    fn test_parse_head() {
        let raw = b"HTTP/1.1 404 Not Found\r\nServer: nginx\r\nX-A: 1\r\nx-a: 2\r\n\r\n";
        let response = parse_head(raw).unwrap();
        assert_eq!(response.status_code, 404);
        assert_eq!(response.status, "404 Not Found");
        assert_eq!(response.headers.get_all("x-a").iter().count(), 2);

        let entries = extract_headers(&response.raw_head, &response.headers).unwrap();
        assert_eq!(entries[1].key, "X-A");
        assert_eq!(entries[2].key, "x-a");
        assert_eq!(entries[2].value, "2");
    }

    #[test]
    fn test_parse_head_without_reason() {
        let response = parse_head(b"HTTP/1.1 204\r\n\r\n").unwrap();
        assert_eq!(response.status, "204");
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_parse_head_rejects_garbage() {
        assert!(parse_head(b"SSH-2.0-OpenSSH_9.6\r\n").is_err());
        assert!(parse_head(b"HTTP/1.1 abc OK\r\n\r\n").is_err());
        assert!(parse_head(b"HTTP/1.1 200 OK\r\nbroken line\r\n\r\n").is_err());
    }

    #[test]
    fn test_head_end() {
        assert_eq!(head_end(b"HTTP/1.1 200 OK\r\n\r\nbody"), Some(19));
        assert_eq!(head_end(b"HTTP/1.1 200 OK\n\nbody"), Some(17));
        assert_eq!(head_end(b"HTTP/1.1 200 OK\r\n"), None);
    }

    #[test]
    fn test_invalid_method_is_fatal() {
        let mut config = ProbeConfig::new();
        config.set_method("GE T");
        assert!(matches!(
            ClientTransport::new(&config),
            Err(ProbeError::InvalidMethod(_))
        ));
        assert!(matches!(
            WireTransport::new(&config),
            Err(ProbeError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_wire_request_construction() {
        let mut config = ProbeConfig::new();
        config.set_method("HEAD");
        config.set_host("vhost.internal");
        config.set_cookie("a=b");
        let transport = WireTransport::new(&config).unwrap();

        let target = url::Url::parse("http://127.0.0.1:8080/x/y?z=1").unwrap();
        let request = transport.build_request(&target).unwrap();
        assert!(request.starts_with("HEAD /x/y?z=1 HTTP/1.1\r\nHost: vhost.internal\r\n"));
        assert!(request.contains("Cookie: a=b\r\n"));
        assert!(!request.contains("Authorization"));
        assert!(!request.contains("User-Agent"));
        assert!(request.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn test_wire_rejects_line_breaks_in_header_values() {
        let mut config = ProbeConfig::new();
        config.set_user_agent("evil\r\nX-Injected: 1");
        assert!(WireTransport::new(&config).is_err());
    }
}
