//! Dialing: TLS setup and the optional proxy tunnel.
//!
//! Proxies are given as URLs. `http://` opens an HTTP `CONNECT` tunnel. With `socks5://` the
//! target is resolved locally, with `socks5h://` the proxy resolves it. Credentials in the URL are sent as
//! `Proxy-Authorization: Basic` or as SOCKS5 username/password. `https://` proxies (TLS to the
//! proxy itself) are not supported and fail with [`WsError::InvalidProxy`].

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpStream, lookup_host};
use tokio_socks::tcp::Socks5Stream;
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream, client_async_tls_with_config,
    connect_async_tls_with_config,
};
use url::Url;

use super::error::WsError;
use crate::Result;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Proxy replies larger than this are not a `CONNECT` response we understand.
const MAX_PROXY_RESPONSE: usize = 8 * 1024;

/// Opens the WebSocket at `endpoint`, tunnelling through `proxy` when one is given.
pub(crate) async fn dial(endpoint: &Url, proxy: Option<&Url>) -> Result<WsStream> {
    let connector = match endpoint.scheme() {
        "wss" => Some(Connector::Rustls(tls_config()?)),
        _ => None,
    };

    let stream = match proxy {
        None => {
            connect_async_tls_with_config(endpoint.as_str(), None, false, connector)
                .await?
                .0
        }
        Some(proxy) => {
            let tunnel = connect_tunnel(proxy, endpoint).await?;
            client_async_tls_with_config(endpoint.as_str(), tunnel, None, connector)
                .await?
                .0
        }
    };

    Ok(stream)
}

/// TLS 1.2 at minimum, native roots, and ALPN pinned to HTTP/1.1 so servers never negotiate h2
/// for the upgrade.
pub(crate) fn tls_config() -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();

    #[cfg(feature = "tracing")]
    for error in &native.errors {
        tracing::warn!(%error, "unable to load a native root certificate");
    }

    let (_added, _ignored) = roots.add_parsable_certificates(native.certs);

    let mut config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
    .with_root_certificates(roots)
    .with_no_client_auth();

    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

async fn connect_tunnel(proxy: &Url, target: &Url) -> Result<TcpStream> {
    let (proxy_host, proxy_port) = host_and_port(proxy)
        .ok_or_else(|| WsError::InvalidProxy(format!("{proxy} has no host")))?;
    let (target_host, target_port) = host_and_port(target)
        .ok_or_else(|| WsError::InvalidProxy(format!("{target} has no host")))?;

    match proxy.scheme() {
        "http" => http_tunnel(proxy, (&proxy_host, proxy_port), &target_host, target_port).await,
        "socks5" => {
            let target = lookup_host((target_host.as_str(), target_port))
                .await?
                .next()
                .ok_or_else(|| WsError::InvalidProxy(format!("{target_host} did not resolve")))?;
            socks5_tunnel(proxy, (&proxy_host, proxy_port), target).await
        }
        "socks5h" => {
            socks5_tunnel(
                proxy,
                (&proxy_host, proxy_port),
                (target_host.as_str(), target_port),
            )
            .await
        }
        "https" => Err(WsError::InvalidProxy(
            "https proxies are not supported, use an http:// or socks5:// proxy URL".to_owned(),
        )
        .into()),
        other => Err(WsError::InvalidProxy(format!("unsupported proxy scheme {other:?}")).into()),
    }
}

async fn socks5_tunnel<'target, T>(
    proxy: &Url,
    (proxy_host, proxy_port): (&str, u16),
    target: T,
) -> Result<TcpStream>
where
    T: tokio_socks::IntoTargetAddr<'target>,
{
    let stream = if proxy.username().is_empty() {
        Socks5Stream::connect((proxy_host, proxy_port), target).await
    } else {
        Socks5Stream::connect_with_password(
            (proxy_host, proxy_port),
            target,
            proxy.username(),
            proxy.password().unwrap_or(""),
        )
        .await
    }
    .map_err(WsError::Socks)?;

    Ok(stream.into_inner())
}

async fn http_tunnel(
    proxy: &Url,
    (proxy_host, proxy_port): (&str, u16),
    target_host: &str,
    target_port: u16,
) -> Result<TcpStream> {
    let mut stream = TcpStream::connect((proxy_host, proxy_port)).await?;
    stream
        .write_all(connect_request(proxy, target_host, target_port).as_bytes())
        .await?;

    let mut head = Vec::with_capacity(256);
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_PROXY_RESPONSE {
            return Err(WsError::InvalidProxy("proxy response too large".to_owned()).into());
        }
        head.push(stream.read_u8().await?);
    }

    check_connect_response(&head)?;

    Ok(stream)
}

fn host_and_port(url: &Url) -> Option<(String, u16)> {
    let host = url.host_str()?.trim_matches(['[', ']']).to_owned();
    let port = url.port_or_known_default()?;

    Some((host, port))
}

fn connect_request(proxy: &Url, host: &str, port: u16) -> String {
    let authority = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    let mut request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
    if !proxy.username().is_empty() {
        let credentials = format!("{}:{}", proxy.username(), proxy.password().unwrap_or(""));
        request.push_str(&format!(
            "Proxy-Authorization: Basic {}\r\n",
            STANDARD.encode(credentials)
        ));
    }
    request.push_str("\r\n");

    request
}

fn check_connect_response(head: &[u8]) -> std::result::Result<(), WsError> {
    let head = String::from_utf8_lossy(head);
    let status_line = head.lines().next().unwrap_or_default();

    match status_line.split_whitespace().nth(1) {
        Some("200") => Ok(()),
        _ => Err(WsError::InvalidProxy(format!(
            "proxy refused tunnel: {status_line}"
        ))),
    }
}
