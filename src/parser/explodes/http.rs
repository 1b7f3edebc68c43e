use super::common::{build_link, mismatch, require};
use super::socks::plain_userinfo;
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Proxy, ProxyType, Transport};
use crate::utils::url::{LinkParts, QueryBuilder};

pub struct HttpCodec;

impl SchemeCodec for HttpCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["http", "https"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::Http
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_http(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        http_link(proxy)
    }
}

/// Parse an HTTP/HTTPS proxy link into a Proxy object
///
/// `https://` means the proxy itself is reached over TLS. A link with a
/// path is a web address, not a proxy, and is rejected.
pub fn explode_http(link: &str) -> Result<Proxy> {
    let tls = link.trim_start().to_ascii_lowercase().starts_with("https");
    let scheme = if tls { "https" } else { "http" };
    let LinkParts {
        username,
        password,
        host,
        port,
        path,
        mut query,
        name,
    } = LinkParts::parse(link, scheme)?;

    if !path.is_empty() {
        return Err(ConvertError::malformed(scheme, "links with a path are not proxies"));
    }

    let transport = Transport {
        tls,
        sni: query.take_any(&["sni", "peer"]),
        skip_cert_verify: query.take_flag(&["allowInsecure", "insecure"]),
        ..Default::default()
    };

    Ok(Proxy::new(
        name.unwrap_or_default(),
        host,
        port,
        Credentials::Http { username, password },
    )
    .with_transport(transport)
    .with_extra(query.into_extra()))
}

pub fn http_link(proxy: &Proxy) -> Result<String> {
    let Credentials::Http { username, password } = &proxy.credentials else {
        return Err(mismatch(ProxyType::Http));
    };
    require(ProxyType::Http, "server", &proxy.server)?;

    let transport = &proxy.transport;
    let mut query = QueryBuilder::new();
    query
        .push_opt("sni", transport.sni.as_deref())
        .push_flag("allowInsecure", transport.skip_cert_verify)
        .push_extra(&proxy.extra);

    Ok(build_link(
        if transport.tls { "https" } else { "http" },
        plain_userinfo(username.as_deref(), password.as_deref()).as_deref(),
        &proxy.server,
        proxy.port,
        "/",
        &query,
        &proxy.name,
    ))
}
