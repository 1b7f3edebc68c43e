use super::common::{build_link, mismatch, read_stream_params, require, write_stream_params};
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Proxy, ProxyType, Transport};
use crate::utils::url::{url_encode, LinkParts, QueryBuilder};

pub struct TrojanCodec;

impl SchemeCodec for TrojanCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["trojan"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::Trojan
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_trojan(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        trojan_link(proxy)
    }
}

/// Parse a Trojan link into a Proxy object
///
/// Trojan always runs over TLS, so `security` carries no information and
/// is discarded.
pub fn explode_trojan(trojan: &str) -> Result<Proxy> {
    let parts = LinkParts::parse(trojan, "trojan")?;
    let password = parts
        .userinfo()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ConvertError::malformed("trojan", "missing password"))?;
    let LinkParts {
        host,
        port,
        mut query,
        name,
        ..
    } = parts;

    query.take("security");
    let mut transport = Transport::default();
    read_stream_params(&mut query, &mut transport);

    // Legacy trojan-go style websocket flags
    let legacy_ws = query.take_flag(&["ws"]).unwrap_or(false);
    let legacy_path = query.take("wspath");
    if legacy_ws && transport.network.is_none() {
        transport.network = Some("ws".to_string());
        transport.path = legacy_path;
    }

    Ok(Proxy::new(
        name.unwrap_or_default(),
        host,
        port,
        Credentials::Trojan { password },
    )
    .with_transport(transport)
    .with_extra(query.into_extra()))
}

pub fn trojan_link(proxy: &Proxy) -> Result<String> {
    let Credentials::Trojan { password } = &proxy.credentials else {
        return Err(mismatch(ProxyType::Trojan));
    };
    require(ProxyType::Trojan, "server", &proxy.server)?;
    require(ProxyType::Trojan, "password", password)?;

    let mut query = QueryBuilder::new();
    query.push("security", "tls");
    write_stream_params(&mut query, &proxy.transport);
    query.push_extra(&proxy.extra);

    Ok(build_link(
        "trojan",
        Some(&url_encode(password)),
        &proxy.server,
        proxy.port,
        "",
        &query,
        &proxy.name,
    ))
}
