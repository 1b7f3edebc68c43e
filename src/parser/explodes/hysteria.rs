use super::common::{build_link, mismatch, require};
use super::SchemeCodec;
use crate::error::Result;
use crate::models::{Credentials, Proxy, ProxyType, Transport};
use crate::utils::url::{LinkParts, QueryBuilder};

pub struct HysteriaCodec;

impl SchemeCodec for HysteriaCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["hysteria"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::Hysteria
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_hysteria(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        hysteria_link(proxy)
    }
}

/// Parse a Hysteria (v1) link into a Proxy object
///
/// Format: `hysteria://host:port?protocol=udp&auth=..&peer=..&upmbps=..&downmbps=..&obfsParam=..#name`.
/// Everything lives in the query; the userinfo is unused.
pub fn explode_hysteria(hysteria: &str) -> Result<Proxy> {
    let LinkParts {
        host,
        port,
        mut query,
        name,
        ..
    } = LinkParts::parse(hysteria, "hysteria")?;

    // Only `xplus` exists; the password below is what matters
    query.take("obfs");

    let credentials = Credentials::Hysteria {
        auth: query.take_any(&["auth", "auth_str"]),
        protocol: query.take("protocol"),
        up: query.take_any(&["upmbps", "up"]),
        down: query.take_any(&["downmbps", "down"]),
        obfs: query.take("obfsParam"),
        ports: query.take("mport"),
    };
    let transport = Transport {
        sni: query.take_any(&["peer", "sni"]),
        skip_cert_verify: query.take_flag(&["insecure", "allowInsecure"]),
        alpn: query.take_list("alpn"),
        ..Default::default()
    };

    Ok(
        Proxy::new(name.unwrap_or_default(), host, port, credentials)
            .with_transport(transport)
            .with_extra(query.into_extra()),
    )
}

pub fn hysteria_link(proxy: &Proxy) -> Result<String> {
    let Credentials::Hysteria {
        auth,
        protocol,
        up,
        down,
        obfs,
        ports,
    } = &proxy.credentials
    else {
        return Err(mismatch(ProxyType::Hysteria));
    };
    require(ProxyType::Hysteria, "server", &proxy.server)?;

    let transport = &proxy.transport;
    let mut query = QueryBuilder::new();
    query
        .push_opt("protocol", protocol.as_deref())
        .push_opt("auth", auth.as_deref())
        .push_opt("peer", transport.sni.as_deref())
        .push_flag("insecure", transport.skip_cert_verify)
        .push_opt("upmbps", up.as_deref())
        .push_opt("downmbps", down.as_deref())
        .push_list("alpn", &transport.alpn);
    if let Some(obfs) = obfs.as_deref().filter(|o| !o.is_empty()) {
        query.push("obfs", "xplus").push("obfsParam", obfs);
    }
    query
        .push_opt("mport", ports.as_deref())
        .push_extra(&proxy.extra);

    Ok(build_link(
        "hysteria",
        None,
        &proxy.server,
        proxy.port,
        "",
        &query,
        &proxy.name,
    ))
}
