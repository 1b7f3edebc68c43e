use super::common::{build_link, mismatch, require};
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Proxy, ProxyType, Transport};
use crate::utils::url::{url_encode, LinkParts, QueryBuilder};

pub struct Hysteria2Codec;

impl SchemeCodec for Hysteria2Codec {
    fn schemes(&self) -> &'static [&'static str] {
        &["hysteria2", "hy2"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::Hysteria2
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_hysteria2(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        hysteria2_link(proxy)
    }
}

/// Parse a Hysteria2 link (`hysteria2://` or `hy2://`) into a Proxy object
pub fn explode_hysteria2(hysteria2: &str) -> Result<Proxy> {
    let scheme = if hysteria2.trim_start().to_ascii_lowercase().starts_with("hy2") {
        "hy2"
    } else {
        "hysteria2"
    };
    let parts = LinkParts::parse(hysteria2, scheme)?;
    let password = parts
        .userinfo()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ConvertError::malformed(scheme, "missing password"))?;
    let LinkParts {
        host,
        port,
        mut query,
        name,
        ..
    } = parts;

    let credentials = Credentials::Hysteria2 {
        password,
        obfs: query.take("obfs"),
        obfs_password: query.take("obfs-password"),
        up: query.take("up"),
        down: query.take("down"),
        ports: query.take_any(&["mport", "ports"]),
    };
    let transport = Transport {
        sni: query.take_any(&["sni", "peer"]),
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

pub fn hysteria2_link(proxy: &Proxy) -> Result<String> {
    let Credentials::Hysteria2 {
        password,
        obfs,
        obfs_password,
        up,
        down,
        ports,
    } = &proxy.credentials
    else {
        return Err(mismatch(ProxyType::Hysteria2));
    };
    require(ProxyType::Hysteria2, "server", &proxy.server)?;
    require(ProxyType::Hysteria2, "password", password)?;

    let transport = &proxy.transport;
    let mut query = QueryBuilder::new();
    query
        .push_opt("sni", transport.sni.as_deref())
        .push_flag("insecure", transport.skip_cert_verify)
        .push_opt("obfs", obfs.as_deref())
        .push_opt("obfs-password", obfs_password.as_deref())
        .push_opt("up", up.as_deref())
        .push_opt("down", down.as_deref())
        .push_opt("mport", ports.as_deref())
        .push_list("alpn", &transport.alpn)
        .push_extra(&proxy.extra);

    Ok(build_link(
        "hysteria2",
        Some(&url_encode(password)),
        &proxy.server,
        proxy.port,
        "/",
        &query,
        &proxy.name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explode_hy2_alias() {
        let proxy = explode_hysteria2(
            "hy2://letmein@example.com:443/?insecure=1&obfs=salamander&obfs-password=gawrgura&sni=real.example.com&mport=20000-30000#Hy2",
        )
        .unwrap();
        assert_eq!(proxy.name, "Hy2");
        assert_eq!(proxy.port, 443);
        assert_eq!(
            proxy.credentials,
            Credentials::Hysteria2 {
                password: "letmein".to_string(),
                obfs: Some("salamander".to_string()),
                obfs_password: Some("gawrgura".to_string()),
                up: None,
                down: None,
                ports: Some("20000-30000".to_string()),
            }
        );
        assert_eq!(proxy.transport.sni.as_deref(), Some("real.example.com"));
        assert_eq!(proxy.transport.skip_cert_verify, Some(true));
        assert!(!proxy.transport.tls);
    }

    #[test]
    fn test_missing_password() {
        assert!(matches!(
            explode_hysteria2("hysteria2://example.com:443"),
            Err(ConvertError::MalformedUri { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let proxy = Proxy::new(
            "My Server (US) #1",
            "2001:db8::1",
            8443,
            Credentials::Hysteria2 {
                password: "secret".to_string(),
                obfs: None,
                obfs_password: None,
                up: Some("30 Mbps".to_string()),
                down: Some("200 Mbps".to_string()),
                ports: None,
            },
        )
        .with_transport(Transport {
            sni: Some("example.com".to_string()),
            alpn: vec!["h3".to_string()],
            ..Default::default()
        });

        let link = hysteria2_link(&proxy).unwrap();
        assert!(link.starts_with("hysteria2://secret@[2001:db8::1]:8443/?sni=example.com"));
        assert_eq!(explode_hysteria2(&link).unwrap(), proxy);
    }
}
