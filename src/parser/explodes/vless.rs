use super::common::{build_link, mismatch, read_stream_params, require, write_stream_params};
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Proxy, ProxyType, Reality, Transport};
use crate::utils::url::{url_encode, LinkParts, QueryBuilder};
use serde_yaml::Value;

pub struct VlessCodec;

impl SchemeCodec for VlessCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["vless"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::Vless
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_vless(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        vless_link(proxy)
    }
}

/// Parse a VLESS link into a Proxy object
///
/// Format: `vless://uuid@host:port?security=tls&type=ws&...#name`
pub fn explode_vless(vless: &str) -> Result<Proxy> {
    let LinkParts {
        username,
        host,
        port,
        mut query,
        name,
        ..
    } = LinkParts::parse(vless, "vless")?;
    let uuid = username.ok_or_else(|| ConvertError::malformed("vless", "missing uuid"))?;

    let mut transport = Transport::default();
    match query.take("security").as_deref() {
        Some("tls") | Some("xtls") => transport.tls = true,
        Some("reality") => {
            transport.tls = true;
            transport.reality = query.take("pbk").map(|public_key| Reality {
                public_key,
                short_id: query.take("sid"),
            });
        }
        _ => {}
    }
    let flow = query.take("flow");
    read_stream_params(&mut query, &mut transport);

    // `none` is the only encryption vless supports; anything else is kept
    let encryption = query.take("encryption").filter(|e| e != "none");

    let mut extra = query.into_extra();
    if let Some(encryption) = encryption {
        extra.insert(Value::from("encryption"), Value::String(encryption));
    }

    Ok(Proxy::new(
        name.unwrap_or_default(),
        host,
        port,
        Credentials::Vless { uuid, flow },
    )
    .with_transport(transport)
    .with_extra(extra))
}

pub fn vless_link(proxy: &Proxy) -> Result<String> {
    let Credentials::Vless { uuid, flow } = &proxy.credentials else {
        return Err(mismatch(ProxyType::Vless));
    };
    require(ProxyType::Vless, "server", &proxy.server)?;
    require(ProxyType::Vless, "uuid", uuid)?;

    let transport = &proxy.transport;
    let encryption = proxy
        .extra
        .get("encryption")
        .and_then(Value::as_str)
        .unwrap_or("none");
    let mut query = QueryBuilder::new();
    query
        .push("encryption", encryption)
        .push_opt("flow", flow.as_deref());
    match (&transport.reality, transport.tls) {
        (Some(reality), _) => {
            query
                .push("security", "reality")
                .push("pbk", &reality.public_key)
                .push_opt("sid", reality.short_id.as_deref());
        }
        (None, true) => {
            query.push("security", "tls");
        }
        (None, false) => {
            query.push("security", "none");
        }
    }
    write_stream_params(&mut query, transport);
    query.push_extra(&proxy.extra);

    Ok(build_link(
        "vless",
        Some(&url_encode(uuid)),
        &proxy.server,
        proxy.port,
        "",
        &query,
        &proxy.name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explode_reality_link() {
        let proxy = explode_vless(
            "vless://b831381d-6324-4d53-ad4f-8cda48b30811@1.2.3.4:443?encryption=none&flow=xtls-rprx-vision&security=reality&sni=www.microsoft.com&fp=chrome&pbk=SbVKOEMjK0sIlbwg4akyBg5mL5KZwwB-ed4eEE7YnRc&sid=6ba85179e30d4fc2&type=tcp&headerType=none#Reality",
        )
        .unwrap();
        assert_eq!(proxy.name, "Reality");
        assert_eq!(
            proxy.credentials,
            Credentials::Vless {
                uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                flow: Some("xtls-rprx-vision".to_string()),
            }
        );
        let transport = &proxy.transport;
        assert!(transport.tls);
        assert_eq!(transport.network, None);
        assert_eq!(transport.sni.as_deref(), Some("www.microsoft.com"));
        assert_eq!(transport.client_fingerprint.as_deref(), Some("chrome"));
        assert_eq!(
            transport.reality,
            Some(Reality {
                public_key: "SbVKOEMjK0sIlbwg4akyBg5mL5KZwwB-ed4eEE7YnRc".to_string(),
                short_id: Some("6ba85179e30d4fc2".to_string()),
            })
        );
        assert!(proxy.extra.is_empty());
    }

    #[test]
    fn test_missing_uuid_is_malformed() {
        assert!(matches!(
            explode_vless("vless://example.com:443?type=ws"),
            Err(ConvertError::MalformedUri { .. })
        ));
    }

    #[test]
    fn test_unknown_params_become_extra() {
        let proxy =
            explode_vless("vless://id@example.com:443?security=tls&type=ws&path=%2Fws&ed=2048")
                .unwrap();
        assert_eq!(proxy.transport.path.as_deref(), Some("/ws"));
        assert_eq!(proxy.extra.get("ed"), Some(&Value::Number(2048.into())));
    }

    #[test]
    fn test_non_default_encryption_survives_round_trip() {
        let proxy =
            explode_vless("vless://id@example.com:443?encryption=aes-128-gcm&security=tls#x")
                .unwrap();
        assert_eq!(
            proxy.extra.get("encryption"),
            Some(&Value::from("aes-128-gcm"))
        );

        let link = vless_link(&proxy).unwrap();
        assert!(link.contains("encryption=aes-128-gcm"), "{}", link);
        assert!(!link.contains("encryption=none"), "{}", link);
        assert_eq!(explode_vless(&link).unwrap(), proxy);
    }

    #[test]
    fn test_round_trip_keeps_name() {
        let proxy = Proxy::new(
            "My Server (US) #1",
            "example.com",
            443,
            Credentials::Vless {
                uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                flow: None,
            },
        )
        .with_transport(Transport {
            network: Some("ws".to_string()),
            path: Some("/path?ed=2048".to_string()),
            host: Some("cdn.example.com".to_string()),
            tls: true,
            sni: Some("example.com".to_string()),
            ..Default::default()
        });

        let link = vless_link(&proxy).unwrap();
        assert!(link.ends_with("#My%20Server%20%28US%29%20%231"));
        assert_eq!(explode_vless(&link).unwrap(), proxy);
    }
}
