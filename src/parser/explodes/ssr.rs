use super::common::{mismatch, require, strip_scheme};
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Proxy, ProxyType};
use crate::utils::base64::{base64_decode, url_safe_base64_encode};
use crate::utils::url::QueryParams;
use crate::utils::yaml::{scalar_from_str, scalar_to_string};
use log::debug;
use serde_yaml::Mapping;

pub struct SsrCodec;

impl SchemeCodec for SsrCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["ssr"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::ShadowsocksR
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_ssr(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        ssr_link(proxy)
    }
}

/// Parse a ShadowsocksR link into a Proxy object
///
/// The whole body is base64 of
/// `host:port:protocol:method:obfs:base64(password)/?obfsparam=..&protoparam=..&remarks=..`
/// where every parameter value is base64 encoded as well.
pub fn explode_ssr(ssr: &str) -> Result<Proxy> {
    let body = strip_scheme(ssr, "ssr").ok_or_else(|| malformed("not an ssr:// link"))?;
    let decoded = base64_decode(body).ok_or_else(|| malformed("body is not base64"))?;

    let (main, query) = match decoded.split_once("/?").or_else(|| decoded.split_once('?')) {
        Some((main, query)) => (main, query),
        None => (decoded.as_str(), ""),
    };

    let parts: Vec<&str> = main.trim_end_matches('/').rsplitn(6, ':').collect();
    let &[password, obfs, cipher, protocol, port, server] = parts.as_slice() else {
        return Err(malformed("expected host:port:protocol:method:obfs:password"));
    };

    let server = server.trim_start_matches('[').trim_end_matches(']');
    if server.is_empty() {
        return Err(malformed("missing server"));
    }
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| malformed("missing or invalid port"))?;
    if cipher.is_empty() {
        return Err(malformed("missing method"));
    }
    let password = base64_decode(password).unwrap_or_default();

    let mut params = QueryParams::parse(query);
    let mut take = |key: &str| params.take(key).and_then(|v| base64_decode(&v));
    let obfs_param = take("obfsparam").filter(|s| !s.is_empty());
    let protocol_param = take("protoparam").filter(|s| !s.is_empty());
    let name = take("remarks").unwrap_or_default();

    let mut extra = Mapping::new();
    for (key, value) in params.into_extra() {
        let text = scalar_to_string(&value).unwrap_or_default();
        let value = base64_decode(&text)
            .map(|decoded| scalar_from_str(&decoded))
            .unwrap_or(value);
        extra.insert(key, value);
    }

    Ok(Proxy::new(
        name,
        server,
        port,
        Credentials::ShadowsocksR {
            cipher: cipher.to_string(),
            password,
            protocol: protocol.to_string(),
            obfs: obfs.to_string(),
            protocol_param,
            obfs_param,
        },
    )
    .with_extra(extra))
}

pub fn ssr_link(proxy: &Proxy) -> Result<String> {
    let Credentials::ShadowsocksR {
        cipher,
        password,
        protocol,
        obfs,
        protocol_param,
        obfs_param,
    } = &proxy.credentials
    else {
        return Err(mismatch(ProxyType::ShadowsocksR));
    };
    require(ProxyType::ShadowsocksR, "server", &proxy.server)?;
    require(ProxyType::ShadowsocksR, "cipher", cipher)?;

    let protocol = if protocol.is_empty() { "origin" } else { protocol };
    let obfs = if obfs.is_empty() { "plain" } else { obfs };

    let mut params = Vec::new();
    let mut push = |key: &str, value: &str| {
        params.push(format!("{}={}", key, url_safe_base64_encode(value)));
    };
    push("obfsparam", obfs_param.as_deref().unwrap_or_default());
    push("protoparam", protocol_param.as_deref().unwrap_or_default());
    push("remarks", &proxy.name);

    for (key, value) in &proxy.extra {
        let (Some(key), Some(text)) = (key.as_str(), scalar_to_string(value)) else {
            debug!("Dropping non-scalar field {:?} from ssr link", key);
            continue;
        };
        if !matches!(key, "obfsparam" | "protoparam" | "remarks") {
            push(key, &text);
        }
    }

    let server = if proxy.server.contains(':') {
        format!("[{}]", proxy.server)
    } else {
        proxy.server.clone()
    };
    let body = format!(
        "{}:{}:{}:{}:{}:{}/?{}",
        server,
        proxy.port,
        protocol,
        cipher,
        obfs,
        url_safe_base64_encode(password),
        params.join("&")
    );

    Ok(format!("ssr://{}", url_safe_base64_encode(&body)))
}

fn malformed(reason: &str) -> ConvertError {
    ConvertError::malformed("ssr", reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    #[test]
    fn test_explode_ssr() {
        let link = format!(
            "ssr://{}",
            url_safe_base64_encode(
                "127.0.0.1:1234:auth_aes128_md5:aes-128-cfb:tls1.2_ticket_auth:YWFhYmJi/?obfsparam=YnJlYWt3YS5uZXQ&protoparam=&remarks=5rWL6K-V5Lit5paH&group=5rWL6K-V5Lit5paH"
            )
        );
        let proxy = explode_ssr(&link).unwrap();
        assert_eq!(proxy.name, "测试中文");
        assert_eq!(proxy.server, "127.0.0.1");
        assert_eq!(proxy.port, 1234);
        assert_eq!(
            proxy.credentials,
            Credentials::ShadowsocksR {
                cipher: "aes-128-cfb".to_string(),
                password: "aaabbb".to_string(),
                protocol: "auth_aes128_md5".to_string(),
                obfs: "tls1.2_ticket_auth".to_string(),
                protocol_param: None,
                obfs_param: Some("breakwa.net".to_string()),
            }
        );
        assert_eq!(
            proxy.extra.get("group"),
            Some(&Value::String("测试中文".to_string()))
        );
    }

    #[test]
    fn test_malformed_body() {
        let link = format!("ssr://{}", url_safe_base64_encode("example.com:443:origin"));
        assert!(matches!(
            explode_ssr(&link),
            Err(ConvertError::MalformedUri { .. })
        ));
        assert!(explode_ssr("ssr://!!!").is_err());
    }

    #[test]
    fn test_round_trip() {
        let proxy = Proxy::new(
            "My Server (US) #1",
            "example.com",
            8443,
            Credentials::ShadowsocksR {
                cipher: "chacha20".to_string(),
                password: "pa:ss/word".to_string(),
                protocol: "auth_chain_a".to_string(),
                obfs: "http_simple".to_string(),
                protocol_param: Some("32:abc".to_string()),
                obfs_param: None,
            },
        );
        let link = ssr_link(&proxy).unwrap();
        assert!(link.starts_with("ssr://"));
        assert_eq!(explode_ssr(&link).unwrap(), proxy);
    }
}
