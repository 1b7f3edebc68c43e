use super::common::{mismatch, require, split_fragment, strip_scheme};
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Proxy, ProxyType, Transport};
use crate::utils::base64::{base64_decode, base64_encode};
use crate::utils::url::parse_flag;
use log::debug;
use serde_json::{Map, Value as JsonValue};
use serde_yaml::{Mapping, Value};

pub struct VmessCodec;

impl SchemeCodec for VmessCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["vmess"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::VMess
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_vmess(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        vmess_link(proxy)
    }
}

/// Parse a VMess link (`vmess://` + base64 of the v2rayN JSON object) into
/// a Proxy object
pub fn explode_vmess(vmess: &str) -> Result<Proxy> {
    let body = strip_scheme(vmess, "vmess").ok_or_else(|| malformed("not a vmess:// link"))?;
    let (body, fragment) = split_fragment(body);

    let decoded = base64_decode(body).ok_or_else(|| malformed("body is not base64"))?;
    let mut json = match serde_json::from_str::<JsonValue>(&decoded) {
        Ok(JsonValue::Object(map)) => map,
        Ok(_) => return Err(malformed("payload is not a JSON object")),
        Err(e) => return Err(malformed(&e.to_string())),
    };

    // Format version, always rewritten on encode
    json.remove("v");

    let name = take_text(&mut json, "ps").or(fragment).unwrap_or_default();
    let server = take_text(&mut json, "add").ok_or_else(|| malformed("missing server"))?;
    let port = take_text(&mut json, "port")
        .and_then(|p| p.trim().parse::<u16>().ok())
        .filter(|p| *p != 0)
        .ok_or_else(|| malformed("missing or invalid port"))?;
    let uuid = take_text(&mut json, "id").ok_or_else(|| malformed("missing id"))?;
    let alter_id = take_text(&mut json, "aid")
        .and_then(|a| a.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let cipher = take_text(&mut json, "scy").unwrap_or_else(|| "auto".to_string());

    let network = take_text(&mut json, "net").map(|n| n.to_ascii_lowercase());
    let header_type = take_text(&mut json, "type");
    let host = take_text(&mut json, "host");
    let path = take_text(&mut json, "path");

    let mut transport = Transport {
        network: match network.as_deref() {
            None | Some("tcp") => match header_type.as_deref() {
                Some("http") => Some("http".to_string()),
                _ => None,
            },
            Some(other) => Some(other.to_string()),
        },
        ..Default::default()
    };
    match transport.network.as_deref() {
        Some("grpc") => transport.service_name = path,
        Some(_) => {
            transport.host = host;
            transport.path = path;
        }
        None => {}
    }

    transport.tls = take_text(&mut json, "tls").is_some_and(|t| t != "none");
    transport.sni = take_text(&mut json, "sni");
    transport.alpn = take_text(&mut json, "alpn")
        .map(|a| {
            a.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();
    transport.client_fingerprint = take_text(&mut json, "fp");
    transport.skip_cert_verify = take_text(&mut json, "allowInsecure").and_then(|v| parse_flag(&v));

    let mut extra = Mapping::new();
    for (key, value) in json {
        if value.is_null() || value.as_str() == Some("") {
            continue;
        }
        match serde_yaml::to_value(&value) {
            Ok(value) => {
                extra.insert(Value::String(key), value);
            }
            Err(e) => debug!("Ignoring vmess field '{}': {}", key, e),
        }
    }

    Ok(Proxy::new(
        name,
        server,
        port,
        Credentials::VMess {
            uuid,
            alter_id,
            cipher,
        },
    )
    .with_transport(transport)
    .with_extra(extra))
}

/// Build a v2rayN style link. Every standard key is written, empty when
/// unset; extra fields are added when they do not collide.
pub fn vmess_link(proxy: &Proxy) -> Result<String> {
    let Credentials::VMess {
        uuid,
        alter_id,
        cipher,
    } = &proxy.credentials
    else {
        return Err(mismatch(ProxyType::VMess));
    };
    require(ProxyType::VMess, "server", &proxy.server)?;
    require(ProxyType::VMess, "uuid", uuid)?;

    let transport = &proxy.transport;
    let (network, header_type) = match transport.network.as_deref() {
        None => ("tcp", "none"),
        Some("http") => ("tcp", "http"),
        Some(network) => (network, "none"),
    };
    let path = match transport.network.as_deref() {
        Some("grpc") => transport.service_name.as_deref(),
        _ => transport.path.as_deref(),
    };

    let mut map = Map::new();
    let mut put = |key: &str, value: JsonValue| {
        map.insert(key.to_string(), value);
    };
    put("v", "2".into());
    put("ps", proxy.name.as_str().into());
    put("add", proxy.server.as_str().into());
    put("port", proxy.port.into());
    put("id", uuid.as_str().into());
    put("aid", (*alter_id).into());
    put("scy", if cipher.is_empty() { "auto" } else { cipher.as_str() }.into());
    put("net", network.into());
    put("type", header_type.into());
    put("host", transport.host.as_deref().unwrap_or_default().into());
    put("path", path.unwrap_or_default().into());
    put("tls", if transport.tls { "tls" } else { "" }.into());
    put("sni", transport.sni.as_deref().unwrap_or_default().into());
    put("alpn", transport.alpn.join(",").into());
    put("fp", transport.client_fingerprint.as_deref().unwrap_or_default().into());
    if let Some(insecure) = transport.skip_cert_verify {
        put("allowInsecure", insecure.into());
    }

    for (key, value) in &proxy.extra {
        let Some(key) = key.as_str() else {
            continue;
        };
        if map.contains_key(key) {
            continue;
        }
        match serde_json::to_value(value) {
            Ok(value) => {
                map.insert(key.to_string(), value);
            }
            Err(e) => debug!("Dropping field '{}' from vmess link: {}", key, e),
        }
    }

    let json = serde_json::to_string(&JsonValue::Object(map))
        .map_err(|e| ConvertError::Render(e.to_string()))?;
    Ok(format!("vmess://{}", base64_encode(&json)))
}

fn malformed(reason: &str) -> ConvertError {
    ConvertError::malformed("vmess", reason)
}

/// Removes `key` and returns it as text. Numbers and bools are accepted
/// since clients disagree on how `port`, `aid` and `allowInsecure` are typed.
fn take_text(json: &mut Map<String, JsonValue>, key: &str) -> Option<String> {
    match json.remove(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
