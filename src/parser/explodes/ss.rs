use super::common::{build_link, mismatch, require, split_fragment, strip_scheme};
use super::SchemeCodec;
use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Plugin, PluginOpt, Proxy, ProxyType, Transport};
use crate::utils::base64::{base64_decode, url_safe_base64_encode};
use crate::utils::url::{split_host_port, url_decode, QueryBuilder, QueryParams};

pub struct SsCodec;

impl SchemeCodec for SsCodec {
    fn schemes(&self) -> &'static [&'static str] {
        &["ss"]
    }

    fn proxy_type(&self) -> ProxyType {
        ProxyType::Shadowsocks
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        explode_ss(link)
    }

    fn encode(&self, proxy: &Proxy) -> Result<String> {
        ss_link(proxy)
    }
}

/// Parse a Shadowsocks link into a Proxy object
///
/// Accepts SIP002 links, with the userinfo either base64 encoded or plain
/// `method:password`, and the legacy form where everything before the
/// fragment is one base64 blob.
pub fn explode_ss(ss: &str) -> Result<Proxy> {
    let body = strip_scheme(ss, "ss").ok_or_else(|| malformed("not an ss:// link"))?;
    let (body, name) = split_fragment(body);

    let (body, mut query) = match body.split_once('?') {
        Some((main, query)) => (main, QueryParams::parse(query)),
        None => (body, QueryParams::default()),
    };
    let body = body.trim_end_matches('/');

    let (cipher, password, server, port) = match body.rsplit_once('@') {
        Some((userinfo, address)) => {
            let (cipher, password) = decode_userinfo(userinfo)?;
            let (server, port) =
                split_host_port(address).ok_or_else(|| malformed("missing server or port"))?;
            (cipher, password, server, port)
        }
        None => {
            // Legacy format: base64(method:password@server:port)
            let decoded = base64_decode(body).ok_or_else(|| malformed("body is not base64"))?;
            let (userinfo, address) = decoded
                .rsplit_once('@')
                .ok_or_else(|| malformed("missing server"))?;
            let (cipher, password) = userinfo
                .split_once(':')
                .filter(|(cipher, _)| !cipher.is_empty())
                .ok_or_else(|| malformed("missing method"))?;
            let (server, port) =
                split_host_port(address).ok_or_else(|| malformed("missing server or port"))?;
            (cipher.to_string(), password.to_string(), server, port)
        }
    };

    let transport = Transport {
        plugin: query.take("plugin").and_then(|p| parse_plugin(&p)),
        ..Default::default()
    };

    Ok(Proxy::new(
        name.unwrap_or_default(),
        server,
        port,
        Credentials::Shadowsocks { cipher, password },
    )
    .with_transport(transport)
    .with_extra(query.into_extra()))
}

/// Build a SIP002 link with a URL-safe base64 userinfo.
pub fn ss_link(proxy: &Proxy) -> Result<String> {
    let Credentials::Shadowsocks { cipher, password } = &proxy.credentials else {
        return Err(mismatch(ProxyType::Shadowsocks));
    };
    require(ProxyType::Shadowsocks, "server", &proxy.server)?;
    require(ProxyType::Shadowsocks, "cipher", cipher)?;

    let userinfo = url_safe_base64_encode(&format!("{}:{}", cipher, password));

    let mut query = QueryBuilder::new();
    if let Some(plugin) = &proxy.transport.plugin {
        query.push("plugin", &plugin_to_string(plugin));
    }
    query.push_extra(&proxy.extra);

    Ok(build_link(
        "ss",
        Some(&userinfo),
        &proxy.server,
        proxy.port,
        "/",
        &query,
        &proxy.name,
    ))
}

fn malformed(reason: &str) -> ConvertError {
    ConvertError::malformed("ss", reason)
}

/// Userinfo is tried as base64 first, then as percent-encoded plain text.
fn decode_userinfo(userinfo: &str) -> Result<(String, String)> {
    let raw = url_decode(userinfo);
    let text = base64_decode(&raw)
        .filter(|decoded| decoded.contains(':'))
        .unwrap_or(raw);

    match text.split_once(':') {
        Some((cipher, password)) if !cipher.is_empty() => {
            Ok((cipher.to_string(), password.to_string()))
        }
        _ => Err(malformed("userinfo is neither base64 nor method:password")),
    }
}

/// Splits `name;key=value;flag` into a plugin, renaming simple-obfs to the
/// Clash vocabulary (`obfs` with `mode`/`host`).
fn parse_plugin(value: &str) -> Option<Plugin> {
    let mut entries = value.split(';').map(str::trim).filter(|e| !e.is_empty());
    let name = entries.next()?;
    let obfs = matches!(name, "obfs-local" | "simple-obfs");

    let opts = entries
        .map(|entry| {
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key, Some(value.to_string())),
                None => (entry, None),
            };
            let key = match (obfs, key) {
                (true, "obfs") => "mode",
                (true, "obfs-host") => "host",
                (_, key) => key,
            };
            PluginOpt::new(key, value)
        })
        .collect();

    Some(Plugin {
        name: if obfs { "obfs".to_string() } else { name.to_string() },
        opts,
    })
}

fn plugin_to_string(plugin: &Plugin) -> String {
    let obfs = plugin.name == "obfs";
    let mut entries = vec![if obfs {
        "obfs-local".to_string()
    } else {
        plugin.name.clone()
    }];

    for opt in &plugin.opts {
        let key = match (obfs, opt.key.as_str()) {
            (true, "mode") => "obfs",
            (true, "host") => "obfs-host",
            (_, key) => key,
        };
        entries.push(match &opt.value {
            Some(value) => format!("{}={}", key, value),
            None => key.to_string(),
        });
    }

    entries.join(";")
}
