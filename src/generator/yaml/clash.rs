//! Clash YAML output: one mapping per proxy, wrapped according to the
//! requested [`OutputMode`].

use serde_yaml::{Mapping, Sequence, Value};

use crate::error::{ConvertError, Result};
use crate::models::{Credentials, OutputMode, Proxy, ProxyType, Transport};
use crate::utils::yaml::{merge_extra, put, put_list, put_opt, scalar_from_str};

/// Convert a proxy into a Clash `proxies` entry.
///
/// Keys come out as `name`, `type`, `server`, `port`, then the type's own
/// fields, then transport settings. Extra fields are merged last and never
/// override a field written here.
pub fn proxy_to_clash(proxy: &Proxy) -> Mapping {
    let mut map = Mapping::new();
    put(&mut map, "name", proxy.name.as_str());
    put(&mut map, "type", proxy.proxy_type().as_clash_type());
    put(&mut map, "server", proxy.server.as_str());
    put(&mut map, "port", proxy.port);

    match &proxy.credentials {
        Credentials::Shadowsocks { cipher, password } => {
            put(&mut map, "cipher", cipher.as_str());
            put(&mut map, "password", password.as_str());
        }
        Credentials::ShadowsocksR {
            cipher,
            password,
            protocol,
            obfs,
            protocol_param,
            obfs_param,
        } => {
            put(&mut map, "cipher", cipher.as_str());
            put(&mut map, "password", password.as_str());
            put(&mut map, "protocol", protocol.as_str());
            put_opt(&mut map, "protocol-param", protocol_param.as_ref());
            put(&mut map, "obfs", obfs.as_str());
            put_opt(&mut map, "obfs-param", obfs_param.as_ref());
        }
        Credentials::VMess {
            uuid,
            alter_id,
            cipher,
        } => {
            put(&mut map, "uuid", uuid.as_str());
            put(&mut map, "alterId", *alter_id);
            put(&mut map, "cipher", cipher.as_str());
        }
        Credentials::Vless { uuid, flow } => {
            put(&mut map, "uuid", uuid.as_str());
            put_opt(&mut map, "flow", flow.as_ref());
        }
        Credentials::Trojan { password } => {
            put(&mut map, "password", password.as_str());
        }
        Credentials::Hysteria {
            auth,
            protocol,
            up,
            down,
            obfs,
            ports,
        } => {
            put_opt(&mut map, "auth-str", auth.as_ref());
            put_opt(&mut map, "protocol", protocol.as_ref());
            put_scalar(&mut map, "up", up.as_deref());
            put_scalar(&mut map, "down", down.as_deref());
            put_opt(&mut map, "obfs", obfs.as_ref());
            put_scalar(&mut map, "ports", ports.as_deref());
        }
        Credentials::Hysteria2 {
            password,
            obfs,
            obfs_password,
            up,
            down,
            ports,
        } => {
            put(&mut map, "password", password.as_str());
            put_opt(&mut map, "obfs", obfs.as_ref());
            put_opt(&mut map, "obfs-password", obfs_password.as_ref());
            put_scalar(&mut map, "up", up.as_deref());
            put_scalar(&mut map, "down", down.as_deref());
            put_scalar(&mut map, "ports", ports.as_deref());
        }
        Credentials::Tuic {
            uuid,
            password,
            congestion_control,
            udp_relay_mode,
        } => {
            put(&mut map, "uuid", uuid.as_str());
            put_opt(&mut map, "password", password.as_ref());
            put_opt(&mut map, "congestion-controller", congestion_control.as_ref());
            put_opt(&mut map, "udp-relay-mode", udp_relay_mode.as_ref());
        }
        Credentials::Socks5 { username, password } | Credentials::Http { username, password } => {
            put_opt(&mut map, "username", username.as_ref());
            put_opt(&mut map, "password", password.as_ref());
        }
    }

    write_transport(&mut map, proxy.proxy_type(), &proxy.transport);
    merge_extra(&mut map, &proxy.extra);
    map
}

/// Serialize proxies into a Clash document (or a bare list).
pub fn render_proxies(proxies: &[Proxy], mode: OutputMode) -> Result<String> {
    let list: Sequence = proxies
        .iter()
        .map(|p| Value::Mapping(proxy_to_clash(p)))
        .collect();

    let document = match mode {
        OutputMode::Proxies => {
            let mut root = Mapping::new();
            put(&mut root, "proxies", list);
            Value::Mapping(root)
        }
        OutputMode::Payload => {
            let mut inner = Mapping::new();
            put(&mut inner, "proxies", list);
            let mut root = Mapping::new();
            put(&mut root, "payload", inner);
            Value::Mapping(root)
        }
        OutputMode::None => Value::Sequence(list),
    };

    serde_yaml::to_string(&document).map_err(|e| ConvertError::Render(e.to_string()))
}

/// Numeric-looking text (`100`, `443`) is written as a number.
fn put_scalar(map: &mut Mapping, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        put(map, key, scalar_from_str(value));
    }
}

fn write_transport(map: &mut Mapping, proxy_type: ProxyType, transport: &Transport) {
    if let Some(plugin) = &transport.plugin {
        put(map, "plugin", plugin.name.as_str());
        let mut opts = Mapping::new();
        for opt in &plugin.opts {
            let value = match &opt.value {
                Some(value) => scalar_from_str(value),
                None => Value::Bool(true),
            };
            put(&mut opts, &opt.key, value);
        }
        if !opts.is_empty() {
            put(map, "plugin-opts", opts);
        }
    }

    let has_switch = matches!(
        proxy_type,
        ProxyType::VMess | ProxyType::Vless | ProxyType::Socks5 | ProxyType::Http
    );
    if has_switch && transport.tls {
        put(map, "tls", true);
    }
    let sni_key = match proxy_type {
        ProxyType::VMess | ProxyType::Vless => "servername",
        _ => "sni",
    };
    put_opt(map, sni_key, transport.sni.as_ref());
    put_list(map, "alpn", &transport.alpn);
    if let Some(skip) = transport.skip_cert_verify {
        put(map, "skip-cert-verify", skip);
    }
    put_opt(map, "client-fingerprint", transport.client_fingerprint.as_ref());

    if let Some(reality) = &transport.reality {
        let mut opts = Mapping::new();
        put(&mut opts, "public-key", reality.public_key.as_str());
        put_opt(&mut opts, "short-id", reality.short_id.as_ref());
        put(map, "reality-opts", opts);
    }

    let Some(network) = transport.network.as_deref() else {
        return;
    };
    put(map, "network", network);

    let mut opts = Mapping::new();
    match network {
        "grpc" => {
            put_opt(&mut opts, "grpc-service-name", transport.service_name.as_ref());
        }
        "h2" => {
            if let Some(host) = &transport.host {
                let hosts: Vec<String> = host
                    .split(',')
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect();
                put_list(&mut opts, "host", &hosts);
            }
            put_opt(&mut opts, "path", transport.path.as_ref());
        }
        "http" => {
            if let Some(path) = &transport.path {
                put_list(&mut opts, "path", std::slice::from_ref(path));
            }
            if let Some(host) = &transport.host {
                let mut headers = Mapping::new();
                put_list(&mut headers, "Host", std::slice::from_ref(host));
                put(&mut opts, "headers", headers);
            }
        }
        _ => {
            put_opt(&mut opts, "path", transport.path.as_ref());
            if let Some(host) = transport.host.as_ref().filter(|h| !h.is_empty()) {
                let mut headers = Mapping::new();
                put(&mut headers, "Host", host.as_str());
                put(&mut opts, "headers", headers);
            }
        }
    }
    if !opts.is_empty() {
        put(map, &format!("{}-opts", network), opts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Plugin, PluginOpt};
    use crate::parser::yaml::clash::proxy_from_mapping;

    fn keys(map: &Mapping) -> Vec<&str> {
        map.keys().filter_map(Value::as_str).collect()
    }

    #[test]
    fn test_field_order_and_extra_merge() {
        let mut extra = Mapping::new();
        put(&mut extra, "udp", true);
        put(&mut extra, "password", "ignored");
        let proxy = Proxy::new(
            "ss1",
            "1.2.3.4",
            8388,
            Credentials::Shadowsocks {
                cipher: "aes-128-gcm".to_string(),
                password: "secret".to_string(),
            },
        )
        .with_transport(Transport {
            plugin: Some(Plugin {
                name: "obfs".to_string(),
                opts: vec![
                    PluginOpt::new("mode", Some("http".to_string())),
                    PluginOpt::new("host", Some("bing.com".to_string())),
                ],
            }),
            ..Default::default()
        })
        .with_extra(extra);

        let map = proxy_to_clash(&proxy);
        assert_eq!(
            keys(&map),
            vec![
                "name",
                "type",
                "server",
                "port",
                "cipher",
                "password",
                "plugin",
                "plugin-opts",
                "udp"
            ]
        );
        assert_eq!(map.get("password"), Some(&Value::from("secret")));
        assert_eq!(map.get("port"), Some(&Value::from(8388)));
    }

    #[test]
    fn test_entry_round_trip() {
        let yaml = r#"
name: vmess-h2
type: vmess
server: example.com
port: 443
uuid: b831381d-6324-4d53-ad4f-8cda48b30811
alterId: 0
cipher: auto
tls: true
servername: example.com
skip-cert-verify: false
network: h2
h2-opts:
  host:
    - a.example.com
    - b.example.com
  path: /h2
udp: true
"#;
        let map = match serde_yaml::from_str::<Value>(yaml).unwrap() {
            Value::Mapping(map) => map,
            _ => unreachable!(),
        };
        let proxy = proxy_from_mapping(map.clone()).unwrap();
        assert_eq!(proxy.transport.host.as_deref(), Some("a.example.com,b.example.com"));
        let rendered = proxy_to_clash(&proxy);
        assert_eq!(proxy_from_mapping(rendered).unwrap(), proxy);
    }

    #[test]
    fn test_disabled_plugin_opts_survive_round_trip() {
        let yaml = r#"
name: ss-v2ray
type: ss
server: 1.2.3.4
port: 8388
cipher: aes-128-gcm
password: secret
plugin: v2ray-plugin
plugin-opts:
  mode: websocket
  mux: false
  path: null
"#;
        let map = match serde_yaml::from_str::<Value>(yaml).unwrap() {
            Value::Mapping(map) => map,
            _ => unreachable!(),
        };
        let proxy = proxy_from_mapping(map).unwrap();
        let rendered = proxy_to_clash(&proxy);

        let opts = rendered.get("plugin-opts").and_then(Value::as_mapping).unwrap();
        assert_eq!(opts.get("mode"), Some(&Value::from("websocket")));
        assert_eq!(opts.get("mux"), Some(&Value::Bool(false)));
        assert_eq!(opts.get("path"), Some(&Value::Null));
        assert_eq!(proxy_from_mapping(rendered).unwrap(), proxy);
    }

    #[test]
    fn test_output_modes() {
        let proxy = Proxy::new(
            "t",
            "a.com",
            443,
            Credentials::Trojan {
                password: "x".to_string(),
            },
        );
        let proxies = vec![proxy];

        let doc: Value =
            serde_yaml::from_str(&render_proxies(&proxies, OutputMode::Proxies).unwrap()).unwrap();
        assert_eq!(doc["proxies"][0]["name"], Value::from("t"));

        let doc: Value =
            serde_yaml::from_str(&render_proxies(&proxies, OutputMode::Payload).unwrap()).unwrap();
        assert_eq!(doc["payload"]["proxies"][0]["type"], Value::from("trojan"));

        let doc: Value =
            serde_yaml::from_str(&render_proxies(&proxies, OutputMode::None).unwrap()).unwrap();
        assert_eq!(doc[0]["port"], Value::from(443));

        assert_eq!(
            render_proxies(&[], OutputMode::Proxies).unwrap().trim(),
            "proxies: []"
        );
    }
}
