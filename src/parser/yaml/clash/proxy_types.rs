//! Field mapping from one Clash `proxies` entry to a [`Proxy`].
//!
//! Every reader consumes the keys it understands from a [`YamlFields`];
//! whatever is left when the entry has been read becomes the proxy's extra
//! fields, nested option blocks included.

use serde_yaml::{Mapping, Value};

use crate::error::{ConvertError, Result};
use crate::models::{Credentials, Plugin, PluginOpt, Proxy, ProxyType, Reality, Transport};
use crate::utils::yaml::scalar_to_string;
use crate::utils::YamlFields;

/// Build a proxy from one entry of a Clash proxy list.
pub fn proxy_from_mapping(map: Mapping) -> Result<Proxy> {
    let mut fields = YamlFields::new(map);

    let type_name = fields
        .take_str("type")
        .ok_or(ConvertError::MissingField("type"))?;
    let proxy_type = ProxyType::from_clash_type(&type_name)
        .ok_or_else(|| ConvertError::UnknownType(type_name.clone()))?;

    let server = fields
        .take_str("server")
        .ok_or(ConvertError::MissingField("server"))?;
    let port = match fields.take_u64("port") {
        None => return Err(ConvertError::MissingField("port")),
        Some(Ok(port)) => u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ConvertError::InvalidEntry(format!("port {} is out of range", port)))?,
        Some(Err(raw)) => {
            return Err(ConvertError::InvalidEntry(format!("invalid port '{}'", raw)))
        }
    };
    let name = fields.take_str("name").unwrap_or_default();

    let mut transport = Transport::default();
    let credentials = match proxy_type {
        ProxyType::Shadowsocks => read_ss(&mut fields, &mut transport)?,
        ProxyType::ShadowsocksR => read_ssr(&mut fields)?,
        ProxyType::VMess => read_vmess(&mut fields, &mut transport)?,
        ProxyType::Vless => read_vless(&mut fields, &mut transport)?,
        ProxyType::Trojan => read_trojan(&mut fields, &mut transport)?,
        ProxyType::Hysteria => read_hysteria(&mut fields, &mut transport),
        ProxyType::Hysteria2 => read_hysteria2(&mut fields, &mut transport)?,
        ProxyType::Tuic => read_tuic(&mut fields, &mut transport)?,
        ProxyType::Socks5 => {
            read_tls(&mut fields, &mut transport, true);
            Credentials::Socks5 {
                username: fields.take_str("username"),
                password: fields.take_str("password"),
            }
        }
        ProxyType::Http => {
            read_tls(&mut fields, &mut transport, true);
            Credentials::Http {
                username: fields.take_str("username"),
                password: fields.take_str("password"),
            }
        }
    };

    Ok(Proxy::new(name, server, port, credentials)
        .with_transport(transport)
        .with_extra(fields.into_mapping()))
}

fn required(fields: &mut YamlFields, key: &'static str) -> Result<String> {
    fields.take_str(key).ok_or(ConvertError::MissingField(key))
}

fn read_ss(fields: &mut YamlFields, transport: &mut Transport) -> Result<Credentials> {
    let cipher = required(fields, "cipher")?;
    let password = fields.take_str("password").unwrap_or_default();

    if let Some(name) = fields.take_str("plugin") {
        let mut opts = Vec::new();
        if let Some(Value::Mapping(raw)) = fields.take("plugin-opts") {
            let mut leftover = Mapping::new();
            for (key, value) in raw {
                let Some(key_text) = key.as_str() else {
                    leftover.insert(key, value);
                    continue;
                };
                let text = match &value {
                    Value::Bool(true) => {
                        opts.push(PluginOpt::new(key_text, None));
                        continue;
                    }
                    Value::Bool(false) | Value::Null => None,
                    other => scalar_to_string(other),
                };
                match text {
                    Some(text) => opts.push(PluginOpt::new(key_text, Some(text))),
                    None => {
                        leftover.insert(key, value);
                    }
                }
            }
            fields.restore("plugin-opts", YamlFields::new(leftover));
        }
        transport.plugin = Some(Plugin { name, opts });
    }

    Ok(Credentials::Shadowsocks { cipher, password })
}

fn read_ssr(fields: &mut YamlFields) -> Result<Credentials> {
    Ok(Credentials::ShadowsocksR {
        cipher: required(fields, "cipher")?,
        password: fields.take_str("password").unwrap_or_default(),
        protocol: fields
            .take_str("protocol")
            .unwrap_or_else(|| "origin".to_string()),
        obfs: fields.take_str("obfs").unwrap_or_else(|| "plain".to_string()),
        protocol_param: fields.take_str_any(&["protocol-param", "protocolparam"]),
        obfs_param: fields.take_str_any(&["obfs-param", "obfsparam"]),
    })
}

fn read_vmess(fields: &mut YamlFields, transport: &mut Transport) -> Result<Credentials> {
    let uuid = required(fields, "uuid")?;
    let alter_id = match fields.take_u64("alterId") {
        None => 0,
        Some(Ok(aid)) => u32::try_from(aid)
            .map_err(|_| ConvertError::InvalidEntry(format!("alterId {} is out of range", aid)))?,
        Some(Err(raw)) => {
            return Err(ConvertError::InvalidEntry(format!("invalid alterId '{}'", raw)))
        }
    };
    let cipher = fields
        .take_str("cipher")
        .unwrap_or_else(|| "auto".to_string());

    read_tls(fields, transport, true);
    read_network(fields, transport);

    Ok(Credentials::VMess {
        uuid,
        alter_id,
        cipher,
    })
}

fn read_vless(fields: &mut YamlFields, transport: &mut Transport) -> Result<Credentials> {
    let uuid = required(fields, "uuid")?;
    let flow = fields.take_str("flow");

    read_tls(fields, transport, true);
    if let Some(mut reality) = fields.take_nested("reality-opts") {
        if let Some(public_key) = reality.take_str("public-key") {
            transport.tls = true;
            transport.reality = Some(Reality {
                public_key,
                short_id: reality.take_str("short-id"),
            });
        }
        fields.restore("reality-opts", reality);
    }
    read_network(fields, transport);

    Ok(Credentials::Vless { uuid, flow })
}

fn read_trojan(fields: &mut YamlFields, transport: &mut Transport) -> Result<Credentials> {
    let password = required(fields, "password")?;
    read_tls(fields, transport, false);
    read_network(fields, transport);
    Ok(Credentials::Trojan { password })
}

fn read_hysteria(fields: &mut YamlFields, transport: &mut Transport) -> Credentials {
    read_tls(fields, transport, false);
    Credentials::Hysteria {
        auth: fields.take_str_any(&["auth-str", "auth_str", "auth"]),
        protocol: fields.take_str("protocol"),
        up: fields.take_str("up"),
        down: fields.take_str("down"),
        obfs: fields.take_str("obfs"),
        ports: fields.take_str("ports"),
    }
}

fn read_hysteria2(fields: &mut YamlFields, transport: &mut Transport) -> Result<Credentials> {
    let password = required(fields, "password")?;
    read_tls(fields, transport, false);
    Ok(Credentials::Hysteria2 {
        password,
        obfs: fields.take_str("obfs"),
        obfs_password: fields.take_str("obfs-password"),
        up: fields.take_str("up"),
        down: fields.take_str("down"),
        ports: fields.take_str("ports"),
    })
}

fn read_tuic(fields: &mut YamlFields, transport: &mut Transport) -> Result<Credentials> {
    let uuid = required(fields, "uuid")?;
    read_tls(fields, transport, false);
    Ok(Credentials::Tuic {
        uuid,
        password: fields.take_str("password"),
        congestion_control: fields.take_str("congestion-controller"),
        udp_relay_mode: fields.take_str("udp-relay-mode"),
    })
}

/// TLS settings. Only some types carry an explicit `tls` switch; for the
/// rest TLS is implied by the protocol.
fn read_tls(fields: &mut YamlFields, transport: &mut Transport, has_switch: bool) {
    if has_switch {
        transport.tls = fields.take_bool("tls").unwrap_or(false);
    }
    transport.sni = fields.take_str_any(&["servername", "sni"]);
    transport.alpn = fields.take_list("alpn");
    transport.skip_cert_verify = fields.take_bool("skip-cert-verify");
    transport.client_fingerprint = fields.take_str("client-fingerprint");
}

/// `network` plus its `<network>-opts` block.
fn read_network(fields: &mut YamlFields, transport: &mut Transport) {
    let network = fields
        .take_str("network")
        .map(|n| n.to_ascii_lowercase())
        .filter(|n| n != "tcp");

    match network.as_deref() {
        Some("grpc") => {
            if let Some(mut opts) = fields.take_nested("grpc-opts") {
                transport.service_name = opts.take_str("grpc-service-name");
                fields.restore("grpc-opts", opts);
            }
        }
        Some("h2") => {
            if let Some(mut opts) = fields.take_nested("h2-opts") {
                let hosts = opts.take_list("host");
                transport.host = Some(hosts.join(",")).filter(|h| !h.is_empty());
                transport.path = opts.take_str("path");
                fields.restore("h2-opts", opts);
            }
        }
        Some("http") => {
            if let Some(mut opts) = fields.take_nested("http-opts") {
                transport.path = opts.take_list("path").into_iter().next();
                if let Some(mut headers) = opts.take_nested("headers") {
                    transport.host = headers.take_list("Host").into_iter().next();
                    opts.restore("headers", headers);
                }
                fields.restore("http-opts", opts);
            }
        }
        Some(other) => {
            let key = format!("{}-opts", other);
            if let Some(mut opts) = fields.take_nested(&key) {
                transport.path = opts.take_str("path");
                if let Some(mut headers) = opts.take_nested("headers") {
                    transport.host = headers.take_str_any(&["Host", "host"]);
                    opts.restore("headers", headers);
                }
                fields.restore(&key, opts);
            }
            if other == "ws" {
                // Pre-ws-opts style keys
                let legacy_path = fields.take_str("ws-path");
                transport.path = transport.path.take().or(legacy_path);
                if let Some(mut headers) = fields.take_nested("ws-headers") {
                    let legacy_host = headers.take_str_any(&["Host", "host"]);
                    transport.host = transport.host.take().or(legacy_host);
                    fields.restore("ws-headers", headers);
                }
            }
        }
        None => {}
    }

    transport.network = network;
}
