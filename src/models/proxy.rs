//! Proxy model definitions
//!
//! Contains the normalized, scheme-independent representation of one proxy.

use std::fmt;

use serde_yaml::Mapping;

/// Represents the type of a proxy.
/// This is the canonical enum used for proxy type identification across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Shadowsocks,
    ShadowsocksR,
    VMess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    Tuic,
    Socks5,
    Http,
}

impl ProxyType {
    pub const ALL: [ProxyType; 10] = [
        ProxyType::Shadowsocks,
        ProxyType::ShadowsocksR,
        ProxyType::VMess,
        ProxyType::Vless,
        ProxyType::Trojan,
        ProxyType::Hysteria,
        ProxyType::Hysteria2,
        ProxyType::Tuic,
        ProxyType::Socks5,
        ProxyType::Http,
    ];

    /// The `type` value Clash uses for this proxy family.
    pub fn as_clash_type(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::ShadowsocksR => "ssr",
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria => "hysteria",
            ProxyType::Hysteria2 => "hysteria2",
            ProxyType::Tuic => "tuic",
            ProxyType::Socks5 => "socks5",
            ProxyType::Http => "http",
        }
    }

    /// Case-insensitive inverse of [`as_clash_type`](Self::as_clash_type).
    pub fn from_clash_type(type_name: &str) -> Option<ProxyType> {
        let type_name = type_name.trim();
        ProxyType::ALL
            .into_iter()
            .find(|t| t.as_clash_type().eq_ignore_ascii_case(type_name))
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_clash_type())
    }
}

/// Protocol-specific credentials. The variant doubles as the proxy's type tag,
/// so a record can never carry fields belonging to another family.
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Shadowsocks {
        cipher: String,
        password: String,
    },
    ShadowsocksR {
        cipher: String,
        password: String,
        protocol: String,
        obfs: String,
        protocol_param: Option<String>,
        obfs_param: Option<String>,
    },
    VMess {
        uuid: String,
        alter_id: u32,
        cipher: String,
    },
    Vless {
        uuid: String,
        flow: Option<String>,
    },
    Trojan {
        password: String,
    },
    Hysteria {
        auth: Option<String>,
        protocol: Option<String>,
        up: Option<String>,
        down: Option<String>,
        /// Obfuscation password (`xplus`).
        obfs: Option<String>,
        ports: Option<String>,
    },
    Hysteria2 {
        password: String,
        obfs: Option<String>,
        obfs_password: Option<String>,
        up: Option<String>,
        down: Option<String>,
        ports: Option<String>,
    },
    Tuic {
        uuid: String,
        password: Option<String>,
        congestion_control: Option<String>,
        udp_relay_mode: Option<String>,
    },
    Socks5 {
        username: Option<String>,
        password: Option<String>,
    },
    Http {
        username: Option<String>,
        password: Option<String>,
    },
}

impl Credentials {
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            Credentials::Shadowsocks { .. } => ProxyType::Shadowsocks,
            Credentials::ShadowsocksR { .. } => ProxyType::ShadowsocksR,
            Credentials::VMess { .. } => ProxyType::VMess,
            Credentials::Vless { .. } => ProxyType::Vless,
            Credentials::Trojan { .. } => ProxyType::Trojan,
            Credentials::Hysteria { .. } => ProxyType::Hysteria,
            Credentials::Hysteria2 { .. } => ProxyType::Hysteria2,
            Credentials::Tuic { .. } => ProxyType::Tuic,
            Credentials::Socks5 { .. } => ProxyType::Socks5,
            Credentials::Http { .. } => ProxyType::Http,
        }
    }
}

/// A single shadowsocks plugin option: `key=value`, or a bare flag when
/// `value` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOpt {
    pub key: String,
    pub value: Option<String>,
}

impl PluginOpt {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        PluginOpt {
            key: key.into(),
            value,
        }
    }
}

/// Shadowsocks plugin, named the way Clash names it (`obfs`, `v2ray-plugin`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: String,
    pub opts: Vec<PluginOpt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reality {
    pub public_key: String,
    pub short_id: Option<String>,
}

/// Transport and obfuscation settings. The default value means plain TCP
/// with nothing on top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transport {
    /// `ws`, `grpc`, `h2`, `http`, ... `None` stands for plain tcp.
    pub network: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub service_name: Option<String>,
    pub tls: bool,
    pub sni: Option<String>,
    pub alpn: Vec<String>,
    pub skip_cert_verify: Option<bool>,
    pub client_fingerprint: Option<String>,
    pub reality: Option<Reality>,
    pub plugin: Option<Plugin>,
}

impl Transport {
    pub fn is_empty(&self) -> bool {
        *self == Transport::default()
    }
}

/// Represents a proxy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub credentials: Credentials,
    pub transport: Transport,
    /// Fields with no dedicated slot, kept in source order.
    pub extra: Mapping,
}

impl Proxy {
    /// Create a proxy with no transport settings and no extra fields.
    /// An empty `name` falls back to `server:port`.
    pub fn new(
        name: impl Into<String>,
        server: impl Into<String>,
        port: u16,
        credentials: Credentials,
    ) -> Self {
        let server = server.into();
        let mut name = name.into();
        if name.is_empty() {
            name = fallback_name(&server, port);
        }
        Proxy {
            name,
            server,
            port,
            credentials,
            transport: Transport::default(),
            extra: Mapping::new(),
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_extra(mut self, extra: Mapping) -> Self {
        self.extra = extra;
        self
    }

    pub fn proxy_type(&self) -> ProxyType {
        self.credentials.proxy_type()
    }
}

/// Display label used when the source has no name for a proxy.
pub fn fallback_name(server: &str, port: u16) -> String {
    format!("{}:{}", server, port)
}
