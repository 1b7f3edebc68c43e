//! Share-link codecs, one per proxy family, and the registry that picks
//! the right one for a link prefix or a proxy type.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;

use crate::error::{ConvertError, Result};
use crate::models::{Proxy, ProxyType};

pub mod common;
pub mod http;
pub mod hysteria;
pub mod hysteria2;
pub mod socks;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;

/// Decodes share links of one scheme family into [`Proxy`] records and
/// encodes them back.
pub trait SchemeCodec: Sync {
    /// URI schemes handled by this codec; the first one is used when encoding.
    fn schemes(&self) -> &'static [&'static str];

    fn proxy_type(&self) -> ProxyType;

    fn decode(&self, link: &str) -> Result<Proxy>;

    fn encode(&self, proxy: &Proxy) -> Result<String>;
}

static CODECS: [&dyn SchemeCodec; 10] = [
    &ss::SsCodec,
    &ssr::SsrCodec,
    &vmess::VmessCodec,
    &vless::VlessCodec,
    &trojan::TrojanCodec,
    &hysteria::HysteriaCodec,
    &hysteria2::Hysteria2Codec,
    &tuic::TuicCodec,
    &socks::SocksCodec,
    &http::HttpCodec,
];

static BY_SCHEME: Lazy<HashMap<&'static str, &'static dyn SchemeCodec>> = Lazy::new(|| {
    CODECS
        .iter()
        .flat_map(|codec| codec.schemes().iter().map(move |scheme| (*scheme, *codec)))
        .collect()
});

static BY_TYPE: Lazy<HashMap<&'static str, &'static dyn SchemeCodec>> = Lazy::new(|| {
    CODECS
        .iter()
        .map(|codec| (codec.proxy_type().as_clash_type(), *codec))
        .collect()
});

/// Looks up the codec for a scheme such as `vless` (a trailing `://` is accepted).
pub fn for_scheme(prefix: &str) -> Result<&'static dyn SchemeCodec> {
    let scheme = prefix.trim().trim_end_matches("://").to_ascii_lowercase();
    BY_SCHEME
        .get(scheme.as_str())
        .copied()
        .ok_or_else(|| ConvertError::UnknownScheme(prefix.to_string()))
}

/// Looks up the codec for a Clash `type` value such as `ss` or `vmess`.
pub fn for_type(type_name: &str) -> Result<&'static dyn SchemeCodec> {
    let key = type_name.trim().to_ascii_lowercase();
    BY_TYPE
        .get(key.as_str())
        .copied()
        .ok_or_else(|| ConvertError::UnknownType(type_name.to_string()))
}

pub fn for_proxy(proxy: &Proxy) -> Result<&'static dyn SchemeCodec> {
    for_type(proxy.proxy_type().as_clash_type())
}

/// The scheme of a link, i.e. everything before `://`.
pub fn scheme_of(link: &str) -> Result<&str> {
    match link.trim().split_once("://") {
        Some((scheme, _)) if !scheme.is_empty() => Ok(scheme),
        _ => Err(ConvertError::UnknownScheme(common::link_label(link))),
    }
}

/// Explode a proxy link into a Proxy object
///
/// This function detects the scheme of the link and calls the matching codec.
pub fn explode(link: &str) -> Result<Proxy> {
    let link = link.trim();
    let scheme = scheme_of(link)?;
    let codec = for_scheme(scheme)?;
    let proxy = codec.decode(link)?;
    debug!(
        "Decoded {} link into proxy '{}' ({}:{})",
        scheme, proxy.name, proxy.server, proxy.port
    );
    Ok(proxy)
}

/// Encode a proxy into a share link of its own scheme.
pub fn implode(proxy: &Proxy) -> Result<String> {
    let link = for_proxy(proxy)?.encode(proxy)?;
    debug!("Encoded proxy '{}' as {} link", proxy.name, proxy.proxy_type());
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_codec() {
        for proxy_type in ProxyType::ALL {
            let codec = for_type(proxy_type.as_clash_type()).unwrap();
            assert_eq!(codec.proxy_type(), proxy_type);
        }
    }

    #[test]
    fn test_scheme_lookup() {
        assert_eq!(for_scheme("ss").unwrap().proxy_type(), ProxyType::Shadowsocks);
        assert_eq!(for_scheme("SSR").unwrap().proxy_type(), ProxyType::ShadowsocksR);
        assert_eq!(for_scheme("hy2://").unwrap().proxy_type(), ProxyType::Hysteria2);
        assert_eq!(for_scheme("https").unwrap().proxy_type(), ProxyType::Http);
        assert_eq!(
            for_scheme("ftp").err(),
            Some(ConvertError::UnknownScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_type_lookup_failure() {
        assert_eq!(
            for_type("wireguard").err(),
            Some(ConvertError::UnknownType("wireguard".to_string()))
        );
        assert_eq!(for_type("VMess").unwrap().proxy_type(), ProxyType::VMess);
    }

    #[test]
    fn test_explode_rejects_unknown_and_missing_scheme() {
        assert!(matches!(
            explode("ftp://x"),
            Err(ConvertError::UnknownScheme(_))
        ));
        assert!(matches!(
            explode("just some text"),
            Err(ConvertError::UnknownScheme(_))
        ));
    }
}
