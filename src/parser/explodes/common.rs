use crate::error::{ConvertError, Result};
use crate::models::{ProxyType, Transport};
use crate::utils::url::{host_port, url_decode, url_encode, QueryBuilder, QueryParams};

/// Returns the part after `scheme://` when the link uses that scheme.
pub fn strip_scheme<'a>(link: &'a str, scheme: &str) -> Option<&'a str> {
    let (prefix, rest) = link.trim().split_once("://")?;
    prefix.eq_ignore_ascii_case(scheme).then_some(rest)
}

/// Splits off the `#name` fragment, percent-decoding it.
pub fn split_fragment(body: &str) -> (&str, Option<String>) {
    match body.split_once('#') {
        Some((rest, fragment)) => {
            let name = url_decode(fragment);
            (rest, Some(name).filter(|n| !n.trim().is_empty()))
        }
        None => (body, None),
    }
}

/// Short, credential-free label for a link, used in diagnostics.
pub fn link_label(link: &str) -> String {
    let link = link.trim();
    match link.split_once("://") {
        Some((scheme, rest)) if rest.chars().count() > 12 => {
            let head: String = rest.chars().take(12).collect();
            format!("{}://{}...", scheme, head)
        }
        _ if link.chars().count() > 24 => {
            let head: String = link.chars().take(24).collect();
            format!("{}...", head)
        }
        _ => link.to_string(),
    }
}

/// Error for a record handed to the codec of another family.
pub fn mismatch(proxy_type: ProxyType) -> ConvertError {
    ConvertError::UnsupportedField {
        proxy_type,
        field: "credentials",
    }
}

/// Fails with `UnsupportedField` when a field the link needs is empty.
pub fn require<'a>(proxy_type: ProxyType, field: &'static str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(ConvertError::UnsupportedField { proxy_type, field })
    } else {
        Ok(value)
    }
}

/// Assembles `scheme://[userinfo@]host:port[path][?query]#name`.
/// `userinfo` must already be percent-encoded.
pub fn build_link(
    scheme: &str,
    userinfo: Option<&str>,
    host: &str,
    port: u16,
    path: &str,
    query: &QueryBuilder,
    name: &str,
) -> String {
    let query = query.finish();
    let mut link = format!("{}://", scheme);
    if let Some(userinfo) = userinfo {
        link.push_str(userinfo);
        link.push('@');
    }
    link.push_str(&host_port(host, port));
    if !query.is_empty() {
        link.push_str(path);
        link.push_str(&query);
    }
    link.push('#');
    link.push_str(&url_encode(name));
    link
}

/// Reads the stream settings shared by vless and trojan links:
/// `type`, `headerType`, `host`, `path`, `serviceName`, `sni`/`peer`, `alpn`,
/// `fp` and `allowInsecure`.
pub fn read_stream_params(query: &mut QueryParams, transport: &mut Transport) {
    let network = query.take("type").map(|n| n.to_ascii_lowercase());
    let header_type = query.take("headerType");

    transport.network = match network.as_deref() {
        None | Some("tcp") => match header_type.as_deref() {
            Some("http") => Some("http".to_string()),
            _ => None,
        },
        Some(other) => Some(other.to_string()),
    };

    // Consumed for every network so a plain tcp link does not leak them
    let host = query.take("host");
    let path = query.take("path");
    let service_name = query.take("serviceName");
    match transport.network.as_deref() {
        Some("grpc") => transport.service_name = service_name,
        Some(_) => {
            transport.host = host;
            transport.path = path;
        }
        None => {}
    }

    transport.sni = query.take_any(&["sni", "peer"]);
    transport.alpn = query.take_list("alpn");
    transport.client_fingerprint = query.take("fp");
    transport.skip_cert_verify = query.take_flag(&["allowInsecure", "insecure"]);
}

/// Writes what [`read_stream_params`] reads.
pub fn write_stream_params(query: &mut QueryBuilder, transport: &Transport) {
    query
        .push_opt("sni", transport.sni.as_deref())
        .push_opt("fp", transport.client_fingerprint.as_deref())
        .push_list("alpn", &transport.alpn);

    match transport.network.as_deref() {
        None => {
            query.push("type", "tcp");
        }
        Some("http") => {
            query
                .push("type", "tcp")
                .push("headerType", "http")
                .push_opt("host", transport.host.as_deref())
                .push_opt("path", transport.path.as_deref());
        }
        Some("grpc") => {
            query
                .push("type", "grpc")
                .push_opt("serviceName", transport.service_name.as_deref());
        }
        Some(network) => {
            query
                .push("type", network)
                .push_opt("host", transport.host.as_deref())
                .push_opt("path", transport.path.as_deref());
        }
    }

    query.push_flag("allowInsecure", transport.skip_cert_verify);
}
