//! URL encoding/decoding utilities and share-link anatomy

use log::debug;
use serde_yaml::{Mapping, Value};
use url::{Host, Url};

use crate::error::{ConvertError, Result};
use crate::utils::yaml::{scalar_from_str, scalar_to_string};

/// Encodes a string using URL encoding
///
/// # Examples
/// ```
/// use urlclash_converter::utils::url::url_encode;
///
/// let encoded = url_encode("My Server (US) #1");
/// assert_eq!(encoded, "My%20Server%20%28US%29%20%231");
/// ```
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Decodes a URL-encoded string
///
/// Returns the original string if decoding fails.
///
/// # Examples
/// ```
/// use urlclash_converter::utils::url::url_decode;
///
/// let decoded = url_decode("Hello%20World%21");
/// assert_eq!(decoded, "Hello World!");
/// ```
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Interprets the usual boolean spellings found in link parameters.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Query parameters of a share link, consumed key by key while decoding.
/// Whatever is left over at the end becomes the proxy's extra fields.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Splits `a=1&b=2` into decoded pairs. A literal `+` is kept as is, since
    /// paths and keys in share links use it verbatim.
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (url_decode(key), url_decode(value)),
                None => (url_decode(pair), String::new()),
            })
            .collect();
        QueryParams { pairs }
    }

    /// Removes `key` and returns its value when it is not empty.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;
        let (_, value) = self.pairs.remove(index);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Like [`take`](Self::take), trying aliases in order. All aliases are
    /// consumed so none of them leaks into the extra fields.
    pub fn take_any(&mut self, keys: &[&str]) -> Option<String> {
        let mut found = None;
        for key in keys {
            let value = self.take(key);
            if found.is_none() {
                found = value;
            }
        }
        found
    }

    pub fn take_flag(&mut self, keys: &[&str]) -> Option<bool> {
        self.take_any(keys).and_then(|v| parse_flag(&v))
    }

    pub fn take_list(&mut self, key: &str) -> Vec<String> {
        self.take(key)
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Unconsumed, non-empty parameters, with scalar-looking values typed back.
    pub fn into_extra(self) -> Mapping {
        let mut extra = Mapping::new();
        for (key, value) in self.pairs {
            if !key.is_empty() && !value.is_empty() {
                extra.insert(Value::String(key), scalar_from_str(&value));
            }
        }
        extra
    }
}

/// Builds the `?a=b&c=d` part of a share link with every value
/// percent-encoded.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pairs: Vec<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder::default()
    }

    pub fn push(&mut self, key: &str, value: &str) -> &mut Self {
        self.pairs
            .push(format!("{}={}", url_encode(key), url_encode(value)));
        self
    }

    pub fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(key, value);
        }
        self
    }

    /// Writes a boolean as `1`/`0`.
    pub fn push_flag(&mut self, key: &str, value: Option<bool>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, if value { "1" } else { "0" });
        }
        self
    }

    pub fn push_list(&mut self, key: &str, values: &[String]) -> &mut Self {
        if !values.is_empty() {
            self.push(key, &values.join(","));
        }
        self
    }

    /// Appends scalar extra fields. Keys already written win; nested values
    /// have no query form and are dropped.
    pub fn push_extra(&mut self, extra: &Mapping) -> &mut Self {
        for (key, value) in extra {
            let Some(key) = key.as_str() else {
                continue;
            };
            let prefix = format!("{}=", url_encode(key));
            if self.pairs.iter().any(|p| p.starts_with(&prefix)) {
                continue;
            }
            match scalar_to_string(value) {
                Some(text) => {
                    self.push(key, &text);
                }
                None => debug!("Dropping non-scalar field '{}' from share link", key),
            }
        }
        self
    }

    /// Returns `?...`, or an empty string when there are no parameters.
    pub fn finish(&self) -> String {
        if self.pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", self.pairs.join("&"))
        }
    }
}

/// The pieces of a standard `scheme://userinfo@host:port?query#name` link.
#[derive(Debug, Clone)]
pub struct LinkParts {
    /// Decoded username part of the userinfo.
    pub username: Option<String>,
    /// Decoded password part of the userinfo (after the first `:`).
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    /// Path without its leading `/`, usually empty.
    pub path: String,
    pub query: QueryParams,
    /// Decoded fragment, the display name.
    pub name: Option<String>,
}

impl LinkParts {
    /// Parses a link whose authority follows the generic URI syntax.
    /// A missing host or a missing or zero port is a malformed link.
    pub fn parse(link: &str, scheme: &str) -> Result<Self> {
        let url = Url::parse(link.trim())
            .map_err(|e| ConvertError::malformed(scheme, e.to_string()))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => {
                let domain = url_decode(domain);
                match raw_host(link) {
                    Some(raw) if raw.eq_ignore_ascii_case(&domain) => raw.to_string(),
                    _ => domain,
                }
            }
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(ConvertError::malformed(scheme, "missing server")),
        };

        let port = url
            .port_or_known_default()
            .filter(|p| *p != 0)
            .ok_or_else(|| ConvertError::malformed(scheme, "missing or invalid port"))?;

        let username = Some(url_decode(url.username())).filter(|s| !s.is_empty());
        let password = url.password().map(url_decode).filter(|s| !s.is_empty());
        let path = url_decode(url.path().trim_start_matches('/'));
        let query = QueryParams::parse(url.query().unwrap_or(""));
        let name = url
            .fragment()
            .map(url_decode)
            .filter(|s| !s.trim().is_empty());

        Ok(LinkParts {
            username,
            password,
            host,
            port,
            path,
            query,
            name,
        })
    }

    /// The whole userinfo, `user:password` when both are present.
    pub fn userinfo(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            (Some(user), None) => Some(user.clone()),
            (None, Some(pass)) => Some(format!(":{}", pass)),
            (None, None) => None,
        }
    }
}

/// Host as written in the link. `url` lowercases the host of `http(s)`
/// links, so the original spelling is looked up here.
fn raw_host(link: &str) -> Option<&str> {
    let (_, rest) = link.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host_port.rsplit_once(':').map_or(host_port, |(h, _)| h);
    (!host.is_empty()).then_some(host)
}

/// Formats `host:port`, bracketing IPv6 literals.
pub fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Splits `host:port` (IPv6 may be bracketed) as found inside base64 blobs.
pub fn split_host_port(input: &str) -> Option<(String, u16)> {
    let (host, port) = input.rsplit_once(':')?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = port.trim().parse::<u16>().ok().filter(|p| *p != 0)?;
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), port))
}
