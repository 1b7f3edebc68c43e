use log::{info, warn};
use serde_yaml::{Mapping, Value as YamlValue};

use super::proxy_types::proxy_from_mapping;
use crate::error::{ConvertError, Result};
use crate::models::{ClashDocument, Diagnostic};

/// Parse the proxy list out of a Clash YAML document
///
/// The list is looked up under `proxies` (or the older `Proxy`), under
/// `payload` (either directly or as `payload.proxies`), or taken from a
/// bare top-level sequence. Entries that cannot be read are skipped and
/// reported; only a document with no recognizable proxy list fails as a
/// whole. Other top-level keys are kept in [`ClashDocument::sections`].
pub fn parse_clash_yaml(content: &str) -> Result<ClashDocument> {
    if content.trim().is_empty() {
        return Err(ConvertError::MalformedDocument(
            "document is empty".to_string(),
        ));
    }

    let document: YamlValue = serde_yaml::from_str(content)
        .map_err(|e| ConvertError::MalformedDocument(e.to_string()))?;
    let (entries, sections) = locate_proxies(document)?;

    let mut parsed_document = ClashDocument {
        sections,
        ..Default::default()
    };
    for (index, entry) in entries.into_iter().enumerate() {
        let subject = entry_subject(&entry, index);
        let parsed = match entry {
            YamlValue::Mapping(map) => proxy_from_mapping(map),
            _ => Err(ConvertError::InvalidEntry(
                "proxy entry is not a mapping".to_string(),
            )),
        };
        match parsed {
            Ok(proxy) => parsed_document.proxies.push(proxy),
            Err(e) => {
                warn!("Skipping Clash proxy {}: {}", subject, e);
                parsed_document.skipped.push(Diagnostic::new(subject, e));
            }
        }
    }

    info!(
        "Parsed {} proxies from Clash document ({} skipped)",
        parsed_document.proxies.len(),
        parsed_document.skipped.len()
    );
    Ok(parsed_document)
}

/// Splits the document into the raw proxy entries and everything else.
fn locate_proxies(document: YamlValue) -> Result<(Vec<YamlValue>, Mapping)> {
    match document {
        YamlValue::Sequence(entries) => Ok((entries, Mapping::new())),
        YamlValue::Mapping(mut root) => {
            for key in ["proxies", "Proxy"] {
                if let Some(list) = root.shift_remove(key) {
                    return Ok((as_list(list, key)?, root));
                }
            }
            let entries = match root.shift_remove("payload") {
                Some(YamlValue::Mapping(mut payload)) => match payload.shift_remove("proxies") {
                    Some(list) => as_list(list, "payload.proxies")?,
                    None => return Err(no_list()),
                },
                Some(list) => as_list(list, "payload")?,
                None => return Err(no_list()),
            };
            Ok((entries, root))
        }
        YamlValue::Null => Err(ConvertError::MalformedDocument(
            "document is empty".to_string(),
        )),
        _ => Err(no_list()),
    }
}

/// A present but empty key (`proxies:`) is an empty list.
fn as_list(value: YamlValue, key: &str) -> Result<Vec<YamlValue>> {
    match value {
        YamlValue::Sequence(entries) => Ok(entries),
        YamlValue::Null => Ok(Vec::new()),
        _ => Err(ConvertError::MalformedDocument(format!(
            "`{}` is not a list",
            key
        ))),
    }
}

fn no_list() -> ConvertError {
    ConvertError::MalformedDocument("no proxy list found".to_string())
}

fn entry_subject(entry: &YamlValue, index: usize) -> String {
    entry
        .as_mapping()
        .and_then(|map: &Mapping| map.get("name"))
        .and_then(YamlValue::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("entry #{}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
port: 7890
proxies:
  - name: ss1
    type: ss
    server: 1.2.3.4
    port: 8388
    cipher: aes-128-gcm
    password: secret
  - name: broken
    type: wireguard
    server: 5.6.7.8
    port: 51820
  - just a string
  - name: trojan1
    type: trojan
    server: example.com
    port: 443
    password: pw
rules:
  - MATCH,DIRECT
"#;

    #[test]
    fn test_parse_skips_bad_entries() {
        let document = parse_clash_yaml(DOCUMENT).unwrap();
        let names: Vec<&str> = document.proxies.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ss1", "trojan1"]);
        assert_eq!(document.skipped.len(), 2);
        assert_eq!(document.skipped[0].subject, "broken");
        assert_eq!(
            document.skipped[0].error,
            ConvertError::UnknownType("wireguard".to_string())
        );
        assert_eq!(document.skipped[1].subject, "entry #3");

        let sections: Vec<&str> = document.sections.keys().filter_map(YamlValue::as_str).collect();
        assert_eq!(sections, vec!["port", "rules"]);
    }

    #[test]
    fn test_locates_list_in_every_layout() {
        let entry = "{name: a, type: trojan, server: a.com, port: 443, password: x}";
        for doc in [
            format!("proxies:\n  - {}\n", entry),
            format!("Proxy:\n  - {}\n", entry),
            format!("payload:\n  - {}\n", entry),
            format!("payload:\n  proxies:\n    - {}\n", entry),
            format!("- {}\n", entry),
        ] {
            let document = parse_clash_yaml(&doc).unwrap();
            assert_eq!(document.proxies.len(), 1, "document: {}", doc);
        }
    }

    #[test]
    fn test_document_level_failures() {
        for doc in ["", "   \n", "just text", "rules: []", "proxies: 5", "proxies: [unclosed"] {
            assert!(
                matches!(
                    parse_clash_yaml(doc),
                    Err(ConvertError::MalformedDocument(_))
                ),
                "document: {:?}",
                doc
            );
        }
    }

    #[test]
    fn test_empty_proxy_list() {
        let document = parse_clash_yaml("proxies: []\n").unwrap();
        assert!(document.proxies.is_empty());
        assert!(parse_clash_yaml("proxies:\n").unwrap().proxies.is_empty());
    }
}
