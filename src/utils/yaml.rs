use serde_yaml::{Mapping, Value};

/// A proxy entry being taken apart field by field. Every `take_*` call
/// removes the key it reads, so what remains afterwards is exactly the set of
/// fields nobody understood; those are kept as the proxy's extra fields.
#[derive(Debug, Clone, Default)]
pub struct YamlFields {
    map: Mapping,
}

impl YamlFields {
    pub fn new(map: Mapping) -> Self {
        YamlFields { map }
    }

    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.map.shift_remove(key)
    }

    /// Takes a scalar as text. Empty strings and nulls read as absent;
    /// non-scalar values are left in place.
    pub fn take_str(&mut self, key: &str) -> Option<String> {
        let text = match self.map.get(key) {
            Some(Value::Mapping(_)) | Some(Value::Sequence(_)) | Some(Value::Tagged(_)) => None,
            Some(_) => self.take(key).and_then(|v| scalar_to_string(&v)),
            None => None,
        };
        text.filter(|s| !s.is_empty())
    }

    pub fn take_str_any(&mut self, keys: &[&str]) -> Option<String> {
        let mut found = None;
        for key in keys {
            let value = self.take_str(key);
            if found.is_none() {
                found = value;
            }
        }
        found
    }

    /// Takes a boolean written as a YAML bool, a 0/1 number, or a string.
    pub fn take_bool(&mut self, key: &str) -> Option<bool> {
        let parsed = match self.map.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_u64().map(|n| n != 0),
            Value::String(s) => crate::utils::url::parse_flag(s),
            _ => None,
        };
        if parsed.is_some() {
            self.take(key);
        }
        parsed
    }

    /// Takes an unsigned integer written either as a number or as a string.
    pub fn take_u64(&mut self, key: &str) -> Option<Result<u64, String>> {
        let value = self.take(key)?;
        Some(match &value {
            Value::Number(n) => n.as_u64().ok_or_else(|| n.to_string()),
            Value::String(s) => s.trim().parse::<u64>().map_err(|_| s.clone()),
            other => Err(scalar_to_string(other).unwrap_or_else(|| "?".to_string())),
        })
    }

    /// Takes a list of strings, accepting a YAML sequence or a comma
    /// separated string.
    pub fn take_list(&mut self, key: &str) -> Vec<String> {
        match self.map.get(key) {
            Some(Value::Sequence(items)) => {
                let list: Vec<String> = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .filter(|s| !s.is_empty())
                    .collect();
                self.take(key);
                list
            }
            Some(Value::String(_)) => self
                .take_str(key)
                .map(|s| {
                    s.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Detaches a nested mapping so its fields can be taken one by one.
    /// Pair with [`restore`](Self::restore) to keep what was not consumed.
    pub fn take_nested(&mut self, key: &str) -> Option<YamlFields> {
        match self.map.get(key) {
            Some(Value::Mapping(_)) => match self.take(key) {
                Some(Value::Mapping(map)) => Some(YamlFields::new(map)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Puts the leftovers of a nested mapping back under `key`.
    pub fn restore(&mut self, key: &str, nested: YamlFields) {
        if !nested.map.is_empty() {
            self.map
                .insert(Value::String(key.to_string()), Value::Mapping(nested.map));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_mapping(self) -> Mapping {
        self.map
    }
}

/// Renders a scalar as text; `None` for nulls and nested values.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Types a text value back: `true`/`false` become bools, integers become
/// numbers, anything else stays a string.
pub fn scalar_from_str(text: &str) -> Value {
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match text.parse::<i64>() {
            Ok(n) if n.to_string() == text => Value::Number(n.into()),
            _ => Value::String(text.to_string()),
        },
    }
}

/// Inserts `key: value` into a mapping being built.
pub fn put(map: &mut Mapping, key: &str, value: impl Into<Value>) {
    map.insert(Value::String(key.to_string()), value.into());
}

pub fn put_opt(map: &mut Mapping, key: &str, value: Option<&String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        put(map, key, value.as_str());
    }
}

pub fn put_list(map: &mut Mapping, key: &str, values: &[String]) {
    if !values.is_empty() {
        let seq = values.iter().map(|v| Value::String(v.clone())).collect();
        map.insert(Value::String(key.to_string()), Value::Sequence(seq));
    }
}

/// Adds `extra` to `target` without overriding fields already present.
/// Nested mappings are merged key by key.
pub fn merge_extra(target: &mut Mapping, extra: &Mapping) {
    for (key, value) in extra {
        match (target.get_mut(key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                merge_extra(existing, incoming);
            }
            (Some(_), _) => {}
            (None, _) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(yaml: &str) -> YamlFields {
        match serde_yaml::from_str::<Value>(yaml).unwrap() {
            Value::Mapping(map) => YamlFields::new(map),
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_take_consumes_keys() {
        let mut f = fields("name: a\nport: '443'\nudp: true\nalpn: [h2, http/1.1]\nempty: ''\n");
        assert_eq!(f.take_str("name").as_deref(), Some("a"));
        assert_eq!(f.take_u64("port"), Some(Ok(443)));
        assert_eq!(f.take_list("alpn"), vec!["h2", "http/1.1"]);
        assert_eq!(f.take_str("empty"), None);
        let rest = f.into_mapping();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.get("udp"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_nested_leftovers_are_restored() {
        let mut f = fields("ws-opts:\n  path: /ws\n  max-early-data: 2048\n");
        let mut ws = f.take_nested("ws-opts").unwrap();
        assert_eq!(ws.take_str("path").as_deref(), Some("/ws"));
        f.restore("ws-opts", ws);
        let rest = f.into_mapping();
        let ws = rest.get("ws-opts").and_then(Value::as_mapping).unwrap();
        assert_eq!(ws.len(), 1);
        assert!(ws.contains_key("max-early-data"));
    }

    #[test]
    fn test_take_str_leaves_nested_values() {
        let mut f = fields("plugin-opts:\n  mode: tls\n");
        assert_eq!(f.take_str("plugin-opts"), None);
        assert!(!f.is_empty());
    }

    #[test]
    fn test_scalar_from_str() {
        assert_eq!(scalar_from_str("true"), Value::Bool(true));
        assert_eq!(scalar_from_str("42"), Value::Number(42.into()));
        assert_eq!(scalar_from_str("042"), Value::String("042".to_string()));
        assert_eq!(scalar_from_str("h2"), Value::String("h2".to_string()));
    }

    #[test]
    fn test_merge_extra_keeps_known_fields() {
        let mut target = match serde_yaml::from_str::<Value>("ws-opts:\n  path: /a\nudp: false\n")
            .unwrap()
        {
            Value::Mapping(m) => m,
            _ => unreachable!(),
        };
        let extra = match serde_yaml::from_str::<Value>(
            "ws-opts:\n  path: /b\n  max-early-data: 1\nudp: true\ntfo: true\n",
        )
        .unwrap()
        {
            Value::Mapping(m) => m,
            _ => unreachable!(),
        };
        merge_extra(&mut target, &extra);
        let ws = target.get("ws-opts").and_then(Value::as_mapping).unwrap();
        assert_eq!(ws.get("path"), Some(&Value::String("/a".to_string())));
        assert!(ws.contains_key("max-early-data"));
        assert_eq!(target.get("udp"), Some(&Value::Bool(false)));
        assert_eq!(target.get("tfo"), Some(&Value::Bool(true)));
    }
}
