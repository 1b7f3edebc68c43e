use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use super::Proxy;
use crate::error::{ConvertError, Result};

/// How the rendered proxy list is wrapped when building a Clash document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// `proxies:` at the top level, a minimal valid document.
    #[default]
    Proxies,
    /// `payload:` holding a `proxies:` key, for subscription endpoints.
    Payload,
    /// The bare list, meant to be spliced into a larger document.
    None,
}

impl FromStr for OutputMode {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proxies" => Ok(OutputMode::Proxies),
            "payload" => Ok(OutputMode::Payload),
            "none" => Ok(OutputMode::None),
            _ => Err(ConvertError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Proxies => "proxies",
            OutputMode::Payload => "payload",
            OutputMode::None => "none",
        })
    }
}

/// One entry that was dropped from a batch, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Proxy name, or a shortened link so credentials stay out of logs.
    pub subject: String,
    pub error: ConvertError,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, error: ConvertError) -> Self {
        Diagnostic {
            subject: subject.into(),
            error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped {}: {}", self.subject, self.error)
    }
}

/// Entries that converted, plus the ones that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub skipped: Vec<Diagnostic>,
}

impl<T> Batch<T> {
    pub fn new() -> Self {
        Batch {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed Clash document: the proxies that could be read, the entries
/// that could not, and every other top-level section untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClashDocument {
    pub proxies: Vec<Proxy>,
    pub skipped: Vec<Diagnostic>,
    /// `rules`, `proxy-groups`, `dns`, ... in source order.
    pub sections: Mapping,
}

/// Outcome of a successful conversion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub output: String,
    /// Number of entries present in `output`.
    pub converted: usize,
    pub skipped: Vec<Diagnostic>,
}

/// Result object handed to the UI: `data` is the output when `success` is
/// true and a readable message otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub data: String,
}

impl ConversionResult {
    pub fn ok(data: impl Into<String>) -> Self {
        ConversionResult {
            success: true,
            data: data.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ConversionResult {
            success: false,
            data: message.into(),
        }
    }
}

impl From<Result<ConversionReport>> for ConversionResult {
    fn from(result: Result<ConversionReport>) -> Self {
        match result {
            Ok(report) => ConversionResult::ok(report.output),
            Err(err) => ConversionResult::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("proxies".parse::<OutputMode>(), Ok(OutputMode::Proxies));
        assert_eq!("Payload".parse::<OutputMode>(), Ok(OutputMode::Payload));
        assert_eq!(" none ".parse::<OutputMode>(), Ok(OutputMode::None));
        assert_eq!(
            "yaml".parse::<OutputMode>(),
            Err(ConvertError::UnknownMode("yaml".to_string()))
        );
        assert_eq!(OutputMode::Payload.to_string(), "payload");
    }

    #[test]
    fn test_result_from_error_carries_message() {
        let result: ConversionResult =
            Err(ConvertError::MalformedDocument("empty document".to_string())).into();
        assert!(!result.success);
        assert_eq!(result.data, "malformed document: empty document");
    }

    #[test]
    fn test_result_serializes_for_js() {
        let json = serde_json::to_string(&ConversionResult::ok("proxies: []\n")).unwrap();
        assert_eq!(json, r#"{"success":true,"data":"proxies: []\n"}"#);
    }
}
