use base64::{engine::general_purpose, Engine as _};

/// Encodes a string to padded standard Base64.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Encodes a string to URL-safe Base64 without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(input)
}

/// Reverses a URL-safe Base64 string to the standard alphabet.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Decodes Base64 in any of the forms found in share links: standard or
/// URL-safe alphabet, with or without padding, possibly wrapped over lines.
///
/// # Returns
/// The decoded text, or `None` if the input is not Base64 or not UTF-8.
pub fn base64_decode(input: &str) -> Option<String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_end_matches('=')
        .to_string();
    if compact.is_empty() {
        return None;
    }

    let bytes = general_purpose::STANDARD_NO_PAD
        .decode(url_safe_base64_reverse(&compact))
        .ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_both_alphabets() {
        // "??>" encodes to "Pz8+" in the standard alphabet and "Pz8-" in the URL-safe one
        assert_eq!(base64_decode("Pz8+").as_deref(), Some("??>"));
        assert_eq!(base64_decode("Pz8-").as_deref(), Some("??>"));
    }

    #[test]
    fn test_decode_ignores_padding_and_whitespace() {
        assert_eq!(base64_decode("YWJjZA==").as_deref(), Some("abcd"));
        assert_eq!(base64_decode("YWJjZA").as_deref(), Some("abcd"));
        assert_eq!(base64_decode("YWJj\nZA==\n").as_deref(), Some("abcd"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(base64_decode("not-base64!!"), None);
        assert_eq!(base64_decode(""), None);
        assert_eq!(base64_decode("aes-256-gcm:secret"), None);
    }

    #[test]
    fn test_encoders() {
        assert_eq!(base64_encode("abcd"), "YWJjZA==");
        assert_eq!(url_safe_base64_encode("??>"), "Pz8-");
    }
}
