//! URL shaping helpers.

/// Normalize a caller-supplied URL into an absolute one.
///
/// A missing scheme defaults to https.
pub fn normalize(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Append one query parameter, percent-encoding the value.
pub fn add_query_param(url: &str, name: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}={}", percent_encode(name), percent_encode(value))
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_a_scheme_when_missing() {
        assert_eq!(normalize("api.example.com/v1"), "https://api.example.com/v1");
        assert_eq!(normalize("http://api.example.com"), "http://api.example.com");
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(normalize("  https://example.com "), "https://example.com");
    }

    #[test]
    fn first_query_param_uses_question_mark() {
        assert_eq!(
            add_query_param("https://example.com/search", "q", "rust"),
            "https://example.com/search?q=rust"
        );
    }

    #[test]
    fn subsequent_params_use_ampersand() {
        assert_eq!(
            add_query_param("https://example.com/search?q=rust", "page", "2"),
            "https://example.com/search?q=rust&page=2"
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        assert_eq!(
            add_query_param("https://example.com/s", "q", "a b&c"),
            "https://example.com/s?q=a%20b%26c"
        );
    }
}
