use sha2::{Digest, Sha256};

use crate::data::{Body, Verb};

/// Derive the cache key for a request.
///
/// The key is the URL with its scheme stripped. When POST caching is
/// enabled and the request is a POST with a body, a hash of the body is
/// appended so distinct payloads never share an entry.
pub fn fingerprint(url: &str, verb: Verb, body: Option<&Body>, cache_post_body: bool) -> String {
    let mut input = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
        .to_string();

    if cache_post_body && verb == Verb::Post {
        if let Some(body) = body {
            let digest = Sha256::digest(body.to_bytes());
            input.push_str("+body=");
            input.push_str(&hex::encode(digest));
        }
    }

    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_stripped() {
        assert_eq!(
            fingerprint("https://example.com/a", Verb::Get, None, false),
            "example.com/a"
        );
        assert_eq!(
            fingerprint("http://example.com/a", Verb::Get, None, false),
            "example.com/a"
        );
    }

    #[test]
    fn http_and_https_share_one_fingerprint() {
        let a = fingerprint("https://example.com/a", Verb::Get, None, false);
        let b = fingerprint("http://example.com/a", Verb::Get, None, false);
        assert_eq!(a, b);
    }

    #[test]
    fn post_body_extends_the_key_only_when_enabled() {
        let body = Body::json(serde_json::json!({"q": 1}));
        let plain = fingerprint("https://example.com/a", Verb::Post, Some(&body), false);
        let keyed = fingerprint("https://example.com/a", Verb::Post, Some(&body), true);
        assert_eq!(plain, "example.com/a");
        assert!(keyed.starts_with("example.com/a+body="));
    }

    #[test]
    fn get_never_gets_a_body_suffix() {
        let body = Body::text("x");
        let key = fingerprint("https://example.com/a", Verb::Get, Some(&body), true);
        assert_eq!(key, "example.com/a");
    }

    #[test]
    fn different_bodies_get_different_keys() {
        let a = Body::text("a");
        let b = Body::text("b");
        let key_a = fingerprint("https://example.com/a", Verb::Post, Some(&a), true);
        let key_b = fingerprint("https://example.com/a", Verb::Post, Some(&b), true);
        assert_ne!(key_a, key_b);
    }
}
