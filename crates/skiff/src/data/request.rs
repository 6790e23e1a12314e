use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::headers::Headers;

/// HTTP verbs the client dispatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
        }
    }

    /// Case-insensitive parse; unknown verbs are rejected.
    pub fn parse(s: &str) -> Option<Verb> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "PATCH" => Some(Verb::Patch),
            "DELETE" => Some(Verb::Delete),
            "HEAD" => Some(Verb::Head),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verb> for reqwest::Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Delete => reqwest::Method::DELETE,
            Verb::Head => reqwest::Method::HEAD,
        }
    }
}

/// Request body: opaque bytes or a structured value.
///
/// Structured bodies are serialized to a JSON byte string at transmission
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Raw(Vec<u8>),
    Json(serde_json::Value),
}

impl Body {
    pub fn text(s: impl Into<String>) -> Self {
        Body::Raw(s.into().into_bytes())
    }

    pub fn json(value: serde_json::Value) -> Self {
        Body::Json(value)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Raw(bytes) => bytes.clone(),
            // Value-to-JSON serialization cannot fail for string-keyed maps
            Body::Json(value) => serde_json::to_vec(value).unwrap_or_default(),
        }
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::text(s)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Raw(s.into_bytes())
    }
}

/// TLS verification policy for one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TlsPolicy {
    #[default]
    Verify,
    Disabled,
    CaPath(PathBuf),
}

/// Transport-specific knobs.
///
/// `timeout: None` means unlimited wait; callers needing bounded wait
/// semantics must set an explicit ceiling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
    pub timeout:         Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub max_redirects:   Option<u32>,
    pub user_agent:      Option<String>,
    pub verbose:         bool,
}

/// One fully-resolved logical request, immutable per dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url:         String,
    pub verb:        Verb,
    pub headers:     Headers,
    pub body:        Option<Body>,
    pub encode_body: bool,
    pub transport:   TransportOptions,
    pub tls:         TlsPolicy,
    /// Backing file of the cookie persistence adapter, when attached.
    pub cookie_file: Option<PathBuf>,
}

impl RequestSpec {
    pub fn new(url: impl Into<String>, verb: Verb) -> Self {
        Self {
            url: url.into(),
            verb,
            headers: Headers::new(),
            body: None,
            encode_body: true,
            transport: TransportOptions::default(),
            tls: TlsPolicy::default(),
            cookie_file: None,
        }
    }

    pub fn hostname(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.url).ok()?;
        url.host_str().map(str::to_string)
    }
}
