//! Cookie persistence adapter.
//!
//! One JSON file backs the whole jar: read before a physical call to
//! build the `Cookie` header, rewritten afterwards with whatever
//! `Set-Cookie` headers the response carried. The file is shared across
//! the lifetime of the client instance and across separate request calls.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::data::Headers;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name:       String,
    pub value:      String,
    pub domain:     String,
    pub path:       String,
    pub secure:     bool,
    /// Unix timestamp; absent means a session cookie.
    pub expires_at: Option<i64>,
}

/// File-backed cookie jar.
#[derive(Debug, Clone)]
pub struct CookieFileJar {
    path:    PathBuf,
    records: Vec<CookieRecord>,
}

impl CookieFileJar {
    /// Load the jar from its backing file. A missing or unreadable file
    /// yields an empty jar; the file appears on the first save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[CookieRecord] {
        &self.records
    }

    /// Render the `Cookie` request header for a URL, or nothing when no
    /// stored cookie matches.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        let request_path = url.path();
        let now = Utc::now().timestamp();

        let cookies: Vec<String> = self
            .records
            .iter()
            .filter(|r| domain_matches(host, &r.domain))
            .filter(|r| request_path.starts_with(r.path.as_str()))
            .filter(|r| r.expires_at.is_none_or(|t| t > now))
            .filter(|r| !r.secure || url.scheme() == "https")
            .map(|r| format!("{}={}", r.name, r.value))
            .collect();

        (!cookies.is_empty()).then(|| cookies.join("; "))
    }

    /// Fold a response's `Set-Cookie` headers into the jar, replacing
    /// same-name cookies for the same domain.
    pub fn absorb(&mut self, url: &Url, headers: &Headers) {
        for raw in headers.get_all("Set-Cookie") {
            if let Some(record) = parse_set_cookie(raw, url) {
                self.upsert(record);
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let encoded = serde_json::to_string_pretty(&self.records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, encoded)
    }

    fn upsert(&mut self, record: CookieRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.name == record.name && r.domain == record.domain)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
}

fn parse_set_cookie(raw: &str, url: &Url) -> Option<CookieRecord> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;

    let mut record = CookieRecord {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
        domain: url.host_str().unwrap_or_default().to_string(),
        path: default_path(url),
        secure: false,
        expires_at: None,
    };
    if record.name.is_empty() {
        return None;
    }

    let mut max_age: Option<i64> = None;
    let mut expires: Option<i64> = None;

    for part in parts {
        let part = part.trim();
        if let Some((key, val)) = part.split_once('=') {
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => record.path = val.trim().to_string(),
                "domain" => record.domain = val.trim().trim_start_matches('.').to_string(),
                "max-age" => max_age = val.trim().parse().ok(),
                "expires" => {
                    expires = DateTime::parse_from_rfc2822(val.trim())
                        .ok()
                        .map(|t| t.timestamp());
                }
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            record.secure = true;
        }
    }

    // Max-Age takes precedence over Expires
    record.expires_at = max_age.map(|secs| Utc::now().timestamp() + secs).or(expires);

    Some(record)
}

fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}
