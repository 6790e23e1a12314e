//! Process-wide configuration.
//!
//! A [`Config`] can be installed once for the whole process, or attached
//! to a single client instance; the instance copy wins. It is consulted
//! once per dispatch.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::Result;

static GLOBAL: OnceCell<Config> = OnceCell::new();

/// Default TLS behavior when a dispatch carries no explicit policy.
///
/// In a TOML file this is either `ssl_cert = false` (verification off)
/// or `ssl_cert = "/path/to/ca.pem"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SslCert {
    Toggle(bool),
    Path(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Per-domain pacing duration in seconds. Absent means no pacing.
    #[serde(default)]
    pub sleep_time: Option<u64>,

    /// Default TLS policy, see [`SslCert`].
    #[serde(default)]
    pub ssl_cert: Option<SslCert>,

    /// Root directory of the response cache store.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Install this configuration process-wide.
    ///
    /// Only the first install wins; returns false if one was already set.
    pub fn install(self) -> bool {
        GLOBAL.set(self).is_ok()
    }

    pub fn global() -> Option<&'static Config> {
        GLOBAL.get()
    }
}

/// Uniform three-tier override resolution:
/// call-site value → instance default → process configuration → hard default.
pub fn resolve<T>(call: Option<T>, instance: Option<T>, process: Option<T>, default: T) -> T {
    call.or(instance).or(process).unwrap_or(default)
}
