//! Error types for skiff.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the caller.
///
/// Transport-level failures (connection refused, DNS, TLS handshake) are
/// never represented here: they are retried up to the configured bound and
/// recorded into the response envelope's error field as data. Only
/// configuration mistakes, mock arming problems and the deliberate
/// delete-on-missing cache edge reach this enum.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request URL is not set; pass one to the dispatch call or set it with url()")]
    MissingUrl,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("empty mock payload")]
    EmptyMock,

    #[error("mock file '{0}' not found")]
    MockFileNotFound(PathBuf),

    #[error("API error: {0}")]
    Api(String),

    #[error("cache store error: {0}")]
    Store(#[from] skiff_store::StoreError),

    #[error("unparseable datetime '{0}'")]
    InvalidDate(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
