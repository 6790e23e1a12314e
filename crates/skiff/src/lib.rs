//! Stateful HTTP API client with caching, retries, throttling, cookie
//! persistence and request mocking.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable request/response types
//! - [`core`] - Pure transformations (fingerprints, sniffing, interpretation)
//! - [`effects`] - I/O with trait abstraction (transport, cookies, logging)
//!
//! The [`Client`] orchestrates one terminal lifecycle per dispatch call:
//! mock overlay first, then a cache freshness check, then a retried
//! transport dispatch with per-domain pacing, then a conditional cache
//! write governed by verb and status-code policy.
//!
//! Transport failures are never raised as errors: they are recorded into
//! the response envelope and read back through accessors. Only
//! configuration mistakes (missing URL), mock arming problems and the
//! explicit delete-on-missing cache edge return [`Error`].

pub mod config;
pub mod core;
pub mod data;
pub mod effects;

mod client;
mod error;
mod mock;

pub use client::{ApiResponse, Client};
pub use config::{Config, SslCert, resolve};
pub use data::{Body, Headers, RequestSpec, ResponseEnvelope, TlsPolicy, TransportOptions, Verb};
pub use effects::{
    CookieFileJar, CookieRecord, Dispatcher, FileSink, LogKind, LogRecord, LogSink,
    ReqwestTransport, ThrottleState, TracingSink, Transport,
};
pub use error::{Error, Result};
pub use mock::MockSource;

pub use skiff_store::{Entry as CacheEntry, ResponseStore, StoreError};
