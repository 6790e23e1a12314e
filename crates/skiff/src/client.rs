//! Client lifecycle: builder, per-call orchestration and accessors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Value, json};
use skiff_store::ResponseStore;

use crate::config::{Config, SslCert, resolve};
use crate::core::{self, fingerprint, interpret, is_json};
use crate::data::envelope::Payload;
use crate::data::{Body, Headers, RequestSpec, ResponseEnvelope, TlsPolicy, TransportOptions, Verb};
use crate::effects::{Dispatcher, LogRecord, LogSink, ReqwestTransport, TracingSink, Transport};
use crate::error::{Error, Result};
use crate::mock::{self, MockSource};

/// The `{data, http_code, error}` triple returned by [`Client::response`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub data:      Value,
    pub http_code: Option<u16>,
    pub error:     Option<String>,
}

/// Stateful HTTP request builder and executor.
///
/// One instance carries the request under construction, the most recent
/// response envelope, the retry/throttle controller and the cache/cookie
/// policy. Every dispatch call (`get`, `post`, `send`, ...) re-enters the
/// same terminal lifecycle: mock overlay first, then cache check, then
/// retried dispatch, then conditional cache write.
///
/// Instances are not safe to share across threads; callers needing
/// concurrency use independent instances.
///
/// # Examples
///
/// ```no_run
/// use skiff::Client;
///
/// let mut client = Client::new();
/// client
///     .url("https://api.example.com/users")
///     .decode(true)
///     .cache(60)
///     .retries(3);
/// client.get()?;
///
/// let users = client.data();
/// # Ok::<(), skiff::Error>(())
/// ```
pub struct Client<T: Transport = ReqwestTransport> {
    transport:  T,
    dispatcher: Dispatcher,
    log_sink:   Box<dyn LogSink>,
    config:     Option<Config>,

    // request under construction
    url:               Option<String>,
    verb:              Verb,
    headers:           Headers,
    query_params:      Vec<(String, String)>,
    body:              Option<Body>,
    encode_body:       bool,
    transport_options: TransportOptions,
    tls:               Option<TlsPolicy>,
    max_retries:       u32,
    auto_decode:       bool,

    // cache policy
    ttl:              Option<u64>,
    read_only:        bool,
    cache_post:       bool,
    cacheable_status: Vec<u16>,
    cache_dir:        Option<PathBuf>,

    cookie_file: Option<PathBuf>,

    mocked:        bool,
    log_requests:  bool,
    log_responses: bool,

    // most recent result
    envelope: ResponseEnvelope,
    response: Option<Payload>,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn instance(url: &str) -> Self {
        let mut client = Self::new();
        client.url(url);
        client
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Build a client over a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            dispatcher: Dispatcher::new(),
            log_sink: Box::new(TracingSink),
            config: None,
            url: None,
            verb: Verb::Get,
            headers: Headers::new(),
            query_params: Vec::new(),
            body: None,
            encode_body: true,
            transport_options: TransportOptions::default(),
            tls: None,
            max_retries: 1,
            auto_decode: false,
            ttl: None,
            read_only: false,
            cache_post: false,
            cacheable_status: Vec::new(),
            cache_dir: None,
            cookie_file: None,
            mocked: false,
            log_requests: false,
            log_responses: false,
            envelope: ResponseEnvelope::default(),
            response: None,
        }
    }

    // --- request builders -------------------------------------------------

    pub fn url(&mut self, url: &str) -> &mut Self {
        self.url = Some(core::url::normalize(url));
        self
    }

    pub fn set_url(&mut self, url: &str) -> &mut Self {
        self.url(url)
    }

    pub fn query_param(&mut self, name: &str, value: &str) -> &mut Self {
        self.query_params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_params<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    pub fn set_headers(&mut self, headers: Headers) -> &mut Self {
        self.headers = headers;
        self
    }

    pub fn content_type(&mut self, value: &str) -> &mut Self {
        self.add_header("Content-Type", value)
    }

    pub fn accept(&mut self, value: &str) -> &mut Self {
        self.add_header("Accept", value)
    }

    pub fn user_agent(&mut self, value: &str) -> &mut Self {
        self.transport_options.user_agent = Some(value.to_string());
        self
    }

    pub fn authorization(&mut self, value: &str) -> &mut Self {
        self.add_header("Authorization", value)
    }

    pub fn basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        self.add_header("Authorization", &format!("Basic {token}"))
    }

    pub fn bearer_auth(&mut self, token: &str) -> &mut Self {
        self.add_header("Authorization", &format!("Bearer {token}"))
    }

    pub fn set_body(&mut self, body: impl Into<Body>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn encode_body(&mut self, encode: bool) -> &mut Self {
        self.encode_body = encode;
        self
    }

    /// Enable or disable structured decoding of response bodies.
    pub fn decode(&mut self, auto: bool) -> &mut Self {
        self.auto_decode = auto;
        self
    }

    pub fn no_decode(&mut self) -> &mut Self {
        self.decode(false)
    }

    pub fn method(&mut self, verb: Verb) -> &mut Self {
        self.verb = verb;
        self
    }

    pub fn retries(&mut self, max: u32) -> &mut Self {
        self.max_retries = max;
        self
    }

    pub fn timeout(&mut self, value: Duration) -> &mut Self {
        self.transport_options.timeout = Some(value);
        self
    }

    pub fn connect_timeout(&mut self, value: Duration) -> &mut Self {
        self.transport_options.connect_timeout = Some(value);
        self
    }

    /// Follow redirects, bounded by `max_redirects`. Zero turns
    /// following back off.
    pub fn follow_locations(&mut self, max_redirects: u32) -> &mut Self {
        self.transport_options.max_redirects = Some(max_redirects);
        self
    }

    pub fn redirect(&mut self, max_redirects: u32) -> &mut Self {
        self.follow_locations(max_redirects)
    }

    pub fn verbose(&mut self) -> &mut Self {
        self.transport_options.verbose = true;
        self
    }

    pub fn disable_ssl(&mut self) -> &mut Self {
        self.tls = Some(TlsPolicy::Disabled);
        self
    }

    pub fn without_strict_ssl(&mut self) -> &mut Self {
        self.disable_ssl()
    }

    pub fn set_ssl_cert(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.tls = Some(TlsPolicy::CaPath(path.into()));
        self
    }

    pub fn certificate(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.set_ssl_cert(path)
    }

    /// Attach a file-backed cookie jar shared across this client's calls.
    pub fn use_cookie_jar(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.cookie_file = Some(path.into());
        self
    }

    /// Attach an instance-level configuration, overriding the process-wide
    /// one for this client only.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = Some(config);
        self
    }

    pub fn log_sink(&mut self, sink: impl LogSink + 'static) -> &mut Self {
        self.log_sink = Box::new(sink);
        self
    }

    pub fn log_requests(&mut self, enabled: bool) -> &mut Self {
        self.log_requests = enabled;
        self
    }

    pub fn log_responses(&mut self, enabled: bool) -> &mut Self {
        self.log_responses = enabled;
        self
    }

    /// Run a builder closure only when `cond` holds.
    pub fn when(&mut self, cond: bool, then: impl FnOnce(&mut Self)) -> &mut Self {
        if cond {
            then(self);
        }
        self
    }

    pub fn when_else(
        &mut self,
        cond: bool,
        then: impl FnOnce(&mut Self),
        otherwise: impl FnOnce(&mut Self),
    ) -> &mut Self {
        if cond { then(self) } else { otherwise(self) }
        self
    }

    // --- cache policy builders --------------------------------------------

    /// Cache successful responses for `ttl_seconds`.
    pub fn cache(&mut self, ttl_seconds: u64) -> &mut Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    /// Cache until an absolute datetime (RFC 3339, or `YYYY-MM-DD HH:MM:SS`
    /// taken as UTC). A datetime in the past yields a zero TTL.
    pub fn cache_until(&mut self, datetime: &str) -> Result<&mut Self> {
        let target = parse_datetime(datetime)?;
        let ttl = target.signed_duration_since(Utc::now()).num_seconds().max(0) as u64;
        Ok(self.cache(ttl))
    }

    pub fn read_only(&mut self, flag: bool) -> &mut Self {
        self.read_only = flag;
        self
    }

    pub fn enable_post_request_cache(&mut self) -> &mut Self {
        self.cache_post = true;
        self
    }

    /// Allow-list of status codes cached even though they denote failure.
    /// When non-empty it replaces the default 200–399 gate entirely.
    pub fn ignore_status_codes(&mut self, codes: impl Into<Vec<u16>>) -> &mut Self {
        self.cacheable_status = codes.into();
        self
    }

    pub fn cache_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Delete the cache entry for the current request.
    ///
    /// Fails with a store error when there is nothing to delete; this
    /// sharp edge is deliberate.
    pub fn clear_cache(&mut self) -> Result<&mut Self> {
        let fp = self.current_fingerprint()?;
        self.store().clear(&fp)?;
        Ok(self)
    }

    /// Path of the cache file the current request would use.
    pub fn cache_path(&self) -> Result<PathBuf> {
        let fp = self.current_fingerprint()?;
        Ok(self.store().path_for(&fp))
    }

    // --- mock overlay ------------------------------------------------------

    /// Arm a canned response. Every subsequent dispatch short-circuits:
    /// no transport call, no cache read or write, no retries.
    ///
    /// Arm after [`decode`], since the payload normalization rule depends
    /// on whether decoding is enabled.
    ///
    /// [`decode`]: Client::decode
    pub fn mock(&mut self, source: impl Into<MockSource>, allow_empty: bool) -> Result<&mut Self> {
        let payload = mock::arm(source.into(), allow_empty, self.auto_decode)?;
        self.response = Some(payload);
        self.envelope = ResponseEnvelope::default();
        self.mocked = true;
        Ok(self)
    }

    // --- dispatch ----------------------------------------------------------

    pub fn get(&mut self) -> Result<&mut Self> {
        self.run(None, Verb::Get, None, None)
    }

    pub fn delete(&mut self) -> Result<&mut Self> {
        self.run(None, Verb::Delete, None, None)
    }

    pub fn head(&mut self) -> Result<&mut Self> {
        self.run(None, Verb::Head, None, None)
    }

    pub fn post(&mut self, body: impl Into<Option<Body>>) -> Result<&mut Self> {
        self.run(None, Verb::Post, body.into(), None)
    }

    pub fn put(&mut self, body: impl Into<Option<Body>>) -> Result<&mut Self> {
        self.run(None, Verb::Put, body.into(), None)
    }

    pub fn patch(&mut self, body: impl Into<Option<Body>>) -> Result<&mut Self> {
        self.run(None, Verb::Patch, body.into(), None)
    }

    /// Dispatch with the verb previously set via [`method`].
    ///
    /// [`method`]: Client::method
    pub fn send(&mut self) -> Result<&mut Self> {
        self.run(None, self.verb, None, None)
    }

    pub fn request(
        &mut self,
        url: &str,
        verb: Verb,
        body: Option<Body>,
        headers: Option<Headers>,
    ) -> Result<&mut Self> {
        self.run(Some(url.to_string()), verb, body, headers)
    }

    /// Stream the response body straight to `dest` and return the number
    /// of bytes written. Bypasses the cache and the retry loop; transport
    /// failures are recorded on [`error`].
    ///
    /// [`error`]: Client::error
    pub fn download(&mut self, dest: impl AsRef<Path>) -> Result<u64> {
        let url = self.url.clone().ok_or(Error::MissingUrl)?;
        let url = self.expand_url(url);
        self.query_params.clear();
        self.url = Some(url.clone());

        let spec = self.build_spec(url, self.verb, self.body.clone(), self.headers.clone());
        let (envelope, written) = self.transport.download(&spec, dest.as_ref());

        self.response = None;
        self.envelope = envelope;
        Ok(written)
    }

    fn run(
        &mut self,
        url_override: Option<String>,
        verb: Verb,
        body: Option<Body>,
        headers: Option<Headers>,
    ) -> Result<&mut Self> {
        // Mock overlay wins before anything else, URL resolution included.
        if self.mocked {
            tracing::debug!("mock armed, skipping dispatch");
            return Ok(self);
        }

        let url = url_override.or_else(|| self.url.clone()).ok_or(Error::MissingUrl)?;
        let url = self.expand_url(url);
        // Params are folded into the stored URL; dropping them keeps a
        // later dispatch from appending the same pair twice.
        self.query_params.clear();
        self.url = Some(url.clone());
        self.verb = verb;

        let body = body.or_else(|| self.body.clone());
        self.body = body.clone();
        let headers = headers.unwrap_or_else(|| self.headers.clone());

        let spec = self.build_spec(url.clone(), verb, body, headers);

        if self.log_requests {
            self.log_sink.write(&LogRecord::request(self.dump()));
        }

        let fingerprint = fingerprint(&url, verb, spec.body.as_ref(), self.cache_post);

        // Fresh, non-error cache entries end the call here. A cached
        // error is a miss: errors are never served from cache.
        if self.ttl.is_some() {
            if let Some(entry) = self.store().lookup::<ResponseEnvelope>(&fingerprint) {
                if entry.payload.ok() {
                    tracing::debug!(%fingerprint, "serving response from cache");
                    self.response = entry.payload.raw_body.clone().map(Payload::Text);
                    self.envelope = entry.payload;
                    return Ok(self);
                }
            }
        }

        let sleep_time = self.resolved_config().and_then(|c| c.sleep_time);
        let (envelope, attempts) =
            self.dispatcher
                .dispatch(&self.transport, &spec, self.max_retries, sleep_time);
        tracing::debug!(status = ?envelope.status, attempts, "dispatch finished");

        self.response = envelope.raw_body.clone().map(Payload::Text);
        self.envelope = envelope;

        if self.log_responses {
            self.log_sink.write(&LogRecord::response(json!({
                "status": self.envelope.status,
                "error": self.envelope.error,
                "body": self.envelope.raw_body,
            })));
        }

        if let Some(ttl) = self.ttl {
            if self.should_cache() {
                // Cache writes never fail the dispatch.
                if let Err(err) = self.store().store(&fingerprint, &self.envelope, ttl) {
                    tracing::warn!(error = %err, %fingerprint, "cache write skipped");
                }
            }
        }

        Ok(self)
    }

    // --- accessors ----------------------------------------------------------

    pub fn status(&self) -> Option<u16> {
        self.envelope.status
    }

    pub fn error(&self) -> Option<&str> {
        self.envelope.error.as_deref().filter(|e| !e.is_empty())
    }

    /// The undecoded response text. For a mocked client this is the
    /// armed payload, which the overlay guarantees is JSON-shaped when
    /// decoding is disabled.
    pub fn raw_response(&self) -> Option<&str> {
        self.envelope.raw_body.as_deref().or(match &self.response {
            Some(Payload::Text(text)) => Some(text),
            _ => None,
        })
    }

    /// Decoded view of the response, applying only the JSON branch of
    /// the interpretation rules. See [`response`] for the full
    /// content-type-aware view.
    ///
    /// [`response`]: Client::response
    pub fn data(&self) -> Option<Value> {
        match &self.response {
            None => None,
            Some(Payload::Structured(value)) => Some(value.clone()),
            Some(Payload::Text(text)) => {
                if self.auto_decode && is_json(text) {
                    serde_json::from_str(text).ok()
                } else {
                    Some(Value::String(text.clone()))
                }
            }
        }
    }

    pub fn body(&self) -> Option<Value> {
        self.data()
    }

    /// Like [`data`], but fails when the last dispatch recorded an
    /// error, before any decoding is attempted.
    ///
    /// [`data`]: Client::data
    pub fn data_or_fail(&self) -> Result<Option<Value>> {
        if let Some(err) = self.error() {
            return Err(Error::Api(err.to_string()));
        }
        Ok(self.data())
    }

    /// Full decoded view: JSON, then XML, then raw text, driven by the
    /// response content-type and the decode setting.
    pub fn response(&self) -> ApiResponse {
        self.response_with(self.auto_decode)
    }

    pub fn response_with(&self, decode: bool) -> ApiResponse {
        let data = match &self.response {
            Some(Payload::Structured(value)) => value.clone(),
            Some(Payload::Text(text)) => {
                interpret(text, self.envelope.content_type.as_deref(), decode)
            }
            None => Value::Null,
        };
        ApiResponse {
            data,
            http_code: self.envelope.status,
            error: self.envelope.error.clone(),
        }
    }

    pub fn response_headers(&self) -> &Headers {
        &self.envelope.headers
    }

    pub fn request_headers(&self) -> &Headers {
        &self.headers
    }

    pub fn response_content_type(&self) -> Option<&str> {
        self.envelope.content_type.as_deref()
    }

    pub fn effective_url(&self) -> Option<&str> {
        self.envelope.effective_url.as_deref()
    }

    /// Filename advertised by the last response's `Content-Disposition`.
    pub fn filename(&self) -> Option<&str> {
        self.envelope.filename.as_deref()
    }

    /// Snapshot of the request under construction, for logging.
    pub fn dump(&self) -> Value {
        json!({
            "url": self.url,
            "verb": self.verb.as_str(),
            "headers": serde_json::to_value(&self.headers).unwrap_or(Value::Null),
            "body": serde_json::to_value(&self.body).unwrap_or(Value::Null),
            "encode_body": self.encode_body,
            "max_retries": self.max_retries,
            "ssl": format!("{:?}", self.resolved_tls()),
            "cache_ttl": self.ttl,
        })
    }

    // --- resolution helpers -------------------------------------------------

    fn expand_url(&self, url: String) -> String {
        let mut url = core::url::normalize(&url);
        for (name, value) in &self.query_params {
            url = core::url::add_query_param(&url, name, value);
        }
        url
    }

    fn build_spec(&self, url: String, verb: Verb, body: Option<Body>, headers: Headers) -> RequestSpec {
        RequestSpec {
            url,
            verb,
            headers,
            body,
            encode_body: self.encode_body,
            transport: self.transport_options.clone(),
            tls: self.resolved_tls(),
            cookie_file: self.cookie_file.clone(),
        }
    }

    fn resolved_config(&self) -> Option<&Config> {
        self.config.as_ref().or_else(|| Config::global())
    }

    /// Explicit per-call setting, else the process default, else verify.
    fn resolved_tls(&self) -> TlsPolicy {
        let process = self
            .resolved_config()
            .and_then(|c| c.ssl_cert.clone())
            .map(|cert| match cert {
                SslCert::Toggle(false) => TlsPolicy::Disabled,
                SslCert::Toggle(true) => TlsPolicy::Verify,
                SslCert::Path(path) => TlsPolicy::CaPath(path),
            });
        resolve(None, self.tls.clone(), process, TlsPolicy::Verify)
    }

    fn store(&self) -> ResponseStore {
        let dir = resolve(
            None,
            self.cache_dir.clone(),
            self.resolved_config().and_then(|c| c.cache_dir.clone()),
            std::env::temp_dir().join("skiff-cache"),
        );
        ResponseStore::new(dir)
    }

    fn current_fingerprint(&self) -> Result<String> {
        let url = self.url.as_deref().ok_or(Error::MissingUrl)?;
        Ok(fingerprint(url, self.verb, self.body.as_ref(), self.cache_post))
    }

    /// Write policy: GET by default, POST only when explicitly enabled,
    /// never errors, and the status allow-list replaces the 200–399 gate
    /// when configured.
    fn should_cache(&self) -> bool {
        if self.read_only || !self.envelope.ok() {
            return false;
        }
        match self.verb {
            Verb::Get => {}
            Verb::Post if self.cache_post => {}
            _ => return false,
        }
        let Some(status) = self.envelope.status else {
            return false;
        };
        if !self.cacheable_status.is_empty() {
            self.cacheable_status.contains(&status)
        } else {
            (200..400).contains(&status)
        }
    }
}

fn parse_datetime(datetime: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(datetime) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidDate(datetime.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTransport;

    impl Transport for NoopTransport {
        fn send(&self, _spec: &RequestSpec) -> ResponseEnvelope {
            ResponseEnvelope {
                status: Some(200),
                raw_body: Some("{}".to_string()),
                ..ResponseEnvelope::default()
            }
        }
    }

    #[test]
    fn dispatch_without_url_is_a_configuration_error() {
        let mut client = Client::with_transport(NoopTransport);
        assert!(matches!(client.get(), Err(Error::MissingUrl)));
    }

    #[test]
    fn basic_auth_sets_the_authorization_header() {
        let mut client = Client::with_transport(NoopTransport);
        client.basic_auth("user", "pass");
        assert_eq!(
            client.request_headers().get("Authorization"),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[test]
    fn when_applies_the_closure_conditionally() {
        let mut client = Client::with_transport(NoopTransport);
        client
            .when(true, |c| {
                c.add_header("X-A", "1");
            })
            .when(false, |c| {
                c.add_header("X-B", "2");
            });
        assert_eq!(client.request_headers().get("X-A"), Some("1"));
        assert_eq!(client.request_headers().get("X-B"), None);
    }

    #[test]
    fn explicit_tls_setting_wins_over_instance_config() {
        let mut client = Client::with_transport(NoopTransport);
        client.config(Config {
            ssl_cert: Some(SslCert::Toggle(false)),
            ..Config::default()
        });
        assert_eq!(client.resolved_tls(), TlsPolicy::Disabled);

        client.set_ssl_cert("/etc/ca.pem");
        assert_eq!(client.resolved_tls(), TlsPolicy::CaPath("/etc/ca.pem".into()));
    }

    #[test]
    fn cache_until_a_past_datetime_clamps_to_zero() {
        let mut client = Client::with_transport(NoopTransport);
        client.cache_until("2001-01-01 00:00:00").unwrap();
        assert_eq!(client.ttl, Some(0));
    }

    #[test]
    fn cache_until_rejects_garbage() {
        let mut client = Client::with_transport(NoopTransport);
        assert!(matches!(
            client.cache_until("soonish"),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn query_params_are_appended_at_dispatch_time() {
        let mut client = Client::with_transport(NoopTransport);
        client
            .url("https://example.com/search")
            .query_param("q", "rust")
            .query_param("page", "2");
        client.get().unwrap();
        assert_eq!(
            client.url.as_deref(),
            Some("https://example.com/search?q=rust&page=2")
        );
    }
}
