//! Transport executor: one physical HTTP call per `send`.

use std::path::Path;

use reqwest::Method;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::redirect::Policy;

use crate::core::extract_filename;
use crate::data::{Headers, RequestSpec, ResponseEnvelope, TlsPolicy, Verb};
use crate::effects::cookies::CookieFileJar;

/// Synchronous HTTP transport abstraction.
///
/// `send` never fails: connection and protocol errors are recorded into
/// the envelope's error field with status 0, and HTTP error statuses
/// (400, 500, ...) are plain data. The retry controller and the caller
/// both branch on the envelope, not on a `Result`.
pub trait Transport {
    fn send(&self, spec: &RequestSpec) -> ResponseEnvelope;

    /// Stream the response body to a file, returning the envelope
    /// (without a raw body) and the number of bytes written.
    fn download(&self, spec: &RequestSpec, dest: &Path) -> (ResponseEnvelope, u64) {
        let mut envelope = self.send(spec);
        let body = envelope.raw_body.take().unwrap_or_default();
        match std::fs::write(dest, body.as_bytes()) {
            Ok(()) => (envelope, body.len() as u64),
            Err(err) => {
                envelope.error = Some(format!("failed to write {}: {err}", dest.display()));
                (envelope, 0)
            }
        }
    }
}

/// Production transport built on reqwest's blocking client.
///
/// A client is built per call because redirect, timeout and TLS policy
/// all live on the builder and vary per request spec.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    fn build_client(&self, spec: &RequestSpec) -> Result<HttpClient, String> {
        let redirects = match spec.transport.max_redirects {
            Some(max) if max > 0 => Policy::limited(max as usize),
            _ => Policy::none(),
        };

        let mut builder = HttpClient::builder()
            .timeout(spec.transport.timeout)
            .redirect(redirects)
            .connection_verbose(spec.transport.verbose);

        if let Some(connect) = spec.transport.connect_timeout {
            builder = builder.connect_timeout(connect);
        }
        if let Some(agent) = &spec.transport.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        match &spec.tls {
            TlsPolicy::Verify => {}
            TlsPolicy::Disabled => {
                builder = builder
                    .danger_accept_invalid_certs(true)
                    .danger_accept_invalid_hostnames(true);
            }
            TlsPolicy::CaPath(path) => {
                let pem = std::fs::read(path)
                    .map_err(|e| format!("failed to read CA certificate {}: {e}", path.display()))?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| e.to_string())?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder.build().map_err(|e| e.to_string())
    }

    fn prepare(&self, spec: &RequestSpec) -> Result<(RequestBuilder, Option<CookieFileJar>), String> {
        let client = self.build_client(spec)?;
        let url = reqwest::Url::parse(&spec.url).map_err(|e| format!("invalid URL {}: {e}", spec.url))?;

        let mut headers = spec.headers.clone();

        let jar = spec.cookie_file.as_ref().map(CookieFileJar::open);
        if let Some(jar) = &jar {
            if let Some(cookie) = jar.header_for(&url) {
                headers.set("Cookie", cookie);
            }
        }

        let body_bytes = match (&spec.body, spec.verb) {
            (Some(body), verb) if verb != Verb::Get => Some(body.to_bytes()),
            _ => None,
        };
        if let Some(bytes) = &body_bytes {
            if spec.encode_body {
                headers.set("Content-Length", bytes.len().to_string());
            }
        }

        let mut request = client.request(Method::from(spec.verb), url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        if let Some(bytes) = body_bytes {
            request = request.body(bytes);
        }

        if spec.transport.verbose {
            tracing::debug!(url = %spec.url, verb = %spec.verb, "sending request");
        }

        Ok((request, jar))
    }

    fn execute(&self, spec: &RequestSpec) -> Result<ResponseEnvelope, String> {
        let (request, mut jar) = self.prepare(spec)?;
        let response = request.send().map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let effective_url = response.url().clone();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), value.to_str().unwrap_or_default());
        }
        let content_type = headers.get("Content-Type").map(str::to_string);
        let filename = extract_filename(&headers);

        if let Some(jar) = jar.as_mut() {
            jar.absorb(&effective_url, &headers);
            if let Err(err) = jar.save() {
                tracing::warn!(error = %err, "failed to persist cookie jar");
            }
        }

        let raw = response.text().map_err(|e| e.to_string())?;

        Ok(ResponseEnvelope {
            status: Some(status),
            error: None,
            raw_body: Some(raw),
            decoded: None,
            headers,
            content_type,
            effective_url: Some(effective_url.to_string()),
            filename,
        })
    }

    fn execute_download(&self, spec: &RequestSpec, dest: &Path) -> Result<(ResponseEnvelope, u64), String> {
        let (request, _jar) = self.prepare(spec)?;
        let mut response = request.send().map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let effective_url = response.url().to_string();

        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), value.to_str().unwrap_or_default());
        }
        let content_type = headers.get("Content-Type").map(str::to_string);
        let filename = extract_filename(&headers);

        let mut file = std::fs::File::create(dest)
            .map_err(|e| format!("failed to create {}: {e}", dest.display()))?;
        let written = response.copy_to(&mut file).map_err(|e| e.to_string())?;

        let envelope = ResponseEnvelope {
            status: Some(status),
            error: None,
            raw_body: None,
            decoded: None,
            headers,
            content_type,
            effective_url: Some(effective_url),
            filename,
        };
        Ok((envelope, written))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, spec: &RequestSpec) -> ResponseEnvelope {
        match self.execute(spec) {
            Ok(envelope) => envelope,
            Err(message) => ResponseEnvelope::from_error(message),
        }
    }

    fn download(&self, spec: &RequestSpec, dest: &Path) -> (ResponseEnvelope, u64) {
        match self.execute_download(spec, dest) {
            Ok(result) => result,
            Err(message) => (ResponseEnvelope::from_error(message), 0),
        }
    }
}
