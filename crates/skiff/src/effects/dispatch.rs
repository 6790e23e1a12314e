//! Retry/throttle controller.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::data::{RequestSpec, ResponseEnvelope};
use crate::effects::transport::Transport;

/// Minimum elapsed time before pacing sleep is re-applied to a domain.
const GUARD_INTERVAL: Duration = Duration::from_secs(1);

/// Per-domain record of the last dispatch attempt.
///
/// Scoped to one controller instance: pacing guarantees hold within a
/// single client's sequence of calls, never across instances or
/// processes.
#[derive(Debug, Default)]
pub struct ThrottleState {
    last_attempt: HashMap<String, Instant>,
}

impl ThrottleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the last recorded attempt to this host is recent enough
    /// that pacing applies.
    pub fn should_pace(&self, host: &str, guard: Duration) -> bool {
        self.last_attempt
            .get(host)
            .is_some_and(|at| at.elapsed() < guard)
    }

    pub fn record(&mut self, host: &str) {
        self.last_attempt.insert(host.to_string(), Instant::now());
    }
}

/// Repeats transport calls up to a configured bound while sequencing
/// per-domain pacing.
///
/// No exponential backoff, no jitter: pacing is a fixed duration applied
/// per domain, not per request.
#[derive(Debug, Default)]
pub struct Dispatcher {
    throttle: ThrottleState,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the request, retrying while the envelope carries an error,
    /// until `max_attempts` physical calls have been made. Returns the
    /// final envelope and the number of attempts used.
    pub fn dispatch<T: Transport>(
        &mut self,
        transport: &T,
        spec: &RequestSpec,
        max_attempts: u32,
        sleep_time: Option<u64>,
    ) -> (ResponseEnvelope, u32) {
        let host = spec.hostname();
        let mut envelope = ResponseEnvelope::default();
        let mut attempts = 0;

        while attempts < max_attempts {
            if let (Some(secs), Some(host)) = (sleep_time, host.as_deref()) {
                if self.throttle.should_pace(host, GUARD_INTERVAL) {
                    tracing::debug!(host, secs, "pacing before dispatch");
                    std::thread::sleep(Duration::from_secs(secs));
                }
            }

            envelope = transport.send(spec);
            attempts += 1;

            if let Some(host) = host.as_deref() {
                self.throttle.record(host);
            }

            if envelope.ok() {
                break;
            }
            tracing::debug!(
                attempt = attempts,
                max = max_attempts,
                error = envelope.error.as_deref().unwrap_or_default(),
                "dispatch attempt failed"
            );
        }

        (envelope, attempts)
    }
}
