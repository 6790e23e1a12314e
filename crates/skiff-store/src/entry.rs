use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached payload, stamped at write time.
///
/// An entry is fresh while `now - stored_at < ttl_seconds`. A zero TTL
/// is never fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub fingerprint: String,
    pub stored_at:   DateTime<Utc>,
    pub ttl_seconds: u64,
    pub payload:     T,
}

impl<T> Entry<T> {
    pub fn new(fingerprint: impl Into<String>, payload: T, ttl_seconds: u64) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            stored_at: Utc::now(),
            ttl_seconds,
            payload,
        }
    }

    /// Freshness against an explicit clock, for deterministic tests.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at).num_seconds();
        age >= 0 && (age as u64) < self.ttl_seconds
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_within_ttl() {
        let entry = Entry::new("example.com/a", 1u32, 60);
        assert!(entry.is_fresh());
    }

    #[test]
    fn stale_once_ttl_elapsed() {
        let entry = Entry::new("example.com/a", 1u32, 60);
        let later = entry.stored_at + Duration::seconds(60);
        assert!(!entry.is_fresh_at(later));
    }

    #[test]
    fn boundary_is_exclusive() {
        let entry = Entry::new("example.com/a", (), 10);
        let just_under = entry.stored_at + Duration::seconds(9);
        let exactly = entry.stored_at + Duration::seconds(10);
        assert!(entry.is_fresh_at(just_under));
        assert!(!entry.is_fresh_at(exactly));
    }

    #[test]
    fn zero_ttl_is_never_fresh() {
        let entry = Entry::new("example.com/a", (), 0);
        assert!(!entry.is_fresh_at(entry.stored_at));
    }
}
