//! One-time CSRF state nonces for the authorize redirect
//!
//! Nonces are keyed by their issuance timestamp rather than by value, so the
//! expiration metadata shares the same key suffix and several nonces can be
//! outstanding at once (multi-tab sign-in) without clobbering each other.
//! Lookup and cleanup are linear scans of the namespace; fine at the
//! cardinality of concurrent sign-in attempts in one session.

use crate::ScopedCache;
use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};
use tracing::debug;

const STATE: &str = "OAuthState#";
const STATE_EXPIRATION: &str = "OAuthStateExpiration#";

/// Lifetime of an outstanding state nonce.
const STATE_TTL_MINUTES: i64 = 10;

/// Generate a random state string for CSRF protection.
///
/// 32 characters from [A-Za-z0-9], to be stored before redirecting to the
/// authorization server and compared against the callback's `state`.
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = thread_rng();
    (0..32)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Issues, validates, expires, and removes one-time CSRF state nonces.
#[derive(Clone, Debug)]
pub struct StateNonceTracker {
    cache: ScopedCache,
}

impl StateNonceTracker {
    pub fn new(cache: ScopedCache) -> Self {
        Self { cache }
    }

    /// Mint a nonce for an outbound authorize URL.
    ///
    /// The nonce and its expiry are stored under sibling keys derived from
    /// the issuance timestamp and stay valid for ten minutes.
    pub fn issue(&self) -> String {
        let nonce = generate_state();
        let now = Utc::now();
        let mut timestamp = now.timestamp_micros();
        // Two issues inside the same microsecond must not clobber each
        // other's slot.
        while self.cache.get(&format!("{STATE}{timestamp}")).is_some() {
            timestamp += 1;
        }

        self.cache.set(&format!("{STATE}{timestamp}"), &nonce);
        self.cache.set(
            &format!("{STATE_EXPIRATION}{timestamp}"),
            &(now + Duration::minutes(STATE_TTL_MINUTES)).to_rfc3339(),
        );

        debug!(timestamp, "issued OAuth state nonce");
        nonce
    }

    /// Drop every outstanding nonce whose expiry has passed.
    pub fn sweep_expired(&self) {
        let now = Utc::now();
        for name in self.cache.keys() {
            let Some(timestamp) = name.strip_prefix(STATE_EXPIRATION) else {
                continue;
            };

            let expired = self
                .cache
                .get(&name)
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|expires_at| expires_at.with_timezone(&Utc) < now)
                // Unparseable expiry means the pair is unusable anyway.
                .unwrap_or(true);

            if expired {
                debug!(timestamp, "sweeping expired OAuth state nonce");
                self.remove_pair(timestamp);
            }
        }
    }

    /// Single-use validation: sweep stale nonces, then consume the entry
    /// holding `nonce` if one remains. A second call with the same value
    /// returns false.
    pub fn validate_and_consume(&self, nonce: &str) -> bool {
        self.sweep_expired();

        match self.find_timestamp(nonce) {
            Some(timestamp) => {
                self.remove_pair(&timestamp);
                true
            }
            None => false,
        }
    }

    /// Best-effort removal of a nonce entry by value, regardless of expiry.
    /// Used as defensive cleanup when a callback fails validation.
    pub fn remove(&self, nonce: &str) {
        if let Some(timestamp) = self.find_timestamp(nonce) {
            self.remove_pair(&timestamp);
        }
    }

    /// Outstanding (not yet swept) nonce count.
    pub fn outstanding(&self) -> usize {
        self.cache
            .keys()
            .iter()
            .filter(|name| name.starts_with(STATE))
            .count()
    }

    fn find_timestamp(&self, nonce: &str) -> Option<String> {
        self.cache.keys().into_iter().find_map(|name| {
            let timestamp = name.strip_prefix(STATE)?;
            (self.cache.get(&name).as_deref() == Some(nonce)).then(|| timestamp.to_string())
        })
    }

    fn remove_pair(&self, timestamp: &str) {
        self.cache.remove(&format!("{STATE}{timestamp}"));
        self.cache.remove(&format!("{STATE_EXPIRATION}{timestamp}"));
    }
}
