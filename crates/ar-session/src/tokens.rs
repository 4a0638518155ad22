//! Expiry-aware access/refresh token caching

use crate::ScopedCache;
use chrono::{DateTime, Utc};
use tracing::debug;

const ACCESS_TOKEN: &str = "AccessToken#";
const ACCESS_TOKEN_EXPIRATION: &str = "AccessTokenExpiration#";
const REFRESH_TOKEN: &str = "RefreshToken";

/// Per-session token cache.
///
/// Holds one access token per resource (with its absolute expiry stored
/// alongside under a sibling key) and a single refresh-token slot. Expiry is
/// enforced at read time; any safety margin is the saver's responsibility.
#[derive(Clone, Debug)]
pub struct TokenStore {
    cache: ScopedCache,
}

impl TokenStore {
    pub fn new(cache: ScopedCache) -> Self {
        Self { cache }
    }

    /// Cache an access token for a resource, overwriting any previous entry.
    pub fn save_access_token(&self, resource_id: &str, token: &str, expires_at: DateTime<Utc>) {
        self.cache
            .set(&format!("{ACCESS_TOKEN}{resource_id}"), token);
        self.cache.set(
            &format!("{ACCESS_TOKEN_EXPIRATION}{resource_id}"),
            &expires_at.to_rfc3339(),
        );
    }

    /// Look up the cached access token for a resource.
    ///
    /// An entry whose expiry has passed (or whose expiry is missing or
    /// unparseable) is evicted and reported as absent; callers never see a
    /// stale token.
    pub fn get_access_token(&self, resource_id: &str) -> Option<String> {
        let token = self.cache.get(&format!("{ACCESS_TOKEN}{resource_id}"))?;

        let expires_at = self
            .cache
            .get(&format!("{ACCESS_TOKEN_EXPIRATION}{resource_id}"))
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc));

        match expires_at {
            Some(expires_at) if expires_at >= Utc::now() => Some(token),
            _ => {
                debug!(resource_id, "evicting expired access token");
                self.remove_access_token(resource_id);
                None
            }
        }
    }

    pub fn remove_access_token(&self, resource_id: &str) {
        self.cache.remove(&format!("{ACCESS_TOKEN}{resource_id}"));
        self.cache
            .remove(&format!("{ACCESS_TOKEN_EXPIRATION}{resource_id}"));
    }

    /// Store the session's refresh token, replacing any previous one.
    pub fn save_refresh_token(&self, token: &str) {
        self.cache.set(REFRESH_TOKEN, token);
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.cache.get(REFRESH_TOKEN)
    }

    pub fn remove_refresh_token(&self) {
        self.cache.remove(REFRESH_TOKEN);
    }

    /// Free-form flow-scoped slot (tenant id, post-login redirect target).
    pub fn save_value(&self, name: &str, value: &str) {
        self.cache.set(name, value);
    }

    pub fn get_value(&self, name: &str) -> Option<String> {
        self.cache.get(name)
    }

    pub fn remove_value(&self, name: &str) {
        self.cache.remove(name);
    }

    /// Remove every namespaced entry (full session logout / cleanup).
    pub fn clear_all(&self) {
        self.cache.clear();
    }
}
