//! Token grant returned by the identity provider's token endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of redeeming an authorization code or a refresh token.
///
/// `expires_on` is the IdP-reported absolute expiry; the caller applies its
/// own safety margin before caching. `refresh_token` is absent when the IdP
/// chooses not to rotate one, and `tenant_id` is only reported on the
/// code-exchange path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Access token
    pub access_token: String,

    /// Refresh token, possibly rotated (optional)
    pub refresh_token: Option<String>,

    /// Absolute expiry of the access token as reported by the IdP
    pub expires_on: DateTime<Utc>,

    /// Directory tenant the grant was issued for (optional)
    pub tenant_id: Option<String>,
}
