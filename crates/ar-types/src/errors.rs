//! Error types and conversions

use thiserror::Error;

/// Failures of the authorization flow.
///
/// Callback validation errors are fatal to the flow attempt and abort before
/// any token exchange. Refresh failures never surface through this type; the
/// controller absorbs them into a "no token available" result because a full
/// re-authorization is always a valid recovery path.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth callback must arrive over HTTPS (or from loopback)")]
    InsecureTransport,

    #[error("OAuth callback did not carry a state parameter")]
    MissingState,

    #[error("OAuth state value was not issued by this session, expired, or was already used")]
    InvalidState,

    #[error("identity provider reported an error: {error}: {description}")]
    IdpRejected { error: String, description: String },

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("no post-login return target was recorded for this session")]
    MissingReturnTarget,
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for String {
    fn from(err: AuthError) -> String {
        err.to_string()
    }
}
