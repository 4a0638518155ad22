//! Shared error and token types for AuthRelay

pub mod errors;
pub mod grant;

pub use errors::{AuthError, AuthResult};
pub use grant::TokenGrant;
