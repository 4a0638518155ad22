//! Session-scoped storage for OAuth flow state and tokens
//!
//! Everything here operates on an externally supplied session key/value
//! store, consumed through the [`SessionStore`] capability trait. The store
//! is scoped to one end-user session; cross-session interference is excluded
//! by construction.

mod scoped;
mod state;
mod store;
mod tokens;

pub use scoped::ScopedCache;
pub use state::{generate_state, StateNonceTracker};
pub use store::{MemorySessionStore, SessionStore};
pub use tokens::TokenStore;
