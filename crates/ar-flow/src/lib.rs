//! OAuth2 authorization-code flow orchestration
//!
//! Decides, per protected-resource access, between reusing a cached access
//! token, renewing it with the session's refresh token, and sending the user
//! through an interactive authorize redirect — and validates the IdP's
//! callback when they come back.
//!
//! # Usage
//! ```no_run
//! # use std::sync::Arc;
//! # use ar_session::{MemorySessionStore, ScopedCache, SessionStore};
//! # use ar_flow::{AuthFlowController, FlowConfig, HttpTokenExchanger};
//! # async fn example() {
//! let config = FlowConfig {
//!     client_id: "my-client-id".into(),
//!     client_secret: Some("my-client-secret".into()),
//!     authority_base: "https://login.example.com".into(),
//!     resource_id: "https://api.example.com".into(),
//!     callback_path: "/oauth/callback".into(),
//! };
//! let cache = ScopedCache::new(Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>);
//! let idp = Arc::new(HttpTokenExchanger::new(config.clone()));
//! let controller = AuthFlowController::new(cache, idp, config);
//!
//! match controller
//!     .get_access_token("contoso", "https://api.example.com", "https://app.example.com/report")
//!     .await
//! {
//!     Some(_token) => { /* call the resource API */ }
//!     None => {
//!         let _url = controller.build_authorization_url(
//!             "https://api.example.com",
//!             "https://app.example.com/oauth/callback",
//!         );
//!         // redirect the user to `url`
//!     }
//! }
//! # }
//! ```

mod config;
mod controller;
mod token_exchange;

pub use config::FlowConfig;
pub use controller::{AuthFlowController, CallbackParams, REDIRECT_TO, TENANT_ID};
pub use token_exchange::{HttpTokenExchanger, TokenEndpoint};
