//! Flow orchestration: token reuse vs. refresh vs. re-authorization

use crate::{FlowConfig, TokenEndpoint};
use ar_session::{ScopedCache, StateNonceTracker, TokenStore};
use ar_types::{AuthError, AuthResult, TokenGrant};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};
use urlencoding::encode;

/// Auxiliary slot holding the URL to send the user back to after
/// authorization completes.
pub const REDIRECT_TO: &str = "RedirectTo";

/// Auxiliary slot holding the directory tenant of the signed-in user.
pub const TENANT_ID: &str = "TenantId";

/// Tokens are cached as expiring this many minutes before the IdP-reported
/// expiry, so they are renewed before the resource server starts rejecting
/// them.
const EXPIRY_MARGIN_MINUTES: i64 = 5;

/// Query parameters of the IdP's redirect back to the application, plus the
/// transport facts the callback handler must check. The hosting framework
/// extracts these; the controller never touches the request itself.
#[derive(Clone, Debug, Default)]
pub struct CallbackParams {
    /// `code` query parameter
    pub code: Option<String>,

    /// `error` query parameter
    pub error: Option<String>,

    /// `error_description` query parameter
    pub error_description: Option<String>,

    /// `state` query parameter
    pub state: Option<String>,

    /// Whether the callback arrived over HTTPS
    pub secure_transport: bool,

    /// Whether the callback came from a loopback address (development)
    pub loopback: bool,

    /// The exact redirect URL that was used to obtain the code
    pub redirect_url: String,
}

/// Orchestrates the authorization-code flow for one user session.
///
/// Per flow attempt: `NoToken -> AwaitingCallback -> (Authorized | Failed)`,
/// with the fast path `HasValidToken -> Authorized` and the refresh path
/// `HasExpiredToken + RefreshToken -> Authorized | NoToken`.
pub struct AuthFlowController {
    tokens: TokenStore,
    states: StateNonceTracker,
    idp: Arc<dyn TokenEndpoint>,
    config: FlowConfig,
}

impl AuthFlowController {
    pub fn new(cache: ScopedCache, idp: Arc<dyn TokenEndpoint>, config: FlowConfig) -> Self {
        Self {
            tokens: TokenStore::new(cache.clone()),
            states: StateNonceTracker::new(cache),
            idp,
            config,
        }
    }

    /// The session's token cache, for callers that manage auxiliary values
    /// or implement logout.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Get a usable access token for `resource_id`, or `None` when the
    /// caller must initiate an interactive authorize redirect.
    ///
    /// Tries the cache first (no network), then a refresh-token renewal.
    /// Before signalling re-authorization, `current_url` is recorded so the
    /// callback can send the user back to where they started.
    pub async fn get_access_token(
        &self,
        tenant_id: &str,
        resource_id: &str,
        current_url: &str,
    ) -> Option<String> {
        if let Some(token) = self.tokens.get_access_token(resource_id) {
            debug!(resource_id, "reusing cached access token");
            return Some(token);
        }

        if let Some(token) = self.refresh_access_token(tenant_id, resource_id).await {
            return Some(token);
        }

        self.tokens.save_value(REDIRECT_TO, current_url);
        None
    }

    /// Renew the access token for `resource_id` with the session's refresh
    /// token.
    ///
    /// `None` means either no refresh token is stored (no network call is
    /// made) or the IdP rejected it — in which case the dead credential is
    /// discarded so a future attempt goes straight to interactive
    /// re-authorization instead of retrying it indefinitely.
    pub async fn refresh_access_token(
        &self,
        tenant_id: &str,
        resource_id: &str,
    ) -> Option<String> {
        let refresh_token = self.tokens.get_refresh_token()?;

        match self
            .idp
            .exchange_refresh_token(&refresh_token, tenant_id, resource_id)
            .await
        {
            Ok(grant) => {
                info!(resource_id, "access token renewed via refresh token");
                self.persist_grant(resource_id, &grant);
                Some(grant.access_token)
            }
            Err(e) => {
                warn!("refresh token rejected, discarding it: {e}");
                self.tokens.remove_refresh_token();
                None
            }
        }
    }

    /// Compose the authorize-redirect URL for a resource, minting a fresh
    /// CSRF state nonce. The caller performs the actual redirect.
    pub fn build_authorization_url(&self, resource_id: &str, redirect_url: &str) -> String {
        let state = self.states.issue();

        format!(
            "{}?response_type=code&client_id={}&resource={}&redirect_uri={}&state={}",
            self.config.authorize_endpoint(FlowConfig::COMMON_TENANT),
            encode(&self.config.client_id),
            encode(resource_id),
            encode(redirect_url),
            encode(&state),
        )
    }

    /// [`Self::build_authorization_url`] for the configured default
    /// resource, with the redirect URL derived from the application's
    /// origin and configured callback path.
    pub fn build_default_authorization_url(&self, origin: &str) -> String {
        self.build_authorization_url(&self.config.resource_id, &self.config.redirect_url(origin))
    }

    /// Validate the IdP's callback and redeem its authorization code.
    ///
    /// Checks run in strict order and short-circuit on the first violation:
    /// transport policy, state presence, state validity (single use), IdP
    /// error report, then the code exchange. On success the grant is cached
    /// (expiry minus the safety margin) and the recorded return target is
    /// handed back for the post-login redirect.
    pub async fn handle_callback(&self, params: CallbackParams) -> AuthResult<String> {
        if !params.secure_transport && !params.loopback {
            return Err(AuthError::InsecureTransport);
        }

        let state = params.state.as_deref().ok_or(AuthError::MissingState)?;

        if !self.states.validate_and_consume(state) {
            // Best-effort cleanup of any lingering entry under this value
            // before failing.
            self.states.remove(state);
            return Err(AuthError::InvalidState);
        }

        if let Some(error) = params.error {
            return Err(AuthError::IdpRejected {
                error,
                description: params.error_description.unwrap_or_default(),
            });
        }

        let code = params.code.as_deref().ok_or_else(|| {
            AuthError::TokenExchange("callback did not carry an authorization code".to_string())
        })?;

        let grant = self.idp.exchange_code(code, &params.redirect_url).await?;

        info!("authorization code redeemed");
        self.persist_grant(&self.config.resource_id, &grant);
        if let Some(ref tenant_id) = grant.tenant_id {
            self.tokens.save_value(TENANT_ID, tenant_id);
        }

        // The return target is read but deliberately NOT removed: clearing
        // it here breaks sessions with several outstanding authorization
        // attempts (multiple tabs) that all share this one slot.
        self.tokens
            .get_value(REDIRECT_TO)
            .ok_or(AuthError::MissingReturnTarget)
    }

    /// Drop everything this session has cached (logout).
    pub fn clear_session(&self) {
        self.tokens.clear_all();
    }

    fn persist_grant(&self, resource_id: &str, grant: &TokenGrant) {
        self.tokens.save_access_token(
            resource_id,
            &grant.access_token,
            grant.expires_on - Duration::minutes(EXPIRY_MARGIN_MINUTES),
        );
        // Keep the previous refresh token when the IdP did not rotate one.
        if let Some(ref refresh_token) = grant.refresh_token {
            self.tokens.save_refresh_token(refresh_token);
        }
    }
}
