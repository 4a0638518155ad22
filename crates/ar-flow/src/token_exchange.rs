//! Token exchange against the IdP's token endpoint

use crate::FlowConfig;
use ar_types::{AuthError, AuthResult, TokenGrant};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

/// The IdP's token endpoint, as consumed by the flow controller.
///
/// Both operations fail with [`AuthError::TokenExchange`]; the controller
/// decides whether that is fatal (code path) or recoverable (refresh path).
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Redeem an authorization code. `redirect_url` must be the exact URL
    /// that was used to obtain the code; IdPs validate the two for
    /// consistency.
    async fn exchange_code(&self, code: &str, redirect_url: &str) -> AuthResult<TokenGrant>;

    /// Redeem a refresh token for a new access token (and possibly a
    /// rotated refresh token).
    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
        tenant_id: &str,
        resource_id: &str,
    ) -> AuthResult<TokenGrant>;
}

/// Token response wire format.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,

    /// Expires in seconds
    #[serde(default)]
    expires_in: Option<i64>,

    /// Refresh token (optional)
    #[serde(default)]
    refresh_token: Option<String>,

    /// Directory tenant the token was issued for (optional)
    #[serde(default)]
    tenant_id: Option<String>,
}

/// Fallback lifetime when the IdP omits `expires_in` (the common default
/// for directory-issued access tokens).
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// [`TokenEndpoint`] over HTTP, posting form-encoded grant requests with
/// `reqwest`.
pub struct HttpTokenExchanger {
    client: Client,
    config: FlowConfig,
}

impl HttpTokenExchanger {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn request_grant(
        &self,
        token_url: &str,
        mut params: HashMap<String, String>,
    ) -> AuthResult<TokenGrant> {
        params.insert("client_id".to_string(), self.config.client_id.clone());
        if let Some(ref client_secret) = self.config.client_secret {
            params.insert("client_secret".to_string(), client_secret.clone());
        }

        let response = self
            .client
            .post(token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("failed to send token request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "token request rejected: {body}");
            return Err(AuthError::TokenExchange(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(format!("failed to parse token response: {e}")))?;

        let expires_in = token_response
            .expires_in
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        Ok(TokenGrant {
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_on: Utc::now() + Duration::seconds(expires_in),
            tenant_id: token_response.tenant_id,
        })
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenExchanger {
    async fn exchange_code(&self, code: &str, redirect_url: &str) -> AuthResult<TokenGrant> {
        debug!("redeeming authorization code");

        let mut params = HashMap::new();
        params.insert("grant_type".to_string(), "authorization_code".to_string());
        params.insert("code".to_string(), code.to_string());
        params.insert("redirect_uri".to_string(), redirect_url.to_string());

        // The user's tenant is not known until the grant comes back.
        let token_url = self.config.token_endpoint(FlowConfig::COMMON_TENANT);
        self.request_grant(&token_url, params).await
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
        tenant_id: &str,
        resource_id: &str,
    ) -> AuthResult<TokenGrant> {
        debug!(tenant_id, "redeeming refresh token");

        let mut params = HashMap::new();
        params.insert("grant_type".to_string(), "refresh_token".to_string());
        params.insert("refresh_token".to_string(), refresh_token.to_string());
        params.insert("resource".to_string(), resource_id.to_string());

        let token_url = self.config.token_endpoint(tenant_id);
        self.request_grant(&token_url, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(authority_base: String) -> FlowConfig {
        FlowConfig {
            client_id: "client".to_string(),
            client_secret: Some("secret".to_string()),
            authority_base,
            resource_id: "https://api.example.com".to_string(),
            callback_path: "/oauth/callback".to_string(),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/common/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("client_id=client"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3600,
                "tenant_id": "contoso"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let exchanger = HttpTokenExchanger::new(config(server.uri()));
        let grant = exchanger
            .exchange_code("auth-code", "https://app.example.com/oauth/callback")
            .await
            .unwrap();

        assert_eq!(grant.access_token, "at-1");
        assert_eq!(grant.refresh_token, Some("rt-1".to_string()));
        assert_eq!(grant.tenant_id, Some("contoso".to_string()));
        assert!(grant.expires_on > Utc::now() + Duration::minutes(55));
    }

    #[tokio::test]
    async fn test_exchange_refresh_token_uses_tenant_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contoso/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-2",
                "expires_in": 600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let exchanger = HttpTokenExchanger::new(config(server.uri()));
        let grant = exchanger
            .exchange_refresh_token("rt-1", "contoso", "https://api.example.com")
            .await
            .unwrap();

        assert_eq!(grant.access_token, "at-2");
        assert_eq!(grant.refresh_token, None);
    }

    #[tokio::test]
    async fn test_rejected_exchange_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let exchanger = HttpTokenExchanger::new(config(server.uri()));
        let err = exchanger
            .exchange_refresh_token("rt-dead", "contoso", "https://api.example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::TokenExchange(_)));
    }
}
