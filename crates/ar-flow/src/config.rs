//! Flow configuration

/// Registered-client configuration for one IdP.
///
/// `authority_base` is the tenant-less authority root, e.g.
/// `https://login.windows.net`; per-tenant endpoints are derived from it.
/// The authorize redirect always goes through the `common` tenant (the user
/// is not known yet); refresh goes through the tenant the grant belongs to.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Client ID identifying the application to the IdP
    pub client_id: String,

    /// Client credential for confidential clients (optional)
    pub client_secret: Option<String>,

    /// Authority root URL, without a tenant segment
    pub authority_base: String,

    /// Default protected resource to request tokens for
    pub resource_id: String,

    /// Path of the application's OAuth callback endpoint
    pub callback_path: String,
}

impl FlowConfig {
    /// Tenant segment used before the user's tenant is known.
    pub const COMMON_TENANT: &'static str = "common";

    /// Authorize endpoint for a tenant.
    pub fn authorize_endpoint(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/authorize",
            self.authority_base.trim_end_matches('/'),
            tenant
        )
    }

    /// Token endpoint for a tenant.
    pub fn token_endpoint(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/token",
            self.authority_base.trim_end_matches('/'),
            tenant
        )
    }

    /// Compose the callback redirect URL from the application's origin
    /// (scheme + authority).
    pub fn redirect_url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.callback_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FlowConfig {
        FlowConfig {
            client_id: "client".to_string(),
            client_secret: Some("secret".to_string()),
            authority_base: "https://login.example.com/".to_string(),
            resource_id: "https://api.example.com".to_string(),
            callback_path: "/oauth/callback".to_string(),
        }
    }

    #[test]
    fn test_endpoints_for_tenant() {
        let config = config();
        assert_eq!(
            config.authorize_endpoint(FlowConfig::COMMON_TENANT),
            "https://login.example.com/common/oauth2/authorize"
        );
        assert_eq!(
            config.token_endpoint("contoso"),
            "https://login.example.com/contoso/oauth2/token"
        );
    }

    #[test]
    fn test_redirect_url_from_origin() {
        let config = config();
        assert_eq!(
            config.redirect_url("https://app.example.com"),
            "https://app.example.com/oauth/callback"
        );
    }
}
