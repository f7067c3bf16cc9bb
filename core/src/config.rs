//! Client configuration: target environment and merchant credentials.
//!
//! # Design
//! An [`Environment`] yields both the API base URL and the checkout redirect
//! base URL, so the two can never point at different environments.

use std::fmt;

pub const SANDBOX_API_URL: &str = "http://demo.vivapayments.com/api/";
pub const SANDBOX_REDIRECT_URL: &str = "http://demo.vivapayments.com/web/checkout?ref=";
pub const PRODUCTION_API_URL: &str = "https://www.vivapayments.com/api/";
pub const PRODUCTION_REDIRECT_URL: &str = "https://www.vivapayments.com/web/checkout?ref=";

/// Which Viva Payments deployment the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
    /// Any other host laid out like the provider (`/api/`, `/web/checkout`),
    /// such as a local mock. A trailing slash on `root` is ignored.
    Custom { root: String },
}

impl Environment {
    pub fn from_production_flag(production: bool) -> Self {
        if production {
            Environment::Production
        } else {
            Environment::Sandbox
        }
    }

    pub fn custom(root: impl Into<String>) -> Self {
        Environment::Custom { root: root.into().trim_end_matches('/').to_string() }
    }

    /// API base URL, always ending in `/`.
    pub fn api_url(&self) -> String {
        match self {
            Environment::Sandbox => SANDBOX_API_URL.to_string(),
            Environment::Production => PRODUCTION_API_URL.to_string(),
            Environment::Custom { root } => format!("{}/api/", root.trim_end_matches('/')),
        }
    }

    /// Checkout redirect prefix; the order code is appended directly.
    pub fn redirect_url(&self) -> String {
        match self {
            Environment::Sandbox => SANDBOX_REDIRECT_URL.to_string(),
            Environment::Production => PRODUCTION_REDIRECT_URL.to_string(),
            Environment::Custom { root } => format!("{}/web/checkout?ref=", root.trim_end_matches('/')),
        }
    }
}

/// Merchant id and API key, sent as HTTP Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    merchant_id: String,
    api_key: String,
}

impl Credentials {
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { merchant_id: merchant_id.into(), api_key: api_key.into() }
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &"***")
            .finish()
    }
}

/// Immutable client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub environment: Environment,
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>, production: bool) -> Self {
        Self {
            environment: Environment::from_production_flag(production),
            credentials: Credentials::new(merchant_id, api_key),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_flag_selects_matching_pair() {
        let sandbox = Environment::from_production_flag(false);
        assert_eq!(sandbox.api_url(), SANDBOX_API_URL);
        assert_eq!(sandbox.redirect_url(), SANDBOX_REDIRECT_URL);

        let production = Environment::from_production_flag(true);
        assert_eq!(production.api_url(), PRODUCTION_API_URL);
        assert_eq!(production.redirect_url(), PRODUCTION_REDIRECT_URL);
    }

    #[test]
    fn sandbox_and_production_redirects_differ() {
        let sandbox = Environment::Sandbox.redirect_url();
        let production = Environment::Production.redirect_url();
        assert!(!sandbox.starts_with(&production));
        assert!(!production.starts_with(&sandbox));
    }

    #[test]
    fn custom_root_derives_both_urls() {
        let env = Environment::custom("http://127.0.0.1:8080/");
        assert_eq!(env.api_url(), "http://127.0.0.1:8080/api/");
        assert_eq!(env.redirect_url(), "http://127.0.0.1:8080/web/checkout?ref=");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig::new("merchant-1", "s3cret", false);
        let rendered = format!("{config:?}");
        assert!(rendered.contains("merchant-1"));
        assert!(!rendered.contains("s3cret"));
    }
}
