use log::*;
use pbw_common::{helpers::parse_boolean_flag, Secret};

use crate::endpoints::{EndpointMap, DEFAULT_HOST, DEFAULT_PORT};

pub const DEFAULT_API_VERSION: &str = "w3.1";

/// The protocol generation, sent as `version` with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(String);

/// The wire key that carries the API identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierField {
    ApiKey,
    MerchantId,
}

impl IdentifierField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::MerchantId => "merchant_id",
        }
    }
}

impl ApiVersion {
    pub fn new(version: &str) -> Self {
        Self(version.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `w2` generation gateways, which use older field names and a different create-charge signature.
    pub fn is_legacy(&self) -> bool {
        self.0.starts_with("w2")
    }

    /// `w2` generation gateways identify the merchant with `merchant_id`. Everything newer uses `api_key`.
    pub fn identifier_field(&self) -> IdentifierField {
        if self.is_legacy() {
            IdentifierField::MerchantId
        } else {
            IdentifierField::ApiKey
        }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub private_key: Secret<String>,
    pub api_version: ApiVersion,
}

impl Credentials {
    pub fn new(api_key: &str, private_key: &str) -> Self {
        Self { api_key: api_key.to_string(), private_key: Secret::new(private_key.to_string()), ..Default::default() }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.private_key.is_blank()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaybywayConfig {
    pub credentials: Credentials,
    pub endpoints: EndpointMap,
}

impl PaybywayConfig {
    pub fn new(api_key: &str, private_key: &str) -> Self {
        Self { credentials: Credentials::new(api_key, private_key), endpoints: EndpointMap::default() }
    }

    pub fn with_endpoints(mut self, endpoints: EndpointMap) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_api_version(mut self, version: &str) -> Self {
        self.credentials.api_version = ApiVersion::new(version);
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let api_key = std::env::var("PBW_API_KEY").unwrap_or_else(|_| {
            warn!("PBW_API_KEY not set. All gateway calls will fail until an API key is provided");
            String::default()
        });
        let private_key = Secret::new(std::env::var("PBW_PRIVATE_KEY").unwrap_or_else(|_| {
            warn!("PBW_PRIVATE_KEY not set. All gateway calls will fail until a private key is provided");
            String::default()
        }));
        let api_version = std::env::var("PBW_API_VERSION").unwrap_or_else(|_| {
            debug!("PBW_API_VERSION not set, using {DEFAULT_API_VERSION} as default");
            DEFAULT_API_VERSION.to_string()
        });
        let host = std::env::var("PBW_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("PBW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("{s} is not a valid port for PBW_PORT. {e} Using the default, {DEFAULT_PORT}, instead.");
                    DEFAULT_PORT
                })
            })
            .unwrap_or(DEFAULT_PORT);
        let use_tls = parse_boolean_flag(std::env::var("PBW_USE_TLS").ok(), true);
        if !use_tls {
            warn!("PBW_USE_TLS is disabled. Gateway requests will be sent in plain text");
        }
        let credentials = Credentials { api_key, private_key, api_version: ApiVersion::new(&api_version) };
        Self { credentials, endpoints: EndpointMap::new(&host, port, use_tls) }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::endpoints::Operation;

    #[test]
    fn identifier_field_follows_protocol_generation() {
        assert_eq!(ApiVersion::default().identifier_field(), IdentifierField::ApiKey);
        assert_eq!(ApiVersion::new("w3").identifier_field(), IdentifierField::ApiKey);
        assert_eq!(ApiVersion::new("w2").identifier_field(), IdentifierField::MerchantId);
        assert_eq!(IdentifierField::MerchantId.as_str(), "merchant_id");
        assert!(ApiVersion::new("w2.1").is_legacy());
        assert!(!ApiVersion::default().is_legacy());
    }

    #[test]
    fn credentials_must_be_non_empty() {
        assert!(!Credentials::default().is_configured());
        assert!(!Credentials::new("api key", "").is_configured());
        assert!(!Credentials::new("", "private key").is_configured());
        assert!(Credentials::new("api key", "private key").is_configured());
    }

    #[test]
    fn builder() {
        let config = PaybywayConfig::new("k", "p")
            .with_api_version("w2")
            .with_endpoints(EndpointMap::new("localhost", 8080, false));
        assert_eq!(config.credentials.api_version.as_str(), "w2");
        assert_eq!(config.endpoints.get(Operation::CreateCharge).url(), "http://localhost:8080/pbwapi/auth_payment");
        assert_eq!(format!("{:?}", config.credentials.private_key), "****");
    }

    const ENV_VARS: [&str; 6] =
        ["PBW_API_KEY", "PBW_PRIVATE_KEY", "PBW_API_VERSION", "PBW_HOST", "PBW_PORT", "PBW_USE_TLS"];

    // All env handling lives in one test so that parallel tests never see each other's variables
    #[test]
    fn configuration_from_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        let config = PaybywayConfig::new_from_env_or_default();
        assert!(!config.credentials.is_configured());
        assert_eq!(config.credentials.api_version.as_str(), DEFAULT_API_VERSION);
        let url = config.endpoints.get(Operation::CheckStatus).url();
        assert_eq!(url, "https://www.paybyway.com:443/pbwapi/check_payment_status");

        std::env::set_var("PBW_API_KEY", "api_key_1");
        std::env::set_var("PBW_PRIVATE_KEY", "private_key");
        std::env::set_var("PBW_API_VERSION", "w2");
        std::env::set_var("PBW_HOST", "localhost");
        std::env::set_var("PBW_PORT", "8080");
        std::env::set_var("PBW_USE_TLS", "false");
        let config = PaybywayConfig::new_from_env_or_default();
        assert!(config.credentials.is_configured());
        assert_eq!(config.credentials.api_key, "api_key_1");
        assert_eq!(config.credentials.private_key.reveal(), "private_key");
        assert_eq!(config.credentials.api_version.identifier_field(), IdentifierField::MerchantId);
        let url = config.endpoints.get(Operation::CheckStatus).url();
        assert_eq!(url, "http://localhost:8080/pbwapi/check_payment_status");

        std::env::set_var("PBW_PORT", "not-a-port");
        std::env::set_var("PBW_USE_TLS", "yes");
        let config = PaybywayConfig::new_from_env_or_default();
        let url = config.endpoints.get(Operation::CheckStatus).url();
        assert_eq!(url, "https://localhost:443/pbwapi/check_payment_status");

        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }
}
