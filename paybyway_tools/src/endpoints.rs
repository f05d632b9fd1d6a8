use std::{collections::HashMap, fmt::Display};

use reqwest::Method;
use url::Url;

use crate::PaybywayApiError;

pub const DEFAULT_HOST: &str = "www.paybyway.com";
pub const DEFAULT_PORT: u16 = 443;

/// Every request the client can send to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateCharge,
    ChargeCardToken,
    CheckStatus,
    Capture,
    Cancel,
    GetCardToken,
    DeleteCardToken,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::CreateCharge,
        Self::ChargeCardToken,
        Self::CheckStatus,
        Self::Capture,
        Self::Cancel,
        Self::GetCardToken,
        Self::DeleteCardToken,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::CreateCharge => "/pbwapi/auth_payment",
            Self::ChargeCardToken => "/pbwapi/charge_card_token",
            Self::CheckStatus => "/pbwapi/check_payment_status",
            Self::Capture => "/pbwapi/capture",
            Self::Cancel => "/pbwapi/cancel",
            Self::GetCardToken => "/pbwapi/get_card_token",
            Self::DeleteCardToken => "/pbwapi/delete_card_token",
        }
    }

    /// The name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCharge => "createCharge",
            Self::ChargeCardToken => "chargeCardToken",
            Self::CheckStatus => "checkStatus",
            Self::Capture => "capture",
            Self::Cancel => "cancel",
            Self::GetCardToken => "getCardToken",
            Self::DeleteCardToken => "deleteCardToken",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where and how a single operation is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub host: String,
    pub path: String,
    pub port: u16,
    pub method: Method,
    pub use_tls: bool,
}

impl RequestOptions {
    pub fn new(host: &str, path: &str, port: u16, use_tls: bool) -> Self {
        Self { host: host.to_string(), path: path.to_string(), port, method: Method::POST, use_tls }
    }

    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Maps each [`Operation`] to its endpoint. Built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct EndpointMap {
    endpoints: HashMap<Operation, RequestOptions>,
}

impl Default for EndpointMap {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, true)
    }
}

impl EndpointMap {
    /// All operations on the same host, using the standard gateway paths.
    pub fn new(host: &str, port: u16, use_tls: bool) -> Self {
        let endpoints =
            Operation::ALL.iter().map(|op| (*op, RequestOptions::new(host, op.path(), port, use_tls))).collect();
        Self { endpoints }
    }

    /// Build the map from a base url such as `http://127.0.0.1:1234`. Any path in the url is ignored.
    pub fn from_base_url(base: &str) -> Result<Self, PaybywayApiError> {
        let url = Url::parse(base).map_err(|e| PaybywayApiError::invalid("endpoints", format!("{base}: {e}")))?;
        let use_tls = match url.scheme() {
            "https" => true,
            "http" => false,
            s => return Err(PaybywayApiError::invalid("endpoints", format!("Unsupported scheme '{s}'"))),
        };
        let host = url.host_str().ok_or_else(|| PaybywayApiError::invalid("endpoints", "Base url has no host"))?;
        let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);
        Ok(Self::new(host, port, use_tls))
    }

    /// Replace the endpoint for a single operation.
    pub fn with_override(mut self, operation: Operation, options: RequestOptions) -> Self {
        self.endpoints.insert(operation, options);
        self
    }

    pub fn get(&self, operation: Operation) -> &RequestOptions {
        // `new` fills every operation and `with_override` can only replace entries
        &self.endpoints[&operation]
    }
}
