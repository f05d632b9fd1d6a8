use std::sync::Arc;

use log::*;
use pbw_common::{helpers::percent_encode, Secret};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde_json::{json, Map, Value};

use crate::{
    charge::{CardTokenCharge, ChargeRequest},
    config::{ApiVersion, PaybywayConfig},
    data_objects::{Exchange, GatewayResponse},
    endpoints::Operation,
    mac::{verify_return_authcode, MacInput},
    PaybywayApiError,
    ReturnParameters,
};

/// Client for the Paybyway payment API.
///
/// Every gateway operation validates its input locally first and makes no network call if that fails. Otherwise it
/// sends exactly one signed POST request. Nothing is retried.
///
/// The client only holds its configuration and an HTTP connection pool, so any number of operations may be in flight
/// at once. The credential setters need `&mut self` and so cannot run while requests are outstanding.
#[derive(Clone)]
pub struct PaybywayApi {
    config: PaybywayConfig,
    client: Arc<Client>,
}

impl PaybywayApi {
    pub fn new(config: PaybywayConfig) -> Result<Self, PaybywayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        // The gateway expects a JSON body, but labelled as a form post
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PaybywayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaybywayConfig {
        &self.config
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        self.config.credentials.api_key = api_key.to_string();
    }

    pub fn set_private_key(&mut self, private_key: &str) {
        self.config.credentials.private_key = Secret::new(private_key.to_string());
    }

    pub fn set_api_version(&mut self, version: &str) {
        self.config.credentials.api_version = ApiVersion::new(version);
    }

    fn api_key(&self) -> &str {
        &self.config.credentials.api_key
    }

    fn private_key(&self) -> &str {
        self.config.credentials.private_key.reveal()
    }

    fn check_credentials(&self) -> Result<(), PaybywayApiError> {
        if self.config.credentials.is_configured() {
            Ok(())
        } else {
            warn!("Gateway call attempted without an API key and private key");
            Err(PaybywayApiError::CredentialsNotSet)
        }
    }

    /// The fields every request carries: the protocol version and the API identifier under the key the configured
    /// protocol generation expects.
    fn base_payload(&self, encode: bool) -> Map<String, Value> {
        let version = &self.config.credentials.api_version;
        let field = version.identifier_field();
        let mut payload = Map::new();
        if encode {
            payload.insert("version".into(), json!(percent_encode(version.as_str())));
            payload.insert(field.as_str().into(), json!(percent_encode(self.api_key())));
        } else {
            payload.insert("version".into(), json!(version.as_str()));
            payload.insert(field.as_str().into(), json!(self.api_key()));
        }
        payload
    }

    /// Sends `payload` to the endpoint for `operation` and normalises the outcome. `context` is handed back
    /// untouched.
    ///
    /// * A transport failure or a body that is not JSON gives a protocol error (code 4).
    /// * JSON without a usable top-level `result` gives a malformed response error (code 1).
    /// * Anything else is returned as a [`GatewayResponse`], whatever its `result` value.
    pub async fn post_to_gateway<C>(&self, operation: Operation, payload: Value, context: C) -> Exchange<C> {
        let result = self.send(operation, &payload).await;
        match &result {
            Ok(res) => info!("{operation} completed with result {}", res.result()),
            Err(e) => warn!("{operation} failed. {e}"),
        }
        Exchange::new(context, result)
    }

    async fn send(&self, operation: Operation, payload: &Value) -> Result<GatewayResponse, PaybywayApiError> {
        let options = self.config.endpoints.get(operation);
        let url = options.url();
        let body = serde_json::to_string(payload).map_err(|e| PaybywayApiError::JsonError(e.to_string()))?;
        trace!("Sending {operation} request to {url}: {body}");
        let response = self
            .client
            .request(options.method.clone(), url)
            .body(body)
            .send()
            .await
            .map_err(|e| PaybywayApiError::TransportError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("Gateway replied to {operation} with HTTP status {status}");
        }
        let text = response.text().await.map_err(|e| PaybywayApiError::TransportError(e.to_string()))?;
        trace!("{operation} response ({status}): {text}");
        let value = serde_json::from_str::<Value>(&text).map_err(|e| PaybywayApiError::JsonError(e.to_string()))?;
        GatewayResponse::from_body(value)
    }

    /// Starts a payment. On success the gateway's reply carries the payment `token`; a failed charge carries an
    /// `incident_id` instead. The charge request is handed back as the exchange context.
    pub async fn create_charge(&self, charge: ChargeRequest) -> Exchange<ChargeRequest> {
        let operation = Operation::CreateCharge;
        debug!("Creating charge for order {}", charge.order_number);
        if let Err(e) = self.check_credentials().and_then(|_| charge.validate(operation.name())) {
            return Exchange::failed(charge, e);
        }
        let authcode = if self.config.credentials.api_version.is_legacy() {
            let amount = charge.amount.to_string();
            MacInput::LegacyCreateCharge { merchant_id: self.api_key(), amount: &amount, currency: &charge.currency }
                .authcode(self.private_key())
        } else {
            MacInput::CreateCharge { api_key: self.api_key(), order_number: &charge.order_number }
                .authcode(self.private_key())
        };
        let mut payload = self.base_payload(false);
        payload.insert("order_number".into(), json!(charge.order_number));
        payload.insert("amount".into(), json!(charge.amount));
        payload.insert("currency".into(), json!(charge.currency));
        payload.insert("payment_method".into(), json!(charge.payment_method));
        if let Some(customer) = &charge.customer {
            payload.insert("customer".into(), json!(customer));
        }
        if let Some(products) = &charge.products {
            payload.insert("products".into(), json!(products));
        }
        payload.insert("authcode".into(), json!(authcode));
        self.post_to_gateway(operation, Value::Object(payload), charge).await
    }

    /// Charges a card that was registered earlier, identified by its card token.
    pub async fn charge_card_token(&self, charge: CardTokenCharge) -> Exchange<CardTokenCharge> {
        let operation = Operation::ChargeCardToken;
        debug!("Charging card token for order {}", charge.order_number);
        if let Err(e) = self.check_credentials().and_then(|_| charge.validate(operation.name())) {
            return Exchange::failed(charge, e);
        }
        let authcode = MacInput::ChargeCardToken {
            api_key: self.api_key(),
            order_number: &charge.order_number,
            card_token: &charge.card_token,
        }
        .authcode(self.private_key());
        let mut payload = self.base_payload(false);
        payload.insert("order_number".into(), json!(charge.order_number));
        payload.insert("amount".into(), json!(charge.amount));
        payload.insert("currency".into(), json!(charge.currency));
        payload.insert("card_token".into(), json!(charge.card_token));
        if let Some(customer) = &charge.customer {
            payload.insert("customer".into(), json!(customer));
        }
        if let Some(products) = &charge.products {
            payload.insert("products".into(), json!(products));
        }
        payload.insert("authcode".into(), json!(authcode));
        self.post_to_gateway(operation, Value::Object(payload), charge).await
    }

    /// Looks up the state of the payment identified by `token` (as returned by [`Self::create_charge`]).
    pub async fn check_status(&self, token: &str) -> Exchange<String> {
        let operation = Operation::CheckStatus;
        debug!("Checking payment status for token {token}");
        let input = MacInput::CheckStatus { api_key: self.api_key(), token };
        self.token_request(operation, "token", token, input).await
    }

    /// Settles a previously authorised payment.
    pub async fn capture(&self, order_number: &str) -> Exchange<String> {
        let operation = Operation::Capture;
        debug!("Capturing payment for order {order_number}");
        let input = MacInput::Capture { api_key: self.api_key(), order_number };
        self.token_request(operation, "order_number", order_number, input).await
    }

    /// Cancels a previously authorised payment.
    pub async fn cancel(&self, order_number: &str) -> Exchange<String> {
        let operation = Operation::Cancel;
        debug!("Cancelling payment for order {order_number}");
        let input = MacInput::Cancel { api_key: self.api_key(), order_number };
        self.token_request(operation, "order_number", order_number, input).await
    }

    /// Fetches the card details (in `source`) behind a card token.
    pub async fn get_card_token(&self, card_token: &str) -> Exchange<String> {
        let operation = Operation::GetCardToken;
        debug!("Fetching card token {card_token}");
        let input = MacInput::GetCardToken { api_key: self.api_key(), card_token };
        self.token_request(operation, "card_token", card_token, input).await
    }

    pub async fn delete_card_token(&self, card_token: &str) -> Exchange<String> {
        let operation = Operation::DeleteCardToken;
        debug!("Deleting card token {card_token}");
        let input = MacInput::DeleteCardToken { api_key: self.api_key(), card_token };
        self.token_request(operation, "card_token", card_token, input).await
    }

    /// The shared shape of the single-identifier operations. The identifier is the exchange context. Wire values are
    /// percent-encoded; the authcode is calculated over the raw values.
    async fn token_request(
        &self,
        operation: Operation,
        key: &str,
        value: &str,
        input: MacInput<'_>,
    ) -> Exchange<String> {
        let context = value.to_string();
        if let Err(e) = self.check_credentials() {
            return Exchange::failed(context, e);
        }
        if value.trim().is_empty() {
            warn!("{operation} called without a {key}");
            return Exchange::failed(context, PaybywayApiError::invalid(operation.name(), format!("{key} is missing")));
        }
        let authcode = input.authcode(self.private_key());
        let mut payload = self.base_payload(true);
        payload.insert(key.into(), json!(percent_encode(value)));
        payload.insert("authcode".into(), json!(authcode));
        self.post_to_gateway(operation, Value::Object(payload), context).await
    }

    /// Checks that return or notification parameters really came from the gateway. No network call is made.
    ///
    /// The parameters are always handed back unmodified, so they can be logged or shown even when verification fails.
    /// A verification failure is never reported as success.
    pub fn verify_return(&self, params: ReturnParameters) -> Exchange<ReturnParameters, ()> {
        if let Err(e) = self.check_credentials() {
            return Exchange::failed(params, e);
        }
        let result = verify_return_authcode(self.private_key(), &params);
        if result.is_ok() {
            debug!("Verified return for order {}", params.order_number.as_deref().unwrap_or_default());
        }
        Exchange::new(params, result)
    }
}
