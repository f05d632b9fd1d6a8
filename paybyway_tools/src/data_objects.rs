use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::PaybywayApiError;

/// The outcome of a single gateway exchange.
///
/// `context` is whatever identified the request (the charge, the token, the order number) and is handed back
/// whether or not the exchange succeeded, so callers can correlate failures without keeping their own state.
#[derive(Debug)]
pub struct Exchange<C, T = GatewayResponse> {
    pub context: C,
    pub result: Result<T, PaybywayApiError>,
}

impl<C, T> Exchange<C, T> {
    pub fn new(context: C, result: Result<T, PaybywayApiError>) -> Self {
        Self { context, result }
    }

    pub fn failed(context: C, error: PaybywayApiError) -> Self {
        Self { context, result: Err(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&PaybywayApiError> {
        self.result.as_ref().err()
    }

    pub fn into_parts(self) -> (C, Result<T, PaybywayApiError>) {
        (self.context, self.result)
    }

    pub fn into_result(self) -> Result<T, PaybywayApiError> {
        self.result
    }
}

/// A well-formed gateway reply: a JSON object with a usable top-level `result`.
///
/// The body is kept verbatim. A non-zero `result` is not an error at this level; it is up to the caller to decide
/// what a failure result means for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    result: i64,
    body: Map<String, Value>,
}

impl GatewayResponse {
    pub fn from_body(body: Value) -> Result<Self, PaybywayApiError> {
        let body = match body {
            Value::Object(map) => map,
            other => {
                return Err(PaybywayApiError::MalformedResponse(format!("Expected a JSON object, got {other}")));
            },
        };
        let result = match body.get("result") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| PaybywayApiError::MalformedResponse("Response has no usable 'result' field".to_string()))?;
        Ok(Self { result, body })
    }

    pub fn result(&self) -> i64 {
        self.result
    }

    pub fn is_success(&self) -> bool {
        self.result == 0
    }

    pub fn token(&self) -> Option<String> {
        self.string_field("token")
    }

    pub fn incident_id(&self) -> Option<String> {
        self.string_field("incident_id")
    }

    /// Card metadata, when the gateway sends it.
    pub fn source(&self) -> Option<&Value> {
        self.body.get("source")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_body(self) -> Value {
        Value::Object(self.body)
    }

    pub fn charge_result(&self) -> ChargeResult {
        ChargeResult { result: self.result, token: self.token(), incident_id: self.incident_id() }
    }

    fn string_field(&self, key: &str) -> Option<String> {
        match self.body.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResult {
    pub result: i64,
    pub token: Option<String>,
    pub incident_id: Option<String>,
}

impl ChargeResult {
    pub fn is_success(&self) -> bool {
        self.result == 0
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn well_formed_responses() {
        let res = GatewayResponse::from_body(json!({"result": 0, "token": "123"})).unwrap();
        assert!(res.is_success());
        assert_eq!(res.token().as_deref(), Some("123"));
        assert_eq!(res.charge_result(), ChargeResult { result: 0, token: Some("123".into()), incident_id: None });

        let res = GatewayResponse::from_body(json!({"result": "000"})).unwrap();
        assert!(res.is_success());

        let res = GatewayResponse::from_body(json!({"result": 1, "incident_id": "abcd"})).unwrap();
        assert!(!res.is_success());
        assert_eq!(res.incident_id().as_deref(), Some("abcd"));
        assert_eq!(res.into_body(), json!({"result": 1, "incident_id": "abcd"}));
    }

    #[test]
    fn source_is_passed_through() {
        let body = json!({"result": 0, "source": {"brand": "Visa", "last4": "0024"}});
        let res = GatewayResponse::from_body(body).unwrap();
        assert_eq!(res.source().unwrap()["last4"], "0024");
        assert_eq!(res.get("source").unwrap()["brand"], "Visa");
    }

    #[test]
    fn malformed_responses() {
        for body in [json!({}), json!([1, 2]), json!("0"), json!({"result": null}), json!({"result": "ok"})] {
            let err = GatewayResponse::from_body(body).unwrap_err();
            assert_eq!(err.code(), 1);
        }
    }

    #[test]
    fn exchange_keeps_context() {
        let ex: Exchange<&str> = Exchange::failed("token", PaybywayApiError::CredentialsNotSet);
        assert!(!ex.is_ok());
        assert_eq!(ex.error().map(|e| e.code()), Some(2));
        let (context, result) = ex.into_parts();
        assert_eq!(context, "token");
        assert!(result.is_err());
    }
}
