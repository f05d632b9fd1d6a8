use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// The parameters the gateway attaches to a payment return redirect or a server-to-server notification.
///
/// Nothing in here can be trusted until it has been verified with
/// [`PaybywayApi::verify_return`](crate::PaybywayApi::verify_return).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnParameters {
    #[serde(rename = "RETURN_CODE", default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<String>,
    #[serde(rename = "ORDER_NUMBER", default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(rename = "AUTHCODE", default, skip_serializing_if = "Option::is_none")]
    pub authcode: Option<String>,
    #[serde(rename = "SETTLED", default, skip_serializing_if = "Option::is_none")]
    pub settled: Option<String>,
    #[serde(rename = "CONTACT_ID", default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(rename = "INCIDENT_ID", default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
}

impl ReturnParameters {
    /// Collects the known keys from a set of key-value pairs. Unknown keys are ignored and later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "RETURN_CODE" => &mut params.return_code,
                "ORDER_NUMBER" => &mut params.order_number,
                "AUTHCODE" => &mut params.authcode,
                "SETTLED" => &mut params.settled,
                "CONTACT_ID" => &mut params.contact_id,
                "INCIDENT_ID" => &mut params.incident_id,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    /// Parses a return url query string, e.g. `RETURN_CODE=0&ORDER_NUMBER=123&AUTHCODE=...`. A leading `?` is
    /// allowed.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())))
    }

    /// `None` if the return code is missing or not a number.
    pub fn return_code(&self) -> Option<ReturnCode> {
        self.return_code.as_deref().and_then(|c| c.trim().parse::<i64>().ok()).map(ReturnCode::from)
    }
}

/// Classifies the numeric return code. Turning these into messages for a shopper is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Success,
    Failed,
    StatusPending,
    Maintenance,
    Unknown(i64),
}

impl From<i64> for ReturnCode {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Failed,
            4 => Self::StatusPending,
            10 => Self::Maintenance,
            other => Self::Unknown(other),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_query_string() {
        let query = "?RETURN_CODE=0&ORDER_NUMBER=order%201&AUTHCODE=ABC&SETTLED=1&foo=bar";
        let params = ReturnParameters::from_query(query);
        assert_eq!(params.return_code.as_deref(), Some("0"));
        assert_eq!(params.order_number.as_deref(), Some("order 1"));
        assert_eq!(params.authcode.as_deref(), Some("ABC"));
        assert_eq!(params.settled.as_deref(), Some("1"));
        assert_eq!(params.contact_id, None);
        assert_eq!(params.incident_id, None);
        assert_eq!(params.return_code(), Some(ReturnCode::Success));
    }

    #[test]
    fn deserialize_wire_keys() {
        let json = r#"{"RETURN_CODE":"1","ORDER_NUMBER":"123","AUTHCODE":"X","INCIDENT_ID":"inc"}"#;
        let params: ReturnParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.incident_id.as_deref(), Some("inc"));
        assert_eq!(params.return_code(), Some(ReturnCode::Failed));
    }

    #[test]
    fn return_codes() {
        assert_eq!(ReturnCode::from(4), ReturnCode::StatusPending);
        assert_eq!(ReturnCode::from(10), ReturnCode::Maintenance);
        assert_eq!(ReturnCode::from(7), ReturnCode::Unknown(7));
        let params = ReturnParameters { return_code: Some("x".into()), ..Default::default() };
        assert_eq!(params.return_code(), None);
    }
}
