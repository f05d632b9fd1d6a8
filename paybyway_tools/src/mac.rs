//! Authcode (MAC) calculation and verification.
//!
//! Every request to the gateway, and every return the gateway sends back, carries an `authcode`: the upper-case hex
//! HMAC-SHA256 of a short signing string, keyed with the merchant's private key. The signing string is a fixed,
//! operation-specific list of fields joined with `|`. There is no escaping, so field values must not contain `|`
//! in a way that makes two different field lists produce the same string. That is a property of the gateway
//! protocol and can't be fixed on this side.
//!
//! | Operation               | Signing string                                                        |
//! |-------------------------|-----------------------------------------------------------------------|
//! | create charge           | `api_key|order_number`                                                |
//! | create charge (`w2`)    | `merchant_id|amount|currency`                                         |
//! | charge card token       | `api_key|order_number|card_token`                                     |
//! | check status            | `api_key|token`                                                       |
//! | capture, cancel         | `api_key|order_number`                                                |
//! | get / delete card token | `api_key|card_token`                                                  |
//! | payment return          | `RETURN_CODE|ORDER_NUMBER[|SETTLED][|CONTACT_ID][|INCIDENT_ID]`       |

use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{PaybywayApiError, ReturnParameters};

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: &str = "|";

/// The fields that go into an authcode, one variant per signing string layout.
#[derive(Debug, Clone, Copy)]
pub enum MacInput<'a> {
    CreateCharge { api_key: &'a str, order_number: &'a str },
    /// `w2` gateways sign a new charge over the amount and currency instead of the order number.
    LegacyCreateCharge { merchant_id: &'a str, amount: &'a str, currency: &'a str },
    ChargeCardToken { api_key: &'a str, order_number: &'a str, card_token: &'a str },
    CheckStatus { api_key: &'a str, token: &'a str },
    Capture { api_key: &'a str, order_number: &'a str },
    Cancel { api_key: &'a str, order_number: &'a str },
    GetCardToken { api_key: &'a str, card_token: &'a str },
    DeleteCardToken { api_key: &'a str, card_token: &'a str },
    Return {
        return_code: &'a str,
        order_number: &'a str,
        settled: Option<&'a str>,
        contact_id: Option<&'a str>,
        incident_id: Option<&'a str>,
    },
}

impl<'a> MacInput<'a> {
    /// The return variant for a set of received parameters. `None` if any of the mandatory fields are missing.
    pub fn for_return(params: &'a ReturnParameters) -> Option<Self> {
        Some(Self::Return {
            return_code: params.return_code.as_deref()?,
            order_number: params.order_number.as_deref()?,
            settled: params.settled.as_deref(),
            contact_id: params.contact_id.as_deref(),
            incident_id: params.incident_id.as_deref(),
        })
    }

    /// The fields in signing order.
    pub fn fields(&self) -> Vec<&'a str> {
        match *self {
            Self::CreateCharge { api_key, order_number } => vec![api_key, order_number],
            Self::LegacyCreateCharge { merchant_id, amount, currency } => vec![merchant_id, amount, currency],
            Self::ChargeCardToken { api_key, order_number, card_token } => vec![api_key, order_number, card_token],
            Self::CheckStatus { api_key, token } => vec![api_key, token],
            Self::Capture { api_key, order_number } | Self::Cancel { api_key, order_number } => {
                vec![api_key, order_number]
            },
            Self::GetCardToken { api_key, card_token } | Self::DeleteCardToken { api_key, card_token } => {
                vec![api_key, card_token]
            },
            Self::Return { return_code, order_number, settled, contact_id, incident_id } => {
                let mut fields = vec![return_code, order_number];
                fields.extend(settled);
                fields.extend(contact_id);
                fields.extend(incident_id);
                fields
            },
        }
    }

    pub fn signing_string(&self) -> String {
        self.fields().join(SEPARATOR)
    }

    pub fn authcode(&self, private_key: &str) -> String {
        calculate_authcode(private_key, &self.signing_string())
    }
}

/// Upper-case hex HMAC-SHA256 of `message`, keyed with `private_key`.
pub fn calculate_authcode(private_key: &str, message: &str) -> String {
    // HMAC accepts keys of any length, so this can't fail
    let mut mac = HmacSha256::new_from_slice(private_key.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Checks a received authcode against the one calculated from `input`.
///
/// The authcode is always upper-case hex, so anything else is rejected before decoding. The digest comparison itself
/// is done by [`Mac::verify_slice`] in constant time.
pub fn authcode_matches(private_key: &str, input: &MacInput<'_>, received: &str) -> bool {
    if !received.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)) {
        return false;
    }
    let Ok(received) = hex::decode(received) else {
        return false;
    };
    // HMAC accepts keys of any length, so this can't fail
    let mut mac = HmacSha256::new_from_slice(private_key.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(input.signing_string().as_bytes());
    mac.verify_slice(&received).is_ok()
}

/// Verifies the authcode on a set of return parameters.
///
/// `RETURN_CODE`, `ORDER_NUMBER` and `AUTHCODE` must all be present. Optional fields are included in the signing
/// string when present, even if empty.
pub fn verify_return_authcode(private_key: &str, params: &ReturnParameters) -> Result<(), PaybywayApiError> {
    let authcode = params
        .authcode
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PaybywayApiError::invalid("checkReturn", "AUTHCODE is missing"))?;
    let input = MacInput::for_return(params)
        .filter(|input| !input.fields().iter().take(2).any(|f| f.is_empty()))
        .ok_or_else(|| PaybywayApiError::invalid("checkReturn", "RETURN_CODE or ORDER_NUMBER is missing"))?;
    if authcode_matches(private_key, &input, authcode) {
        trace!("Authcode for return of order {} is valid", params.order_number.as_deref().unwrap_or_default());
        Ok(())
    } else {
        let order_number = params.order_number.clone().unwrap_or_default();
        warn!("Invalid authcode on return for order {order_number}");
        Err(PaybywayApiError::MacVerificationFailed { order_number })
    }
}
