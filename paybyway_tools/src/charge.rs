use serde::{Deserialize, Serialize, Serializer};

use crate::PaybywayApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentMethod {
    #[serde(rename = "card")]
    Card {
        #[serde(serialize_with = "bool_as_int", deserialize_with = "int_as_bool", default)]
        register_card_token: bool,
    },
    #[serde(rename = "e-payment")]
    EPayment {
        return_url: String,
        notify_url: String,
        lang: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        selected: Option<Vec<String>>,
    },
}

impl PaymentMethod {
    pub fn card() -> Self {
        Self::Card { register_card_token: false }
    }

    pub fn card_with_token_registration() -> Self {
        Self::Card { register_card_token: true }
    }

    pub fn e_payment(return_url: &str, notify_url: &str, lang: &str) -> Self {
        Self::EPayment {
            return_url: return_url.to_string(),
            notify_url: notify_url.to_string(),
            lang: lang.to_string(),
            selected: None,
        }
    }

    /// Restrict the e-payment page to the given methods. Has no effect on card payments.
    pub fn with_selected(self, methods: &[&str]) -> Self {
        match self {
            Self::EPayment { return_url, notify_url, lang, .. } => Self::EPayment {
                return_url,
                notify_url,
                lang,
                selected: Some(methods.iter().map(|m| m.to_string()).collect()),
            },
            card => card,
        }
    }

    fn validate(&self, operation: &'static str) -> Result<(), PaybywayApiError> {
        match self {
            Self::Card { .. } => Ok(()),
            Self::EPayment { return_url, notify_url, lang, .. } => {
                if return_url.trim().is_empty() {
                    return Err(PaybywayApiError::invalid(operation, "e-payment return_url is missing"));
                }
                if notify_url.trim().is_empty() {
                    return Err(PaybywayApiError::invalid(operation, "e-payment notify_url is missing"));
                }
                if lang.trim().is_empty() {
                    return Err(PaybywayApiError::invalid(operation, "e-payment lang is missing"));
                }
                Ok(())
            },
        }
    }
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// The flag goes out as `0`/`1`, but a plain JSON boolean is accepted coming back in.
fn int_as_bool<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(v) => v != 0,
    })
}

/// Optional customer details. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_zip: Option<String>,
}

/// A line item. The gateway requires the product prices to add up to the charge amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub id: String,
    pub title: String,
    pub count: u32,
    pub pretax_price: u64,
    pub tax: u32,
    pub price: u64,
    #[serde(rename = "type")]
    pub product_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub order_number: String,
    /// In minor currency units
    pub amount: u64,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub products: Option<Vec<ProductLine>>,
}

impl ChargeRequest {
    pub fn new(order_number: &str, amount: u64, currency: &str, payment_method: PaymentMethod) -> Self {
        Self {
            order_number: order_number.to_string(),
            amount,
            currency: currency.to_string(),
            payment_method: Some(payment_method),
            customer: None,
            products: None,
        }
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_products(mut self, products: Vec<ProductLine>) -> Self {
        self.products = Some(products);
        self
    }

    /// Local checks only. Whether the product prices add up to `amount` is left to the gateway.
    pub fn validate(&self, operation: &'static str) -> Result<(), PaybywayApiError> {
        validate_order(operation, &self.order_number, self.amount, &self.currency, self.products.as_deref())?;
        match &self.payment_method {
            Some(method) => method.validate(operation),
            None => Err(PaybywayApiError::invalid(operation, "payment method is missing")),
        }
    }
}

/// A charge against a card stored earlier with a card token. No payment method is involved: the card token stands
/// in for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTokenCharge {
    pub order_number: String,
    /// In minor currency units
    pub amount: u64,
    pub currency: String,
    pub card_token: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub products: Option<Vec<ProductLine>>,
}

impl CardTokenCharge {
    pub fn new(order_number: &str, amount: u64, currency: &str, card_token: &str) -> Self {
        Self {
            order_number: order_number.to_string(),
            amount,
            currency: currency.to_string(),
            card_token: card_token.to_string(),
            customer: None,
            products: None,
        }
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_products(mut self, products: Vec<ProductLine>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn validate(&self, operation: &'static str) -> Result<(), PaybywayApiError> {
        validate_order(operation, &self.order_number, self.amount, &self.currency, self.products.as_deref())?;
        if self.card_token.trim().is_empty() {
            return Err(PaybywayApiError::invalid(operation, "card token is missing"));
        }
        Ok(())
    }
}

fn validate_order(
    operation: &'static str,
    order_number: &str,
    amount: u64,
    currency: &str,
    products: Option<&[ProductLine]>,
) -> Result<(), PaybywayApiError> {
    if order_number.trim().is_empty() {
        return Err(PaybywayApiError::invalid(operation, "order number is missing"));
    }
    if amount == 0 {
        return Err(PaybywayApiError::invalid(operation, "amount is missing"));
    }
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PaybywayApiError::invalid(operation, format!("'{currency}' is not a currency code")));
    }
    for p in products.unwrap_or_default() {
        if p.id.trim().is_empty() || p.title.trim().is_empty() || p.count == 0 {
            return Err(PaybywayApiError::invalid(
                operation,
                format!("product '{}' requires an id, title and a non-zero count", p.id),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn product(id: &str, price: u64) -> ProductLine {
        ProductLine {
            id: id.to_string(),
            title: "title".to_string(),
            count: 1,
            pretax_price: price,
            tax: 0,
            price,
            product_type: 1,
        }
    }

    #[test]
    fn payment_method_wire_format() {
        let card = serde_json::to_value(PaymentMethod::card_with_token_registration()).unwrap();
        assert_eq!(card, json!({"type": "card", "register_card_token": 1}));
        let method =
            PaymentMethod::e_payment("https://shop/return", "https://shop/notify", "fi").with_selected(&["nordea"]);
        let value = serde_json::to_value(method).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "e-payment",
                "return_url": "https://shop/return",
                "notify_url": "https://shop/notify",
                "lang": "fi",
                "selected": ["nordea"]
            })
        );
        let parsed: PaymentMethod = serde_json::from_value(json!({"type": "card"})).unwrap();
        assert_eq!(parsed, PaymentMethod::card());
    }

    #[test]
    fn register_card_token_accepts_bools_and_ints() {
        for (flag, expected) in [(json!(true), true), (json!(false), false), (json!(1), true), (json!(0), false)] {
            let parsed: PaymentMethod =
                serde_json::from_value(json!({"type": "card", "register_card_token": flag})).unwrap();
            assert_eq!(parsed, PaymentMethod::Card { register_card_token: expected });
            assert_eq!(serde_json::to_value(&parsed).unwrap()["register_card_token"], u8::from(expected));
        }
        let parsed = serde_json::from_value::<PaymentMethod>(json!({"type": "card", "register_card_token": "yes"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn product_type_is_renamed() {
        let value = serde_json::to_value(product("1", 123)).unwrap();
        assert_eq!(value["type"], 1);
        assert_eq!(value["pretax_price"], 123);
    }

    #[test]
    fn validation() {
        let charge = ChargeRequest::new("order1", 100, "EUR", PaymentMethod::card());
        assert!(charge.validate("createCharge").is_ok());

        let mut c = charge.clone();
        c.order_number = String::new();
        assert_eq!(c.validate("createCharge").unwrap_err().code(), 3);

        let mut c = charge.clone();
        c.amount = 0;
        assert!(c.validate("createCharge").unwrap_err().to_string().contains("amount"));

        let mut c = charge.clone();
        c.currency = "EURO".to_string();
        assert_eq!(c.validate("createCharge").unwrap_err().code(), 3);

        let mut c = charge.clone();
        c.payment_method = None;
        assert!(c.validate("createCharge").unwrap_err().to_string().contains("payment method"));

        let c = ChargeRequest::new("order1", 100, "EUR", PaymentMethod::e_payment("", "n", "fi"));
        assert!(c.validate("createCharge").is_err());

        let mut p = product("", 100);
        p.id = String::new();
        let c = charge.clone().with_products(vec![p]);
        assert!(c.validate("createCharge").is_err());

        let c = charge.with_products(vec![product("a", 50), product("b", 50)]);
        assert!(c.validate("createCharge").is_ok());
    }

    #[test]
    fn card_token_charge_validation() {
        let charge = CardTokenCharge::new("order1", 100, "EUR", "card-123");
        assert!(charge.validate("chargeCardToken").is_ok());
        let mut c = charge.clone();
        c.card_token = " ".to_string();
        let err = c.validate("chargeCardToken").unwrap_err();
        assert_eq!(err.code(), 3);
        assert!(err.to_string().contains("card token"));
        let c = CardTokenCharge::new("order1", 0, "EUR", "card-123");
        assert!(c.validate("chargeCardToken").is_err());
    }
}
