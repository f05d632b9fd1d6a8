//! Paybyway gateway client
//!
//! Signs and sends payment requests to the Paybyway card payment API, and verifies the return and notification
//! parameters the gateway sends back to the merchant.
//!
//! * [`PaybywayApi`] holds the credentials and performs the operations (create charge, charge a stored card, status
//!   check, capture, cancel, card token lookup and removal, return verification).
//! * [`mod@mac`] builds the `|`-separated signing strings and the HMAC-SHA256 authcodes, independently of any HTTP
//!   concerns.
//! * Every operation resolves to an [`Exchange`], which carries the caller's request context back together with the
//!   result. Errors carry a stable numeric code (see [`ErrorKind`]).
mod api;
mod charge;
mod config;
mod data_objects;
mod endpoints;
mod error;
pub mod mac;
mod return_params;

pub use api::PaybywayApi;
pub use charge::{CardTokenCharge, ChargeRequest, Customer, PaymentMethod, ProductLine};
pub use config::{ApiVersion, Credentials, IdentifierField, PaybywayConfig, DEFAULT_API_VERSION};
pub use data_objects::{ChargeResult, Exchange, GatewayResponse};
pub use endpoints::{EndpointMap, Operation, RequestOptions, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{ErrorKind, PaybywayApiError};
pub use return_params::{ReturnCode, ReturnParameters};
