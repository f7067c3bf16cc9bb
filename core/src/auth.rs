//! HTTP Basic authentication header.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::Credentials;

/// `Basic base64(merchant_id:api_key)`.
pub fn basic_auth_header(credentials: &Credentials) -> String {
    let token = STANDARD.encode(format!("{}:{}", credentials.merchant_id(), credentials.api_key()));
    format!("Basic {token}")
}
