//! Viva Payments API client.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and the shared [`VivaClient::parse_response`], which turns an
//! `HttpResponse` into an [`ApiResponse`]. The high-level operations run the
//! two through the client's [`Transport`]. The client keeps no state between
//! calls beyond its immutable configuration.

use std::fmt::Display;

use tracing::{debug, instrument, warn};

use crate::auth::basic_auth_header;
use crate::config::{ClientConfig, Environment};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::{ParamValue, Params};
use crate::response::ApiResponse;
use crate::transport::{Transport, UreqTransport};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous client for the Viva Payments API.
///
/// ```
/// use viva_core::{Params, VivaClient};
///
/// let client = VivaClient::new("merchant", "key", false);
/// let req = client.build_create_order(100, Params::new().with("RequestLang", "en-US"));
/// assert_eq!(req.url, "http://demo.vivapayments.com/api/orders");
/// assert_eq!(req.body.as_deref(), Some("amount=100&RequestLang=en-US"));
/// ```
#[derive(Debug, Clone)]
pub struct VivaClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl VivaClient<UreqTransport> {
    /// Sandbox unless `production` is set. Does no I/O.
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>, production: bool) -> Self {
        Self::from_config(ClientConfig::new(merchant_id, api_key, production))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T> VivaClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.config.environment
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Checkout page URL for `order_code` in the configured environment.
    pub fn get_redirect_url(&self, order_code: impl Display) -> String {
        format!("{}{order_code}", self.config.environment.redirect_url())
    }

    pub fn build_create_order(&self, amount: impl Into<ParamValue>, extra: Params) -> HttpRequest {
        self.form_request(HttpMethod::Post, "orders", Params::pack("amount", amount, extra))
    }

    pub fn build_cancel_order(&self, order_code: impl Display, extra: Params) -> HttpRequest {
        let code = order_code.to_string();
        let path = format!("orders/{code}");
        self.form_request(HttpMethod::Delete, &path, Params::pack("order_code", code, extra))
    }

    pub fn build_get_transaction(&self, transaction_id: impl Display, extra: Params) -> HttpRequest {
        let id = transaction_id.to_string();
        let path = format!("transactions/{id}");
        self.form_request(HttpMethod::Get, &path, Params::pack("transaction_id", id, extra))
    }

    pub fn build_create_recurring_transaction(&self, transaction_id: impl Display, extra: Params) -> HttpRequest {
        let id = transaction_id.to_string();
        let path = format!("transactions/{id}");
        self.form_request(HttpMethod::Post, &path, Params::pack("transaction_id", id, extra))
    }

    /// The amount travels in the query string; the request has no body.
    pub fn build_cancel_transaction(
        &self,
        transaction_id: impl Display,
        amount: impl Into<ParamValue>,
    ) -> HttpRequest {
        let amount = amount.into();
        HttpRequest {
            method: HttpMethod::Delete,
            url: format!("{}transactions/{transaction_id}?amount={amount}", self.config.environment.api_url()),
            headers: vec![self.authorization()],
            body: None,
        }
    }

    /// Checks for a 2xx status, then decodes the body.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        check_status(&response)?;
        ApiResponse::decode(&response.body)
    }

    fn form_request(&self, method: HttpMethod, path: &str, params: Params) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.config.environment.api_url()),
            headers: vec![
                self.authorization(),
                ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
            ],
            body: Some(params.to_form_body()),
        }
    }

    fn authorization(&self) -> (String, String) {
        ("Authorization".to_string(), basic_auth_header(&self.config.credentials))
    }
}

impl<T: Transport> VivaClient<T> {
    /// Creates a payment order for `amount`, usually whole cents.
    pub fn create_order(&self, amount: impl Into<ParamValue>, extra: Params) -> Result<ApiResponse, ApiError> {
        self.send(self.build_create_order(amount, extra))
    }

    pub fn cancel_order(&self, order_code: impl Display, extra: Params) -> Result<ApiResponse, ApiError> {
        self.send(self.build_cancel_order(order_code, extra))
    }

    pub fn get_transaction(&self, transaction_id: impl Display, extra: Params) -> Result<ApiResponse, ApiError> {
        self.send(self.build_get_transaction(transaction_id, extra))
    }

    /// Charges again using the card details of an earlier transaction.
    pub fn create_recurring_transaction(
        &self,
        transaction_id: impl Display,
        extra: Params,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.build_create_recurring_transaction(transaction_id, extra))
    }

    /// Cancels, or refunds when already cleared, `amount` of a transaction.
    pub fn cancel_transaction(
        &self,
        transaction_id: impl Display,
        amount: impl Into<ParamValue>,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.build_cancel_transaction(transaction_id, amount))
    }

    #[instrument(name = "viva_request", skip_all, fields(method = %request.method, url = %request.url))]
    fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, "response received");
        self.parse_response(response)
    }
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "provider returned an error status");
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    const OK_BODY: &str = r#"{"OrderCode":175936509216,"ErrorCode":0,"ErrorText":null,"TimeStamp":"2013-10-01T15:11:41.4391667+03:00","Success":true}"#;
    const SANDBOX_AUTH: &str = "Basic bWVyY2hhbnQ6a2V5";

    /// Records every request and answers with a fixed response.
    struct Recording {
        status: u16,
        body: String,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Recording {
        fn answering(status: u16, body: &str) -> Self {
            Self { status, body: body.to_string(), seen: RefCell::new(Vec::new()) }
        }

        fn last(&self) -> HttpRequest {
            self.seen.borrow().last().cloned().unwrap()
        }
    }

    impl Transport for Recording {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(HttpResponse { status: self.status, headers: Vec::new(), body: self.body.clone() })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn sandbox<T>(transport: T) -> VivaClient<T> {
        VivaClient::with_transport(ClientConfig::new("merchant", "key", false), transport)
    }

    fn client() -> VivaClient<Recording> {
        sandbox(Recording::answering(200, OK_BODY))
    }

    #[test]
    fn create_order_posts_form_body_to_orders() {
        let client = client();
        let response = client.create_order(100, Params::new().with("RequestLang", "en-US")).unwrap();
        let req = client.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://demo.vivapayments.com/api/orders");
        assert_eq!(req.body.as_deref(), Some("amount=100&RequestLang=en-US"));
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(response.order_code().as_deref(), Some("175936509216"));
    }

    #[test]
    fn amounts_accept_any_numeric_value() {
        let c = client();
        assert_eq!(c.build_create_order(10.5, Params::new()).body.as_deref(), Some("amount=10.5"));
        assert_eq!(c.build_create_order(-3i64, Params::new()).body.as_deref(), Some("amount=-3"));
        assert_eq!(
            c.build_cancel_transaction("ABC-123", 2.25).url,
            "http://demo.vivapayments.com/api/transactions/ABC-123?amount=2.25"
        );
    }

    #[test]
    fn cancel_order_deletes_with_order_code_in_path_and_body() {
        let req = client().build_cancel_order(175936509216u64, Params::new());
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://demo.vivapayments.com/api/orders/175936509216");
        assert_eq!(req.body.as_deref(), Some("order_code=175936509216"));
    }

    #[test]
    fn get_transaction_sends_body_on_get() {
        let req = client().build_get_transaction("ABC-123", Params::new().with("date", "2013-10-01"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://demo.vivapayments.com/api/transactions/ABC-123");
        assert_eq!(req.body.as_deref(), Some("transaction_id=ABC-123&date=2013-10-01"));
    }

    #[test]
    fn recurring_transaction_posts_to_transaction_path() {
        let req = client().build_create_recurring_transaction("ABC-123", Params::new().with("amount", 500));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://demo.vivapayments.com/api/transactions/ABC-123");
        assert_eq!(req.body.as_deref(), Some("transaction_id=ABC-123&amount=500"));
    }

    #[test]
    fn cancel_transaction_inlines_amount_without_body() {
        let client = client();
        client.cancel_transaction("ABC-123", 10).unwrap();
        let req = client.transport().last();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "http://demo.vivapayments.com/api/transactions/ABC-123?amount=10");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn every_operation_carries_the_same_basic_auth() {
        let c = client();
        let requests = [
            c.build_create_order(1, Params::new()),
            c.build_cancel_order("1", Params::new()),
            c.build_get_transaction("t", Params::new()),
            c.build_create_recurring_transaction("t", Params::new()),
            c.build_cancel_transaction("t", 1),
        ];
        for req in &requests {
            assert_eq!(req.header("authorization"), Some(SANDBOX_AUTH), "{}", req.url);
            assert!(!req.body.as_deref().unwrap_or_default().contains("key"));
        }
    }

    #[test]
    fn production_client_targets_production_urls() {
        let c = VivaClient::with_transport(ClientConfig::new("m", "k", true), Unreachable);
        assert_eq!(c.build_create_order(1, Params::new()).url, "https://www.vivapayments.com/api/orders");
        assert_eq!(c.get_redirect_url(42), "https://www.vivapayments.com/web/checkout?ref=42");
    }

    #[test]
    fn redirect_url_is_pure_and_environment_specific() {
        let c = client();
        assert_eq!(c.get_redirect_url("175936509216"), c.get_redirect_url("175936509216"));
        assert_eq!(
            c.get_redirect_url(175936509216u64),
            "http://demo.vivapayments.com/web/checkout?ref=175936509216"
        );
        assert!(c.transport().seen.borrow().is_empty());
    }

    #[test]
    fn non_2xx_surfaces_status_and_raw_body() {
        let body = r#"{"ErrorCode":403,"ErrorText":"Forbidden"}"#;
        let c = sandbox(Recording::answering(403, body));
        let err = c.get_transaction("x", Params::new()).unwrap_err();
        match err {
            ApiError::HttpError { status, body: raw } => {
                assert_eq!(status, 403);
                assert_eq!(raw, body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn transport_failure_is_returned_untranslated() {
        let c = sandbox(Unreachable);
        let err = c.create_order(100, Params::new()).unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref msg) if msg == "connection refused"));
    }

    #[test]
    fn response_without_timestamp_is_an_error() {
        let c = sandbox(Recording::answering(200, r#"{"ErrorCode":0}"#));
        assert!(matches!(c.cancel_order(1, Params::new()), Err(ApiError::MissingTimestamp)));
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let c = sandbox(Recording::answering(200, "<html>oops</html>"));
        assert!(matches!(c.create_order(1, Params::new()), Err(ApiError::DeserializationError(_))));
    }

    #[test]
    fn custom_environment_keeps_urls_paired() {
        let config = ClientConfig::new("m", "k", false).with_environment(Environment::custom("http://localhost:3000/"));
        let c = VivaClient::with_transport(config, Unreachable);
        assert_eq!(c.build_create_order(1, Params::new()).url, "http://localhost:3000/api/orders");
        assert_eq!(c.get_redirect_url("7"), "http://localhost:3000/web/checkout?ref=7");
    }
}
