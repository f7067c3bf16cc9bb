//! In-memory stand-in for the Viva Payments API, used by integration tests
//! and local experiments.
//!
//! Routes mirror the provider under `/api/`. Every request must carry the
//! configured Basic credentials. Successful answers are shaped like the
//! provider's: `ErrorCode`, `ErrorText`, `Success` and a `TimeStamp` with
//! seven fractional digits and a `+03:00` offset.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const FIRST_ORDER_CODE: u64 = 175_936_509_216;

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub merchant_id: String,
    pub api_key: String,
}

impl MockConfig {
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { merchant_id: merchant_id.into(), api_key: api_key.into() }
    }

    fn expected_authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.merchant_id, self.api_key));
        format!("Basic {token}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_code: u64,
    pub amount: u64,
    pub params: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub amount: u64,
    pub refunded: u64,
    pub parent_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub orders: HashMap<u64, Order>,
    pub transactions: HashMap<String, Transaction>,
}

impl Store {
    /// Seeds a settled transaction, as if a customer had paid `amount`.
    pub fn with_transaction(mut self, transaction_id: &str, amount: u64) -> Self {
        let transaction = Transaction {
            transaction_id: transaction_id.to_string(),
            amount,
            refunded: 0,
            parent_id: None,
        };
        self.transactions.insert(transaction_id.to_string(), transaction);
        self
    }
}

#[derive(Clone)]
pub struct MockState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
    next_order_code: Arc<AtomicU64>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        Self::with_store(config, Store::default())
    }

    pub fn with_store(config: MockConfig, store: Store) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
            next_order_code: Arc::new(AtomicU64::new(FIRST_ORDER_CODE)),
        }
    }

    pub fn store(&self) -> Arc<RwLock<Store>> {
        Arc::clone(&self.store)
    }
}

pub fn app(config: MockConfig) -> Router {
    app_with_state(MockState::new(config))
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/{order_code}", delete(cancel_order))
        .route(
            "/api/transactions/{transaction_id}",
            post(create_recurring_transaction)
                .get(get_transaction)
                .delete(cancel_transaction),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// Current time in the provider's format, e.g. `2013-10-01T15:11:41.4391667+03:00`.
pub fn provider_timestamp() -> String {
    let offset = FixedOffset::east_opt(3 * 3600).expect("offset within a day");
    let now = Utc::now().with_timezone(&offset);
    let ticks = now.nanosecond() % 1_000_000_000 / 100;
    format!(
        "{}.{ticks:07}{}",
        now.format("%Y-%m-%dT%H:%M:%S"),
        now.format("%:z")
    )
}

/// Provider-shaped error answer.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "ErrorCode": self.status.as_u16(),
            "ErrorText": self.message,
            "TimeStamp": provider_timestamp(),
            "Success": false,
        });
        (self.status, Json(body)).into_response()
    }
}

fn success(fields: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("ErrorCode".into(), json!(0));
    body.insert("ErrorText".into(), Value::Null);
    body.insert("TimeStamp".into(), json!(provider_timestamp()));
    body.insert("CorrelationId".into(), Value::Null);
    body.insert("EventId".into(), json!(0));
    body.insert("Success".into(), json!(true));
    if let Value::Object(extra) = fields {
        body.extend(extra);
    }
    Json(Value::Object(body))
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Failure> {
    let provided = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if provided == Some(state.config.expected_authorization().as_str()) {
        Ok(())
    } else {
        tracing::debug!("rejected request with bad credentials");
        Err(Failure::new(StatusCode::UNAUTHORIZED, "Authorization has been denied for this request."))
    }
}

fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}

fn parse_amount(raw: Option<&String>) -> Result<Option<u64>, Failure> {
    match raw {
        None => Ok(None),
        Some(s) => match s.parse::<u64>() {
            Ok(amount) if amount > 0 => Ok(Some(amount)),
            _ => Err(Failure::new(StatusCode::BAD_REQUEST, format!("Invalid amount '{s}'"))),
        },
    }
}

async fn create_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers)?;
    let mut params = parse_form(&body);
    let amount = parse_amount(params.get("amount"))?
        .ok_or_else(|| Failure::new(StatusCode::BAD_REQUEST, "Missing amount"))?;
    params.remove("amount");

    let order_code = state.next_order_code.fetch_add(1, Ordering::SeqCst);
    state
        .store
        .write()
        .await
        .orders
        .insert(order_code, Order { order_code, amount, params });
    Ok(success(json!({ "OrderCode": order_code })))
}

async fn cancel_order(
    State(state): State<MockState>,
    Path(order_code): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers)?;
    let removed = state.store.write().await.orders.remove(&order_code);
    match removed {
        Some(order) => Ok(success(json!({ "OrderCode": order.order_code }))),
        None => Err(Failure::new(StatusCode::NOT_FOUND, format!("Order {order_code} not found"))),
    }
}

fn transaction_json(t: &Transaction) -> Value {
    json!({
        "TransactionId": t.transaction_id,
        "Amount": t.amount,
        "RefundedAmount": t.refunded,
        "ParentId": t.parent_id,
        "StatusId": "F",
    })
}

async fn get_transaction(
    State(state): State<MockState>,
    Path(transaction_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers)?;
    let store = state.store.read().await;
    let transaction = store
        .transactions
        .get(&transaction_id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, format!("Transaction {transaction_id} not found")))?;
    Ok(success(json!({ "Transactions": [transaction_json(transaction)] })))
}

async fn create_recurring_transaction(
    State(state): State<MockState>,
    Path(transaction_id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers)?;
    let params = parse_form(&body);
    let mut store = state.store.write().await;
    let parent = store
        .transactions
        .get(&transaction_id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, format!("Transaction {transaction_id} not found")))?;
    let amount = parse_amount(params.get("amount"))?.unwrap_or(parent.amount);

    let child = Transaction {
        transaction_id: Uuid::new_v4().to_string().to_uppercase(),
        amount,
        refunded: 0,
        parent_id: Some(transaction_id),
    };
    let fields = transaction_json(&child);
    store.transactions.insert(child.transaction_id.clone(), child);
    Ok(success(fields))
}

#[derive(Deserialize)]
pub struct CancelQuery {
    pub amount: Option<u64>,
}

async fn cancel_transaction(
    State(state): State<MockState>,
    Path(transaction_id): Path<String>,
    Query(query): Query<CancelQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers)?;
    let amount = query
        .amount
        .filter(|a| *a > 0)
        .ok_or_else(|| Failure::new(StatusCode::BAD_REQUEST, "Missing amount"))?;

    let mut store = state.store.write().await;
    let transaction = store
        .transactions
        .get_mut(&transaction_id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, format!("Transaction {transaction_id} not found")))?;
    let refunded = transaction
        .refunded
        .checked_add(amount)
        .filter(|total| *total <= transaction.amount)
        .ok_or_else(|| Failure::new(StatusCode::BAD_REQUEST, "Amount exceeds the refundable balance"))?;
    transaction.refunded = refunded;
    let refund = Transaction {
        transaction_id: Uuid::new_v4().to_string().to_uppercase(),
        amount,
        refunded: 0,
        parent_id: Some(transaction_id),
    };
    Ok(success(transaction_json(&refund)))
}
