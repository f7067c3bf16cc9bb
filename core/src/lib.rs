//! Synchronous client for the Viva Payments HTTP API.
//!
//! # Overview
//! Creates and cancels payment orders, fetches transactions, issues
//! recurring charges and refunds, and builds checkout redirect URLs. Every
//! call is a single authenticated round-trip whose JSON answer is decoded
//! into an [`ApiResponse`] with a typed `TimeStamp`.
//!
//! # Design
//! - `VivaClient` holds immutable configuration and a [`Transport`].
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_response` (consumes an `HttpResponse`), so the I/O boundary is
//!   explicit and request shapes are testable without a network.
//! - The response schema is left untyped apart from `TimeStamp`.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod response;
pub mod timestamp;
pub mod transport;

pub use client::VivaClient;
pub use config::{ClientConfig, Credentials, Environment};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{ParamValue, Params};
pub use response::ApiResponse;
pub use transport::{Transport, UreqTransport};
