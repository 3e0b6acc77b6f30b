//! Exchange REST API Adapter
//!
//! Implements the `ExchangeClient` port over the venue's betting REST
//! API. Handles session authentication, order placement, cancellation,
//! order queries and market cash-out.
//!
//! Sub-modules:
//! - `auth`: App-key and session-token credentials from the environment
//! - `client`: HTTP client with concurrency limiting and retries
//! - `exchange`: `ExchangeClient` port implementation
//! - `types`: API request/response type definitions

pub mod auth;
pub mod client;
pub mod exchange;
pub mod types;

pub use auth::ExchangeAuth;
pub use client::{RestClient, RestClientConfig};
pub use exchange::RestExchangeClient;
