//! Transport abstraction for Bot API calls.
//!
//! [`Transport`] is HTTP-agnostic; `rbot_rubika::HttpTransport` implements it with reqwest, and tests
//! substitute scripted implementations.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

/// Performs one authenticated Bot API call and returns the response payload.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Calls `method` with a JSON `body`. On success returns the unwrapped `data` object.
    async fn call(&self, method: &str, body: Value) -> Result<Value, TransportError>;
}
