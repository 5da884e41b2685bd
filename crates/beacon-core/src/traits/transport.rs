//! Network transport abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::AppResult;
use crate::types::payload::Payload;

/// Flags derived for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// The caller needs the response body.
    pub expects_response: bool,
    /// The document is unloading; the transport should use a fire-and-forget channel.
    pub document_unloading: bool,
    /// Route through the third-party identity domain.
    pub use_id_third_party_domain: bool,
}

/// Transport collaborator that owns wire format and delivery.
///
/// Retry policy, if any, belongs to the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Creates a fresh, empty payload for one send.
    fn create_payload(&self) -> Payload {
        Payload::new()
    }

    /// Sends the payload. Resolves with the parsed response, if any.
    async fn send_request(
        &self,
        payload: &Payload,
        options: RequestOptions,
    ) -> AppResult<Option<Value>>;
}
