//! Transport used by the replay binary: logs each request instead of sending it.

use async_trait::async_trait;
use serde_json::Value;

use beacon_core::AppResult;
use beacon_core::traits::{RequestOptions, Transport};
use beacon_core::types::Payload;

/// Writes every payload to the log and resolves without a response.
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send_request(
        &self,
        payload: &Payload,
        options: RequestOptions,
    ) -> AppResult<Option<Value>> {
        let body = serde_json::to_string(&payload.to_json())?;
        tracing::info!(
            events = payload.event_count(),
            expects_response = options.expects_response,
            document_unloading = options.document_unloading,
            use_id_third_party_domain = options.use_id_third_party_domain,
            body = %body,
            "Request"
        );
        Ok(None)
    }
}
