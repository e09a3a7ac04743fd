//! HTTP adapter for the sheet endpoint.
//!
//! The endpoint is a single URL accepting form-encoded POST bodies. The
//! `action` field selects the operation; mutations answer with a small
//! `{success, id?, error?}` envelope and `getAll` with the full collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use ciboard_core::config::StoreConfig;
use ciboard_core::{Request, RequestId};

use crate::wire::{GetAllResponse, MutationAck, RequestRow};
use crate::{RequestStore, StoreError, StoreSnapshot};

pub struct SheetStore {
    client: Client,
    endpoint: String,
}

impl SheetStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::new(&config.endpoint_url, Duration::from_secs(config.timeout_secs))
    }

    async fn post(&self, action: &str, fields: Vec<(&'static str, String)>) -> Result<String, StoreError> {
        debug!(action, endpoint = %self.endpoint, "posting to sheet endpoint");

        let mut form: Vec<(&'static str, String)> = vec![("action", action.to_string())];
        form.extend(fields);

        let response =
            self.client.post(&self.endpoint).form(&form).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn mutate(
        &self,
        action: &str,
        fields: Vec<(&'static str, String)>,
    ) -> Result<MutationAck, StoreError> {
        let body = self.post(action, fields).await?;
        let ack: MutationAck = serde_json::from_str(&body)
            .map_err(|error| StoreError::Decode(format!("{action} response: {error}")))?;

        if !ack.success {
            let reason = ack.error.unwrap_or_else(|| "store reported failure".to_string());
            return Err(StoreError::Rejected(reason));
        }
        Ok(ack)
    }
}

#[async_trait]
impl RequestStore for SheetStore {
    async fn fetch_all(&self) -> Result<StoreSnapshot, StoreError> {
        let body = self.post("getAll", Vec::new()).await?;
        let envelope: GetAllResponse = serde_json::from_str(&body)
            .map_err(|error| StoreError::Decode(format!("getAll response: {error}")))?;

        let snapshot = envelope.into_snapshot();
        info!(requests = snapshot.requests.len(), "fetched request collection");
        Ok(snapshot)
    }

    async fn add_request(&self, request: &Request) -> Result<RequestId, StoreError> {
        let row = RequestRow::from_request(request);
        let ack = self.mutate("addRequest", row.to_form_fields()).await?;

        // The sheet numbers its own rows; keep the caller's id only when the
        // ack omits one.
        let id = ack.id.filter(|id| !id.is_empty()).unwrap_or_else(|| request.id.0.clone());
        info!(request_id = %id, "request added to store");
        Ok(RequestId(id))
    }

    async fn update_request(&self, request: &Request) -> Result<(), StoreError> {
        let row = RequestRow::from_request(request);
        self.mutate("updateRequest", row.to_form_fields()).await?;
        debug!(request_id = %request.id, "request updated in store");
        Ok(())
    }

    async fn delete_request(&self, id: &RequestId) -> Result<(), StoreError> {
        self.mutate("deleteRequest", vec![("Id", id.0.clone())]).await?;
        info!(request_id = %id, "request deleted from store");
        Ok(())
    }
}
