//! Traits for the webhook subsystem.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;
use crate::webhooks::webhooks_model::{
    LegacyWebhookConfig, NewWebhookDestination, PipelineChangeEvent, WebhookDestination,
    WebhookDestinationUpdate, WebhookEventKind,
};

/// Read/write access to the destination configuration collection.
///
/// The dispatcher only uses the read side; the write side backs the admin
/// management screen.
#[async_trait]
pub trait WebhookConfigRepositoryTrait: Send + Sync {
    async fn list_destinations(&self) -> Result<Vec<WebhookDestination>>;

    /// The single-destination configuration document of earlier releases,
    /// if one is stored at its well-known settings key.
    async fn get_legacy_config(&self) -> Result<Option<LegacyWebhookConfig>>;

    async fn create_destination(
        &self,
        new_destination: NewWebhookDestination,
    ) -> Result<WebhookDestination>;

    async fn update_destination(
        &self,
        destination_id: &str,
        update: WebhookDestinationUpdate,
    ) -> Result<WebhookDestination>;

    async fn delete_destination(&self, destination_id: &str) -> Result<usize>;
}

/// HTTP seam for outbound deliveries. `Ok(())` means the destination
/// answered with a 2xx status.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn deliver(&self, url: &str, secret: &str, body: &Value) -> Result<()>;
}

/// Public contract of the webhook dispatcher.
///
/// Every operation is best-effort and safe to call from a fire-and-forget
/// context: failures are logged, never raised. The return value is `true`
/// when at least one destination acknowledged the delivery with a 2xx.
#[async_trait]
pub trait WebhookDispatcherTrait: Send + Sync {
    /// Generic entry point; the `send_*` operations are thin wrappers
    /// fixing the event kind.
    async fn send(&self, kind: WebhookEventKind, payload: Value, entity_id: &str) -> bool;

    async fn send_client_created(&self, client: Value) -> bool;

    async fn send_client_updated(&self, client: Value) -> bool;

    async fn send_client_status_changed(&self, client: Value, previous_status: &str) -> bool;

    async fn send_proposal_created(&self, proposal: Value) -> bool;

    async fn send_proposal_updated(&self, proposal: Value) -> bool;

    async fn send_proposal_status_changed(&self, proposal: Value, previous_status: &str) -> bool;

    async fn send_pipeline_status_changed(&self, change: PipelineChangeEvent) -> bool;

    /// Drops the cached destination list so the next dispatch re-reads the
    /// configuration store. Called by the admin service after mutations.
    fn invalidate_config_cache(&self);
}
