pub mod destinations_service;
pub mod transport;
pub mod webhooks_errors;
pub mod webhooks_model;
pub mod webhooks_service;
pub mod webhooks_traits;

#[cfg(test)]
mod webhooks_service_tests;

pub use destinations_service::WebhookDestinationService;
pub use transport::{HttpWebhookTransport, WEBHOOK_SECRET_HEADER};
pub use webhooks_errors::WebhookError;
pub use webhooks_model::{
    EntityEventFlags, EventActor, LegacyWebhookConfig, NewWebhookDestination, PipelineChangeEvent,
    PipelineEventFlags, ThrottleKey, ThrottleSettings, WebhookDestination,
    WebhookDestinationUpdate, WebhookEnvelope, WebhookEventFlags, WebhookEventKind,
};
pub use webhooks_service::WebhookDispatcher;
pub use webhooks_traits::{
    WebhookConfigRepositoryTrait, WebhookDispatcherTrait, WebhookTransport,
};
