use std::sync::Arc;

use crate::errors::{Error, Result, ValidationError};
use crate::webhooks::webhooks_model::{
    NewWebhookDestination, WebhookDestination, WebhookDestinationUpdate,
};
use crate::webhooks::webhooks_traits::{WebhookConfigRepositoryTrait, WebhookDispatcherTrait};

/// Backs the admin screen that manages webhook destinations.
///
/// Every mutation invalidates the dispatcher's configuration cache so the
/// change takes effect on the next dispatch instead of after the cache
/// TTL.
pub struct WebhookDestinationService {
    config_repo: Arc<dyn WebhookConfigRepositoryTrait>,
    dispatcher: Arc<dyn WebhookDispatcherTrait>,
}

impl WebhookDestinationService {
    pub fn new(
        config_repo: Arc<dyn WebhookConfigRepositoryTrait>,
        dispatcher: Arc<dyn WebhookDispatcherTrait>,
    ) -> Self {
        WebhookDestinationService {
            config_repo,
            dispatcher,
        }
    }

    pub async fn list_destinations(&self) -> Result<Vec<WebhookDestination>> {
        self.config_repo.list_destinations().await
    }

    pub async fn create_destination(
        &self,
        new_destination: NewWebhookDestination,
    ) -> Result<WebhookDestination> {
        if new_destination.url.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "url".to_string(),
            )));
        }

        let destination = self.config_repo.create_destination(new_destination).await?;
        self.dispatcher.invalidate_config_cache();
        Ok(destination)
    }

    pub async fn update_destination(
        &self,
        destination_id: &str,
        update: WebhookDestinationUpdate,
    ) -> Result<WebhookDestination> {
        let destination = self
            .config_repo
            .update_destination(destination_id, update)
            .await?;
        self.dispatcher.invalidate_config_cache();
        Ok(destination)
    }

    pub async fn delete_destination(&self, destination_id: &str) -> Result<usize> {
        let deleted = self.config_repo.delete_destination(destination_id).await?;
        self.dispatcher.invalidate_config_cache();
        Ok(deleted)
    }
}
