use std::sync::Arc;

use chrono::Utc;

use crate::clients::clients_model::{Client, ClientUpdate, NewClient};
use crate::clients::clients_traits::ClientRepositoryTrait;
use crate::constants::STATUS_PENDING;
use crate::errors::{Error, Result, ValidationError};
use crate::monitor::{ChangeBroadcaster, ChangeKind};

/// Service for client registration and maintenance.
///
/// After every successful mutation the fresh record is published on the
/// change broadcaster so the change monitor can translate it into webhook
/// notifications. A service constructed with `new` broadcasts to nobody;
/// the composition root injects the shared broadcaster.
pub struct ClientService {
    client_repo: Arc<dyn ClientRepositoryTrait>,
    broadcaster: Arc<ChangeBroadcaster>,
}

impl ClientService {
    pub fn new(client_repo: Arc<dyn ClientRepositoryTrait>) -> Self {
        ClientService {
            client_repo,
            broadcaster: Arc::new(ChangeBroadcaster::new()),
        }
    }

    /// Sets the change broadcaster for this service.
    pub fn with_change_broadcaster(mut self, broadcaster: Arc<ChangeBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        self.client_repo.get_client_by_id(client_id)
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        self.client_repo.list_clients()
    }

    pub async fn register_client(
        &self,
        name: String,
        email: Option<String>,
        phone: Option<String>,
        document: Option<String>,
    ) -> Result<Client> {
        if name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }

        let now = Utc::now();
        let new_client = NewClient {
            id: None,
            name,
            email,
            phone,
            document,
            status: STATUS_PENDING.to_string(),
            created_at: now,
            updated_at: now,
        };

        let client = self.client_repo.create_client(new_client).await?;
        self.broadcaster
            .publish_client(ChangeKind::Added, client.clone());
        Ok(client)
    }

    pub async fn update_client(&self, client_id: &str, update: ClientUpdate) -> Result<Client> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Client name cannot be empty".to_string(),
                )));
            }
        }

        let client = self.client_repo.update_client(client_id, update).await?;
        self.broadcaster
            .publish_client(ChangeKind::Modified, client.clone());
        Ok(client)
    }

    pub async fn update_client_status(&self, client_id: &str, status: &str) -> Result<Client> {
        if status.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "status".to_string(),
            )));
        }

        let update = ClientUpdate {
            status: Some(status.to_string()),
            ..Default::default()
        };
        self.update_client(client_id, update).await
    }

    pub async fn delete_client(&self, client_id: &str) -> Result<usize> {
        self.client_repo.delete_client(client_id).await
    }
}
