//! Repository trait for clients.

use async_trait::async_trait;

use crate::clients::clients_model::{Client, ClientUpdate, NewClient};
use crate::errors::Result;

#[async_trait]
pub trait ClientRepositoryTrait: Send + Sync {
    fn get_client_by_id(&self, client_id: &str) -> Result<Option<Client>>;

    fn list_clients(&self) -> Result<Vec<Client>>;

    async fn create_client(&self, new_client: NewClient) -> Result<Client>;

    async fn update_client(&self, client_id: &str, update: ClientUpdate) -> Result<Client>;

    async fn delete_client(&self, client_id: &str) -> Result<usize>;
}
