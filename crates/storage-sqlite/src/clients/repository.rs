use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use creditflow_core::clients::{Client, ClientRepositoryTrait, ClientUpdate, NewClient};
use creditflow_core::Result;

use super::model::{ClientDB, ClientUpdateDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::clients;

pub struct ClientRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ClientRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ClientRepository { pool, writer }
    }
}

#[async_trait]
impl ClientRepositoryTrait for ClientRepository {
    fn get_client_by_id(&self, client_id: &str) -> Result<Option<Client>> {
        let mut conn = get_connection(&self.pool)?;
        let row = clients::table
            .find(client_id)
            .first::<ClientDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Client::from))
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = clients::table
            .order(clients::created_at.desc())
            .load::<ClientDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn create_client(&self, new_client: NewClient) -> Result<Client> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let row = ClientDB {
                    id: new_client
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: new_client.name,
                    email: new_client.email,
                    phone: new_client.phone,
                    document: new_client.document,
                    status: new_client.status,
                    created_at: new_client.created_at.to_rfc3339(),
                    updated_at: new_client.updated_at.to_rfc3339(),
                };

                diesel::insert_into(clients::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let inserted = clients::table
                    .find(&row.id)
                    .first::<ClientDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Client::from(inserted))
            })
            .await
    }

    async fn update_client(&self, client_id: &str, update: ClientUpdate) -> Result<Client> {
        let client_id = client_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let mut changes = ClientUpdateDB::from(update);
                changes.updated_at = Some(Utc::now().to_rfc3339());

                diesel::update(clients::table.find(&client_id))
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let updated = clients::table
                    .find(&client_id)
                    .first::<ClientDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Client::from(updated))
            })
            .await
    }

    async fn delete_client(&self, client_id: &str) -> Result<usize> {
        let client_id = client_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted = diesel::delete(clients::table.find(&client_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}
