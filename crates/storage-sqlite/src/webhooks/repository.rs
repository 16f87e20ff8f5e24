use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::warn;
use uuid::Uuid;

use creditflow_core::constants::LEGACY_WEBHOOK_SETTING_KEY;
use creditflow_core::webhooks::{
    LegacyWebhookConfig, NewWebhookDestination, WebhookConfigRepositoryTrait, WebhookDestination,
    WebhookDestinationUpdate,
};
use creditflow_core::Result;

use super::model::WebhookDestinationDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{app_settings, webhook_destinations};

pub struct WebhookConfigRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl WebhookConfigRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        WebhookConfigRepository { pool, writer }
    }
}

#[async_trait]
impl WebhookConfigRepositoryTrait for WebhookConfigRepository {
    async fn list_destinations(&self) -> Result<Vec<WebhookDestination>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = webhook_destinations::table
            .order(webhook_destinations::created_at.asc())
            .load::<WebhookDestinationDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(WebhookDestination::from).collect())
    }

    async fn get_legacy_config(&self) -> Result<Option<LegacyWebhookConfig>> {
        let mut conn = get_connection(&self.pool)?;
        let document = app_settings::table
            .find(LEGACY_WEBHOOK_SETTING_KEY)
            .select(app_settings::setting_value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        match document {
            Some(document) => match serde_json::from_str::<LegacyWebhookConfig>(&document) {
                Ok(legacy) => Ok(Some(legacy)),
                Err(e) => {
                    warn!("Ignoring unparseable legacy webhook configuration: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn create_destination(
        &self,
        new_destination: NewWebhookDestination,
    ) -> Result<WebhookDestination> {
        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<WebhookDestination> {
                    let events = serde_json::to_string(&new_destination.events)
                        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                    let now = Utc::now().to_rfc3339();

                    let row = WebhookDestinationDB {
                        id: Uuid::new_v4().to_string(),
                        name: new_destination.name,
                        url: new_destination.url,
                        secret: new_destination.secret,
                        enabled: new_destination.enabled,
                        events,
                        throttle_enabled: new_destination.throttle.enabled,
                        throttle_interval: new_destination.throttle.interval as i32,
                        created_at: now.clone(),
                        updated_at: now,
                    };

                    diesel::insert_into(webhook_destinations::table)
                        .values(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;

                    Ok(WebhookDestination::from(row))
                },
            )
            .await
    }

    async fn update_destination(
        &self,
        destination_id: &str,
        update: WebhookDestinationUpdate,
    ) -> Result<WebhookDestination> {
        let destination_id = destination_id.to_string();
        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<WebhookDestination> {
                    let mut row = webhook_destinations::table
                        .find(&destination_id)
                        .first::<WebhookDestinationDB>(conn)
                        .map_err(StorageError::from)?;

                    if let Some(name) = update.name {
                        row.name = name;
                    }
                    if let Some(url) = update.url {
                        row.url = url;
                    }
                    if let Some(secret) = update.secret {
                        row.secret = secret;
                    }
                    if let Some(enabled) = update.enabled {
                        row.enabled = enabled;
                    }
                    if let Some(events) = update.events {
                        row.events = serde_json::to_string(&events)
                            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                    }
                    if let Some(throttle) = update.throttle {
                        row.throttle_enabled = throttle.enabled;
                        row.throttle_interval = throttle.interval as i32;
                    }
                    row.updated_at = Utc::now().to_rfc3339();

                    diesel::update(webhook_destinations::table.find(&destination_id))
                        .set(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;

                    Ok(WebhookDestination::from(row))
                },
            )
            .await
    }

    async fn delete_destination(&self, destination_id: &str) -> Result<usize> {
        let destination_id = destination_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted =
                    diesel::delete(webhook_destinations::table.find(&destination_id))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}
