//! Database model for webhook destinations.
//!
//! The nested event flags are stored as a JSON text column; the throttle
//! settings as two scalar columns.

use diesel::prelude::*;
use log::warn;

use creditflow_core::webhooks::{ThrottleSettings, WebhookDestination, WebhookEventFlags};

#[derive(Queryable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::webhook_destinations)]
pub struct WebhookDestinationDB {
    pub id: String,
    pub name: String,
    pub url: String,
    pub secret: String,
    pub enabled: bool,
    pub events: String,
    pub throttle_enabled: bool,
    pub throttle_interval: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WebhookDestinationDB> for WebhookDestination {
    fn from(db: WebhookDestinationDB) -> Self {
        let events: WebhookEventFlags = serde_json::from_str(&db.events).unwrap_or_else(|e| {
            warn!(
                "Invalid event flags for webhook destination '{}': {}",
                db.id, e
            );
            WebhookEventFlags::default()
        });

        WebhookDestination {
            id: db.id,
            name: db.name,
            url: db.url,
            secret: db.secret,
            enabled: db.enabled,
            events,
            throttle: ThrottleSettings {
                enabled: db.throttle_enabled,
                interval: db.throttle_interval.max(0) as u64,
            },
        }
    }
}
