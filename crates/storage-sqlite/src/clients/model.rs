//! Database models for clients.

use diesel::prelude::*;

use creditflow_core::clients::{Client, ClientUpdate};

use crate::utils::parse_timestamp;

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::clients)]
pub struct ClientDB {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ClientDB> for Client {
    fn from(db: ClientDB) -> Self {
        Client {
            id: db.id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            document: db.document,
            status: db.status,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
        }
    }
}

/// Changeset for partial client updates. `None` columns are skipped.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::clients)]
pub struct ClientUpdateDB {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
}

impl From<ClientUpdate> for ClientUpdateDB {
    fn from(update: ClientUpdate) -> Self {
        ClientUpdateDB {
            name: update.name,
            email: update.email,
            phone: update.phone,
            document: update.document,
            status: update.status,
            updated_at: None,
        }
    }
}
