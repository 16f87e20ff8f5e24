use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use creditflow_core::banks::{Bank, BankRepositoryTrait, NewBank};
use creditflow_core::Result;

use super::model::BankDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::banks;

pub struct BankRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BankRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        BankRepository { pool, writer }
    }
}

#[async_trait]
impl BankRepositoryTrait for BankRepository {
    fn get_bank_by_id(&self, bank_id: &str) -> Result<Option<Bank>> {
        let mut conn = get_connection(&self.pool)?;
        let row = banks::table
            .find(bank_id)
            .first::<BankDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Bank::from))
    }

    fn list_banks(&self) -> Result<Vec<Bank>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = banks::table
            .order(banks::name.asc())
            .load::<BankDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Bank::from).collect())
    }

    async fn create_bank(&self, new_bank: NewBank) -> Result<Bank> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Bank> {
                let row = BankDB {
                    id: new_bank.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: new_bank.name,
                    trading_name: new_bank.trading_name,
                };

                diesel::insert_into(banks::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(Bank::from(row))
            })
            .await
    }
}
