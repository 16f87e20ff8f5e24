use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use creditflow_core::proposals::{
    NewProposal, Proposal, ProposalRepositoryTrait, ProposalUpdate,
};
use creditflow_core::Result;

use super::model::{ProposalDB, ProposalUpdateDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::proposals;

pub struct ProposalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ProposalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ProposalRepository { pool, writer }
    }
}

#[async_trait]
impl ProposalRepositoryTrait for ProposalRepository {
    fn get_proposal_by_id(&self, proposal_id: &str) -> Result<Option<Proposal>> {
        let mut conn = get_connection(&self.pool)?;
        let row = proposals::table
            .find(proposal_id)
            .first::<ProposalDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Proposal::from))
    }

    fn list_proposals(&self) -> Result<Vec<Proposal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = proposals::table
            .order(proposals::created_at.desc())
            .load::<ProposalDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Proposal::from).collect())
    }

    fn list_proposals_for_client(&self, client_id: &str) -> Result<Vec<Proposal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = proposals::table
            .filter(proposals::client_id.eq(client_id))
            .order(proposals::created_at.desc())
            .load::<ProposalDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Proposal::from).collect())
    }

    fn count_proposals_for_year(&self, year: i32) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = proposals::table
            .filter(proposals::proposal_number.like(format!("P-{}-%", year)))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    async fn create_proposal(&self, new_proposal: NewProposal) -> Result<Proposal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Proposal> {
                let row = ProposalDB {
                    id: new_proposal
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    proposal_number: new_proposal.proposal_number,
                    client_id: new_proposal.client_id,
                    bank_id: new_proposal.bank_id,
                    amount: new_proposal.amount.to_string(),
                    term_months: new_proposal.term_months,
                    status: new_proposal.status,
                    pipeline_status: new_proposal.pipeline_status,
                    created_at: new_proposal.created_at.to_rfc3339(),
                    updated_at: new_proposal.updated_at.to_rfc3339(),
                };

                diesel::insert_into(proposals::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let inserted = proposals::table
                    .find(&row.id)
                    .first::<ProposalDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Proposal::from(inserted))
            })
            .await
    }

    async fn update_proposal(
        &self,
        proposal_id: &str,
        update: ProposalUpdate,
    ) -> Result<Proposal> {
        let proposal_id = proposal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Proposal> {
                let mut changes = ProposalUpdateDB::from(update);
                changes.updated_at = Some(Utc::now().to_rfc3339());

                diesel::update(proposals::table.find(&proposal_id))
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let updated = proposals::table
                    .find(&proposal_id)
                    .first::<ProposalDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Proposal::from(updated))
            })
            .await
    }

    async fn delete_proposal(&self, proposal_id: &str) -> Result<usize> {
        let proposal_id = proposal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted = diesel::delete(proposals::table.find(&proposal_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}
