//! Database models for proposals.

use diesel::prelude::*;

use creditflow_core::proposals::{Proposal, ProposalUpdate};

use crate::utils::{parse_decimal, parse_timestamp};

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::proposals)]
pub struct ProposalDB {
    pub id: String,
    pub proposal_number: String,
    pub client_id: String,
    pub bank_id: Option<String>,
    pub amount: String,
    pub term_months: i32,
    pub status: String,
    pub pipeline_status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProposalDB> for Proposal {
    fn from(db: ProposalDB) -> Self {
        Proposal {
            id: db.id,
            proposal_number: db.proposal_number,
            client_id: db.client_id,
            bank_id: db.bank_id,
            amount: parse_decimal(&db.amount),
            term_months: db.term_months,
            status: db.status,
            pipeline_status: db.pipeline_status,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
        }
    }
}

/// Changeset for partial proposal updates. `None` columns are skipped.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::proposals)]
pub struct ProposalUpdateDB {
    pub bank_id: Option<String>,
    pub amount: Option<String>,
    pub term_months: Option<i32>,
    pub status: Option<String>,
    pub pipeline_status: Option<String>,
    pub updated_at: Option<String>,
}

impl From<ProposalUpdate> for ProposalUpdateDB {
    fn from(update: ProposalUpdate) -> Self {
        ProposalUpdateDB {
            bank_id: update.bank_id,
            amount: update.amount.map(|amount| amount.to_string()),
            term_months: update.term_months,
            status: update.status,
            pipeline_status: update.pipeline_status,
            updated_at: None,
        }
    }
}
