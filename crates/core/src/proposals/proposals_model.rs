use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A credit proposal moving through the approval pipeline.
///
/// `status` is the overall approval status; `pipeline_status` is the
/// proposal's position on the Kanban board. The two evolve independently
/// and are diffed independently by the change monitor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    /// Human-facing identifier, e.g. `P-2025-0042`.
    pub proposal_number: String,
    pub client_id: String,
    pub bank_id: Option<String>,
    pub amount: Decimal,
    pub term_months: i32,
    pub status: String,
    pub pipeline_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for submitting a new proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub id: Option<String>,
    pub proposal_number: String,
    pub client_id: String,
    pub bank_id: Option<String>,
    pub amount: Decimal,
    pub term_months: i32,
    pub status: String,
    pub pipeline_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an existing proposal. `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalUpdate {
    pub bank_id: Option<String>,
    pub amount: Option<Decimal>,
    pub term_months: Option<i32>,
    pub status: Option<String>,
    pub pipeline_status: Option<String>,
}
