//! Repository trait for proposals.

use async_trait::async_trait;

use crate::errors::Result;
use crate::proposals::proposals_model::{NewProposal, Proposal, ProposalUpdate};

#[async_trait]
pub trait ProposalRepositoryTrait: Send + Sync {
    fn get_proposal_by_id(&self, proposal_id: &str) -> Result<Option<Proposal>>;

    fn list_proposals(&self) -> Result<Vec<Proposal>>;

    fn list_proposals_for_client(&self, client_id: &str) -> Result<Vec<Proposal>>;

    /// Number of proposals whose number was issued for the given year.
    /// Used when generating the next sequential proposal number.
    fn count_proposals_for_year(&self, year: i32) -> Result<i64>;

    async fn create_proposal(&self, new_proposal: NewProposal) -> Result<Proposal>;

    async fn update_proposal(&self, proposal_id: &str, update: ProposalUpdate)
        -> Result<Proposal>;

    async fn delete_proposal(&self, proposal_id: &str) -> Result<usize>;
}
