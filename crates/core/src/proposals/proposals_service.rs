use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

use crate::clients::clients_traits::ClientRepositoryTrait;
use crate::constants::{PIPELINE_STAGES, PIPELINE_STAGE_SUBMITTED, STATUS_PENDING};
use crate::errors::{Error, Result, ValidationError};
use crate::monitor::{ChangeBroadcaster, ChangeKind};
use crate::proposals::proposals_model::{NewProposal, Proposal, ProposalUpdate};
use crate::proposals::proposals_traits::ProposalRepositoryTrait;

/// Service for proposal intake and pipeline movement.
///
/// Mutations are published on the change broadcaster after the write
/// succeeds; webhook notification is the change monitor's job, never this
/// service's.
pub struct ProposalService {
    proposal_repo: Arc<dyn ProposalRepositoryTrait>,
    client_repo: Arc<dyn ClientRepositoryTrait>,
    broadcaster: Arc<ChangeBroadcaster>,
}

impl ProposalService {
    pub fn new(
        proposal_repo: Arc<dyn ProposalRepositoryTrait>,
        client_repo: Arc<dyn ClientRepositoryTrait>,
    ) -> Self {
        ProposalService {
            proposal_repo,
            client_repo,
            broadcaster: Arc::new(ChangeBroadcaster::new()),
        }
    }

    /// Sets the change broadcaster for this service.
    pub fn with_change_broadcaster(mut self, broadcaster: Arc<ChangeBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    pub fn get_proposal(&self, proposal_id: &str) -> Result<Option<Proposal>> {
        self.proposal_repo.get_proposal_by_id(proposal_id)
    }

    pub fn list_proposals(&self) -> Result<Vec<Proposal>> {
        self.proposal_repo.list_proposals()
    }

    pub fn list_proposals_for_client(&self, client_id: &str) -> Result<Vec<Proposal>> {
        self.proposal_repo.list_proposals_for_client(client_id)
    }

    pub async fn submit_proposal(
        &self,
        client_id: String,
        bank_id: Option<String>,
        amount: Decimal,
        term_months: i32,
    ) -> Result<Proposal> {
        if self.client_repo.get_client_by_id(&client_id)?.is_none() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Client not found: {}",
                client_id
            ))));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Proposal amount must be positive".to_string(),
            )));
        }
        if term_months <= 0 {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Proposal term must be at least one month".to_string(),
            )));
        }

        let now = Utc::now();
        let proposal_number = self.next_proposal_number(now.year())?;

        let new_proposal = NewProposal {
            id: None,
            proposal_number,
            client_id,
            bank_id,
            amount,
            term_months,
            status: STATUS_PENDING.to_string(),
            pipeline_status: PIPELINE_STAGE_SUBMITTED.to_string(),
            created_at: now,
            updated_at: now,
        };

        let proposal = self.proposal_repo.create_proposal(new_proposal).await?;
        self.broadcaster
            .publish_proposal(ChangeKind::Added, proposal.clone());
        Ok(proposal)
    }

    pub async fn update_proposal(
        &self,
        proposal_id: &str,
        update: ProposalUpdate,
    ) -> Result<Proposal> {
        if let Some(amount) = &update.amount {
            if *amount <= Decimal::ZERO {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Proposal amount must be positive".to_string(),
                )));
            }
        }
        if let Some(stage) = &update.pipeline_status {
            validate_pipeline_stage(stage)?;
        }

        let proposal = self
            .proposal_repo
            .update_proposal(proposal_id, update)
            .await?;
        self.broadcaster
            .publish_proposal(ChangeKind::Modified, proposal.clone());
        Ok(proposal)
    }

    pub async fn update_proposal_status(
        &self,
        proposal_id: &str,
        status: &str,
    ) -> Result<Proposal> {
        if status.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "status".to_string(),
            )));
        }

        let update = ProposalUpdate {
            status: Some(status.to_string()),
            ..Default::default()
        };
        self.update_proposal(proposal_id, update).await
    }

    /// Moves a proposal to another pipeline stage (Kanban board drop).
    pub async fn move_pipeline_stage(&self, proposal_id: &str, stage: &str) -> Result<Proposal> {
        validate_pipeline_stage(stage)?;

        let update = ProposalUpdate {
            pipeline_status: Some(stage.to_string()),
            ..Default::default()
        };
        self.update_proposal(proposal_id, update).await
    }

    pub async fn delete_proposal(&self, proposal_id: &str) -> Result<usize> {
        self.proposal_repo.delete_proposal(proposal_id).await
    }

    fn next_proposal_number(&self, year: i32) -> Result<String> {
        let issued = self.proposal_repo.count_proposals_for_year(year)?;
        Ok(format!("P-{}-{:04}", year, issued + 1))
    }
}

fn validate_pipeline_stage(stage: &str) -> Result<()> {
    if PIPELINE_STAGES.contains(&stage) {
        Ok(())
    } else {
        Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Unknown pipeline stage: {}",
            stage
        ))))
    }
}
