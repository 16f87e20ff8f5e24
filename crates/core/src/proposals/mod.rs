pub mod proposals_model;
pub mod proposals_service;
pub mod proposals_traits;

pub use proposals_model::{NewProposal, Proposal, ProposalUpdate};
pub use proposals_service::ProposalService;
pub use proposals_traits::ProposalRepositoryTrait;
