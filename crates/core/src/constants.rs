//! Application-wide constants.

/// Approval pipeline stages, in board order.
pub const PIPELINE_STAGE_SUBMITTED: &str = "submitted";
pub const PIPELINE_STAGE_PRE_ANALYSIS: &str = "pre_analysis";
pub const PIPELINE_STAGE_CREDIT: &str = "credit";
pub const PIPELINE_STAGE_LEGAL: &str = "legal";
pub const PIPELINE_STAGE_CONTRACT: &str = "contract";

/// The complete ordered set of pipeline stages.
pub const PIPELINE_STAGES: [&str; 5] = [
    PIPELINE_STAGE_SUBMITTED,
    PIPELINE_STAGE_PRE_ANALYSIS,
    PIPELINE_STAGE_CREDIT,
    PIPELINE_STAGE_LEGAL,
    PIPELINE_STAGE_CONTRACT,
];

/// Default approval status for newly registered clients and proposals.
pub const STATUS_PENDING: &str = "pending";

/// Well-known settings key holding the legacy single-destination webhook
/// configuration document.
pub const LEGACY_WEBHOOK_SETTING_KEY: &str = "webhook_config";
