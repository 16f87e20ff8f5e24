use thiserror::Error;

/// Errors local to the webhook subsystem.
///
/// These never cross the dispatcher's public boundary; `send` converts every
/// failure into a logged `false` outcome.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}
