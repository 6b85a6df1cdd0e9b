use thiserror::Error;

/// Reasons a received message cannot be delivered. Always terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No body received")]
    MissingBody,

    #[error("Unreadable body: {0}")]
    UnreadableBody(String),

    #[error("No properties data")]
    MissingProperties,

    #[error("No service callback url")]
    MissingCallbackUrl,
}
