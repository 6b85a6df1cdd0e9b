use strum::Display;

/// Result of one delivery attempt. Drives the retry/dead-letter decision.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DeliveryOutcome {
    /// Callback accepted the payload; carries the response body.
    Success(String),
    /// Token lease or callback failed; counted against the retry ceiling.
    RecoverableFailure(String),
    /// Message cannot be delivered as-is; dead-lettered without retry.
    Invalid(String),
}

impl DeliveryOutcome {
    pub fn reason(&self) -> &str {
        match self {
            Self::Success(body) => body,
            Self::RecoverableFailure(reason) | Self::Invalid(reason) => reason,
        }
    }
}
