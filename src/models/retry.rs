use crate::constants::MAX_RETRIES;

/// Retry position of a message, derived from its `retries` property.
///
/// Values above [`MAX_RETRIES`] are clamped so the counter never grows past
/// the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    retries: u32,
}

impl RetryState {
    pub fn new(retries: u32) -> Self {
        Self {
            retries: retries.min(MAX_RETRIES),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether another redelivery may be scheduled.
    pub fn can_retry(&self) -> bool {
        self.retries < MAX_RETRIES
    }

    /// State carried by the redelivery clone, or `None` at the ceiling.
    pub fn next(&self) -> Option<Self> {
        self.can_retry().then(|| Self {
            retries: self.retries + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_allowed_below_ceiling() {
        for retries in 0..MAX_RETRIES {
            let state = RetryState::new(retries);
            assert!(state.can_retry());
            assert_eq!(state.next().map(|s| s.retries()), Some(retries + 1));
        }
    }

    #[test]
    fn test_no_retry_at_ceiling() {
        let state = RetryState::new(MAX_RETRIES);
        assert!(!state.can_retry());
        assert_eq!(state.next(), None);
    }

    #[test]
    fn test_counter_is_clamped_to_ceiling() {
        let state = RetryState::new(MAX_RETRIES + 7);
        assert_eq!(state.retries(), MAX_RETRIES);
        assert!(!state.can_retry());
    }
}
