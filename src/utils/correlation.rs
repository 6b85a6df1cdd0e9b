use rand::Rng;

use crate::constants::{CORRELATION_ID_MAX, CORRELATION_ID_MIN};

/// Generates a six digit correlation id for messages that arrive without one.
pub fn generate_correlation_id() -> String {
    rand::rng()
        .random_range(CORRELATION_ID_MIN..CORRELATION_ID_MAX)
        .to_string()
}
