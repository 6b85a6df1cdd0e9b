// base64 helpers for the extended callback logging

use base64::Engine;

pub fn base64_encode(message: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(message)
}
