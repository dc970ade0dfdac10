//! Generated element ids

use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<prefix>-<random base36 token>`, e.g. `accordion-trigger-3kq9z0f1x2`
pub(crate) fn random_id(prefix: &str) -> String {
    let mut token: u64 = rand::rng().random();
    let mut digits = Vec::with_capacity(13);
    loop {
        digits.push(ALPHABET[(token % 36) as usize] as char);
        token /= 36;
        if token == 0 {
            break;
        }
    }
    let token: String = digits.into_iter().rev().collect();
    format!("{prefix}-{token}")
}

/// Treat an empty attribute like a missing one
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
