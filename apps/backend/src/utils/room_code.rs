//! Private room codes.
//!
//! Six characters from a Crockford-style alphabet (no I, L, O, U) so
//! codes survive being read aloud or typed from a screenshot.

use rand::Rng;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
pub const CODE_LEN: usize = 6;

/// Generate a fresh room code.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Uppercase and trim user input before lookup.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}
