//! Six-digit registration verification codes.

use rand::Rng;

/// Number of digits in a verification code.
pub const CODE_DIGITS: usize = 6;

/// Generates a uniformly random zero-padded 6-digit code (`000000`-`999999`).
pub fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(0..1_000_000);
    format!("{:06}", code)
}

/// Returns true if `code` is exactly six ASCII digits.
pub fn is_valid_verification_code(code: &str) -> bool {
    code.len() == CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}
