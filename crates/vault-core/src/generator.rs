//! Random secret generation

use rand::{rngs::OsRng, Rng};

/// Shortest secret `generate_secret` will produce
pub const MIN_SECRET_LEN: usize = 8;

/// Longest secret `generate_secret` will produce
pub const MAX_SECRET_LEN: usize = 32;

/// Characters secrets are drawn from
pub const SECRET_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+-=";

/// Generate a random secret from the OS CSPRNG.
///
/// `length` is clamped to `[MIN_SECRET_LEN, MAX_SECRET_LEN]`.
pub fn generate_secret(length: usize) -> String {
    let length = length.clamp(MIN_SECRET_LEN, MAX_SECRET_LEN);
    let mut rng = OsRng;

    (0..length)
        .map(|_| char::from(SECRET_ALPHABET[rng.gen_range(0..SECRET_ALPHABET.len())]))
        .collect()
}
