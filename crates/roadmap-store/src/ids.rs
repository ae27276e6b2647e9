//! Identifier minting
//!
//! User ids and backup keys are `<prefix>_<unix millis>_<random base36>`.
//! They are identity tokens, not secrets.

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix
pub const SUFFIX_LEN: usize = 12;

/// Random lowercase base36 string of `len` characters
#[must_use]
pub fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

/// Mint a user id from a timestamp and a random suffix
#[must_use]
pub fn mint_user_id(now: DateTime<Utc>) -> String {
    format!("user_{}_{}", now.timestamp_millis(), random_token(SUFFIX_LEN))
}

/// Mint a backup key binding user, export time and a random suffix
#[must_use]
pub fn mint_backup_key(user_id: &str, exported_at: DateTime<Utc>) -> String {
    format!(
        "backup_{}_{}_{}",
        user_id,
        exported_at.timestamp_millis(),
        random_token(SUFFIX_LEN)
    )
}
