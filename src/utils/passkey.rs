use rand::{distr::Alphanumeric, Rng};

pub const PASSKEY_LEN: usize = 32;

/// Generate a random alphanumeric passkey for a new user
pub fn generate_passkey() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PASSKEY_LEN)
        .map(char::from)
        .collect()
}
