use rand::{distributions::Alphanumeric, Rng};

pub const CODE_LENGTH: usize = 8;

/// Random alphanumeric code mailed for email verification
pub fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}
