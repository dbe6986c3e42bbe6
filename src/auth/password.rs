use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

/// SHA-256 digest of the password, base64 encoded. Stored as-is in `user.password`.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    hash_password(password) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_to_base64_sha256() {
        // echo -n "password" | openssl dgst -sha256 -binary | base64
        assert_eq!(hash_password("password"), "XohImNooBHFR0OVvjcYpJ3NgPQ1qq73WKhHvch0VQtg=");
    }

    #[test]
    fn verifies_matching_password_only() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }
}
