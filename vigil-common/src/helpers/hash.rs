use data_encoding::HEXLOWER;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::helpers::rng::get_crypto_rng;
use crate::Secret;

/// Generate a new random session credential. The raw value is handed to the
/// client; only its hash is ever persisted.
pub fn generate_session_token() -> Secret<String> {
    let mut bytes = [0; 32];
    get_crypto_rng().fill(&mut bytes[..]);
    Secret::new(HEXLOWER.encode(&bytes))
}

/// Deterministic one-way hash of a session credential. Computed identically
/// on storage and on every lookup so the hash can serve as an equality key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    HEXLOWER.encode(hasher.finalize().as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn test_hash_token_known_value() {
        // SHA-256 of the empty string
        assert_eq!(
            hash_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a.expose_secret(), b.expose_secret());
        assert_eq!(a.expose_secret().len(), 64);
    }
}
