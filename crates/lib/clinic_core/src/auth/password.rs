//! Password hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 12;

/// Hash a password with bcrypt (cost 12).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A stored hash that bcrypt cannot parse counts as a mismatch, so a corrupt
/// row can never authenticate.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    match bcrypt::verify(password, hash) {
        Ok(matched) => Ok(matched),
        Err(bcrypt::BcryptError::InvalidHash(_)) | Err(bcrypt::BcryptError::InvalidPrefix(_)) => {
            Ok(false)
        }
        Err(e) => Err(AuthError::Internal(format!("bcrypt verify: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("patient123").unwrap();
        assert!(verify_password("patient123", &hash).unwrap());
        assert!(!verify_password("patient124", &hash).unwrap());
    }

    #[test]
    fn hashes_at_cost_12() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$2b$12$"), "{hash}");
    }

    #[test]
    fn garbage_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").unwrap());
    }
}
