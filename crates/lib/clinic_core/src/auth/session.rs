//! Session token issuance and verification.
//!
//! A session is an HS256 JWT carrying a [`Principal`] snapshot. It is signed,
//! not encrypted, and lives exactly [`SESSION_TTL_SECS`] from issuance. There
//! is no server-side session store: a token stays valid until it expires.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use thiserror::Error;
use tracing::{info, warn};

use super::AuthError;
use crate::models::auth::{Principal, SessionClaims};

/// Session lifetime: 24 hours, fixed and non-sliding.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("session expired")]
    Expired,

    #[error("session token malformed")]
    Malformed,

    #[error("session signature invalid")]
    SignatureInvalid,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens with a process-wide shared secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKeys(..)")
    }
}

impl SessionKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for `principal`, valid for 24 hours from now.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedSession, AuthError> {
        self.issue_at(principal, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        let expires_at = issued_at + Duration::seconds(SESSION_TTL_SECS);
        let claims = SessionClaims {
            user: principal.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))?;
        Ok(IssuedSession { token, expires_at })
    }

    /// Verify signature and expiry, returning the embedded principal.
    ///
    /// The signature is checked before anything else is decoded, so any
    /// change to a well-formed token reports `SignatureInvalid`.
    pub fn verify(&self, token: &str) -> Result<Principal, VerificationError> {
        if !is_compact_jws(token) {
            return Err(VerificationError::Malformed);
        }
        let Some((message, signature)) = token.rsplit_once('.') else {
            return Err(VerificationError::Malformed);
        };
        match jsonwebtoken::crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding,
            Algorithm::HS256,
        ) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(VerificationError::SignatureInvalid),
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims.user)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    VerificationError::SignatureInvalid
                }
                _ => VerificationError::Malformed,
            })
    }
}

/// Three non-empty base64url segments separated by dots.
fn is_compact_jws(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

/// Resolve the signing secret: env var `JWT_SECRET` → `SESSION_SECRET` → persisted file.
pub fn resolve_session_secret() -> String {
    for var in ["JWT_SECRET", "SESSION_SECRET"] {
        if let Ok(secret) = std::env::var(var)
            && !secret.is_empty()
        {
            return secret;
        }
    }
    // Generate and persist
    let secret_path = session_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(error = %e, "could not create secret directory");
    }
    match std::fs::write(&secret_path, &secret) {
        Ok(()) => info!(path = %secret_path.display(), "generated new session secret"),
        Err(e) => warn!(error = %e, "session secret not persisted; sessions end on restart"),
    }
    secret
}

/// Path to the persisted session secret file.
fn session_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clinic")
        .join("session-secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use uuid::Uuid;

    fn keys() -> SessionKeys {
        SessionKeys::from_secret(b"test-secret")
    }

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::now_v7(),
            email: format!("{role}@clinic.com"),
            name: "Test User".into(),
            role,
        }
    }

    #[test]
    fn issued_token_verifies_to_same_principal() {
        for role in Role::ALL {
            let p = principal(role);
            let issued = keys().issue(&p).unwrap();
            let verified = keys().verify(&issued.token).unwrap();
            assert_eq!(p, verified);
            assert_eq!(role, verified.role);
        }
    }

    #[test]
    fn expiry_is_24_hours_after_issue() {
        let now = Utc::now();
        let issued = keys().issue_at(&principal(Role::Admin), now).unwrap();
        assert_eq!(
            SESSION_TTL_SECS,
            (issued.expires_at - now).num_seconds()
        );
    }

    #[test]
    fn token_past_24_hours_is_expired() {
        let issued_at = Utc::now() - Duration::hours(25);
        let issued = keys().issue_at(&principal(Role::Patient), issued_at).unwrap();
        assert_eq!(
            Err(VerificationError::Expired),
            keys().verify(&issued.token)
        );
    }

    #[test]
    fn token_just_inside_lifetime_is_accepted() {
        let issued_at = Utc::now() - Duration::hours(23);
        let issued = keys().issue_at(&principal(Role::Dentist), issued_at).unwrap();
        assert!(keys().verify(&issued.token).is_ok());
    }

    #[test]
    fn tampered_payload_or_signature_is_signature_invalid() {
        let token = keys().issue(&principal(Role::Patient)).unwrap().token;
        let header_len = token.find('.').unwrap();
        let sig_start = token.rfind('.').unwrap();

        // One position inside the payload and one inside the signature.
        for pos in [header_len + 5, sig_start + 5] {
            let mut bytes = token.clone().into_bytes();
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(
                Err(VerificationError::SignatureInvalid),
                keys().verify(&tampered),
                "tampered at {pos}"
            );
        }
    }

    #[test]
    fn tampering_any_byte_is_signature_invalid() {
        let token = keys().issue(&principal(Role::Receptionist)).unwrap().token;
        for (pos, original) in token.bytes().enumerate() {
            let mut bytes = token.clone().into_bytes();
            bytes[pos] = if original == b'x' { b'y' } else { b'x' };
            let tampered = String::from_utf8(bytes).unwrap();
            // Replacing a separator changes the token's shape.
            let expected = if original == b'.' {
                VerificationError::Malformed
            } else {
                VerificationError::SignatureInvalid
            };
            assert_eq!(Err(expected), keys().verify(&tampered), "tampered at {pos}");
        }
    }

    #[test]
    fn signed_but_unreadable_claims_are_malformed() {
        // {"alg":"HS256","typ":"JWT"} . {"hello":"world"}
        let message = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJoZWxsbyI6IndvcmxkIn0";
        let signature = jsonwebtoken::crypto::sign(
            message.as_bytes(),
            &EncodingKey::from_secret(b"test-secret"),
            Algorithm::HS256,
        )
        .unwrap();
        assert_eq!(
            Err(VerificationError::Malformed),
            keys().verify(&format!("{message}.{signature}"))
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_signature_invalid() {
        let token = SessionKeys::from_secret(b"other")
            .issue(&principal(Role::Admin))
            .unwrap()
            .token;
        assert_eq!(
            Err(VerificationError::SignatureInvalid),
            keys().verify(&token)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(Err(VerificationError::Malformed), keys().verify(""));
        assert_eq!(Err(VerificationError::Malformed), keys().verify("abc"));
        assert_eq!(Err(VerificationError::Malformed), keys().verify("a.b"));
        assert_eq!(Err(VerificationError::Malformed), keys().verify("a..c"));
    }
}
