//! Signed session tokens.
//!
//! A token is an opaque base64url string: a serialized payload (user id,
//! expiry, random nonce) followed by a 32-byte keyed BLAKE3 tag computed
//! with the process-wide secret.  Callers never parse tokens; they hand
//! them back to [`sign`]/[`verify`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, Result};

const TAG_SIZE: usize = blake3::OUT_LEN;
const NONCE_SIZE: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    u_id: u64,
    expires_at: DateTime<Utc>,
    /// Random per-token bytes so two tokens for the same user never collide.
    nonce: [u8; NONCE_SIZE],
}

/// Issue a token for a user, valid for `ttl` from now.
pub fn sign(secret: &[u8; 32], u_id: u64, ttl: Duration) -> String {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let payload = TokenPayload {
        u_id,
        expires_at: Utc::now() + ttl,
        nonce,
    };

    let payload_bytes = bincode::serialize(&payload).expect("payload serialization");
    let tag = blake3::keyed_hash(secret, &payload_bytes);

    let mut bytes = payload_bytes;
    bytes.extend_from_slice(tag.as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify a token's signature and expiry, returning the embedded user id.
/// Every failure mode collapses to [`AuthError::InvalidToken`].
pub fn verify(secret: &[u8; 32], token: &str) -> Result<u64> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| AuthError::InvalidToken)?;

    if bytes.len() <= TAG_SIZE {
        return Err(AuthError::InvalidToken);
    }
    let (payload_bytes, tag) = bytes.split_at(bytes.len() - TAG_SIZE);

    let expected = blake3::keyed_hash(secret, payload_bytes);
    if expected.as_bytes()[..].ct_eq(tag).unwrap_u8() != 1 {
        return Err(AuthError::InvalidToken);
    }

    let payload: TokenPayload =
        bincode::deserialize(payload_bytes).map_err(|_| AuthError::InvalidToken)?;

    if Utc::now() > payload.expires_at {
        return Err(AuthError::InvalidToken);
    }

    Ok(payload.u_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> [u8; 32] {
        let mut s = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut s);
        s
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let secret = secret();
        let token = sign(&secret, 42, Duration::hours(24));
        assert_eq!(verify(&secret, &token).unwrap(), 42);
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let secret = secret();
        let a = sign(&secret, 7, Duration::hours(24));
        let b = sign(&secret, 7, Duration::hours(24));
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = secret();
        let token = sign(&secret, 1, Duration::seconds(-1));
        assert!(verify(&secret, &token).is_err());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = sign(&secret(), 1, Duration::hours(24));
        assert!(verify(&secret(), &token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let secret = secret();
        let token = sign(&secret, 1, Duration::hours(24));
        let mut bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        bytes[0] ^= 0xFF;
        let tampered = URL_SAFE_NO_PAD.encode(bytes);
        assert!(verify(&secret, &tampered).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let secret = secret();
        assert!(verify(&secret, "not base64 ***").is_err());
        assert!(verify(&secret, "").is_err());
        assert!(verify(&secret, &URL_SAFE_NO_PAD.encode([0u8; 8])).is_err());
    }
}
