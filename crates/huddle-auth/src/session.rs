//! The [`SessionManager`]: token lifecycle and one-time reset codes.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::RngCore;
use tokio::sync::Mutex;

use crate::error::{AuthError, Result};
use crate::token;

const RESET_CODE_LEN: usize = 6;
const RESET_CODE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

struct SessionState {
    /// Process-wide signing secret, generated from the OS RNG.
    secret: [u8; 32],
    /// Tokens explicitly revoked by logout.
    invalid_tokens: HashSet<String>,
    /// Outstanding reset codes, each mapping to exactly one user.
    reset_codes: HashMap<String, u64>,
}

impl SessionState {
    fn fresh() -> Self {
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        SessionState {
            secret,
            invalid_tokens: HashSet::new(),
            reset_codes: HashMap::new(),
        }
    }
}

/// Issues, verifies and revokes session tokens, and manages one-time
/// password-reset codes.  All state is process-local and independent of the
/// persisted entity graph.
pub struct SessionManager {
    ttl: Duration,
    inner: Mutex<SessionState>,
}

impl SessionManager {
    /// Create a manager whose tokens live for `ttl` from issuance.
    pub fn new(ttl: Duration) -> Self {
        SessionManager {
            ttl,
            inner: Mutex::new(SessionState::fresh()),
        }
    }

    /// Discard the secret and all session state.  Every outstanding token
    /// and reset code becomes invalid.  Used for test isolation.
    pub async fn reset(&self) {
        *self.inner.lock().await = SessionState::fresh();
    }

    /// Issue a fresh token for a user.  Never fails.
    pub async fn issue_token(&self, u_id: u64) -> String {
        let state = self.inner.lock().await;
        token::sign(&state.secret, u_id, self.ttl)
    }

    /// Verify a token, returning the embedded user id.  This is the single
    /// authorization gate for every operation.
    pub async fn verify_token(&self, token: &str) -> Result<u64> {
        let state = self.inner.lock().await;
        if state.invalid_tokens.contains(token) {
            return Err(AuthError::InvalidToken);
        }
        token::verify(&state.secret, token)
    }

    /// Revoke a token.  Idempotent.
    pub async fn invalidate(&self, token: &str) {
        let mut state = self.inner.lock().await;
        state.invalid_tokens.insert(token.to_string());
    }

    /// Generate a reset code for a user, unique among the codes currently
    /// outstanding.
    pub async fn issue_reset_code(&self, u_id: u64) -> String {
        let mut state = self.inner.lock().await;
        let mut rng = rand::rngs::OsRng;
        loop {
            let code: String = (0..RESET_CODE_LEN)
                .map(|_| *RESET_CODE_ALPHABET.choose(&mut rng).expect("alphabet") as char)
                .collect();
            if !state.reset_codes.contains_key(&code) {
                state.reset_codes.insert(code.clone(), u_id);
                return code;
            }
        }
    }

    /// Look up the user a code was issued for without consuming it.
    pub async fn reset_code_user(&self, code: &str) -> Result<u64> {
        let state = self.inner.lock().await;
        state
            .reset_codes
            .get(code)
            .copied()
            .ok_or(AuthError::InvalidResetCode)
    }

    /// Consume a reset code: returns the mapped user id and removes the
    /// code, so a second attempt with the same code fails.
    pub async fn consume_reset_code(&self, code: &str) -> Result<u64> {
        let mut state = self.inner.lock().await;
        state
            .reset_codes
            .remove(code)
            .ok_or(AuthError::InvalidResetCode)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}
