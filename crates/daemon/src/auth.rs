use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use md5::{Digest, Md5};
use zeroize::Zeroizing;

/// Credential check for one module's `AUTHREQD` challenge.
///
/// Takes the challenge the daemon issued and the username the client sent
/// back, and returns the base64 response a correct password would have
/// produced, or `None` if the user doesn't exist. The caller compares this
/// against what the client actually sent; the trait never sees the client's
/// response itself, so a mismatched digest never touches stored secrets.
pub trait ModuleAuthenticator: Send + Sync {
    fn expected_response(&self, user: &str, challenge: &str) -> Option<String>;
}

/// A [`ModuleAuthenticator`] backed by an in-memory username/password table.
pub struct StaticModuleAuth {
    passwords: HashMap<String, Zeroizing<String>>,
}

impl StaticModuleAuth {
    #[must_use]
    pub fn new() -> Self {
        Self { passwords: HashMap::new() }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.passwords.insert(user.into(), Zeroizing::new(password.into()));
        self
    }
}

impl Default for StaticModuleAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleAuthenticator for StaticModuleAuth {
    fn expected_response(&self, user: &str, challenge: &str) -> Option<String> {
        let password = self.passwords.get(user)?;
        Some(challenge_response(password, challenge))
    }
}

/// Computes `base64_no_pad(MD5(password || challenge))`, the response both
/// the client and the daemon compute independently.
#[must_use]
pub fn challenge_response(password: &str, challenge: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(challenge.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}

static CHALLENGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a fresh per-connection challenge, unique across a daemon's
/// lifetime even under back-to-back connections in the same nanosecond.
#[must_use]
pub fn generate_challenge() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let counter = CHALLENGE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&nanos.to_le_bytes());
    bytes[8..].copy_from_slice(&counter.to_le_bytes());
    STANDARD_NO_PAD.encode(bytes)
}
