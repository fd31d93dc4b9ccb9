//! Session State
//!
//! Connection-scoped identity handed out by the server.
//!
//! ## Transitions
//! ```text
//!   (anonymous) ── enable_encryption(key) ──► (encrypted)
//!        │                                         │
//!        └────────── start(session_key) ◄──────────┘
//!                          │
//!                          ▼
//!                     (logged in) ── end() ──► (anonymous)
//! ```
//!
//! The API key is a one-time credential: it survives `end()` and can only
//! be configured once.

use md5::{Digest, Md5};

use crate::error::{AnidbError, Result};

/// Per-connection identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    api_key: Option<String>,
    session_key: Option<String>,
    encryption_key: Option<String>,
    encryption_enabled: bool,
    logged_in: bool,
}

impl Session {
    /// Create an unauthenticated session
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the API key used for the ENCRYPT handshake
    ///
    /// Fails if a non-empty key is already present.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        if self.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            return Err(AnidbError::ApiKeyAlreadySet);
        }
        self.api_key = Some(api_key.into());
        Ok(())
    }

    /// Record a successful login
    pub fn start(&mut self, session_key: impl Into<String>) {
        self.session_key = Some(session_key.into());
        self.logged_in = true;
    }

    /// Record a completed encryption handshake
    pub fn enable_encryption(&mut self, encryption_key: impl Into<String>) {
        self.encryption_key = Some(encryption_key.into());
        self.encryption_enabled = true;
    }

    /// Drop everything the server handed out; the API key is kept
    pub fn end(&mut self) {
        self.session_key = None;
        self.encryption_key = None;
        self.encryption_enabled = false;
        self.logged_in = false;
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_enabled
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref()
    }

    pub fn encryption_key(&self) -> Option<&str> {
        self.encryption_key.as_deref()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Session encryption key: hex MD5 of the API key followed by the salt the
/// server sent with its ENCRYPTION ENABLED reply
pub fn derive_encryption_key(api_key: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(api_key.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
