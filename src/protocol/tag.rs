//! Correlation tags
//!
//! Every request carries a short tag that the server echoes back, which is
//! the only way to pair a reply with the request that caused it.
//!
//! ## Tag Shape
//! ```text
//! ┌─────┬───────────────────────┐
//! │ '_' │ 4 × [0-9A-Za-z]       │
//! └─────┴───────────────────────┘
//! ```

use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use rand::Rng;

/// Leading sentinel character of every tag
pub const TAG_SENTINEL: char = '_';

/// Number of alphanumeric characters after the sentinel
pub const TAG_BODY_LEN: usize = 4;

const TAG_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A tag reserved in a [`TagRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationTag(String);

impl CorrelationTag {
    /// Lexical check only; says nothing about whether the tag is reserved
    pub fn is_valid(text: &str) -> bool {
        let mut chars = text.chars();
        chars.next() == Some(TAG_SENTINEL)
            && text.len() == 1 + TAG_BODY_LEN
            && chars.all(|c| c.is_ascii_alphanumeric())
    }

    /// Wrap a token that has the tag shape
    pub fn parse(text: &str) -> Option<Self> {
        Self::is_valid(text).then(|| Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of tags currently held by live requests
///
/// ## Concurrency
/// One short-lived lock per call. Callers must not hold the awaiting-reply
/// lock while calling into the registry.
#[derive(Debug, Default)]
pub struct TagRegistry {
    in_use: Mutex<HashSet<String>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a tag no live request holds
    ///
    /// Collisions only cost another draw.
    pub fn reserve(&self) -> CorrelationTag {
        let mut rng = rand::rng();
        loop {
            let candidate = Self::generate(&mut rng);
            if self.in_use.lock().insert(candidate.clone()) {
                return CorrelationTag(candidate);
            }
            tracing::trace!("Tag collision on {}, retrying", candidate);
        }
    }

    /// Return a tag to the pool
    ///
    /// Returns false (and logs) if the tag was not held; nothing else is
    /// touched in that case.
    pub fn release(&self, tag: &CorrelationTag) -> bool {
        let removed = self.in_use.lock().remove(tag.as_str());
        if !removed {
            tracing::error!("Released tag {} that was not reserved", tag);
        }
        removed
    }

    /// Whether `tag` is currently reserved
    pub fn is_reserved(&self, tag: &str) -> bool {
        self.in_use.lock().contains(tag)
    }

    /// Number of tags currently reserved
    pub fn len(&self) -> usize {
        self.in_use.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn generate<R: Rng>(rng: &mut R) -> String {
        let mut tag = String::with_capacity(1 + TAG_BODY_LEN);
        tag.push(TAG_SENTINEL);
        for _ in 0..TAG_BODY_LEN {
            tag.push(TAG_CHARS[rng.random_range(0..TAG_CHARS.len())] as char);
        }
        tag
    }
}
