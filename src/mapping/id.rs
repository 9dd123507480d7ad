//! Identifier generation for mapping ids and generated record ids

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Id policy, resolved per id parameter when a record is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdPattern {
    /// Process-local counter starting at 1 (not restart-safe)
    Sequence,
    /// Random UUID v4
    Uuid,
}

/// Produces sequence or random identifiers
#[derive(Debug, Default)]
pub struct IdGenerator {
    sequence: AtomicU64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    pub fn generate(&self, pattern: IdPattern) -> String {
        match pattern {
            IdPattern::Sequence => (self.sequence.fetch_add(1, Ordering::SeqCst) + 1).to_string(),
            IdPattern::Uuid => uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Unspecified patterns fall back to UUID
    pub fn generate_or_uuid(&self, pattern: Option<IdPattern>) -> String {
        self.generate(pattern.unwrap_or(IdPattern::Uuid))
    }
}
