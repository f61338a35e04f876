//! Domain Entities
//!
//! Core business entities for the gate domain.

use crate::domain::value_objects::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Challenge entity - the arithmetic question a user must answer
#[derive(Debug, Clone)]
pub struct Challenge {
    pub user_id: UserId,
    pub expected_answer: String,
    pub issued_at: DateTime<Utc>,
}

impl Challenge {
    pub fn new(user_id: UserId, expected_answer: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            expected_answer: expected_answer.into(),
            issued_at,
        }
    }

    /// Expired once strictly more than `ttl_ms` has passed since issuance
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl_ms: i64) -> bool {
        (now - self.issued_at).num_milliseconds() > ttl_ms
    }

    /// Whether a submitted reply matches, ignoring surrounding whitespace
    pub fn accepts(&self, submitted: &str) -> bool {
        submitted.trim() == self.expected_answer
    }
}

/// Result of a successful account lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub name: String,
    pub banks: Vec<String>,
}

/// Aggregate usage of one daily counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    /// Identities with at least one stored day
    pub identities: u64,
    /// Sum over every stored day
    pub total_checks: u64,
    /// Sum for the current day
    pub today_checks: u64,
}
