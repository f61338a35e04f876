//! Repository Traits
//!
//! Interfaces for data persistence and the lookup collaborator.
//! Implementations are in the infrastructure layer.

use crate::domain::entities::{AccountInfo, Challenge, LedgerStats};
use crate::domain::value_objects::{AccountNumber, Identity, QuotaKind, UserId};
use crate::error::GateResult;
use platform::rate_limit::DayKey;

/// Daily counter storage
///
/// Every method is a single atomic operation on the store. Absent entries read
/// as zero.
#[trait_variant::make(CounterRepository: Send)]
pub trait LocalCounterRepository {
    /// Count for the day, creating a zero entry when absent
    async fn get_or_init(&self, identity: &Identity, day: &DayKey) -> GateResult<u32>;

    /// Count for the day without creating anything
    async fn count(&self, identity: &Identity, day: &DayKey) -> GateResult<u32>;

    /// Add one and return the new count
    async fn increment(&self, identity: &Identity, day: &DayKey) -> GateResult<u32>;

    /// Zero the count for one identity; false when it was already zero or absent
    async fn reset(&self, identity: &Identity, day: &DayKey) -> GateResult<bool>;

    /// Zero every non-zero count of a kind; returns how many were zeroed
    async fn reset_all(&self, kind: QuotaKind, day: &DayKey) -> GateResult<u64>;

    /// Aggregate usage of a kind
    async fn stats(&self, kind: QuotaKind, day: &DayKey) -> GateResult<LedgerStats>;
}

/// Pending challenge storage, at most one per user
#[trait_variant::make(ChallengeRepository: Send)]
pub trait LocalChallengeRepository {
    /// Store a challenge, replacing any previous one for the same user
    async fn put(&self, challenge: &Challenge) -> GateResult<()>;

    /// Stored challenge, expired or not
    async fn get(&self, user_id: &UserId) -> GateResult<Option<Challenge>>;

    /// Remove the user's challenge (no-op when absent)
    async fn delete(&self, user_id: &UserId) -> GateResult<()>;
}

/// Account lookup collaborator
#[trait_variant::make(AccountLookup: Send)]
pub trait LocalAccountLookup {
    /// `Ok(None)` when the account does not exist
    async fn lookup(&self, account: &AccountNumber) -> GateResult<Option<AccountInfo>>;
}
