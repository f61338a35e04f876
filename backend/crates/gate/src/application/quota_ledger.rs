//! Quota Ledger Use Case
//!
//! Per-identity, per-day check counters.

use crate::application::config::GateConfig;
use crate::domain::entities::LedgerStats;
use crate::domain::repository::CounterRepository;
use crate::domain::value_objects::{Identity, QuotaKind, Remaining};
use crate::error::GateResult;
use std::sync::Arc;

/// Quota Ledger
pub struct QuotaLedger<R>
where
    R: CounterRepository,
{
    counter_repo: Arc<R>,
    config: Arc<GateConfig>,
}

impl<R> QuotaLedger<R>
where
    R: CounterRepository,
{
    pub fn new(counter_repo: Arc<R>, config: Arc<GateConfig>) -> Self {
        Self {
            counter_repo,
            config,
        }
    }

    /// Administrator under the user counter
    fn is_admin(&self, identity: &Identity) -> bool {
        matches!(identity, Identity::User(user) if self.config.is_admin(user))
    }

    /// Identities the ledger never counts
    fn is_exempt(&self, identity: &Identity) -> bool {
        match identity {
            Identity::User(user) => self.config.is_admin(user),
            Identity::Ip(ip) => ip.is_unknown(),
        }
    }

    /// Whether the identity has headroom today
    ///
    /// Also creates today's zero entry, so a following `remaining` reads the
    /// stored value rather than the default.
    pub async fn can_proceed(&self, identity: &Identity) -> GateResult<bool> {
        if self.is_exempt(identity) {
            return Ok(true);
        }

        let day = self.config.today();
        let count = self.counter_repo.get_or_init(identity, &day).await?;
        let quota = self.config.quota_for(identity.kind());
        let allowed = quota.allows(count);

        if !allowed {
            tracing::info!(
                identity = %identity,
                count = count,
                limit = quota.max_per_day,
                day = %day,
                "Daily quota exhausted"
            );
        }

        Ok(allowed)
    }

    /// Checks left today; may be negative
    pub async fn remaining(&self, identity: &Identity) -> GateResult<Remaining> {
        if self.is_admin(identity) {
            return Ok(Remaining::Unlimited);
        }

        let day = self.config.today();
        let count = self.counter_repo.count(identity, &day).await?;
        Ok(Remaining::Limited(
            self.config.quota_for(identity.kind()).remaining(count),
        ))
    }

    /// Count one completed check
    pub async fn record(&self, identity: &Identity) -> GateResult<()> {
        if self.is_exempt(identity) {
            return Ok(());
        }

        let day = self.config.today();
        let count = self.counter_repo.increment(identity, &day).await?;

        tracing::debug!(identity = %identity, count = count, day = %day, "Check recorded");

        Ok(())
    }

    /// Zero today's count for one identity; false when there was nothing to zero
    pub async fn reset_today(&self, identity: &Identity) -> GateResult<bool> {
        let day = self.config.today();
        let reset = self.counter_repo.reset(identity, &day).await?;

        tracing::info!(identity = %identity, day = %day, reset = reset, "Daily quota reset");

        Ok(reset)
    }

    /// Zero today's count for every identity of a kind
    pub async fn reset_all_today(&self, kind: QuotaKind) -> GateResult<u64> {
        let day = self.config.today();
        let reset = self.counter_repo.reset_all(kind, &day).await?;

        tracing::info!(kind = %kind, reset = reset, day = %day, "Daily quotas reset");

        Ok(reset)
    }

    /// Usage summary of a kind
    pub async fn stats(&self, kind: QuotaKind) -> GateResult<LedgerStats> {
        let day = self.config.today();
        self.counter_repo.stats(kind, &day).await
    }
}
