//! Admit Check Use Case
//!
//! Decides whether a check request may reach the account lookup, and counts
//! it once the lookup has run.

use crate::application::challenge_gate::ChallengeGate;
use crate::application::config::GateConfig;
use crate::application::quota_ledger::QuotaLedger;
use crate::domain::repository::{ChallengeRepository, CounterRepository};
use crate::domain::value_objects::{Identity, IpIdentity, UserId};
use crate::error::GateResult;
use serde::Serialize;
use std::sync::Arc;

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// An earlier challenge is still unanswered
    PendingChallenge,
    /// The address used up its daily checks
    IpLimit,
    /// The user used up their daily checks
    UserLimit,
}

/// Admission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied {
        reason: DenialReason,
        /// Set when this denial issued a new challenge
        challenge_question: Option<String>,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Admit Check Use Case
pub struct AdmitCheckUseCase<R, C>
where
    R: CounterRepository,
    C: ChallengeRepository,
{
    ledger: QuotaLedger<R>,
    gate: ChallengeGate<C>,
    config: Arc<GateConfig>,
}

impl<R, C> AdmitCheckUseCase<R, C>
where
    R: CounterRepository,
    C: ChallengeRepository,
{
    pub fn new(counter_repo: Arc<R>, challenge_repo: Arc<C>, config: Arc<GateConfig>) -> Self {
        Self {
            ledger: QuotaLedger::new(counter_repo, config.clone()),
            gate: ChallengeGate::new(challenge_repo, config.clone()),
            config,
        }
    }

    /// Decide on a check request from `user_id` at `ip`
    ///
    /// The address quota is consulted before the user quota. Storage faults
    /// fail closed except for the address quota, which fails open.
    pub async fn execute(&self, user_id: &UserId, ip: &IpIdentity) -> GateResult<Admission> {
        if self.gate.has_pending(user_id).await? {
            tracing::info!(user_id = %user_id, "Check refused: challenge pending");
            return Ok(Admission::Denied {
                reason: DenialReason::PendingChallenge,
                challenge_question: None,
            });
        }

        if self.config.is_admin(user_id) {
            return Ok(Admission::Allowed);
        }

        let ip_allowed = match self.ledger.can_proceed(&Identity::Ip(ip.clone())).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::error!(error = %e, ip = %ip, "IP quota unreadable, letting request through");
                true
            }
        };

        if !ip_allowed {
            return self.deny(user_id, DenialReason::IpLimit).await;
        }

        if !self
            .ledger
            .can_proceed(&Identity::User(user_id.clone()))
            .await?
        {
            return self.deny(user_id, DenialReason::UserLimit).await;
        }

        Ok(Admission::Allowed)
    }

    /// Count a completed check against the user and, for non-admins, the address
    pub async fn record(&self, user_id: &UserId, ip: &IpIdentity) -> GateResult<()> {
        self.ledger.record(&Identity::User(user_id.clone())).await?;

        if !self.config.is_admin(user_id) {
            if let Err(e) = self.ledger.record(&Identity::Ip(ip.clone())).await {
                tracing::error!(error = %e, ip = %ip, "Failed to record IP check");
            }
        }

        Ok(())
    }

    /// Quota ledger used by this admission flow
    pub fn ledger(&self) -> &QuotaLedger<R> {
        &self.ledger
    }

    async fn deny(&self, user_id: &UserId, reason: DenialReason) -> GateResult<Admission> {
        let question = self.gate.issue(user_id).await?;

        tracing::info!(user_id = %user_id, reason = ?reason, "Check refused: quota exhausted");

        Ok(Admission::Denied {
            reason,
            challenge_question: Some(question),
        })
    }
}
