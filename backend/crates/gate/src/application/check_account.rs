//! Check Account Use Case

use crate::application::admit_check::{Admission, AdmitCheckUseCase, DenialReason};
use crate::application::config::GateConfig;
use crate::domain::entities::AccountInfo;
use crate::domain::repository::{AccountLookup, ChallengeRepository, CounterRepository};
use crate::domain::value_objects::{AccountNumber, Identity, IpIdentity, Remaining, UserId};
use crate::error::GateResult;
use std::sync::Arc;

/// Input DTO for check account
#[derive(Debug, Clone)]
pub struct CheckAccountInput {
    pub user_id: UserId,
    pub ip: IpIdentity,
    pub account: AccountNumber,
}

/// What the lookup produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(AccountInfo),
    NotFound,
    Failed(String),
}

/// Output DTO for check account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckAccountOutput {
    Completed {
        lookup: LookupOutcome,
        remaining: Remaining,
    },
    Denied {
        reason: DenialReason,
        challenge_question: Option<String>,
    },
}

/// Check Account Use Case
pub struct CheckAccountUseCase<R, C, L>
where
    R: CounterRepository,
    C: ChallengeRepository,
    L: AccountLookup,
{
    admission: AdmitCheckUseCase<R, C>,
    lookup: Arc<L>,
}

impl<R, C, L> CheckAccountUseCase<R, C, L>
where
    R: CounterRepository,
    C: ChallengeRepository,
    L: AccountLookup,
{
    pub fn new(
        counter_repo: Arc<R>,
        challenge_repo: Arc<C>,
        lookup: Arc<L>,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            admission: AdmitCheckUseCase::new(counter_repo, challenge_repo, config),
            lookup,
        }
    }

    /// Admit, look up, then count the check
    ///
    /// The check is counted whatever the lookup returns. No store is touched
    /// while the lookup runs.
    pub async fn execute(&self, input: CheckAccountInput) -> GateResult<CheckAccountOutput> {
        if let Admission::Denied {
            reason,
            challenge_question,
        } = self.admission.execute(&input.user_id, &input.ip).await?
        {
            return Ok(CheckAccountOutput::Denied {
                reason,
                challenge_question,
            });
        }

        tracing::info!(user_id = %input.user_id, account = %input.account, "Checking account");

        let lookup = match self.lookup.lookup(&input.account).await {
            Ok(Some(info)) => LookupOutcome::Found(info),
            Ok(None) => LookupOutcome::NotFound,
            Err(e) => {
                tracing::warn!(error = %e, account = %input.account, "Account check error");
                LookupOutcome::Failed(e.to_string())
            }
        };

        self.admission.record(&input.user_id, &input.ip).await?;

        let remaining = self
            .admission
            .ledger()
            .remaining(&Identity::User(input.user_id.clone()))
            .await?;

        Ok(CheckAccountOutput::Completed { lookup, remaining })
    }
}
