//! Challenge Gate Use Case

use crate::application::config::GateConfig;
use crate::domain::entities::Challenge;
use crate::domain::repository::ChallengeRepository;
use crate::domain::services::ArithmeticChallenge;
use crate::domain::value_objects::UserId;
use crate::error::GateResult;
use chrono::Utc;
use std::sync::Arc;

/// Challenge Gate
///
/// Expiry is enforced by readers; nothing sweeps in the background.
pub struct ChallengeGate<C>
where
    C: ChallengeRepository,
{
    challenge_repo: Arc<C>,
    config: Arc<GateConfig>,
}

impl<C> ChallengeGate<C>
where
    C: ChallengeRepository,
{
    pub fn new(challenge_repo: Arc<C>, config: Arc<GateConfig>) -> Self {
        Self {
            challenge_repo,
            config,
        }
    }

    /// Load the user's challenge, discarding it if expired
    async fn live_challenge(&self, user_id: &UserId) -> GateResult<Option<Challenge>> {
        let Some(challenge) = self.challenge_repo.get(user_id).await? else {
            return Ok(None);
        };

        if challenge.is_expired_at(Utc::now(), self.config.challenge_ttl_ms()) {
            self.challenge_repo.delete(user_id).await?;
            tracing::info!(user_id = %user_id, "Challenge expired");
            return Ok(None);
        }

        Ok(Some(challenge))
    }

    /// Whether the user has an unexpired challenge
    pub async fn has_pending(&self, user_id: &UserId) -> GateResult<bool> {
        Ok(self.live_challenge(user_id).await?.is_some())
    }

    /// Issue a new challenge, replacing any previous one; returns the question
    pub async fn issue(&self, user_id: &UserId) -> GateResult<String> {
        let arithmetic = ArithmeticChallenge::generate(&mut rand::rng());
        let challenge = Challenge::new(user_id.clone(), arithmetic.answer(), Utc::now());

        self.challenge_repo.put(&challenge).await?;

        tracing::info!(user_id = %user_id, "Issued challenge");

        Ok(arithmetic.question())
    }

    /// Check a reply
    ///
    /// A correct reply or an expired challenge consumes the record. A wrong
    /// reply leaves it in place, so the user may retry until expiry.
    pub async fn verify(&self, user_id: &UserId, submitted: &str) -> GateResult<bool> {
        let Some(challenge) = self.live_challenge(user_id).await? else {
            return Ok(false);
        };

        if challenge.accepts(submitted) {
            self.challenge_repo.delete(user_id).await?;
            tracing::info!(user_id = %user_id, "Challenge solved");
            return Ok(true);
        }

        tracing::warn!(user_id = %user_id, "Wrong challenge answer");
        Ok(false)
    }
}
