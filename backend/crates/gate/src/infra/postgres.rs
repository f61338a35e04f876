//! PostgreSQL Repository Implementations

use crate::domain::entities::{Challenge, LedgerStats};
use crate::domain::repository::{ChallengeRepository, CounterRepository};
use crate::domain::value_objects::{Identity, QuotaKind, UserId};
use crate::error::GateResult;
use chrono::{DateTime, Utc};
use platform::rate_limit::DayKey;
use sqlx::PgPool;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgGateRepository {
    pool: PgPool,
}

impl PgGateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete challenges older than the TTL
    pub async fn cleanup_expired(&self, challenge_ttl_ms: i64) -> GateResult<u64> {
        let Some(cutoff) = chrono::Duration::try_milliseconds(challenge_ttl_ms)
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return Ok(0);
        };

        let challenges_deleted = sqlx::query("DELETE FROM gate_challenges WHERE issued_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(challenges = challenges_deleted, "Cleaned up expired challenges");

        Ok(challenges_deleted)
    }
}

impl CounterRepository for PgGateRepository {
    async fn get_or_init(&self, identity: &Identity, day: &DayKey) -> GateResult<u32> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let row = sqlx::query_as::<_, (i32,)>(
            r#"
            INSERT INTO gate_daily_counters (quota_kind, identity, day_key, check_count)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (quota_kind, identity, day_key)
            DO UPDATE SET check_count = gate_daily_counters.check_count
            RETURNING check_count
            "#,
        )
        .bind(identity.kind().as_str())
        .bind(identity.key())
        .bind(day.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count_from_row(row.0))
    }

    async fn count(&self, identity: &Identity, day: &DayKey) -> GateResult<u32> {
        let row = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT check_count
            FROM gate_daily_counters
            WHERE quota_kind = $1 AND identity = $2 AND day_key = $3
            "#,
        )
        .bind(identity.kind().as_str())
        .bind(identity.key())
        .bind(day.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(count_from_row).unwrap_or(0))
    }

    async fn increment(&self, identity: &Identity, day: &DayKey) -> GateResult<u32> {
        let row = sqlx::query_as::<_, (i32,)>(
            r#"
            INSERT INTO gate_daily_counters (quota_kind, identity, day_key, check_count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (quota_kind, identity, day_key)
            DO UPDATE SET
                check_count = gate_daily_counters.check_count + 1,
                updated_at = now()
            RETURNING check_count
            "#,
        )
        .bind(identity.kind().as_str())
        .bind(identity.key())
        .bind(day.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count_from_row(row.0))
    }

    async fn reset(&self, identity: &Identity, day: &DayKey) -> GateResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE gate_daily_counters
            SET check_count = 0, updated_at = now()
            WHERE quota_kind = $1 AND identity = $2 AND day_key = $3 AND check_count > 0
            "#,
        )
        .bind(identity.kind().as_str())
        .bind(identity.key())
        .bind(day.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reset_all(&self, kind: QuotaKind, day: &DayKey) -> GateResult<u64> {
        let reset = sqlx::query(
            r#"
            UPDATE gate_daily_counters
            SET check_count = 0, updated_at = now()
            WHERE quota_kind = $1 AND day_key = $2 AND check_count > 0
            "#,
        )
        .bind(kind.as_str())
        .bind(day.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(reset)
    }

    async fn stats(&self, kind: QuotaKind, day: &DayKey) -> GateResult<LedgerStats> {
        let (identities, total, today) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(DISTINCT identity),
                COALESCE(SUM(check_count), 0)::BIGINT,
                COALESCE(SUM(check_count) FILTER (WHERE day_key = $2), 0)::BIGINT
            FROM gate_daily_counters
            WHERE quota_kind = $1
            "#,
        )
        .bind(kind.as_str())
        .bind(day.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerStats {
            identities: identities.max(0) as u64,
            total_checks: total.max(0) as u64,
            today_checks: today.max(0) as u64,
        })
    }
}

impl ChallengeRepository for PgGateRepository {
    async fn put(&self, challenge: &Challenge) -> GateResult<()> {
        sqlx::query(
            r#"
            INSERT INTO gate_challenges (user_id, expected_answer, issued_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET
                expected_answer = EXCLUDED.expected_answer,
                issued_at = EXCLUDED.issued_at
            "#,
        )
        .bind(challenge.user_id.as_str())
        .bind(&challenge.expected_answer)
        .bind(challenge.issued_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: &UserId) -> GateResult<Option<Challenge>> {
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT user_id, expected_answer, issued_at
            FROM gate_challenges
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_challenge(user_id)))
    }

    async fn delete(&self, user_id: &UserId) -> GateResult<()> {
        sqlx::query("DELETE FROM gate_challenges WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// CHECK (check_count >= 0) keeps this lossless
fn count_from_row(count: i32) -> u32 {
    u32::try_from(count).unwrap_or(0)
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct ChallengeRow {
    #[allow(dead_code)]
    user_id: String,
    expected_answer: String,
    issued_at: DateTime<Utc>,
}

impl ChallengeRow {
    fn into_challenge(self, user_id: &UserId) -> Challenge {
        Challenge::new(user_id.clone(), self.expected_answer, self.issued_at)
    }
}
