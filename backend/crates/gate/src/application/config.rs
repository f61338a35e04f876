//! Application Configuration
//!
//! Configuration for the gate application layer.

use crate::domain::value_objects::{QuotaKind, UserId};
use chrono::{FixedOffset, Offset, Utc};
use platform::rate_limit::{DailyQuota, DayKey};
use std::time::Duration;

/// Gate application configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Checks per user per day
    pub user_daily_limit: u32,
    /// Checks per IP address per day
    pub ip_daily_limit: u32,
    /// Challenge validity window
    pub challenge_ttl: Duration,
    /// Identity exempt from the user quota
    pub admin_id: Option<UserId>,
    /// Offset in which calendar days are counted
    pub day_offset: FixedOffset,
    /// Bearer token every caller must present; `None` accepts any caller
    pub service_token: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            user_daily_limit: 10,
            ip_daily_limit: 20,
            challenge_ttl: Duration::from_secs(10 * 60),
            admin_id: None,
            day_offset: Utc.fix(),
            service_token: None,
        }
    }
}

impl GateConfig {
    /// Default configuration with an administrator
    pub fn with_admin(admin_id: UserId) -> Self {
        Self {
            admin_id: Some(admin_id),
            ..Default::default()
        }
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.admin_id.as_ref() == Some(user_id)
    }

    pub fn quota_for(&self, kind: QuotaKind) -> DailyQuota {
        match kind {
            QuotaKind::User => DailyQuota::new(self.user_daily_limit),
            QuotaKind::Ip => DailyQuota::new(self.ip_daily_limit),
        }
    }

    /// Challenge TTL in milliseconds, saturating at `i64::MAX`
    pub fn challenge_ttl_ms(&self) -> i64 {
        i64::try_from(self.challenge_ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Current quota window
    pub fn today(&self) -> DayKey {
        DayKey::today(&self.day_offset)
    }
}
