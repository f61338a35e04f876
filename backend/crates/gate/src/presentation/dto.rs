//! API DTOs (Data Transfer Objects)

use crate::application::admit_check::{Admission, DenialReason};
use crate::application::check_account::{CheckAccountOutput, LookupOutcome};
use crate::domain::entities::AccountInfo;
use crate::domain::value_objects::{QuotaKind, Remaining};
use serde::{Deserialize, Serialize};

/// Request for POST /api/gate/check
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub user_id: String,
    pub account_number: String,
    /// Client address as seen by the bot front end
    #[serde(default)]
    pub ip: Option<String>,
}

/// Request for POST /api/gate/admit and POST /api/gate/record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRequest {
    pub user_id: String,
    #[serde(default)]
    pub ip: Option<String>,
}

/// How the lookup went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Found,
    NotFound,
    Failed,
}

/// Response for POST /api/gate/check
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CheckResponse {
    Completed {
        lookup: LookupStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        account: Option<AccountInfo>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        remaining: Remaining,
    },
    Denied {
        reason: DenialReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge_question: Option<String>,
    },
}

impl From<CheckAccountOutput> for CheckResponse {
    fn from(output: CheckAccountOutput) -> Self {
        match output {
            CheckAccountOutput::Completed { lookup, remaining } => {
                let (lookup, account, error) = match lookup {
                    LookupOutcome::Found(info) => (LookupStatus::Found, Some(info), None),
                    LookupOutcome::NotFound => (LookupStatus::NotFound, None, None),
                    LookupOutcome::Failed(message) => (LookupStatus::Failed, None, Some(message)),
                };
                CheckResponse::Completed {
                    lookup,
                    account,
                    error,
                    remaining,
                }
            }
            CheckAccountOutput::Denied {
                reason,
                challenge_question,
            } => CheckResponse::Denied {
                reason,
                challenge_question,
            },
        }
    }
}

/// Response for POST /api/gate/admit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_question: Option<String>,
}

impl From<Admission> for AdmitResponse {
    fn from(admission: Admission) -> Self {
        match admission {
            Admission::Allowed => Self {
                allowed: true,
                reason: None,
                challenge_question: None,
            },
            Admission::Denied {
                reason,
                challenge_question,
            } => Self {
                allowed: false,
                reason: Some(reason),
                challenge_question,
            },
        }
    }
}

/// Response for GET /api/gate/challenge/{user_id}
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeStatusResponse {
    pub pending: bool,
}

/// Request for POST /api/gate/challenge/{user_id}/verify
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub answer: String,
}

/// Response for POST /api/gate/challenge/{user_id}/verify
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// Response for GET /api/gate/users/{user_id}/remaining
#[derive(Debug, Clone, Serialize)]
pub struct RemainingResponse {
    pub remaining: Remaining,
}

/// Request for POST /api/gate/admin/reset
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub requester_id: String,
    /// `"all"` or a single identity
    pub target: String,
    #[serde(default = "default_kind")]
    pub kind: QuotaKind,
}

impl ResetRequest {
    pub const ALL: &'static str = "all";

    pub fn targets_all(&self) -> bool {
        self.target.trim().eq_ignore_ascii_case(Self::ALL)
    }
}

/// Response for POST /api/gate/admin/reset
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub reset: u64,
}

/// Query for GET /api/gate/admin/stats
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub requester_id: String,
    #[serde(default = "default_kind")]
    pub kind: QuotaKind,
}

fn default_kind() -> QuotaKind {
    QuotaKind::User
}
