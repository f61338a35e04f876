//! HTTP Handlers

use crate::application::admit_check::AdmitCheckUseCase;
use crate::application::challenge_gate::ChallengeGate;
use crate::application::check_account::{CheckAccountInput, CheckAccountOutput, CheckAccountUseCase};
use crate::application::config::GateConfig;
use crate::application::quota_ledger::QuotaLedger;
use crate::domain::entities::LedgerStats;
use crate::domain::repository::{AccountLookup, ChallengeRepository, CounterRepository};
use crate::domain::value_objects::{AccountNumber, Identity, IpIdentity, QuotaKind, UserId};
use crate::error::{GateError, GateResult};
use crate::presentation::dto::{
    AdmitResponse, ChallengeStatusResponse, CheckRequest, CheckResponse, IdentityRequest,
    RemainingResponse, ResetRequest, ResetResponse, StatsQuery, VerifyRequest, VerifyResponse,
};
use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use platform::client::resolve_client_address;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Shared state for gate handlers
pub struct GateAppState<R, L>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub lookup: Arc<L>,
    pub config: Arc<GateConfig>,
}

impl<R, L> Clone for GateAppState<R, L>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            lookup: self.lookup.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, L> GateAppState<R, L>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    fn admission(&self) -> AdmitCheckUseCase<R, R> {
        AdmitCheckUseCase::new(self.repo.clone(), self.repo.clone(), self.config.clone())
    }

    fn ledger(&self) -> QuotaLedger<R> {
        QuotaLedger::new(self.repo.clone(), self.config.clone())
    }

    fn challenges(&self) -> ChallengeGate<R> {
        ChallengeGate::new(self.repo.clone(), self.config.clone())
    }

    fn require_admin(&self, requester_id: &str) -> GateResult<UserId> {
        let requester = UserId::new(requester_id)?;
        if !self.config.is_admin(&requester) {
            tracing::warn!(requester = %requester, "Administrative call from non-admin");
            return Err(GateError::Forbidden);
        }
        Ok(requester)
    }
}

/// Peer address of the TCP connection, when the server exposes it
pub struct PeerIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for PeerIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PeerIp(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip()),
        ))
    }
}

fn client_ip(explicit: Option<&str>, headers: &HeaderMap, peer: Option<IpAddr>) -> IpIdentity {
    IpIdentity::new(resolve_client_address(explicit, headers, peer))
}

/// POST /api/gate/check
pub async fn check_account<R, L>(
    State(state): State<GateAppState<R, L>>,
    headers: HeaderMap,
    PeerIp(peer): PeerIp,
    Json(req): Json<CheckRequest>,
) -> GateResult<Response>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let input = CheckAccountInput {
        user_id: UserId::new(req.user_id)?,
        ip: client_ip(req.ip.as_deref(), &headers, peer),
        account: AccountNumber::new(req.account_number)?,
    };

    let use_case = CheckAccountUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.lookup.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(input).await?;

    let status = match output {
        CheckAccountOutput::Completed { .. } => StatusCode::OK,
        CheckAccountOutput::Denied { .. } => StatusCode::TOO_MANY_REQUESTS,
    };

    Ok((status, Json(CheckResponse::from(output))).into_response())
}

/// POST /api/gate/admit
pub async fn admit<R, L>(
    State(state): State<GateAppState<R, L>>,
    headers: HeaderMap,
    PeerIp(peer): PeerIp,
    Json(req): Json<IdentityRequest>,
) -> GateResult<Json<AdmitResponse>>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let user_id = UserId::new(req.user_id)?;
    let ip = client_ip(req.ip.as_deref(), &headers, peer);

    let admission = state.admission().execute(&user_id, &ip).await?;

    Ok(Json(AdmitResponse::from(admission)))
}

/// POST /api/gate/record
pub async fn record<R, L>(
    State(state): State<GateAppState<R, L>>,
    headers: HeaderMap,
    PeerIp(peer): PeerIp,
    Json(req): Json<IdentityRequest>,
) -> GateResult<StatusCode>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let user_id = UserId::new(req.user_id)?;
    let ip = client_ip(req.ip.as_deref(), &headers, peer);

    state.admission().record(&user_id, &ip).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/gate/challenge/{user_id}
pub async fn challenge_status<R, L>(
    State(state): State<GateAppState<R, L>>,
    Path(user_id): Path<String>,
) -> GateResult<Json<ChallengeStatusResponse>>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let user_id = UserId::new(user_id)?;
    let pending = state.challenges().has_pending(&user_id).await?;

    Ok(Json(ChallengeStatusResponse { pending }))
}

/// POST /api/gate/challenge/{user_id}/verify
pub async fn verify_challenge<R, L>(
    State(state): State<GateAppState<R, L>>,
    Path(user_id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> GateResult<Json<VerifyResponse>>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let user_id = UserId::new(user_id)?;
    let verified = state.challenges().verify(&user_id, &req.answer).await?;

    Ok(Json(VerifyResponse { verified }))
}

/// GET /api/gate/users/{user_id}/remaining
pub async fn remaining<R, L>(
    State(state): State<GateAppState<R, L>>,
    Path(user_id): Path<String>,
) -> GateResult<Json<RemainingResponse>>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let identity = Identity::User(UserId::new(user_id)?);
    let remaining = state.ledger().remaining(&identity).await?;

    Ok(Json(RemainingResponse { remaining }))
}

/// POST /api/gate/admin/reset
pub async fn admin_reset<R, L>(
    State(state): State<GateAppState<R, L>>,
    Json(req): Json<ResetRequest>,
) -> GateResult<Json<ResetResponse>>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let requester = state.require_admin(&req.requester_id)?;
    let ledger = state.ledger();

    let reset = if req.targets_all() {
        ledger.reset_all_today(req.kind).await?
    } else {
        let identity = match req.kind {
            QuotaKind::User => Identity::User(UserId::new(req.target.as_str())?),
            QuotaKind::Ip => Identity::Ip(IpIdentity::new(req.target.as_str())),
        };
        u64::from(ledger.reset_today(&identity).await?)
    };

    tracing::info!(requester = %requester, target = %req.target, kind = %req.kind, reset = reset, "Admin reset");

    Ok(Json(ResetResponse { reset }))
}

/// GET /api/gate/admin/stats
pub async fn admin_stats<R, L>(
    State(state): State<GateAppState<R, L>>,
    Query(query): Query<StatsQuery>,
) -> GateResult<Json<LedgerStats>>
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    state.require_admin(&query.requester_id)?;
    let stats = state.ledger().stats(query.kind).await?;

    Ok(Json(stats))
}
