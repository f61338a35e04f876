//! Gate Router

use crate::application::config::GateConfig;
use crate::domain::repository::{AccountLookup, ChallengeRepository, CounterRepository};
use crate::presentation::handlers::{self, GateAppState};
use crate::presentation::middleware::require_service_token;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Create the gate router for any storage backend and lookup client
///
/// With a service token configured every route requires
/// `Authorization: Bearer <token>`.
pub fn gate_router<R, L>(repo: Arc<R>, lookup: Arc<L>, config: GateConfig) -> Router
where
    R: CounterRepository + ChallengeRepository + Send + Sync + 'static,
    L: AccountLookup + Send + Sync + 'static,
{
    let service_token = config.service_token.clone();
    let state = GateAppState {
        repo,
        lookup,
        config: Arc::new(config),
    };

    let router = Router::new()
        .route("/check", post(handlers::check_account::<R, L>))
        .route("/admit", post(handlers::admit::<R, L>))
        .route("/record", post(handlers::record::<R, L>))
        .route(
            "/challenge/{user_id}",
            get(handlers::challenge_status::<R, L>),
        )
        .route(
            "/challenge/{user_id}/verify",
            post(handlers::verify_challenge::<R, L>),
        )
        .route(
            "/users/{user_id}/remaining",
            get(handlers::remaining::<R, L>),
        )
        .route("/admin/reset", post(handlers::admin_reset::<R, L>))
        .route("/admin/stats", get(handlers::admin_stats::<R, L>))
        .with_state(state);

    match service_token {
        Some(token) => router.route_layer(middleware::from_fn_with_state(
            Arc::<str>::from(token),
            require_service_token,
        )),
        None => router,
    }
}
