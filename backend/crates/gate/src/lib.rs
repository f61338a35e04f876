//! Admission Gate Backend Module
//!
//! Decides whether a bank-account check may run, based on per-user and
//! per-address daily quotas and an arithmetic challenge issued once a quota
//! runs out.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Quota ledger, challenge gate and the use cases built on them
//! - `infra/` - PostgreSQL and JSON-file storage, HTTP account lookup
//! - `presentation/` - HTTP handlers, router and the service-token guard
//!
//! ## Admission Order
//! 1. A pending challenge blocks the user until it is answered or expires
//! 2. The address quota (20/day) is consulted before the user quota (10/day)
//! 3. An exhausted quota issues a fresh challenge
//! 4. A completed check counts against both, whatever the lookup returned

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::GateConfig;
pub use error::{GateError, GateResult};
pub use infra::http_lookup::HttpAccountLookup;
pub use infra::json_file::JsonFileGateRepository;
pub use infra::postgres::PgGateRepository;
pub use presentation::router::gate_router;
