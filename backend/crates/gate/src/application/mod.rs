//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod admit_check;
pub mod challenge_gate;
pub mod check_account;
pub mod config;
pub mod quota_ledger;
