//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Calendar-day windows and daily quota arithmetic
//! - Client address resolution for throttling keys
//! - Bearer service-token checks

pub mod client;
pub mod rate_limit;
pub mod token;
