//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Challenge, AccountInfo, LedgerStats)
//! - Domain value objects (UserId, IpIdentity, Identity, Remaining, AccountNumber)
//! - Domain services (arithmetic challenge generation)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
