//! Infrastructure Layer
//!
//! Storage backends and the account lookup client.

pub mod http_lookup;
pub mod json_file;
pub mod postgres;
