//! Shared Kernel - Cross-crate error vocabulary
//!
//! This crate holds the pieces every other crate agrees on:
//! - [`error::kind::ErrorKind`] - error classification mapped to HTTP status codes
//! - [`error::app_error::AppError`] - the unified error carried to the response boundary
//! - RFC 7807 rendering of [`AppError`] behind the `axum` feature
//!
//! Domain crates keep their own `thiserror` enums and convert into [`AppError`]
//! at the edge, so the kernel stays free of domain vocabulary.
//!
//! [`AppError`]: error::app_error::AppError

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}

pub use error::app_error::AppError;
pub use error::kind::ErrorKind;
