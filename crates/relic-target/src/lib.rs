//! # relic-target
//!
//! ECMAScript target resolution for differential script delivery.
//!
//! A build's target specification is an ordered list of tokens mixing
//! browser queries (`chrome58`) with ECMAScript edition tokens (`es2019`).
//! This crate derives the single baseline edition the modern bundle is
//! compiled to, which in turn decides the syntax probes emitted into the
//! bootstrap loader and the polyfill feature sets requested for the
//! legacy path.

pub mod target;

pub use target::TargetYear;

/// Result type for target resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for target resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target token with no defined syntax test or transform baseline.
    #[error(
        "unsupported ECMAScript target '{0}': es5 and esnext have no differential-delivery baseline"
    )]
    UnsupportedTarget(String),
}
