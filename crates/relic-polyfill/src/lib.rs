//! # relic-polyfill
//!
//! Polyfill feature-set computation for the legacy delivery path.
//!
//! Browsers that fall back to the legacy bundle also need polyfills. In
//! delivery mode those are fetched at page load from a polyfill delivery
//! service, so the build computes the exact ordered feature list to
//! request. In inlined mode the polyfill code is merged into the legacy
//! bundle instead and no runtime request happens.
//!
//! Recognized feature names live in an immutable [`PolyfillRegistry`]
//! that is injected into [`PolyfillSet::build`], never read from ambient
//! state.

pub mod registry;
pub mod set;

pub use registry::PolyfillRegistry;
pub use set::{PolyfillMode, PolyfillSet};

/// Result type for polyfill-set computation.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for polyfill-set computation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A requested polyfill name is absent from the registry. Raised at
    /// configuration-validation time, before any transform work begins.
    #[error("unknown polyfill name: '{0}'")]
    UnknownPolyfill(String),
}
