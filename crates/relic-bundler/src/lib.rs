//! # relic-bundler
//!
//! Differential script delivery for web application builds.
//!
//! Given a single modern compiled bundle, this crate produces a
//! syntactically down-leveled legacy bundle and rewrites served HTML so
//! that a small inline bootstrap picks exactly one of the two at page
//! load - never both.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use relic_bundler::{
//!     DeliveryConfig, DeliveryPipeline, ModernChunk, OxcTranspiler, RolldownBundler,
//! };
//! use relic_polyfill::PolyfillRegistry;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeliveryConfig::new()
//!     .targets(["es2019"])
//!     .sourcemap(true);
//!
//! let mut pipeline = DeliveryPipeline::new(
//!     config,
//!     &PolyfillRegistry::builtin(),
//!     Arc::new(OxcTranspiler),
//!     Arc::new(RolldownBundler),
//! )?;
//!
//! // At the host's chunk-finalized lifecycle point:
//! let modern = ModernChunk {
//!     file_name: "app.abcd.js".into(),
//!     code: std::fs::read_to_string("dist/assets/app.abcd.js")?,
//!     map: None,
//! };
//! let legacy = pipeline.emit_legacy_chunk(&modern).await?;
//! std::fs::write(format!("dist/assets/{}", legacy.file_name), &legacy.code)?;
//!
//! // At the host's per-document lifecycle point:
//! let html = pipeline.transform_html(&std::fs::read_to_string("dist/index.html")?)?;
//! # Ok(()) }
//! ```
//!
//! The transpiler and bundler are injected collaborators; [`OxcTranspiler`]
//! and [`RolldownBundler`] are the defaults, and tests swap in fakes.

pub mod builder;
pub mod bundle;
pub mod chunk;
pub mod config;
pub mod pipeline;
pub mod transpile;

mod remap;

pub use builder::{LegacyArtifactBuilder, references_regenerator};
pub use bundle::{BundleRequest, Bundled, LegacyBundler, RolldownBundler};
pub use chunk::{LegacyChunk, ModernChunk, legacy_file_name};
pub use config::DeliveryConfig;
pub use pipeline::DeliveryPipeline;
pub use transpile::{OxcTranspiler, Transpiled, TranspileOptions, Transpiler};

// Re-export the core crates' entry points for plugin authors
pub use relic_loader::{LoaderScript, rewrite_html};
pub use relic_polyfill::{PolyfillMode, PolyfillRegistry, PolyfillSet};
pub use relic_target::TargetYear;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::{LOG_ENV, LogLevel, init_logging, init_logging_from_env};

/// Error types for differential-delivery operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unsupported target token.
    #[error("target resolution failed: {0}")]
    Target(#[from] relic_target::Error),

    /// A requested polyfill name is absent from the registry.
    #[error(transparent)]
    Polyfill(#[from] relic_polyfill::Error),

    /// The transpiler returned no usable code for the modern bundle.
    #[error("failed to transform modern bundle '{0}': transpiler produced no output")]
    TransformFailure(String),

    /// The bundler failed to produce the inlined-polyfill artifact.
    #[error("failed to bundle legacy artifact '{file}': {reason}")]
    Bundling { file: String, reason: String },

    /// HTML rewrite was requested before the legacy chunk was emitted.
    #[error("HTML rewrite requested before the legacy chunk was emitted")]
    ChunkNotEmitted,

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for differential-delivery operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Target(_) => "UNSUPPORTED_TARGET",
            Error::Polyfill(_) => "UNKNOWN_POLYFILL",
            Error::TransformFailure(_) => "TRANSFORM_FAILURE",
            Error::Bundling { .. } => "BUNDLING_ERROR",
            Error::ChunkNotEmitted => "CHUNK_NOT_EMITTED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Target(_) => Some(Box::new(
                "Pick an ECMAScript edition between es2015 and es2020 (es5 and esnext \
                 cannot be probed for at runtime).",
            )),
            Error::Polyfill(_) => Some(Box::new(
                "Polyfill names must match the delivery service's feature registry. \
                 Year bundles (es2015..es2019) are added automatically.",
            )),
            Error::TransformFailure(_) => Some(Box::new(
                "The legacy bundle cannot be skipped: the generated loader references \
                 its URL unconditionally. Fix the modern bundle or the transpiler setup.",
            )),
            Error::ChunkNotEmitted => Some(Box::new(
                "Call emit_legacy_chunk() for the modern bundle before transforming HTML.",
            )),
            _ => None,
        }
    }
}
