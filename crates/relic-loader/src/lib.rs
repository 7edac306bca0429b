//! # relic-loader
//!
//! Synthesis of the inline bootstrap script that performs differential
//! script loading, and the rewrite of built HTML documents to embed it.
//!
//! The bootstrap runs synchronously at page load, before any application
//! code. It probes the browser's capabilities inside a single `try` block
//! and then loads exactly one of the two bundles: the modern module
//! bundle on probe success, or the legacy classic-script bundle (plus its
//! runtime polyfill dependencies) on probe failure.

pub mod rewrite;
pub mod script;

pub use rewrite::rewrite_html;
pub use script::{LoaderScript, Probe, ScriptLoad};
