//! Build configuration for one differential-delivery pipeline.

use relic_polyfill::PolyfillMode;
use serde::{Deserialize, Serialize};

/// Configuration for one build. Owned by the invoking build-tool
/// integration and immutable for the duration of the build; the pipeline
/// only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Build target specification: ECMAScript edition tokens and browser
    /// queries, in priority order. The first `es` token decides the
    /// probed edition; no token defaults to `es2020`.
    #[serde(default)]
    pub targets: Vec<String>,

    /// How polyfills reach the legacy path.
    #[serde(default)]
    pub polyfills: PolyfillMode,

    /// Minify the legacy artifact. Applied at the bundle stage, not to
    /// the transpiler output directly.
    #[serde(default)]
    pub minify: bool,

    /// Emit a source map alongside the legacy file.
    #[serde(default)]
    pub sourcemap: bool,

    /// Skip any external browserslist configuration when transpiling.
    #[serde(default)]
    pub ignore_browserslist_config: bool,
}

impl DeliveryConfig {
    /// Start from the defaults: `es2020`, delivery-mode polyfills, no
    /// minification, no source maps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target specification.
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the polyfill mode.
    pub fn polyfills(mut self, mode: PolyfillMode) -> Self {
        self.polyfills = mode;
        self
    }

    /// Minify the legacy artifact.
    pub fn minify(mut self, on: bool) -> Self {
        self.minify = on;
        self
    }

    /// Emit source maps.
    pub fn sourcemap(mut self, on: bool) -> Self {
        self.sourcemap = on;
        self
    }

    /// Ignore external browserslist configuration.
    pub fn ignore_browserslist_config(mut self, on: bool) -> Self {
        self.ignore_browserslist_config = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_use_delivery_mode() {
        let config = DeliveryConfig::new();
        assert!(config.targets.is_empty());
        assert!(!config.polyfills.is_inlined());
        assert!(!config.minify);
        assert!(!config.sourcemap);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DeliveryConfig = serde_json::from_str(
            r#"{"targets": ["es2018"], "polyfills": {"Inlined": {"root": "/srv/app"}}, "minify": true}"#,
        )
        .unwrap();

        assert_eq!(config.targets, ["es2018"]);
        assert!(config.polyfills.is_inlined());
        assert!(config.minify);
        assert!(!config.sourcemap);
        assert!(!config.ignore_browserslist_config);
    }

    #[test]
    fn builder_methods_compose() {
        let config = DeliveryConfig::new()
            .targets(["chrome58", "es2018"])
            .polyfills(PolyfillMode::Inlined { root: PathBuf::from("/srv/app") })
            .minify(true)
            .sourcemap(true);

        assert_eq!(config.targets, ["chrome58", "es2018"]);
        assert!(config.polyfills.is_inlined());
        assert!(config.minify);
        assert!(config.sourcemap);
    }
}
