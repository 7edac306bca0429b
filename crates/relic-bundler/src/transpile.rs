//! Down-level transpiler collaborator.
//!
//! The transpiler is injected into the Legacy Artifact Builder, so the
//! pipeline stays testable with fakes. [`OxcTranspiler`] is the default,
//! backed by the oxc toolchain.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{HelperLoaderMode, TransformOptions, Transformer};

use crate::remap::chain_source_maps;
use crate::{Error, Result};

/// Lowering floor for the legacy artifact. Browsers that fail the loader's
/// probes can predate every probed edition, so this is also the fallback
/// when the configured targets give the transpiler nothing to work with.
const LEGACY_BASELINE: &str = "es5";

/// Options handed to the transpiler for one modern bundle.
#[derive(Debug, Clone, Default)]
pub struct TranspileOptions {
    /// Modern bundle file name, used for diagnostics and source maps.
    pub file_name: String,
    /// Browser/edition targets, verbatim from the build configuration.
    /// An empty list lowers to the es5 floor.
    pub targets: Vec<String>,
    /// Skip external browserslist configuration when deriving targets.
    pub ignore_browserslist_config: bool,
    /// Rewrite lowering helpers (generator machinery included) against an
    /// external runtime instead of emitting per-file imports. Set in
    /// delivery mode, where the output runs as a classic script and the
    /// loader fetches runtime dependencies separately.
    pub rewrite_generators: bool,
    /// Produce a source map.
    pub sourcemap: bool,
    /// Source map of the modern bundle. When present, the emitted map is
    /// chained through it so positions point at the original sources.
    pub input_map: Option<String>,
}

/// Transpiler output for one bundle.
#[derive(Debug, Clone)]
pub struct Transpiled {
    /// Down-leveled source text.
    pub code: String,
    /// Source map JSON, when requested.
    pub map: Option<String>,
}

/// Down-level transpiler collaborator. Returning `Ok(None)` signals the
/// tool produced no usable code; the builder turns that into a fatal
/// [`Error::TransformFailure`].
///
/// Output contract: with `rewrite_generators` set the code must run as a
/// classic script, though it may reference runtime globals such as
/// `regeneratorRuntime` (the builder scans for that one and the loader
/// fetches it). Without `rewrite_generators` the output is re-bundled
/// together with the polyfill library, so module imports are allowed and
/// no per-usage polyfill narrowing is expected of the transpiler.
#[async_trait]
pub trait Transpiler: Send + Sync {
    /// Down-level `source` to the legacy baseline.
    async fn transpile(
        &self,
        source: &str,
        options: &TranspileOptions,
    ) -> Result<Option<Transpiled>>;
}

/// Default transpiler backed by the oxc toolchain: parse, semantic
/// analysis, down-level transform, codegen.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcTranspiler;

#[async_trait]
impl Transpiler for OxcTranspiler {
    async fn transpile(
        &self,
        source: &str,
        options: &TranspileOptions,
    ) -> Result<Option<Transpiled>> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
        if parsed.panicked || !parsed.errors.is_empty() {
            tracing::warn!(
                file = %options.file_name,
                errors = parsed.errors.len(),
                "modern bundle failed to parse"
            );
            return Ok(None);
        }
        let mut program = parsed.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();

        let transform_options = transform_options(options)?;
        let transformed = Transformer::new(&allocator, Path::new(&options.file_name), &transform_options)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            tracing::warn!(
                file = %options.file_name,
                errors = transformed.errors.len(),
                "down-level transform reported errors"
            );
            return Ok(None);
        }

        let codegen_options = CodegenOptions {
            source_map_path: options
                .sourcemap
                .then(|| PathBuf::from(&options.file_name)),
            ..CodegenOptions::default()
        };
        let output = Codegen::new().with_options(codegen_options).build(&program);

        let mut map = output.map.map(|m| m.to_json_string());
        if let (Some(fresh), Some(input)) = (map.as_deref(), options.input_map.as_deref()) {
            match chain_source_maps(fresh, input) {
                Ok(chained) => map = Some(chained),
                Err(err) => tracing::warn!(
                    file = %options.file_name,
                    error = %err,
                    "input source map could not be chained, emitting the unchained map"
                ),
            }
        }

        Ok(Some(Transpiled { code: output.code, map }))
    }
}

/// Derive the oxc transform configuration from the collaborator options.
///
/// The configured targets are taken as engine levels (`chrome58`,
/// `es2019`). Browserslist-style queries are not resolvable here, so a
/// list oxc cannot parse falls back to the es5 floor rather than failing
/// the build.
fn transform_options(options: &TranspileOptions) -> Result<TransformOptions> {
    let mut transform = if options.targets.is_empty() {
        if !options.ignore_browserslist_config {
            tracing::debug!(
                file = %options.file_name,
                "no engine targets and no browserslist resolution here, lowering to the floor"
            );
        }
        baseline()?
    } else {
        match TransformOptions::from_target(&options.targets.join(",")) {
            Ok(transform) => transform,
            Err(reason) => {
                tracing::warn!(
                    file = %options.file_name,
                    targets = ?options.targets,
                    reason = %reason,
                    "targets not expressible as engine levels, lowering to the floor"
                );
                baseline()?
            }
        }
    };

    if options.rewrite_generators {
        transform.helper_loader.mode = HelperLoaderMode::External;
    }

    Ok(transform)
}

fn baseline() -> Result<TransformOptions> {
    TransformOptions::from_target(LEGACY_BASELINE)
        .map_err(|e| Error::InvalidConfig(format!("transform target: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn downlevels_modern_syntax() {
        let options = TranspileOptions {
            file_name: "app.js".into(),
            ..TranspileOptions::default()
        };
        let out = OxcTranspiler
            .transpile("const f = (x) => x ?? 1;", &options)
            .await
            .unwrap()
            .expect("transpiled output");
        assert!(!out.code.contains("=>"));
        assert!(!out.code.contains("??"));
    }

    #[tokio::test]
    async fn engine_targets_relax_the_lowering() {
        let options = TranspileOptions {
            file_name: "app.js".into(),
            targets: vec!["es2019".to_string()],
            ..TranspileOptions::default()
        };
        let out = OxcTranspiler
            .transpile("const f = (x) => x + 1;", &options)
            .await
            .unwrap()
            .expect("transpiled output");
        // Arrow functions are es2015 syntax; an es2019 engine keeps them.
        assert!(out.code.contains("=>"));
    }

    #[tokio::test]
    async fn inexpressible_targets_fall_back_to_the_floor() {
        let options = TranspileOptions {
            file_name: "app.js".into(),
            targets: vec!["defaults".to_string(), "not dead".to_string()],
            ..TranspileOptions::default()
        };
        let out = OxcTranspiler
            .transpile("const f = (x) => x + 1;", &options)
            .await
            .unwrap()
            .expect("transpiled output");
        assert!(!out.code.contains("=>"));
    }

    #[test]
    fn generator_rewrites_select_external_helpers() {
        let external = transform_options(&TranspileOptions {
            rewrite_generators: true,
            ..TranspileOptions::default()
        })
        .unwrap();
        assert!(matches!(
            external.helper_loader.mode,
            HelperLoaderMode::External
        ));

        let bundled = transform_options(&TranspileOptions::default()).unwrap();
        assert!(!matches!(
            bundled.helper_loader.mode,
            HelperLoaderMode::External
        ));
    }

    #[tokio::test]
    async fn unparseable_input_yields_no_output() {
        let options = TranspileOptions {
            file_name: "broken.js".into(),
            ..TranspileOptions::default()
        };
        let out = OxcTranspiler
            .transpile("const = nope(", &options)
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn source_map_is_emitted_when_requested() {
        let options = TranspileOptions {
            file_name: "app.js".into(),
            sourcemap: true,
            ..TranspileOptions::default()
        };
        let out = OxcTranspiler
            .transpile("let x = 1;", &options)
            .await
            .unwrap()
            .expect("transpiled output");
        let map = out.map.expect("source map");
        assert!(map.contains("\"mappings\""));
    }

    #[tokio::test]
    async fn emitted_map_chains_through_the_input_map() {
        // One token at (0, 0) mapping the whole modern bundle back to the
        // original source.
        let input_map = r#"{"version":3,"file":"app.js","sources":["src/orig.ts"],"sourcesContent":["let x = 1;\n"],"names":[],"mappings":"AAAA"}"#;
        let options = TranspileOptions {
            file_name: "app.js".into(),
            sourcemap: true,
            input_map: Some(input_map.to_string()),
            ..TranspileOptions::default()
        };
        let out = OxcTranspiler
            .transpile("let x = 1;", &options)
            .await
            .unwrap()
            .expect("transpiled output");
        let map = out.map.expect("source map");
        assert!(map.contains("src/orig.ts"));
        assert!(!map.contains("\"app.js\""));
    }
}
