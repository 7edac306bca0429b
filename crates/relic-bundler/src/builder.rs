//! Legacy artifact construction: down-level transform plus optional
//! re-bundling with inlined polyfills.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use relic_polyfill::PolyfillMode;

use crate::bundle::{BundleRequest, LegacyBundler};
use crate::chunk::{LegacyChunk, ModernChunk, legacy_file_name};
use crate::config::DeliveryConfig;
use crate::transpile::{Transpiled, TranspileOptions, Transpiler};
use crate::{Error, Result};

/// A free reference to this identifier in the legacy code means the
/// bundle expects the regenerator runtime to be loaded first.
pub(crate) const REGENERATOR_GLOBAL: &str = "regeneratorRuntime";

/// Synthetic module ids fed to the bundler in inlined-polyfill mode.
const ENTRY_ID: &str = "relic:legacy-entry.js";
const TRANSPILED_ID: &str = "relic:transpiled.js";

/// Orchestrates the down-level transform of one modern chunk into exactly
/// one legacy chunk, or fails. The transpiler and bundler are injected
/// collaborators.
pub struct LegacyArtifactBuilder {
    config: DeliveryConfig,
    transpiler: Arc<dyn Transpiler>,
    bundler: Arc<dyn LegacyBundler>,
}

impl LegacyArtifactBuilder {
    /// Wire a builder to its collaborators.
    pub fn new(
        config: DeliveryConfig,
        transpiler: Arc<dyn Transpiler>,
        bundler: Arc<dyn LegacyBundler>,
    ) -> Self {
        Self { config, transpiler, bundler }
    }

    /// The configuration this builder was constructed with.
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Build the legacy counterpart of `modern`.
    ///
    /// # Errors
    ///
    /// [`Error::TransformFailure`] when the transpiler produces no usable
    /// code, [`Error::Bundling`] when the inlined-polyfill re-bundle
    /// fails. Both are fatal: the generated loader references the legacy
    /// URL unconditionally, so the build must not proceed without it.
    pub async fn build(&self, modern: &ModernChunk) -> Result<LegacyChunk> {
        let inlined = self.config.polyfills.is_inlined();
        let options = TranspileOptions {
            file_name: modern.file_name.clone(),
            targets: self.config.targets.clone(),
            ignore_browserslist_config: self.config.ignore_browserslist_config,
            rewrite_generators: !inlined,
            sourcemap: self.config.sourcemap,
            input_map: modern.map.clone(),
        };

        tracing::debug!(file = %modern.file_name, inlined, "transpiling modern bundle");
        let transpiled = self
            .transpiler
            .transpile(&modern.code, &options)
            .await?
            .filter(|out| !out.code.is_empty())
            .ok_or_else(|| Error::TransformFailure(modern.file_name.clone()))?;

        let file_name = legacy_file_name(&modern.file_name);
        match &self.config.polyfills {
            PolyfillMode::Delivery { .. } => Ok(LegacyChunk {
                file_name,
                code: transpiled.code,
                map: transpiled.map,
            }),
            PolyfillMode::Inlined { root } => self.rebundle(root, file_name, transpiled).await,
        }
    }

    /// Merge the transpiled code with the polyfill library and the
    /// regenerator runtime into one self-executing file.
    async fn rebundle(
        &self,
        root: &Path,
        file_name: String,
        transpiled: Transpiled,
    ) -> Result<LegacyChunk> {
        let mut modules = FxHashMap::default();
        // Runtime dependencies import first so their globals exist by the
        // time the transpiled code runs.
        modules.insert(
            ENTRY_ID.to_string(),
            format!(
                "import \"core-js\";\nimport \"regenerator-runtime/runtime\";\nimport \"{TRANSPILED_ID}\";\n"
            ),
        );
        modules.insert(TRANSPILED_ID.to_string(), transpiled.code);

        tracing::debug!(file = %file_name, root = %root.display(), "re-bundling with inlined polyfills");
        let bundled = self
            .bundler
            .bundle(BundleRequest {
                entry: ENTRY_ID.to_string(),
                modules,
                root: root.to_path_buf(),
                minify: self.config.minify,
                sourcemap: self.config.sourcemap,
            })
            .await?;

        Ok(LegacyChunk { file_name, code: bundled.code, map: bundled.map })
    }
}

/// Textual scan for a free `regeneratorRuntime` reference in the legacy
/// code. String literals and comments can false-positive; the loader then
/// fetches a runtime that goes unused, which is harmless.
pub fn references_regenerator(code: &str) -> bool {
    code.contains(REGENERATOR_GLOBAL)
}
