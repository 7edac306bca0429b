//! Build-lifecycle entry points for one differential-delivery build.

use std::sync::Arc;

use relic_loader::{LoaderScript, rewrite_html};
use relic_polyfill::{PolyfillRegistry, PolyfillSet};
use relic_target::TargetYear;

use crate::builder::{LegacyArtifactBuilder, references_regenerator};
use crate::bundle::LegacyBundler;
use crate::chunk::{LegacyChunk, ModernChunk};
use crate::config::DeliveryConfig;
use crate::transpile::Transpiler;
use crate::{Error, Result};

/// One build's differential-delivery state, wired into the host build
/// lifecycle: configuration resolves up front, the legacy chunk is
/// emitted once after the modern bundle is finalized, and each generated
/// HTML document is rewritten afterwards.
pub struct DeliveryPipeline {
    target: TargetYear,
    polyfills: PolyfillSet,
    inlined: bool,
    builder: LegacyArtifactBuilder,
    emitted: Option<EmittedPair>,
}

/// The modern/legacy pair this pipeline instance manages, recorded only
/// once the legacy chunk fully exists.
struct EmittedPair {
    modern_file_name: String,
    legacy: LegacyChunk,
    needs_regenerator: bool,
}

impl std::fmt::Debug for DeliveryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryPipeline")
            .field("target", &self.target)
            .field("polyfills", &self.polyfills)
            .field("inlined", &self.inlined)
            .finish_non_exhaustive()
    }
}

impl DeliveryPipeline {
    /// Resolve the target and validate the polyfill configuration.
    ///
    /// Fails fast on an unsupported target token or an unknown polyfill
    /// name, before any transpiler work begins.
    pub fn new(
        config: DeliveryConfig,
        registry: &PolyfillRegistry,
        transpiler: Arc<dyn Transpiler>,
        bundler: Arc<dyn LegacyBundler>,
    ) -> Result<Self> {
        let target = TargetYear::resolve(&config.targets)?;
        let polyfills = PolyfillSet::build(&config.polyfills, target, registry)?;
        let inlined = config.polyfills.is_inlined();
        tracing::debug!(
            target = %target,
            polyfills = polyfills.names().len(),
            inlined,
            "differential delivery configured"
        );

        Ok(Self {
            target,
            polyfills,
            inlined,
            builder: LegacyArtifactBuilder::new(config, transpiler, bundler),
            emitted: None,
        })
    }

    /// The resolved baseline edition.
    pub fn target(&self) -> TargetYear {
        self.target
    }

    /// The polyfill feature set requested by the generated loader.
    pub fn polyfills(&self) -> &PolyfillSet {
        &self.polyfills
    }

    /// The legacy chunk, once emitted.
    pub fn legacy_chunk(&self) -> Option<&LegacyChunk> {
        self.emitted.as_ref().map(|pair| &pair.legacy)
    }

    /// Build and record the legacy counterpart of `modern`.
    ///
    /// Called at the host's chunk-finalized lifecycle point. Emission is
    /// atomic: on error nothing is recorded and a later
    /// [`transform_html`](Self::transform_html) still fails fast.
    pub async fn emit_legacy_chunk(&mut self, modern: &ModernChunk) -> Result<&LegacyChunk> {
        let legacy = self.builder.build(modern).await?;
        // In inlined mode the runtime is already merged into the bundle.
        let needs_regenerator = !self.inlined && references_regenerator(&legacy.code);
        tracing::info!(
            modern = %modern.file_name,
            legacy = %legacy.file_name,
            needs_regenerator,
            "emitted legacy chunk"
        );

        let pair = self.emitted.insert(EmittedPair {
            modern_file_name: modern.file_name.clone(),
            legacy,
            needs_regenerator,
        });
        Ok(&pair.legacy)
    }

    /// Rewrite one built HTML document, replacing the managed module
    /// script tag with the bootstrap loader.
    ///
    /// # Errors
    ///
    /// [`Error::ChunkNotEmitted`] when called before
    /// [`emit_legacy_chunk`](Self::emit_legacy_chunk) has completed.
    pub fn transform_html(&self, html: &str) -> Result<String> {
        let pair = self.emitted.as_ref().ok_or(Error::ChunkNotEmitted)?;
        let target = self.target;
        let polyfills = &self.polyfills;

        Ok(rewrite_html(
            html,
            &pair.modern_file_name,
            &pair.legacy.file_name,
            |modern_src, legacy_src| {
                LoaderScript::new(target, polyfills, modern_src, legacy_src, pair.needs_regenerator)
                    .render()
            },
        ))
    }
}
