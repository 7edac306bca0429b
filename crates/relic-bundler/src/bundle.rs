//! Re-bundling collaborator for inlined-polyfill mode.
//!
//! In inlined mode the transpiled code is merged with the polyfill
//! library and regenerator runtime into one self-executing file. The
//! bundler is injected like the transpiler; [`RolldownBundler`] is the
//! default.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform, RawMinifyOptions,
    SourceMapType,
};
use rolldown_common::{ModuleType, Output, ResolvedExternal};
use rolldown_plugin::{
    __inner::SharedPluginable, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs,
    HookResolveIdOutput, HookResolveIdReturn, Plugin, PluginContext,
};
use rustc_hash::FxHashMap;

use crate::{Error, Result};

/// One re-bundling request: merge the transpiled code and its runtime
/// dependencies into a single self-executing file.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Module id the bundle starts from.
    pub entry: String,
    /// In-memory sources for synthetic module ids; the transpiled code is
    /// fed back in as if it were a file.
    pub modules: FxHashMap<String, String>,
    /// Directory that on-disk dependencies (the polyfill library, the
    /// regenerator runtime) resolve from.
    pub root: PathBuf,
    /// Minify the merged output.
    pub minify: bool,
    /// Emit a source map for the merged output.
    pub sourcemap: bool,
}

/// Bundler output for one request.
#[derive(Debug, Clone)]
pub struct Bundled {
    /// Merged bundle text.
    pub code: String,
    /// Source map JSON, when requested.
    pub map: Option<String>,
}

/// Module bundler collaborator. Must produce exactly one output chunk in
/// IIFE form with dynamic imports inlined: the loader expects a single
/// legacy URL.
#[async_trait]
pub trait LegacyBundler: Send + Sync {
    /// Bundle one request into a single self-executing file.
    async fn bundle(&self, request: BundleRequest) -> Result<Bundled>;
}

/// Default bundler backed by rolldown.
#[derive(Debug, Default, Clone, Copy)]
pub struct RolldownBundler;

#[async_trait]
impl LegacyBundler for RolldownBundler {
    async fn bundle(&self, request: BundleRequest) -> Result<Bundled> {
        let entry = request.entry.clone();
        let bundling_error = |reason: String| Error::Bundling { file: entry.clone(), reason };

        let options = BundlerOptions {
            input: Some(vec![InputItem { name: None, import: request.entry.clone() }]),
            cwd: Some(request.root.clone()),
            format: Some(OutputFormat::Iife),
            platform: Some(Platform::Browser),
            // The probe/load mechanism expects exactly one legacy URL, so
            // no code splitting survives this step.
            inline_dynamic_imports: Some(true),
            minify: request.minify.then(|| RawMinifyOptions::from(true)),
            sourcemap: request.sourcemap.then_some(SourceMapType::File),
            ..Default::default()
        };

        let plugins: Vec<SharedPluginable> =
            vec![Arc::new(SyntheticSourcePlugin::new(request.modules))];

        let mut bundler = BundlerBuilder::default()
            .with_options(options)
            .with_plugins(plugins)
            .build()
            .map_err(|e| bundling_error(format!("{e:?}")))?;

        let output = bundler
            .generate()
            .await
            .map_err(|e| bundling_error(format!("{e:?}")))?;

        let chunk = output
            .assets
            .iter()
            .find_map(|asset| match asset {
                Output::Chunk(chunk) => Some(chunk),
                Output::Asset(_) => None,
            })
            .ok_or_else(|| bundling_error("bundler produced no output chunk".to_string()))?;

        Ok(Bundled {
            code: chunk.code.clone(),
            map: chunk.map.as_ref().map(|m| m.to_json_string()),
        })
    }
}

/// Serves in-memory sources to rolldown for synthetic module ids. Real
/// files (the polyfill library under `node_modules`) fall through to
/// rolldown's own resolution.
#[derive(Debug, Clone)]
struct SyntheticSourcePlugin {
    modules: Arc<FxHashMap<String, String>>,
}

impl SyntheticSourcePlugin {
    fn new(modules: FxHashMap<String, String>) -> Self {
        Self { modules: Arc::new(modules) }
    }
}

impl Plugin for SyntheticSourcePlugin {
    fn name(&self) -> Cow<'static, str> {
        "relic-synthetic-sources".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        use rolldown_plugin::HookUsage;
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let modules = Arc::clone(&self.modules);

        async move {
            if modules.contains_key(&specifier) {
                return Ok(Some(HookResolveIdOutput {
                    id: specifier.into(),
                    external: Some(ResolvedExternal::Bool(false)),
                    ..Default::default()
                }));
            }
            Ok(None)
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let modules = Arc::clone(&self.modules);

        async move {
            let Some(source) = modules.get(&id) else {
                return Ok(None);
            };

            Ok(Some(HookLoadOutput {
                code: source.clone().into(),
                module_type: Some(infer_module_type(&id)),
                ..Default::default()
            }))
        }
    }
}

/// Infers module type from the synthetic id's extension.
fn infer_module_type(id: &str) -> ModuleType {
    match Path::new(id).extension().and_then(|e| e.to_str()) {
        Some("json") => ModuleType::Json,
        _ => ModuleType::Js,
    }
}
