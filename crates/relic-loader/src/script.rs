//! Bootstrap loader script: structure and serialization.
//!
//! The script is modeled as a structured probe/load sequence and rendered
//! to text by one serializer, so the branch-ordering invariant is testable
//! on the structure instead of on substrings of generated text.

use relic_polyfill::PolyfillSet;
use relic_target::TargetYear;

/// Syntax forms introduced at each probed edition. Editions before 2018
/// are not separately probed: the module-support probe already gates out
/// browsers too old to run any modern bundle.
const SYNTAX_TESTS: &[(u16, &str)] = &[
    // Spread in object literal, dot-all regex flag, async generator
    (2018, "void ({...{}}, /0/s, async function*(){})"),
    // Optional catch binding
    (2019, "try{} catch{}"),
    // Optional chaining
    (2020, "0?.$"),
];

/// Where the regenerator runtime is fetched from when the legacy bundle
/// references it without having it bundled in.
pub const REGENERATOR_URL: &str =
    "https://cdn.jsdelivr.net/npm/regenerator-runtime@0.13.7/runtime.min.js";

/// A capability test run inside the loader's `try` block. Any probe
/// throwing sends the page down the legacy branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Accesses a sub-property of the template script's `noModule`
    /// property; `noModule` is `undefined` on browsers that don't parse
    /// `type="module"`, so the access throws there.
    ModuleSupport,
    /// `eval` of the new-syntax forms introduced at one edition.
    Syntax(&'static str),
}

/// One `<script>` insertion performed by the loader at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLoad {
    /// URL assigned to the inserted script element.
    pub src: String,
    /// Insert with `type="module"`; classic script otherwise.
    pub module: bool,
}

/// Structured form of the inline bootstrap script.
///
/// Probes run in order; on success exactly the modern load executes, on
/// failure exactly the fallback loads execute in order. Classic scripts
/// execute in document order, so the fallback ordering (polyfill request,
/// regenerator runtime, legacy bundle) is what lets the legacy bundle
/// find its runtime dependencies already defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderScript {
    probes: Vec<Probe>,
    modern: ScriptLoad,
    fallback: Vec<ScriptLoad>,
}

impl LoaderScript {
    /// Build the loader for one modern/legacy bundle pair.
    ///
    /// `needs_regenerator` is decided by the caller from the legacy
    /// bundle's code; it adds a regenerator runtime load between the
    /// polyfill request and the legacy bundle.
    pub fn new(
        target: TargetYear,
        polyfills: &PolyfillSet,
        modern_src: &str,
        legacy_src: &str,
        needs_regenerator: bool,
    ) -> Self {
        let mut probes = vec![Probe::ModuleSupport];
        probes.extend(
            SYNTAX_TESTS
                .iter()
                .filter(|(year, _)| *year <= target.year())
                .map(|(_, test)| Probe::Syntax(test)),
        );

        let mut fallback = Vec::new();
        if let Some(url) = polyfills.request_url() {
            fallback.push(ScriptLoad { src: url, module: false });
        }
        if needs_regenerator {
            fallback.push(ScriptLoad { src: REGENERATOR_URL.to_string(), module: false });
        }
        fallback.push(ScriptLoad { src: legacy_src.to_string(), module: false });

        Self {
            probes,
            modern: ScriptLoad { src: modern_src.to_string(), module: true },
            fallback,
        }
    }

    /// Capability probes, in execution order.
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// The load performed when every probe passes.
    pub fn modern(&self) -> &ScriptLoad {
        &self.modern
    }

    /// The loads performed when any probe fails, in execution order.
    pub fn fallback(&self) -> &[ScriptLoad] {
        &self.fallback
    }

    /// Serialize to the inline `<script>` block injected into the HTML.
    ///
    /// Every load clones one template script element instead of repeating
    /// element creation in the emitted text; this only trims output size.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<script>\n");
        out.push_str("(function() {\n");
        out.push_str("  var tpl = document.createElement('script');\n");
        out.push_str("  var load = function(src, type) {\n");
        out.push_str("    var el = tpl.cloneNode();\n");
        out.push_str("    if (type) el.type = type;\n");
        out.push_str("    el.src = src;\n");
        out.push_str("    document.head.appendChild(el);\n");
        out.push_str("  };\n");
        out.push_str("  try {\n");
        for probe in &self.probes {
            match probe {
                Probe::ModuleSupport => out.push_str("    tpl.noModule.$;\n"),
                Probe::Syntax(test) => {
                    out.push_str(&format!("    eval('{}');\n", escape_single_quoted(test)));
                }
            }
        }
        out.push_str(&render_load(&self.modern));
        out.push_str("  } catch (e) {\n");
        for load in &self.fallback {
            out.push_str(&render_load(load));
        }
        out.push_str("  }\n");
        out.push_str("})();\n");
        out.push_str("</script>");
        out
    }
}

fn render_load(load: &ScriptLoad) -> String {
    let src = escape_single_quoted(&load.src);
    if load.module {
        format!("    load('{src}', 'module');\n")
    } else {
        format!("    load('{src}');\n")
    }
}

/// Escape text for embedding inside a single-quoted JS string literal.
fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_polyfill::{PolyfillMode, PolyfillRegistry, PolyfillSet};

    fn target(year: u16) -> TargetYear {
        TargetYear::resolve([format!("es{year}")]).unwrap()
    }

    fn delivery_set(year: u16) -> PolyfillSet {
        PolyfillSet::build(
            &PolyfillMode::Delivery { requested: Vec::new() },
            target(year),
            &PolyfillRegistry::builtin(),
        )
        .unwrap()
    }

    fn empty_set() -> PolyfillSet {
        PolyfillSet::build(
            &PolyfillMode::Inlined { root: ".".into() },
            target(2020),
            &PolyfillRegistry::builtin(),
        )
        .unwrap()
    }

    #[test]
    fn module_probe_always_comes_first() {
        let script = LoaderScript::new(target(2020), &empty_set(), "/m.js", "/l.js", false);
        assert_eq!(script.probes()[0], Probe::ModuleSupport);
    }

    #[test]
    fn syntax_probes_accumulate_from_2018_to_target() {
        let script = LoaderScript::new(target(2020), &empty_set(), "/m.js", "/l.js", false);
        let syntax: Vec<&str> = script
            .probes()
            .iter()
            .filter_map(|p| match p {
                Probe::Syntax(test) => Some(*test),
                Probe::ModuleSupport => None,
            })
            .collect();
        assert_eq!(
            syntax,
            [
                "void ({...{}}, /0/s, async function*(){})",
                "try{} catch{}",
                "0?.$",
            ]
        );
    }

    #[test]
    fn no_syntax_probe_below_2018() {
        for year in [2015, 2016, 2017] {
            let script = LoaderScript::new(target(year), &empty_set(), "/m.js", "/l.js", false);
            assert_eq!(script.probes(), [Probe::ModuleSupport], "es{year}");
        }
    }

    #[test]
    fn es2019_probe_is_optional_catch_binding() {
        let script = LoaderScript::new(target(2019), &empty_set(), "/m.js", "/l.js", false);
        assert!(script.probes().contains(&Probe::Syntax("try{} catch{}")));
        assert!(!script.probes().contains(&Probe::Syntax("0?.$")));
    }

    #[test]
    fn fallback_order_is_polyfills_then_regenerator_then_legacy() {
        let script =
            LoaderScript::new(target(2019), &delivery_set(2019), "/m.js", "/l.js", true);
        let fallback = script.fallback();
        assert_eq!(fallback.len(), 3);
        assert!(fallback[0].src.contains("polyfill.min.js?features=es2015,"));
        assert_eq!(fallback[1].src, REGENERATOR_URL);
        assert_eq!(fallback[2].src, "/l.js");
        assert!(fallback.iter().all(|load| !load.module));
    }

    #[test]
    fn empty_polyfill_set_emits_no_request() {
        let script = LoaderScript::new(target(2019), &empty_set(), "/m.js", "/l.js", false);
        assert_eq!(script.fallback().len(), 1);
        assert_eq!(script.fallback()[0].src, "/l.js");
    }

    #[test]
    fn only_the_modern_load_is_a_module() {
        let script =
            LoaderScript::new(target(2020), &delivery_set(2020), "/m.js", "/l.js", false);
        assert!(script.modern().module);
        assert_eq!(script.modern().src, "/m.js");
        assert!(script.fallback().iter().all(|load| !load.module));
    }

    #[test]
    fn rendered_text_keeps_branch_order() {
        let script =
            LoaderScript::new(target(2019), &delivery_set(2019), "/assets/m.js", "/assets/l.js", true);
        let text = script.render();

        let modern = text.find("load('/assets/m.js', 'module')").unwrap();
        let polyfills = text.find("polyfill.min.js").unwrap();
        let regenerator = text.find("regenerator-runtime").unwrap();
        let legacy = text.find("load('/assets/l.js')").unwrap();
        let catch_branch = text.find("catch (e)").unwrap();

        assert!(modern < catch_branch);
        assert!(catch_branch < polyfills);
        assert!(polyfills < regenerator);
        assert!(regenerator < legacy);
    }

    #[test]
    fn rendered_text_never_contains_a_module_script_tag() {
        // The rewriter's idempotence depends on the emitted block not
        // matching the module-tag pattern itself.
        let script =
            LoaderScript::new(target(2020), &delivery_set(2020), "/m.js", "/l.js", false);
        assert!(!script.render().contains("<script type=\"module\""));
    }

    #[test]
    fn sources_are_escaped_for_single_quotes() {
        let script = LoaderScript::new(target(2015), &empty_set(), "/it's.js", "/l.js", false);
        assert!(script.render().contains("load('/it\\'s.js', 'module')"));
    }
}
