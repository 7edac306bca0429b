//! Registry of recognized polyfill feature names.

use rustc_hash::FxHashSet;

/// Feature names understood by the polyfill delivery service. Year tokens
/// cover the language-level bundles; the rest are named browser-API
/// polyfills.
const BUILTIN_NAMES: &[&str] = &[
    "es2015",
    "es2016",
    "es2017",
    "es2018",
    "es2019",
    "AbortController",
    "CustomEvent",
    "Element.prototype.closest",
    "Element.prototype.matches",
    "EventSource",
    "IntersectionObserver",
    "IntersectionObserverEntry",
    "MutationObserver",
    "NodeList.prototype.forEach",
    "Object.fromEntries",
    "Promise",
    "Promise.prototype.finally",
    "ResizeObserver",
    "URL",
    "URLSearchParams",
    "WebAnimations",
    "fetch",
    "globalThis",
    "queueMicrotask",
    "requestAnimationFrame",
    "requestIdleCallback",
    "smoothscroll",
];

/// Immutable set of recognized polyfill names.
///
/// The registry is externally maintained; this crate only validates
/// membership. Constructing a custom registry is primarily useful in
/// tests.
#[derive(Debug, Clone)]
pub struct PolyfillRegistry {
    names: FxHashSet<String>,
}

impl PolyfillRegistry {
    /// Build a registry from an explicit name list.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The registry of names the well-known delivery service recognizes.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_NAMES.iter().copied())
    }

    /// Whether `name` is a recognized polyfill.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of recognized names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the registry recognizes nothing.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for PolyfillRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_year_tokens_up_to_2019() {
        let registry = PolyfillRegistry::builtin();
        for year in 2015..=2019 {
            assert!(registry.contains(&format!("es{year}")), "missing es{year}");
        }
        assert!(!registry.contains("es2020"));
    }

    #[test]
    fn builtin_covers_named_api_polyfills() {
        let registry = PolyfillRegistry::builtin();
        assert!(registry.contains("fetch"));
        assert!(registry.contains("IntersectionObserver"));
        assert!(!registry.contains("window.fetch"));
    }

    #[test]
    fn custom_registry_is_injectable() {
        let registry = PolyfillRegistry::new(["left-pad"]);
        assert!(registry.contains("left-pad"));
        assert!(!registry.contains("fetch"));
        assert_eq!(registry.len(), 1);
    }
}
