//! Ordered polyfill feature sets and the delivery-service request URL.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use relic_target::TargetYear;

use crate::registry::PolyfillRegistry;
use crate::{Error, Result};

/// Runtime endpoint serving polyfill code for a requested feature list.
/// Referenced only by URL construction; never invoked during the build.
const DELIVERY_SERVICE: &str = "https://polyfill.io/v3/polyfill.min.js";

/// Year-token polyfill bundles stop at 2019; the delivery service has no
/// es2020 bundle.
const YEAR_TOKEN_CEILING: u16 = 2019;

/// How polyfills reach browsers that load the legacy bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyfillMode {
    /// Fetch polyfills at page load from the delivery service. Carries
    /// the explicitly requested feature names on top of the year bundles.
    Delivery { requested: Vec<String> },
    /// Merge the polyfill library into the legacy bundle at build time.
    /// Carries the directory the polyfill library and regenerator runtime
    /// resolve from. Explicit feature names are not resolvable on this
    /// path.
    Inlined { root: PathBuf },
}

impl Default for PolyfillMode {
    fn default() -> Self {
        Self::Delivery { requested: Vec::new() }
    }
}

impl PolyfillMode {
    /// True for [`PolyfillMode::Inlined`].
    pub fn is_inlined(&self) -> bool {
        matches!(self, Self::Inlined { .. })
    }
}

/// Ordered, deduplicated polyfill feature names for one build.
///
/// Year bundles come first as a contiguous ascending run starting at
/// `es2015`; explicitly requested names follow, sorted lexicographically.
/// Earlier-edition bundles are prerequisites for later ones and the
/// delivery service resolves dependencies in request order, so the order
/// is part of the contract (and keeps the request URL deterministic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyfillSet {
    names: Vec<String>,
}

impl PolyfillSet {
    /// Compute the feature set for `mode` at the resolved target edition.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPolyfill`] for the first requested name absent from
    /// `registry`, before anything else is computed.
    pub fn build(
        mode: &PolyfillMode,
        target: TargetYear,
        registry: &PolyfillRegistry,
    ) -> Result<Self> {
        let PolyfillMode::Delivery { requested } = mode else {
            return Ok(Self { names: Vec::new() });
        };

        for name in requested {
            if !registry.contains(name) {
                return Err(Error::UnknownPolyfill(name.clone()));
            }
        }

        let mut names: Vec<String> = (TargetYear::MIN..=target.year().min(YEAR_TOKEN_CEILING))
            .map(|year| format!("es{year}"))
            .collect();

        let mut extra: Vec<&String> = requested.iter().collect();
        extra.sort();
        for name in extra {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.clone());
            }
        }

        Ok(Self { names })
    }

    /// Feature names in request order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True when no runtime polyfill request is needed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Delivery-service URL for this set, `None` when the set is empty.
    pub fn request_url(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!("{DELIVERY_SERVICE}?features={}", self.names.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(requested: &[&str]) -> PolyfillMode {
        PolyfillMode::Delivery {
            requested: requested.iter().map(ToString::to_string).collect(),
        }
    }

    fn year(y: u16) -> TargetYear {
        TargetYear::resolve([format!("es{y}")]).unwrap()
    }

    #[test]
    fn year_tokens_form_ascending_run_for_every_target() {
        let registry = PolyfillRegistry::builtin();
        for target_year in 2015..=2020u16 {
            let set = PolyfillSet::build(&delivery(&[]), year(target_year), &registry).unwrap();
            let expected: Vec<String> = (2015..=target_year.min(2019))
                .map(|y| format!("es{y}"))
                .collect();
            assert_eq!(set.names(), expected.as_slice(), "target es{target_year}");
        }
    }

    #[test]
    fn explicit_names_follow_year_tokens_sorted() {
        let registry = PolyfillRegistry::builtin();
        let set =
            PolyfillSet::build(&delivery(&["fetch", "IntersectionObserver"]), year(2016), &registry)
                .unwrap();
        assert_eq!(set.names(), ["es2015", "es2016", "IntersectionObserver", "fetch"]);
    }

    #[test]
    fn duplicates_collapse_to_one_occurrence() {
        let registry = PolyfillRegistry::builtin();
        let set = PolyfillSet::build(
            &delivery(&["fetch", "es2016", "fetch"]),
            year(2018),
            &registry,
        )
        .unwrap();
        assert_eq!(set.names(), ["es2015", "es2016", "es2017", "es2018", "fetch"]);
    }

    #[test]
    fn unknown_name_is_rejected_naming_the_value() {
        let registry = PolyfillRegistry::builtin();
        let err =
            PolyfillSet::build(&delivery(&["fetch", "es9000"]), year(2019), &registry).unwrap_err();
        let Error::UnknownPolyfill(name) = err;
        assert_eq!(name, "es9000");
    }

    #[test]
    fn inlined_mode_yields_empty_set() {
        let registry = PolyfillRegistry::builtin();
        let mode = PolyfillMode::Inlined { root: PathBuf::from(".") };
        let set = PolyfillSet::build(&mode, year(2020), &registry).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.request_url(), None);
    }

    #[test]
    fn request_url_joins_features_in_order() {
        let registry = PolyfillRegistry::builtin();
        let set = PolyfillSet::build(&delivery(&["fetch"]), year(2015), &registry).unwrap();
        assert_eq!(
            set.request_url().unwrap(),
            "https://polyfill.io/v3/polyfill.min.js?features=es2015,fetch"
        );
    }

    #[test]
    fn delivery_mode_set_is_never_empty() {
        let registry = PolyfillRegistry::builtin();
        for target_year in 2015..=2020u16 {
            let set = PolyfillSet::build(&delivery(&[]), year(target_year), &registry).unwrap();
            assert!(!set.is_empty());
        }
    }
}
