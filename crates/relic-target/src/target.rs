//! Baseline ECMAScript edition for one build.

use crate::{Error, Result};

/// Editions below this have no suffix-specific meaning: `es6` is the 2015
/// edition, so ordinals are offset by six years from ES5's 2009 baseline.
const EDITION_EPOCH: u16 = 2009;

/// Resolved ECMAScript edition of the modern bundle, as a calendar year.
///
/// Exactly one `TargetYear` exists per build. The value is always within
/// `[MIN, MAX]`; `es5` and `esnext` never resolve because neither has a
/// defined syntax test nor a down-level transform baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetYear(u16);

impl TargetYear {
    /// Earliest edition the loader's module probe can gate on its own.
    pub const MIN: u16 = 2015;
    /// Latest edition with a defined syntax probe.
    pub const MAX: u16 = 2020;

    /// Resolve a target specification to its baseline edition.
    ///
    /// The first token matching `es` followed by digits (case-insensitive)
    /// wins; `esnext` counts as an ES token so it can be rejected rather
    /// than skipped. A digit suffix below 2000 is an edition ordinal
    /// (`es6` is 2015), otherwise a calendar year. With no matching token
    /// the default is `es2020`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedTarget`] for `es5` and `esnext` in any casing.
    pub fn resolve<I, S>(targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in targets {
            let token = token.as_ref();
            if let Some(suffix) = es_suffix(token) {
                return Self::from_suffix(token, suffix);
            }
        }
        Ok(Self(Self::MAX))
    }

    fn from_suffix(token: &str, suffix: &str) -> Result<Self> {
        if suffix.eq_ignore_ascii_case("next") {
            return Err(Error::UnsupportedTarget(token.to_string()));
        }
        let raw: u16 = suffix
            .parse()
            .map_err(|_| Error::UnsupportedTarget(token.to_string()))?;
        if raw == 5 {
            return Err(Error::UnsupportedTarget(token.to_string()));
        }
        let year = if raw < 2000 { raw + EDITION_EPOCH } else { raw };
        Ok(Self(year.clamp(Self::MIN, Self::MAX)))
    }

    /// The resolved calendar year, e.g. `2019` for `es2019`.
    pub fn year(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for TargetYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "es{}", self.0)
    }
}

/// Returns the part after `es` when the token is an ES edition token:
/// `es` followed by digits, or `esnext`.
fn es_suffix(token: &str) -> Option<&str> {
    let prefix = token.get(..2)?;
    if !prefix.eq_ignore_ascii_case("es") {
        return None;
    }
    let rest = &token[2..];
    let is_edition =
        rest.eq_ignore_ascii_case("next") || (!rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()));
    is_edition.then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_calendar_year_tokens() {
        let target = TargetYear::resolve(["es2019"]).unwrap();
        assert_eq!(target.year(), 2019);
        assert_eq!(target.to_string(), "es2019");
    }

    #[test]
    fn resolution_is_case_insensitive() {
        for token in ["es2020", "Es2020", "ES2020", "eS2020"] {
            assert_eq!(TargetYear::resolve([token]).unwrap().year(), 2020);
        }
    }

    #[test]
    fn first_matching_token_wins() {
        let target = TargetYear::resolve(["chrome58", "es2018", "firefox57"]).unwrap();
        assert_eq!(target.year(), 2018);

        let target = TargetYear::resolve(["chrome58", "es2016", "es2020"]).unwrap();
        assert_eq!(target.year(), 2016);
    }

    #[test]
    fn defaults_to_es2020_without_es_token() {
        assert_eq!(TargetYear::resolve(["chrome58", "defaults"]).unwrap().year(), 2020);
        assert_eq!(TargetYear::resolve(Vec::<String>::new()).unwrap().year(), 2020);
    }

    #[test]
    fn edition_ordinals_map_to_years() {
        assert_eq!(TargetYear::resolve(["es6"]).unwrap().year(), 2015);
        assert_eq!(TargetYear::resolve(["es11"]).unwrap().year(), 2020);
    }

    #[test]
    fn rejects_es5_and_esnext_in_any_casing() {
        for token in ["es5", "ES5", "esnext", "ESNext", "esNEXT"] {
            let err = TargetYear::resolve([token]).unwrap_err();
            let Error::UnsupportedTarget(value) = err;
            assert_eq!(value, token);
        }
    }

    #[test]
    fn non_es_tokens_never_reject() {
        // "esbuild" has a non-digit suffix and is an ordinary browser-ish
        // token, not an edition.
        assert_eq!(TargetYear::resolve(["esbuild"]).unwrap().year(), 2020);
        assert_eq!(TargetYear::resolve(["node14"]).unwrap().year(), 2020);
    }

    #[test]
    fn out_of_range_years_clamp_into_bounds() {
        assert_eq!(TargetYear::resolve(["es2022"]).unwrap().year(), 2020);
        assert_eq!(TargetYear::resolve(["es2014"]).unwrap().year(), 2015);
    }
}
