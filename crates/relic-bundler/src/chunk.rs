//! Modern and legacy chunk identities.

/// The already-built modern-syntax bundle. Produced by the host bundler
/// before this pipeline runs; read-only here.
#[derive(Debug, Clone)]
pub struct ModernChunk {
    /// Output file name, e.g. `app.abcd.js`.
    pub file_name: String,
    /// Bundle source text.
    pub code: String,
    /// Source map JSON, when the host emitted one.
    pub map: Option<String>,
}

/// The down-leveled artifact registered back into the host build as a
/// sibling of the modern file. Write-once: constructed by the Legacy
/// Artifact Builder and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LegacyChunk {
    /// Output file name, e.g. `app.abcd.legacy.js`.
    pub file_name: String,
    /// Bundle source text.
    pub code: String,
    /// Source map JSON, when source maps are enabled.
    pub map: Option<String>,
}

/// Derive the legacy file name: `app.abcd.js` -> `app.abcd.legacy.js`.
/// The extension is preserved so `app.mjs` becomes `app.legacy.mjs`.
pub fn legacy_file_name(modern: &str) -> String {
    match modern.rfind('.') {
        Some(idx) => format!("{}.legacy{}", &modern[..idx], &modern[idx..]),
        None => format!("{modern}.legacy"),
    }
}
