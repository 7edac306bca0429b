//! Module-script tag replacement in built HTML.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// The exact tag shape the host bundler emits for entry bundles. Other
/// module tags in the document are left untouched so several independent
/// entry bundles can coexist, each managed by its own pipeline instance.
static MODULE_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<script type="module" src="([^"]+)"></script>"#).expect("valid pattern")
});

/// Replace each module script tag whose `src` basename equals
/// `modern_file_name` with the text produced by `emit`.
///
/// `emit` receives the matched modern URL and the legacy URL derived from
/// it: `legacy_file_name` placed in the same directory as the modern
/// file. Rewriting is idempotent as long as `emit` does not itself
/// produce a matching module tag.
pub fn rewrite_html(
    html: &str,
    modern_file_name: &str,
    legacy_file_name: &str,
    mut emit: impl FnMut(&str, &str) -> String,
) -> String {
    MODULE_SCRIPT
        .replace_all(html, |caps: &Captures<'_>| {
            let src = &caps[1];
            if basename(src) == modern_file_name {
                emit(src, &sibling(src, legacy_file_name))
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `/assets/app.js` + `app.legacy.js` -> `/assets/app.legacy.js`.
fn sibling(path: &str, file_name: &str) -> String {
    match path.rfind('/') {
        Some(idx) => format!("{}/{}", &path[..idx], file_name),
        None => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_takes_final_segment() {
        assert_eq!(basename("/assets/app.js"), "app.js");
        assert_eq!(basename("app.js"), "app.js");
    }

    #[test]
    fn sibling_replaces_final_segment() {
        assert_eq!(sibling("/assets/app.js", "app.legacy.js"), "/assets/app.legacy.js");
        assert_eq!(sibling("app.js", "app.legacy.js"), "app.legacy.js");
    }
}
