//! Source map chaining for the down-level transform.
//!
//! The transpiler's fresh map describes transpiled positions in terms of
//! the modern bundle. When the host hands over the modern bundle's own
//! map, the two are composed so the legacy map points at the original
//! sources instead of at an intermediate artifact.

use oxc_sourcemap::{SourceMap, SourceMapBuilder, Token};
use rustc_hash::FxHashMap;

/// Compose `fresh` (transpiled -> modern bundle) with `input` (modern
/// bundle -> original sources) into one map (transpiled -> original
/// sources).
///
/// Fresh tokens whose position precedes every input token are dropped:
/// there is nothing to attribute them to. Sources, contents and names are
/// carried over from the input map only.
pub(crate) fn chain_source_maps(
    fresh: &str,
    input: &str,
) -> std::result::Result<String, oxc_sourcemap::Error> {
    let fresh = SourceMap::from_json_string(fresh)?;
    let input = SourceMap::from_json_string(input)?;
    let input_tokens: Vec<Token> = input.get_tokens().collect();

    let mut builder = SourceMapBuilder::default();
    let mut source_ids: FxHashMap<u32, u32> = FxHashMap::default();
    let mut name_ids: FxHashMap<u32, u32> = FxHashMap::default();

    for token in fresh.get_tokens() {
        let Some(origin) = lookup(&input_tokens, token.get_src_line(), token.get_src_col()) else {
            continue;
        };

        let source_id = origin.get_source_id().and_then(|id| {
            let source = input.get_source(id)?;
            Some(*source_ids.entry(id).or_insert_with(|| {
                let content = input.get_source_content(id).map_or("", |c| c);
                builder.add_source_and_content(source, content)
            }))
        });
        let name_id = origin.get_name_id().and_then(|id| {
            let name = input.get_name(id)?;
            Some(*name_ids.entry(id).or_insert_with(|| builder.add_name(name)))
        });

        builder.add_token(
            token.get_dst_line(),
            token.get_dst_col(),
            origin.get_src_line(),
            origin.get_src_col(),
            source_id,
            name_id,
        );
    }

    Ok(builder.into_sourcemap().to_json_string())
}

/// Greatest input token at or before `(line, col)` in generated-position
/// order, the position the fresh token's source side refers to.
fn lookup<'a>(tokens: &'a [Token], line: u32, col: u32) -> Option<&'a Token> {
    let idx = tokens.partition_point(|t| (t.get_dst_line(), t.get_dst_col()) <= (line, col));
    idx.checked_sub(1).map(|i| &tokens[i])
}
