//! Parse-tree cache.
//!
//! A cache file holds the JSON line for one source file. It is reused when it
//! is non-empty, well-formed JSON and at least as new as both the source and
//! the running parser binary; anything else is replaced by a fresh parse.

use std::env;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::errors::{OasmError, SourceContext};
use crate::syntax::parse_to_json;

/// Where a tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOrigin {
    Cached,
    Parsed,
}

#[derive(Debug, Clone)]
pub struct CachedTree {
    /// One line of JSON, without the trailing newline.
    pub json: String,
    pub origin: TreeOrigin,
}

/// Reads and parses `path`, naming the source after the path.
pub fn read_source(path: &Path) -> Result<SourceContext, OasmError> {
    let content = fs::read_to_string(path).map_err(|e| OasmError::io(path, &e))?;
    Ok(SourceContext::from_file(path.display().to_string(), content))
}

/// Returns the tree for `source_path`, from `cache_path` when it is fresh.
pub fn load_or_parse(source_path: &Path, cache_path: &Path) -> Result<CachedTree, OasmError> {
    if let Some(json) = read_fresh_cache(source_path, cache_path) {
        debug!(cache = %cache_path.display(), "cache hit");
        return Ok(CachedTree {
            json,
            origin: TreeOrigin::Cached,
        });
    }
    debug!(cache = %cache_path.display(), "cache miss");

    let source = read_source(source_path)?;
    let json = parse_to_json(&source)?;
    write_cache(cache_path, &json)?;
    Ok(CachedTree {
        json,
        origin: TreeOrigin::Parsed,
    })
}

fn read_fresh_cache(source_path: &Path, cache_path: &Path) -> Option<String> {
    let cache_meta = fs::metadata(cache_path).ok()?;
    if cache_meta.len() == 0 {
        return None;
    }
    let cache_modified = cache_meta.modified().ok()?;
    let source_modified = fs::metadata(source_path).ok()?.modified().ok()?;
    if cache_modified < source_modified {
        debug!(cache = %cache_path.display(), "cache is older than its source");
        return None;
    }
    if parser_modified().is_some_and(|parser| cache_modified < parser) {
        debug!(cache = %cache_path.display(), "cache is older than the parser");
        return None;
    }
    let text = fs::read_to_string(cache_path).ok()?;
    let json = text.trim_end_matches(['\n', '\r']);
    if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
        debug!(cache = %cache_path.display(), error = %e, "cache is malformed");
        return None;
    }
    Some(json.to_string())
}

/// Modification time of the running executable. A rebuilt parser may have a
/// different grammar, so trees written before it are not reused.
fn parser_modified() -> Option<SystemTime> {
    let exe = env::current_exe().ok()?;
    fs::metadata(exe).ok()?.modified().ok()
}

fn write_cache(cache_path: &Path, json: &str) -> Result<(), OasmError> {
    if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OasmError::cache(cache_path, e.to_string()))?;
    }
    fs::write(cache_path, format!("{json}\n"))
        .map_err(|e| OasmError::cache(cache_path, e.to_string()))
}
