//! Batch parsing of a source tree into a mirrored tree of cached JSON files.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cache::{load_or_parse, TreeOrigin};
use crate::errors::{ErrorKind, OasmError};

pub const SOURCE_EXTENSION: &str = "oasm";
pub const CACHE_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Cached,
    Parsed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub cache: PathBuf,
    pub status: FileStatus,
}

/// Outcome of a batch run that parsed every file.
#[derive(Debug, Default)]
pub struct ProjectReport {
    pub files: Vec<FileReport>,
}

impl ProjectReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Recursively collects `.oasm` files under `root`, sorted so runs are
/// reproducible.
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>, OasmError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .unwrap_or(root)
                .display()
                .to_string();
            OasmError::unspanned(
                ErrorKind::Io {
                    path: path.clone(),
                    message: e.to_string(),
                },
                &path,
                "io",
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// `source_dir/a/b.oasm` maps to `cache_dir/a/b.json`.
pub fn cache_path_for(source_dir: &Path, cache_dir: &Path, source: &Path) -> PathBuf {
    let relative = source.strip_prefix(source_dir).unwrap_or(source);
    cache_dir.join(relative).with_extension(CACHE_EXTENSION)
}

pub fn parse_project(source_dir: &Path, cache_dir: &Path) -> Result<ProjectReport, OasmError> {
    parse_project_with(source_dir, cache_dir, |_| {})
}

/// Like [`parse_project`], calling `observe` after each file, failures
/// included. Stops at the first file that does not parse.
pub fn parse_project_with<F>(
    source_dir: &Path,
    cache_dir: &Path,
    mut observe: F,
) -> Result<ProjectReport, OasmError>
where
    F: FnMut(&FileReport),
{
    let sources = discover_sources(source_dir)?;
    info!(files = sources.len(), root = %source_dir.display(), "building project");

    let mut report = ProjectReport::default();
    for source in sources {
        let cache = cache_path_for(source_dir, cache_dir, &source);
        let result = load_or_parse(&source, &cache);
        let status = match &result {
            Ok(tree) if tree.origin == TreeOrigin::Cached => FileStatus::Cached,
            Ok(_) => FileStatus::Parsed,
            Err(_) => FileStatus::Failed,
        };
        debug!(source = %source.display(), ?status, "file done");
        let file = FileReport {
            source,
            cache,
            status,
        };
        observe(&file);
        result?;
        report.files.push(file);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_path_mirrors_the_source_tree() {
        let path = cache_path_for(
            Path::new("src"),
            Path::new("build/trees"),
            Path::new("src/kernel/io.oasm"),
        );
        assert_eq!(path, PathBuf::from("build/trees/kernel/io.json"));
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        for name in ["b.oasm", "a.oasm", "notes.txt", "lib/c.oasm"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let found = discover_sources(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.oasm"),
                PathBuf::from("b.oasm"),
                PathBuf::from("lib/c.oasm"),
            ]
        );
    }
}
