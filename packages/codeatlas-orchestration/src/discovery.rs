//! Discovery stage
//!
//! Walks the repository tree with the configured include/exclude globs,
//! hashes candidate files, and selects the working set: everything on a
//! full run, changed files plus their reverse-import closure on an
//! incremental run, unfinished files on a resume.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use codeatlas_ir::{IndexConfig, LanguageId};

use crate::error::{OrchestratorError, Result};
use crate::incremental::ReverseImportIndex;
use crate::pipeline::FileDiagnostic;
use crate::progress::JobProgress;

/// One discovered source file
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the repository root, '/'-separated
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub content_hash: String,
    pub size: u64,
}

/// Discovery output
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Files to run the per-file pipeline over, sorted by path
    pub files: Vec<DiscoveredFile>,
    /// Files present in the previous snapshot but gone now
    pub tombstones: Vec<String>,
    /// Oversized / unsupported files, with diagnostics
    pub skipped: Vec<FileDiagnostic>,
    /// Current `file_path → content_hash` over the whole tree (not just
    /// the working set; incremental fidelity needs the full map)
    pub file_hashes: HashMap<String, String>,
}

pub struct Discovery<'a> {
    config: &'a IndexConfig,
}

impl<'a> Discovery<'a> {
    pub fn new(config: &'a IndexConfig) -> Self {
        Self { config }
    }

    pub fn discover(
        &self,
        root: &Path,
        previous_hashes: Option<&HashMap<String, String>>,
        reverse_imports: Option<&ReverseImportIndex>,
        progress: Option<&JobProgress>,
    ) -> Result<DiscoveryReport> {
        let mut report = DiscoveryReport::default();

        let mut overrides = OverrideBuilder::new(root);
        for pattern in &self.config.include_patterns {
            overrides
                .add(pattern)
                .map_err(|e| OrchestratorError::Config(format!("Bad include pattern: {}", e)))?;
        }
        for pattern in &self.config.exclude_patterns {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| OrchestratorError::Config(format!("Bad exclude pattern: {}", e)))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| OrchestratorError::Config(format!("Bad glob set: {}", e)))?;

        let walker = WalkBuilder::new(root)
            .overrides(overrides)
            .hidden(true)
            .git_ignore(true)
            .build();

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "walk error");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let abs_path = entry.into_path();
            let rel_path = relative_path(root, &abs_path);

            if !self.supported(&rel_path) {
                continue;
            }

            let size = fs::metadata(&abs_path)?.len();
            if size > self.config.max_file_bytes {
                report.skipped.push(FileDiagnostic {
                    file_path: rel_path,
                    stage: "Discovery".to_string(),
                    error_kind: "file_too_large".to_string(),
                    message: format!("{} bytes exceeds max_file_bytes", size),
                });
                continue;
            }

            let bytes = fs::read(&abs_path)?;
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            let content_hash = format!("{:x}", hasher.finalize());

            report
                .file_hashes
                .insert(rel_path.clone(), content_hash.clone());
            candidates.push(DiscoveredFile {
                rel_path,
                abs_path,
                content_hash,
                size,
            });
        }
        candidates.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        // Incremental selection: changed files + reverse-import closure
        if let Some(previous) = previous_hashes {
            let changed: Vec<String> = candidates
                .iter()
                .filter(|f| previous.get(&f.rel_path) != Some(&f.content_hash))
                .map(|f| f.rel_path.clone())
                .collect();

            let affected = match reverse_imports {
                Some(index) => index.affected_files(&changed),
                None => changed.iter().cloned().collect(),
            };

            for path in previous.keys() {
                if !report.file_hashes.contains_key(path) {
                    report.tombstones.push(path.clone());
                }
            }
            report.tombstones.sort();

            candidates.retain(|f| affected.contains(&f.rel_path));
            info!(
                changed = changed.len(),
                affected = affected.len(),
                tombstones = report.tombstones.len(),
                "incremental discovery"
            );
        }

        // Resume: drop files the previous run already finished
        if let Some(progress) = progress {
            candidates.retain(|f| !progress.is_completed(&f.rel_path));
        }

        info!(files = candidates.len(), "discovery complete");
        report.files = candidates;
        Ok(report)
    }

    fn supported(&self, rel_path: &str) -> bool {
        let Some(ext) = rel_path.rsplit('.').next() else {
            return false;
        };
        if self
            .config
            .supported_extensions
            .iter()
            .any(|e| e.trim_start_matches('.') == ext)
        {
            return true;
        }
        LanguageId::from_extension(ext).is_some()
    }
}

fn relative_path(root: &Path, abs: &Path) -> String {
    abs.strip_prefix(root)
        .unwrap_or(abs)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discovers_supported_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.py", "x = 1\n");
        write(dir.path(), "a.py", "y = 2\n");
        write(dir.path(), "README.md", "# readme\n");

        let config = IndexConfig::default();
        let report = Discovery::new(&config)
            .discover(dir.path(), None, None, None)
            .unwrap();

        let paths: Vec<&str> = report.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.py", "b.py"]);
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.py", "x = 1\n");
        write(dir.path(), "vendor/dep.py", "y = 2\n");

        let config = IndexConfig::default();
        let report = Discovery::new(&config)
            .discover(dir.path(), None, None, None)
            .unwrap();

        let paths: Vec<&str> = report.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.py"]);
    }

    #[test]
    fn test_oversized_file_skipped_with_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.py", &"x = 1\n".repeat(100));

        let mut config = IndexConfig::default();
        config.max_file_bytes = 10;
        let report = Discovery::new(&config)
            .discover(dir.path(), None, None, None)
            .unwrap();

        assert!(report.files.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].error_kind, "file_too_large");
    }

    #[test]
    fn test_incremental_selects_changed_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x = 1\n");
        write(dir.path(), "b.py", "y = 2\n");

        let config = IndexConfig::default();
        let discovery = Discovery::new(&config);
        let full = discovery.discover(dir.path(), None, None, None).unwrap();

        // Change a.py, keep b.py
        write(dir.path(), "a.py", "x = 42\n");
        let report = discovery
            .discover(dir.path(), Some(&full.file_hashes), None, None)
            .unwrap();

        let paths: Vec<&str> = report.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.py"]);
        assert!(report.tombstones.is_empty());
    }

    #[test]
    fn test_deleted_file_becomes_tombstone() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x = 1\n");
        write(dir.path(), "b.py", "y = 2\n");

        let config = IndexConfig::default();
        let discovery = Discovery::new(&config);
        let full = discovery.discover(dir.path(), None, None, None).unwrap();

        fs::remove_file(dir.path().join("b.py")).unwrap();
        let report = discovery
            .discover(dir.path(), Some(&full.file_hashes), None, None)
            .unwrap();

        assert_eq!(report.tombstones, vec!["b.py".to_string()]);
    }

    #[test]
    fn test_resume_drops_completed_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x = 1\n");
        write(dir.path(), "b.py", "y = 2\n");

        let mut progress = JobProgress::new("repo", "snap1");
        progress.mark_completed("a.py");

        let config = IndexConfig::default();
        let report = Discovery::new(&config)
            .discover(dir.path(), None, None, Some(&progress))
            .unwrap();

        let paths: Vec<&str> = report.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["b.py"]);
    }

    #[test]
    fn test_supported_extensions_whitelist() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "script.xyz", "whatever\n");

        let mut config = IndexConfig::default();
        config.supported_extensions.push("xyz".to_string());
        let report = Discovery::new(&config)
            .discover(dir.path(), None, None, None)
            .unwrap();
        assert_eq!(report.files.len(), 1);
    }
}
