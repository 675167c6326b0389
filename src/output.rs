//! Artifact sinks
//!
//! Generated files are staged first and only become visible on `commit`.
//! `StagedDirSink` stages into temp files next to their targets and renames
//! them into place, so an interrupted or failed run never leaves a partially
//! written module behind.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::checksum::Checksum;
use crate::codegen::{GeneratedArtifact, Language};

/// File name of the generation manifest
pub const MANIFEST_FILE: &str = "bindgen-manifest.json";

/// Outcome of committing staged artifacts; paths are relative to the sink
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Paths now visible in the sink
    pub written: Vec<PathBuf>,
    /// Paths that could not be moved into place
    pub failed: Vec<(PathBuf, io::Error)>,
}

/// Caller-supplied destination for generated artifacts. Never read from.
pub trait ArtifactSink: Send {
    /// Stage `content` under `relative`; replaces an earlier staging of the same path
    fn stage(&mut self, relative: &Path, content: &str) -> io::Result<()>;

    /// Make every staged artifact visible
    fn commit(&mut self) -> CommitReport;

    /// Discard every staged artifact
    fn rollback(&mut self);

    /// Number of artifacts staged but not yet committed
    fn staged_count(&self) -> usize;
}

// =============================================================================
// Directory sink
// =============================================================================

/// Writes into a directory with atomic renames
pub struct StagedDirSink {
    root: PathBuf,
    staged: BTreeMap<PathBuf, NamedTempFile>,
}

impl StagedDirSink {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            staged: BTreeMap::new(),
        })
    }
}

impl ArtifactSink for StagedDirSink {
    fn stage(&mut self, relative: &Path, content: &str) -> io::Result<()> {
        let target = self.root.join(relative);
        let parent = target.parent().unwrap_or(&self.root).to_path_buf();
        std::fs::create_dir_all(&parent)?;

        // Same directory as the target so the rename never crosses filesystems
        let mut file = tempfile::Builder::new()
            .prefix(".bindgen-")
            .suffix(".tmp")
            .tempfile_in(&parent)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "Staged artifact");
        self.staged.insert(relative.to_path_buf(), file);
        Ok(())
    }

    fn commit(&mut self) -> CommitReport {
        let mut report = CommitReport::default();
        for (relative, file) in std::mem::take(&mut self.staged) {
            match file.persist(self.root.join(&relative)) {
                Ok(_) => report.written.push(relative),
                // The temp file is removed when the returned handle drops
                Err(e) => report.failed.push((relative, e.error)),
            }
        }
        report
    }

    fn rollback(&mut self) {
        if !self.staged.is_empty() {
            tracing::debug!(staged = self.staged.len(), "Discarding staged artifacts");
        }
        self.staged.clear();
    }

    fn staged_count(&self) -> usize {
        self.staged.len()
    }
}

// =============================================================================
// Memory sink
// =============================================================================

/// Keeps artifacts in memory (tests, drift checks, dry runs)
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    staged: BTreeMap<PathBuf, String>,
    committed: BTreeMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed content of one artifact
    pub fn get(&self, relative: impl AsRef<Path>) -> Option<&str> {
        self.committed.get(relative.as_ref()).map(String::as_str)
    }

    /// Committed artifacts by path
    pub fn files(&self) -> &BTreeMap<PathBuf, String> {
        &self.committed
    }
}

impl ArtifactSink for MemorySink {
    fn stage(&mut self, relative: &Path, content: &str) -> io::Result<()> {
        self.staged.insert(relative.to_path_buf(), content.to_string());
        Ok(())
    }

    fn commit(&mut self) -> CommitReport {
        let mut report = CommitReport::default();
        for (path, content) in std::mem::take(&mut self.staged) {
            report.written.push(path.clone());
            self.committed.insert(path, content);
        }
        report
    }

    fn rollback(&mut self) {
        self.staged.clear();
    }

    fn staged_count(&self) -> usize {
        self.staged.len()
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// One generated artifact in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the output directory, `/`-separated
    pub path: String,
    pub language: Language,
    pub checksum: Checksum,
    pub types: usize,
}

/// Deterministic summary of one generation run (no timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    pub generator: String,
    pub version: String,
    pub artifacts: Vec<ManifestEntry>,
}

impl GenerationManifest {
    pub fn new<'a>(artifacts: impl IntoIterator<Item = &'a GeneratedArtifact>) -> Self {
        let mut entries: Vec<ManifestEntry> = artifacts
            .into_iter()
            .map(|a| ManifestEntry {
                path: portable_path(&a.path),
                language: a.language,
                checksum: Checksum::of(&a.content),
                types: a.type_count,
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            generator: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            artifacts: entries,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.artifacts.iter().find(|e| e.path == path)
    }
}

fn portable_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_files_invisible_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = StagedDirSink::new(dir.path()).unwrap();
        sink.stage(Path::new("voc.py"), "A = 1\n").unwrap();
        sink.stage(Path::new("nested/voc.rs"), "// x\n").unwrap();

        assert!(!dir.path().join("voc.py").exists());
        assert_eq!(sink.staged_count(), 2);

        let report = sink.commit();
        assert!(report.failed.is_empty());
        assert_eq!(report.written.len(), 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("voc.py")).unwrap(), "A = 1\n");
        assert_eq!(std::fs::read_to_string(dir.path().join("nested/voc.rs")).unwrap(), "// x\n");
        assert_eq!(sink.staged_count(), 0);
    }

    #[test]
    fn test_rollback_and_drop_leave_no_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("voc.py"), "old\n").unwrap();
        {
            let mut sink = StagedDirSink::new(dir.path()).unwrap();
            sink.stage(Path::new("voc.py"), "new\n").unwrap();
            sink.rollback();
            sink.stage(Path::new("other.py"), "x\n").unwrap();
            // dropped without commit
        }
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["voc.py".to_string()]);
        assert_eq!(std::fs::read_to_string(dir.path().join("voc.py")).unwrap(), "old\n");
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.stage(Path::new("a.py"), "a").unwrap();
        assert!(sink.get("a.py").is_none());
        sink.commit();
        assert_eq!(sink.get("a.py"), Some("a"));
    }

    #[test]
    fn test_manifest_is_sorted_and_stable() {
        let artifacts = vec![
            GeneratedArtifact {
                language: Language::Rust,
                path: PathBuf::from("voc.rs"),
                content: "r".to_string(),
                type_count: 1,
            },
            GeneratedArtifact {
                language: Language::Python,
                path: PathBuf::from("voc.py"),
                content: "p".to_string(),
                type_count: 1,
            },
        ];
        let manifest = GenerationManifest::new(&artifacts);
        let paths: Vec<_> = manifest.artifacts.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["voc.py", "voc.rs"]);
        assert_eq!(manifest.to_json().unwrap(), GenerationManifest::new(artifacts.iter().rev()).to_json().unwrap());
        assert!(manifest.entry("voc.py").unwrap().checksum.verify("p"));
    }
}
