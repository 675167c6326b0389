//! Schema Sources
//!
//! The parser never touches the filesystem directly: it asks a `SchemaSource`
//! to canonicalize, resolve and load documents. This is the resolver callback
//! for `xs:import` / `xs:include`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Loads schema documents and resolves references between them
pub trait SchemaSource: Send + Sync {
    /// Canonical form of a location; two spellings of one document must agree
    fn canonicalize(&self, location: &str) -> io::Result<String>;

    /// Resolve a `schemaLocation` relative to the document at `base`
    fn resolve(&self, base: &str, reference: &str) -> String;

    /// Read the document text
    fn load(&self, location: &str) -> io::Result<String>;
}

// =============================================================================
// Filesystem
// =============================================================================

/// Reads schemas from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsSchemaSource;

impl FsSchemaSource {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaSource for FsSchemaSource {
    fn canonicalize(&self, location: &str) -> io::Result<String> {
        let path = fs::canonicalize(location)?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn resolve(&self, base: &str, reference: &str) -> String {
        let reference_path = Path::new(reference);
        if reference_path.is_absolute() {
            return reference.to_string();
        }
        let dir = Path::new(base).parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);
        dir.join(reference_path).to_string_lossy().into_owned()
    }

    fn load(&self, location: &str) -> io::Result<String> {
        fs::read_to_string(location)
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Serves schemas from memory, keyed by `/`-separated names
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaSource {
    documents: HashMap<String, String>,
}

impl MemorySchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: &str, content: impl Into<String>) {
        self.documents.insert(normalize_path(name), content.into());
    }
}

impl SchemaSource for MemorySchemaSource {
    fn canonicalize(&self, location: &str) -> io::Result<String> {
        let normalized = normalize_path(location);
        if self.documents.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory schema named '{}'", location),
            ))
        }
    }

    fn resolve(&self, base: &str, reference: &str) -> String {
        if reference.starts_with('/') {
            return normalize_path(reference);
        }
        match base.rfind('/') {
            Some(idx) => normalize_path(&format!("{}/{}", &base[..idx], reference)),
            None => normalize_path(reference),
        }
    }

    fn load(&self, location: &str) -> io::Result<String> {
        self.documents.get(&normalize_path(location)).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory schema named '{}'", location),
            )
        })
    }
}

/// Collapse `.` and `..` segments of a `/`-separated path
fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a/./b/../c.xsd"), "a/c.xsd");
        assert_eq!(normalize_path("../x.xsd"), "../x.xsd");
        assert_eq!(normalize_path("/a/../b.xsd"), "/b.xsd");
    }

    #[test]
    fn test_memory_resolve_relative() {
        let source = MemorySchemaSource::new()
            .with_document("schemas/root.xsd", "<x/>")
            .with_document("schemas/common/voc.xsd", "<y/>");
        let resolved = source.resolve("schemas/root.xsd", "common/voc.xsd");
        assert_eq!(resolved, "schemas/common/voc.xsd");
        assert_eq!(source.canonicalize("schemas/./common/voc.xsd").unwrap(), resolved);
        assert_eq!(source.load(&resolved).unwrap(), "<y/>");
        assert!(source.canonicalize("missing.xsd").is_err());
    }

    #[test]
    fn test_fs_source_resolves_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.xsd");
        let mut file = fs::File::create(&root).unwrap();
        write!(file, "<schema/>").unwrap();
        fs::write(dir.path().join("other.xsd"), "<schema/>").unwrap();

        let source = FsSchemaSource::new();
        let root_str = source.canonicalize(root.to_str().unwrap()).unwrap();
        let other = source.resolve(&root_str, "other.xsd");
        assert!(source.canonicalize(&other).is_ok());
        assert_eq!(source.load(&other).unwrap(), "<schema/>");
    }
}
