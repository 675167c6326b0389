//! Error types for the binding generator

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::codegen::Language;
use crate::model::QName;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Where in a schema document something was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    /// Canonical document location (path or in-memory name)
    pub document: String,
    /// 1-based line, 0 when unknown
    pub line: u32,
    /// 1-based column, 0 when unknown
    pub column: u32,
}

impl SourceLocation {
    pub fn new(document: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            document: document.into(),
            line,
            column,
        }
    }

    /// Location pointing at a whole document
    pub fn document(document: impl Into<String>) -> Self {
        Self::new(document, 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.document)
        } else {
            write!(f, "{}:{}:{}", self.document, self.line, self.column)
        }
    }
}

/// Malformed or unresolvable schema input, localized to one document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{location}: {reason}")]
pub struct SchemaParseError {
    pub location: SourceLocation,
    pub reason: String,
}

impl SchemaParseError {
    pub fn new(location: SourceLocation, reason: impl Into<String>) -> Self {
        Self {
            location,
            reason: reason.into(),
        }
    }
}

/// Generator errors
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Schema parse error: {0}")]
    SchemaParse(#[from] SchemaParseError),

    #[error("Cyclic type hierarchy: {}", format_chain(.chain))]
    CyclicTypeHierarchy { chain: Vec<QName> },

    #[error("Empty resolved enumeration {type_name}: restriction chain {} leaves no members", format_chain(.chain))]
    EmptyResolvedEnumeration { type_name: QName, chain: Vec<QName> },

    #[error("Could not find a free identifier for value {raw_value:?} in {type_name} (generator defect)")]
    CollisionResolution { type_name: String, raw_value: String },

    #[error("Failed to write {language} output {}: {source}", .path.display())]
    EmissionIo {
        language: Language,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Generation cancelled {stage}")]
    Cancelled { stage: &'static str },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerateError {
    /// Errors that must abort the whole run instead of being aggregated
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            GenerateError::CollisionResolution { .. } | GenerateError::Cancelled { .. }
        )
    }
}

fn format_chain(chain: &[QName]) -> String {
    chain
        .iter()
        .map(|q| q.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
