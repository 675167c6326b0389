//! Diagnostics
//!
//! Collects warnings and errors across the parse, resolve and emit stages so a
//! single run reports every problem it can detect, not just the first one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GenerateError, SchemaParseError};

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Parsing ===
    /// Malformed document, unresolved reference, duplicate qualified name
    SchemaParse,

    // === Resolution ===
    /// Restriction/extension/group chain loops back on itself
    CyclicTypeHierarchy,
    /// Restriction intersection left no members
    EmptyResolvedEnumeration,
    /// Type skipped because a type it derives from failed
    DependsOnFailedType,
    /// Restriction declares a value its base does not have
    MemberNotInBase,
    /// Same raw value contributed by two merged layers
    ValueCollision,

    // === Emission ===
    /// Naming strategy exhausted (generator defect)
    CollisionResolution,
    /// Filesystem failure while writing one language's output
    EmissionIo,

    // === General ===
    /// Configuration could not be loaded
    Config,
    /// Run was cancelled between stages
    Cancelled,
    /// Generated output differs from what is on disk
    Drift,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaParse => "E001",
            Self::CyclicTypeHierarchy => "E002",
            Self::EmptyResolvedEnumeration => "E003",
            Self::CollisionResolution => "E004",
            Self::EmissionIo => "E005",
            Self::Config => "E006",
            Self::Cancelled => "E007",
            Self::Drift => "E008",
            Self::DependsOnFailedType => "W001",
            Self::MemberNotInBase => "W002",
            Self::ValueCollision => "W003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::SchemaParse
            | Self::CyclicTypeHierarchy
            | Self::EmptyResolvedEnumeration
            | Self::CollisionResolution
            | Self::EmissionIo
            | Self::Config
            | Self::Cancelled
            | Self::Drift => Severity::Error,

            Self::DependsOnFailedType | Self::MemberNotInBase | Self::ValueCollision => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Type name, document location or language the diagnostic is about
    pub subject: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Additional context (chains, related declarations)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

impl From<&SchemaParseError> for DiagnosticItem {
    fn from(err: &SchemaParseError) -> Self {
        DiagnosticItem::new(err.location.to_string(), DiagnosticCode::SchemaParse, err.reason.clone())
    }
}

impl From<&GenerateError> for DiagnosticItem {
    fn from(err: &GenerateError) -> Self {
        match err {
            GenerateError::SchemaParse(e) => e.into(),
            GenerateError::CyclicTypeHierarchy { chain } => {
                let subject = chain.first().map(|q| q.to_string()).unwrap_or_default();
                let joined = chain.iter().map(|q| q.to_string()).collect::<Vec<_>>().join(" -> ");
                DiagnosticItem::new(subject, DiagnosticCode::CyclicTypeHierarchy, err.to_string())
                    .with_context(format!("Chain: {}", joined))
            }
            GenerateError::EmptyResolvedEnumeration { type_name, chain } => {
                let joined = chain.iter().map(|q| q.to_string()).collect::<Vec<_>>().join(" -> ");
                DiagnosticItem::new(type_name.to_string(), DiagnosticCode::EmptyResolvedEnumeration, err.to_string())
                    .with_context(format!("Chain: {}", joined))
            }
            GenerateError::CollisionResolution { type_name, .. } => {
                DiagnosticItem::new(type_name.clone(), DiagnosticCode::CollisionResolution, err.to_string())
            }
            GenerateError::EmissionIo { language, .. } => {
                DiagnosticItem::new(language.to_string(), DiagnosticCode::EmissionIo, err.to_string())
            }
            GenerateError::Config(_) => DiagnosticItem::new("config", DiagnosticCode::Config, err.to_string()),
            GenerateError::Cancelled { stage } => {
                DiagnosticItem::new(*stage, DiagnosticCode::Cancelled, err.to_string())
            }
            GenerateError::Io(_) | GenerateError::Json(_) | GenerateError::WorkerPool(_) => {
                DiagnosticItem::new("io", DiagnosticCode::EmissionIo, err.to_string())
            }
        }
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from all pipeline stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        match item.severity() {
            Severity::Error => tracing::debug!(code = %item.code, "{}", item.message),
            Severity::Warning => tracing::warn!(code = %item.code, "{}", item.message),
        }
        self.items.push(item);
    }

    /// Record an error value
    pub fn push_error(&mut self, err: &GenerateError) {
        self.push(DiagnosticItem::from(err));
    }

    /// Add a warning
    pub fn warning(&mut self, subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) {
        self.push(DiagnosticItem::new(subject, code, message));
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Check if a specific code was reported
    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|i| i.code == code)
    }

    /// All items with a specific code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Promote every warning to an error-carrying item (for `warnings_as_errors`)
    pub fn promote_warnings(&mut self) -> usize {
        let promoted = self.warning_count();
        if promoted > 0 {
            let subjects: Vec<String> = self.warnings().map(|w| w.to_string()).collect();
            let mut item = DiagnosticItem::new(
                "diagnostics",
                DiagnosticCode::Config,
                format!("{} warning(s) treated as errors", promoted),
            );
            for s in subjects {
                item = item.with_context(s);
            }
            self.items.push(item);
        }
        promoted
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
