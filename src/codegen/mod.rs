//! Code Generation
//!
//! Turns a `ResolvedModel` into one source artifact per target language.
//!
//! Architecture:
//! - NameTable: every identifier of one backend, computed once before emission
//! - CodegenContext: read-only view of resolved model + names + render profile
//! - CodeEmitter: one implementation per language, selected through EmitterRegistry
//!
//! The key constraint: emitters never see raw schema documents, only resolved
//! types, and emission is pure (same inputs, byte-identical output).

pub mod config;
pub mod names;
pub mod python;
pub mod rust;

pub use config::{Language, NamingConfig, RenderProfile, ReservedWords};
pub use names::{IdentifierStyle, NameTable, NamingResolver};

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{DomainTag, QName};
use crate::resolver::{ResolvedComplexType, ResolvedEnumeration, ResolvedField, ResolvedModel, ResolvedType, ValueType};

// =============================================================================
// Emitted values
// =============================================================================

/// One constant of a generated enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedSymbol {
    /// Language identifier, unique within the enclosing type
    pub identifier: String,
    /// Exact raw schema value
    pub value: String,
    /// Display label and provenance, if any
    pub documentation: Option<String>,
}

/// One generated file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub language: Language,
    pub path: PathBuf,
    pub content: String,
    /// Number of type declarations in `content`
    pub type_count: usize,
}

// =============================================================================
// CodegenContext
// =============================================================================

/// Everything an emitter may read while rendering one module
pub struct CodegenContext<'a> {
    pub resolved: &'a ResolvedModel,
    pub names: &'a NameTable,
    pub profile: &'a RenderProfile,
}

impl<'a> CodegenContext<'a> {
    /// Generated name of a type, falling back to its local name
    pub fn type_name(&self, name: &QName) -> String {
        self.names
            .type_name(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.local.clone())
    }

    /// Constants of an enumeration, aligned with the resolved member order
    pub fn symbols(&self, enumeration: &ResolvedEnumeration) -> Vec<EmittedSymbol> {
        let identifiers = self.names.members(&enumeration.name);
        enumeration
            .members
            .iter()
            .zip(identifiers)
            .map(|(member, identifier)| {
                let mut parts = Vec::new();
                if let Some(label) = &member.label {
                    parts.push(label.clone());
                }
                // Only a member-level tag that differs from the type's is worth repeating
                if let Some(domain) = &member.provenance.domain {
                    if enumeration.domain.as_ref() != Some(domain) {
                        parts.push(format!("[{}]", domain));
                    }
                }
                EmittedSymbol {
                    identifier: identifier.clone(),
                    value: member.value.clone(),
                    documentation: if parts.is_empty() { None } else { Some(parts.join(" ")) },
                }
            })
            .collect()
    }

    /// Documentation lines of a type: schema text, then the domain tag
    pub fn enum_documentation(&self, enumeration: &ResolvedEnumeration) -> Vec<String> {
        // The tag is re-rendered from `domain`; drop the raw annotation line
        let mut lines: Vec<String> = enumeration
            .documentation
            .iter()
            .flat_map(|block| block.lines())
            .filter(|line| DomainTag::parse(line).is_none())
            .map(str::to_string)
            .collect();
        if let Some(domain) = &enumeration.domain {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(domain.to_string());
        }
        lines
    }

    /// Target type of a value type, without optional/array wrapping
    pub fn render_value_type(&self, value_type: &ValueType) -> String {
        match value_type {
            ValueType::Builtin(local) => self.profile.builtin_type(local),
            ValueType::Enumeration(name) | ValueType::Complex(name) => match self.names.type_name(name) {
                Some(identifier) => identifier.to_string(),
                None => self.profile.types.string.clone(),
            },
            ValueType::List(inner) => self.profile.wrap_array(&self.render_value_type(inner)),
        }
    }

    /// Whether a single-valued field closes a reference cycle back to `owner`
    pub fn needs_boxing(&self, owner: &QName, field: &ResolvedField) -> bool {
        if field.is_many() {
            return false;
        }
        let ValueType::Complex(target) = &field.value_type else {
            return false;
        };
        let mut stack = vec![target];
        let mut visited: HashSet<&QName> = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == owner {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(complex) = self.resolved.complex_type(current) {
                for f in &complex.fields {
                    if let ValueType::Complex(next) = &f.value_type {
                        stack.push(next);
                    }
                }
            }
        }
        false
    }
}

// =============================================================================
// CodeEmitter
// =============================================================================

/// Language backend
pub trait CodeEmitter: Send + Sync {
    fn language(&self) -> Language;

    fn profile(&self) -> &RenderProfile;

    /// File the module for `module_name` is written to
    fn file_name(&self, module_name: &str) -> String {
        format!("{}.{}", module_name, self.profile().extension)
    }

    /// Header, imports and module-level attributes
    fn emit_module_header(&self, ctx: &CodegenContext<'_>) -> String;

    /// Text between two top-level declarations
    fn type_separator(&self) -> &'static str {
        "\n"
    }

    /// Documentation block for `lines`, indented by `indent` spaces
    fn emit_doc_comment(&self, lines: &[String], indent: usize) -> String;

    fn emit_enum_type(&self, enumeration: &ResolvedEnumeration, ctx: &CodegenContext<'_>) -> String;

    fn emit_complex_type(&self, complex: &ResolvedComplexType, ctx: &CodegenContext<'_>) -> String;

    /// Render every resolved type into one module, in source declaration order
    fn emit_module(
        &self,
        resolved: &ResolvedModel,
        naming: &NamingResolver,
        module_name: &str,
    ) -> Result<GeneratedArtifact> {
        let reserved = self.profile().reserved_words();
        let names = NameTable::build(resolved, naming, &reserved)?;
        let ctx = CodegenContext {
            resolved,
            names: &names,
            profile: self.profile(),
        };

        let mut content = self.emit_module_header(&ctx);
        let mut type_count = 0;
        for ty in resolved.types() {
            content.push_str(self.type_separator());
            match ty {
                ResolvedType::Enumeration(e) => content.push_str(&self.emit_enum_type(e, &ctx)),
                ResolvedType::Complex(c) => content.push_str(&self.emit_complex_type(c, &ctx)),
            }
            type_count += 1;
        }
        if !content.ends_with('\n') {
            content.push('\n');
        }

        tracing::debug!(language = %self.language(), types = type_count, "Emitted module");
        Ok(GeneratedArtifact {
            language: self.language(),
            path: PathBuf::from(self.file_name(module_name)),
            content,
            type_count,
        })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Emitters keyed by language
#[derive(Clone, Default)]
pub struct EmitterRegistry {
    emitters: BTreeMap<Language, Arc<dyn CodeEmitter>>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in backend
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(python::PythonEmitter::new(RenderProfile::python())));
        registry.register(Arc::new(rust::RustEmitter::new(RenderProfile::rust())));
        registry
    }

    /// Add or replace the emitter for its language
    pub fn register(&mut self, emitter: Arc<dyn CodeEmitter>) {
        self.emitters.insert(emitter.language(), emitter);
    }

    pub fn get(&self, language: Language) -> Option<Arc<dyn CodeEmitter>> {
        self.emitters.get(&language).cloned()
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.emitters.keys().copied()
    }
}

impl std::fmt::Debug for EmitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterRegistry")
            .field("languages", &self.emitters.keys().collect::<Vec<_>>())
            .finish()
    }
}
