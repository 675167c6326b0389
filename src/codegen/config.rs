//! Codegen Configuration
//!
//! Two-tier configuration:
//! - Global (NamingConfig): language-agnostic identifier conventions
//! - Per-language (RenderProfile): builtin type mappings, optionality, reserved words
//!
//! Resolution is config-free. Only naming and emission consult configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

// =============================================================================
// Languages
// =============================================================================

/// Supported target languages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
        }
    }

    pub fn all() -> &'static [Language] {
        &[Language::Python, Language::Rust]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Naming Configuration (Language-Agnostic)
// =============================================================================

/// Identifier conventions shared by every backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Appended to identifiers that collide with a reserved word (`AS` -> `AS_VALUE`)
    pub reserved_suffix: String,
    /// Prepended to identifiers starting with a digit (`1` -> `VALUE_1`)
    pub digit_prefix: String,
    /// Identifier for the empty literal
    pub empty_name: String,
    /// Acronyms kept upper-case in type names
    pub acronyms: BTreeSet<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            reserved_suffix: "_VALUE".to_string(),
            digit_prefix: "VALUE_".to_string(),
            empty_name: "VALUE".to_string(),
            acronyms: ["ID", "URL", "URI", "XML", "HL7", "OID", "UUID", "API"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Reserved Words
// =============================================================================

/// Case-insensitive reserved word set of one target language
#[derive(Debug, Clone, Default)]
pub struct ReservedWords {
    words: HashSet<String>,
}

impl ReservedWords {
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            words: words.into_iter().map(|w| w.to_ascii_lowercase()).collect(),
        }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.words.contains(&candidate.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

// =============================================================================
// Render Profile (Per-Language)
// =============================================================================

/// Language-specific rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderProfile {
    pub language: Language,
    /// Builtin XSD datatype mappings
    pub types: TypeMappings,
    /// How to represent optional fields
    pub optional: OptionalRepr,
    /// File extension of generated modules
    pub extension: String,
}

/// Target types for the XSD builtin families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeMappings {
    pub string: String,
    pub integer: String,
    pub decimal: String,
    pub float: String,
    pub boolean: String,
    /// Dates, times and durations keep their lexical form
    pub temporal: String,
    pub binary: String,
    pub any: String,
}

/// Representation of optional values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalRepr {
    /// Rust: Option<T>
    Option,
    /// Python: Optional[T]
    OptionalType,
}

/// Builtin family of an XSD datatype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFamily {
    String,
    Integer,
    Decimal,
    Float,
    Boolean,
    Temporal,
    Binary,
    /// `IDREFS`, `NMTOKENS`, `ENTITIES`
    StringList,
    Any,
}

impl BuiltinFamily {
    pub fn of(local: &str) -> Self {
        match local {
            "boolean" => Self::Boolean,
            "decimal" => Self::Decimal,
            "float" | "double" => Self::Float,
            "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger" | "positiveInteger"
            | "nonPositiveInteger" | "negativeInteger" | "unsignedLong" | "unsignedInt"
            | "unsignedShort" | "unsignedByte" => Self::Integer,
            "date" | "dateTime" | "time" | "duration" | "gYear" | "gYearMonth" | "gMonth"
            | "gMonthDay" | "gDay" => Self::Temporal,
            "base64Binary" | "hexBinary" => Self::Binary,
            "IDREFS" | "NMTOKENS" | "ENTITIES" => Self::StringList,
            "anyType" | "anySimpleType" => Self::Any,
            _ => Self::String,
        }
    }
}

impl RenderProfile {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Python => Self::python(),
            Language::Rust => Self::rust(),
        }
    }

    /// Default Rust profile
    pub fn rust() -> Self {
        Self {
            language: Language::Rust,
            types: TypeMappings {
                string: "String".to_string(),
                integer: "i64".to_string(),
                decimal: "String".to_string(),
                float: "f64".to_string(),
                boolean: "bool".to_string(),
                temporal: "String".to_string(),
                binary: "String".to_string(),
                any: "String".to_string(),
            },
            optional: OptionalRepr::Option,
            extension: "rs".to_string(),
        }
    }

    /// Default Python profile (stdlib enums and dataclasses)
    pub fn python() -> Self {
        Self {
            language: Language::Python,
            types: TypeMappings {
                string: "str".to_string(),
                integer: "int".to_string(),
                decimal: "Decimal".to_string(),
                float: "float".to_string(),
                boolean: "bool".to_string(),
                temporal: "str".to_string(),
                binary: "bytes".to_string(),
                any: "object".to_string(),
            },
            optional: OptionalRepr::OptionalType,
            extension: "py".to_string(),
        }
    }

    /// Reserved words of the language plus names generated code imports
    pub fn reserved_words(&self) -> ReservedWords {
        match self.language {
            Language::Rust => ReservedWords::new(RUST_KEYWORDS.iter().chain(RUST_PRELUDE).copied()),
            Language::Python => ReservedWords::new(PYTHON_KEYWORDS.iter().chain(PYTHON_BUILTINS).copied()),
        }
    }

    /// Target type for a builtin XSD datatype
    pub fn builtin_type(&self, local: &str) -> String {
        match BuiltinFamily::of(local) {
            BuiltinFamily::String => self.types.string.clone(),
            BuiltinFamily::Integer => self.types.integer.clone(),
            BuiltinFamily::Decimal => self.types.decimal.clone(),
            BuiltinFamily::Float => self.types.float.clone(),
            BuiltinFamily::Boolean => self.types.boolean.clone(),
            BuiltinFamily::Temporal => self.types.temporal.clone(),
            BuiltinFamily::Binary => self.types.binary.clone(),
            BuiltinFamily::StringList => self.wrap_array(&self.types.string),
            BuiltinFamily::Any => self.types.any.clone(),
        }
    }

    /// Wrap a type to make it optional
    pub fn wrap_optional(&self, type_str: &str) -> String {
        match self.optional {
            OptionalRepr::Option => format!("Option<{}>", type_str),
            OptionalRepr::OptionalType => format!("Optional[{}]", type_str),
        }
    }

    /// Wrap a type in a sequence container
    pub fn wrap_array(&self, type_str: &str) -> String {
        match self.language {
            Language::Rust => format!("Vec<{}>", type_str),
            Language::Python => format!("List[{}]", type_str),
        }
    }

    /// Wrap a type in Box (Rust only, for recursion)
    pub fn wrap_box(&self, type_str: &str) -> String {
        match self.language {
            Language::Rust => format!("Box<{}>", type_str),
            Language::Python => type_str.to_string(),
        }
    }
}

// =============================================================================
// Keywords
// =============================================================================

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
    "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
    "_",
];

/// Names generated Rust modules rely on
const RUST_PRELUDE: &[&str] = &[
    "String", "Vec", "Option", "Result", "Box", "Some", "None", "Ok", "Err",
    "Serialize", "Deserialize", "Debug", "Clone", "Copy", "Default",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break",
    "class", "continue", "def", "del", "elif", "else", "except", "finally",
    "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
    "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Builtins shadowed by class attributes, plus names the generated module imports
const PYTHON_BUILTINS: &[&str] = &[
    "bool", "bytes", "dict", "float", "int", "list", "object", "set", "str",
    "tuple", "type", "self", "cls", "Enum", "dataclass", "field", "Optional",
    "List", "Decimal",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_profile_defaults() {
        let profile = RenderProfile::rust();
        assert_eq!(profile.types.string, "String");
        assert_eq!(profile.types.integer, "i64");
        assert_eq!(profile.extension, "rs");
    }

    #[test]
    fn test_reserved_words_are_case_insensitive() {
        let python = RenderProfile::python().reserved_words();
        assert!(python.contains("AS"));
        assert!(python.contains("STR"));
        assert!(python.contains("list"));
        assert!(!python.contains("ACTIVE"));

        let rust = RenderProfile::rust().reserved_words();
        assert!(rust.contains("TYPE"));
        assert!(!rust.contains("STR"));
    }

    #[test]
    fn test_builtin_mapping() {
        let python = RenderProfile::python();
        assert_eq!(python.builtin_type("token"), "str");
        assert_eq!(python.builtin_type("positiveInteger"), "int");
        assert_eq!(python.builtin_type("NMTOKENS"), "List[str]");
        assert_eq!(RenderProfile::rust().builtin_type("boolean"), "bool");
    }

    #[test]
    fn test_wrappers() {
        let rust = RenderProfile::rust();
        assert_eq!(rust.wrap_optional("String"), "Option<String>");
        assert_eq!(rust.wrap_array("i64"), "Vec<i64>");
        assert_eq!(rust.wrap_box("Node"), "Box<Node>");

        let python = RenderProfile::python();
        assert_eq!(python.wrap_optional("str"), "Optional[str]");
        assert_eq!(python.wrap_box("Node"), "Node");
    }

    #[test]
    fn test_language_display() {
        assert_eq!(Language::Python.to_string(), "python");
        assert_eq!(Language::all().len(), 2);
    }
}
