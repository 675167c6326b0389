//! Schema Bindgen
//!
//! Generates native type bindings (Python, Rust) from XML Schema vocabularies
//! such as the HL7 v3 coded value sets.
//!
//! ## Features
//!
//! - **Restriction Flattening**: abstract/specialized domains and value sets resolve to their exact member sets
//! - **Stable Naming**: identifiers never depend on member order or hash iteration order
//! - **Exact Literals**: every emitted constant stores the raw schema value
//! - **Aggregated Diagnostics**: one run reports every schema problem it can detect
//! - **Atomic Output**: generated files are staged and renamed into place on success only
//!
//! ## Architecture
//!
//! ```text
//! schema documents
//!   └─ parser     (SchemaSource → SchemaModel, frozen)
//!        └─ resolver  (TypeGraph DAG → ResolvedModel, immutable)
//!             └─ codegen   (NameTable + CodeEmitter per language → GeneratedArtifact)
//!                  └─ output    (ArtifactSink: staged, committed atomically)
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod resolver;

pub use checksum::Checksum;
pub use codegen::{CodeEmitter, EmitterRegistry, GeneratedArtifact, Language};
pub use config::BindgenConfig;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use error::{GenerateError, Result, SchemaParseError, SourceLocation};
pub use model::{QName, SchemaModel};
pub use output::{ArtifactSink, GenerationManifest, MemorySink, StagedDirSink};
pub use parser::{FsSchemaSource, MemorySchemaSource, SchemaParser, SchemaSource};
pub use pipeline::{CancellationToken, GenerateOptions, GenerationReport, Generator};
pub use resolver::{ResolvedModel, TypeResolver};
