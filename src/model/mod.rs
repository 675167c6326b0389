//! Schema Model
//!
//! In-memory representation of schema constructs: simple types, complex types,
//! enumerations and groups, keyed by qualified name.
//!
//! Two phases, two types:
//! - `SchemaModelBuilder`: write-once, owned by the parser while documents arrive
//! - `SchemaModel`: frozen, read-many, shared by the resolver and every emitter
//!
//! Freezing orders documents canonically by (target namespace, location) so the
//! order in which documents were parsed never changes the model.

pub mod domain;

pub use domain::{DomainKind, DomainTag};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SchemaParseError, SourceLocation};

/// The XML Schema namespace; names in it are builtin datatypes
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

// =============================================================================
// Qualified Names
// =============================================================================

/// Namespace-qualified name of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local: local.into(),
        }
    }

    /// Name without a namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Builtin XSD datatype name
    pub fn xsd(local: impl Into<String>) -> Self {
        Self {
            namespace: Some(XSD_NAMESPACE.to_string()),
            local: local.into(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Reference from one declaration to another type
pub type TypeRef = QName;

// =============================================================================
// Declarations
// =============================================================================

/// Where an enumeration member came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Type that declared the member
    pub declared_in: QName,
    /// Domain/vocSet tag of the member, falling back to its declaring type's tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainTag>,
}

/// One `xs:enumeration` facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationMember {
    /// Exact literal value from the schema, never normalized
    pub value: String,
    /// Display label from the member's documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub provenance: Provenance,
    pub location: SourceLocation,
}

/// Constraining facet other than enumeration, kept as metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleDerivation {
    Restriction { base: TypeRef, facets: Vec<Facet> },
    List { item: TypeRef },
    Union { members: Vec<TypeRef> },
}

/// Simple type without enumeration facets of its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleType {
    pub derivation: SimpleDerivation,
}

/// Simple type declaring enumeration members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationType {
    /// Restriction base (absent for unions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    /// Named union member types, merged before the declared members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub union_members: Vec<TypeRef>,
    /// Members in declaration order
    pub members: Vec<EnumerationMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationKind {
    Restriction,
    Extension,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexDerivation {
    pub kind: DerivationKind,
    pub base: TypeRef,
    /// Derived through `xs:simpleContent`
    pub simple_content: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Element,
    Attribute,
    /// Text content of a simple-content complex type
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn is_many(&self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => *n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

/// Element, attribute or text value of a complex type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// XML name as written in the schema
    pub name: String,
    pub type_ref: TypeRef,
    pub kind: FieldKind,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl FieldDecl {
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }
}

/// `xs:element ref="..."` particle; typed through the referenced element declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub element: QName,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

/// Content item of a complex type or group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Particle {
    Field(FieldDecl),
    ElementRef(ElementRef),
    GroupRef(TypeRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<ComplexDerivation>,
    pub content: Vec<Particle>,
    pub is_abstract: bool,
}

/// Named model group or attribute group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupType {
    pub content: Vec<Particle>,
    pub attribute_group: bool,
}

/// The four declaration variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Simple(SimpleType),
    Complex(ComplexType),
    Enumeration(EnumerationType),
    Group(GroupType),
}

/// A top-level type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: QName,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainTag>,
    pub location: SourceLocation,
}

impl TypeDeclaration {
    /// Restriction/extension base, if any
    pub fn base(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Simple(s) => match &s.derivation {
                SimpleDerivation::Restriction { base, .. } => Some(base),
                _ => None,
            },
            TypeKind::Complex(c) => c.derivation.as_ref().map(|d| &d.base),
            TypeKind::Enumeration(e) => e.base.as_ref(),
            TypeKind::Group(_) => None,
        }
    }

    /// Every type this declaration mentions, in declaration order
    pub fn referenced_types(&self) -> Vec<&TypeRef> {
        let mut refs = Vec::new();
        match &self.kind {
            TypeKind::Simple(s) => match &s.derivation {
                SimpleDerivation::Restriction { base, .. } => refs.push(base),
                SimpleDerivation::List { item } => refs.push(item),
                SimpleDerivation::Union { members } => refs.extend(members.iter()),
            },
            TypeKind::Enumeration(e) => {
                refs.extend(e.base.iter());
                refs.extend(e.union_members.iter());
            }
            TypeKind::Complex(c) => {
                refs.extend(c.derivation.as_ref().map(|d| &d.base));
                collect_particle_refs(&c.content, &mut refs);
            }
            TypeKind::Group(g) => collect_particle_refs(&g.content, &mut refs),
        }
        refs
    }

    /// Top-level elements referenced by `ref=` particles
    pub fn referenced_elements(&self) -> Vec<&QName> {
        let content = match &self.kind {
            TypeKind::Complex(c) => &c.content,
            TypeKind::Group(g) => &g.content,
            _ => return Vec::new(),
        };
        content
            .iter()
            .filter_map(|p| match p {
                Particle::ElementRef(r) => Some(&r.element),
                _ => None,
            })
            .collect()
    }

    pub fn as_enumeration(&self) -> Option<&EnumerationType> {
        match &self.kind {
            TypeKind::Enumeration(e) => Some(e),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            TypeKind::Simple(_) => "simple",
            TypeKind::Complex(_) => "complex",
            TypeKind::Enumeration(_) => "enumeration",
            TypeKind::Group(_) => "group",
        }
    }
}

fn collect_particle_refs<'a>(content: &'a [Particle], refs: &mut Vec<&'a TypeRef>) {
    for particle in content {
        match particle {
            Particle::Field(f) => refs.push(&f.type_ref),
            Particle::GroupRef(g) => refs.push(g),
            Particle::ElementRef(_) => {}
        }
    }
}

/// Top-level `xs:element`, needed to type `ref=` particles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDeclaration {
    pub name: QName,
    pub type_ref: TypeRef,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Import {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
    },
    Include,
}

/// `xs:import` / `xs:include` as written in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub kind: ReferenceKind,
    /// Raw `schemaLocation`, resolved against the referencing document by the parser
    pub schema_location: String,
    pub at: SourceLocation,
}

/// A parsed schema document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Canonical location of the document
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    pub types: Vec<TypeDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<DocumentReference>,
}

impl SchemaDocument {
    /// Sort key that makes the model independent of parse order
    pub fn canonical_key(&self) -> (String, String) {
        (
            self.target_namespace.clone().unwrap_or_default(),
            self.location.clone(),
        )
    }
}

/// What the model keeps of a document once its declarations moved into the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    pub references: Vec<DocumentReference>,
    /// Names declared by this document, in declaration order
    pub declared: Vec<QName>,
}

// =============================================================================
// Builder (construction phase)
// =============================================================================

/// Write-once construction phase of the model
#[derive(Debug, Default)]
pub struct SchemaModelBuilder {
    documents: Vec<SchemaDocument>,
}

impl SchemaModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, document: SchemaDocument) {
        self.documents.push(document);
    }

    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    /// Drop a document (used when it references undeclared types)
    pub fn reject_document(&mut self, location: &str) -> Option<SchemaDocument> {
        let idx = self.documents.iter().position(|d| d.location == location)?;
        Some(self.documents.remove(idx))
    }

    /// Freeze into a read-only model.
    ///
    /// Duplicate qualified names are reported; the declaration from the
    /// canonically-first document wins.
    pub fn freeze(mut self) -> (SchemaModel, Vec<SchemaParseError>) {
        self.documents.sort_by_key(|a| a.canonical_key());

        let mut errors = Vec::new();
        let mut types: IndexMap<QName, TypeDeclaration> = IndexMap::new();
        let mut elements: IndexMap<QName, ElementDeclaration> = IndexMap::new();
        let mut documents = Vec::with_capacity(self.documents.len());

        for doc in self.documents {
            let mut declared = Vec::with_capacity(doc.types.len());
            for decl in doc.types {
                if let Some(existing) = types.get(&decl.name) {
                    errors.push(SchemaParseError::new(
                        decl.location.clone(),
                        format!(
                            "duplicate declaration of '{}' (first declared at {})",
                            decl.name, existing.location
                        ),
                    ));
                    continue;
                }
                declared.push(decl.name.clone());
                types.insert(decl.name.clone(), decl);
            }
            for element in doc.elements {
                elements.entry(element.name.clone()).or_insert(element);
            }
            documents.push(DocumentInfo {
                location: doc.location,
                target_namespace: doc.target_namespace,
                references: doc.references,
                declared,
            });
        }

        (
            SchemaModel {
                documents,
                types,
                elements,
            },
            errors,
        )
    }
}

// =============================================================================
// Frozen model (resolution phase)
// =============================================================================

/// Read-only schema model; safe to share across threads
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    documents: Vec<DocumentInfo>,
    types: IndexMap<QName, TypeDeclaration>,
    elements: IndexMap<QName, ElementDeclaration>,
}

impl SchemaModel {
    /// Get a declaration by qualified name
    pub fn get(&self, name: &QName) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }

    /// All declarations in canonical declaration order
    pub fn types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &QName> {
        self.types.keys()
    }

    pub fn element(&self, name: &QName) -> Option<&ElementDeclaration> {
        self.elements.get(name)
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn contains(&self, name: &QName) -> bool {
        name.is_builtin() || self.types.contains_key(name)
    }

    /// Find declarations by local name (names can collide across namespaces)
    pub fn find_local(&self, local: &str) -> Vec<&TypeDeclaration> {
        self.types.values().filter(|t| t.name.local == local).collect()
    }
}
