//! Type Resolver
//!
//! Computes the effective type hierarchy over a frozen `SchemaModel`:
//! - every enumeration-shaped type gets a flattened `ResolvedEnumeration`
//! - every complex type gets its effective field list after extension
//! - every other simple type is reduced to the value type emitters map
//!
//! Resolution walks the hierarchy DAG dependencies-first, so each type is
//! resolved exactly once. Structural failures (cycles, empty intersections)
//! are fatal to the affected type only; everything independent still resolves
//! and all failures are reported together.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::{GenerateError, SourceLocation};
use crate::graph::TypeGraph;
use crate::model::{
    DerivationKind, DomainTag, EnumerationMember, EnumerationType, FieldKind, MaxOccurs, Particle, QName,
    SchemaModel, SimpleDerivation, TypeDeclaration, TypeKind,
};

// =============================================================================
// Resolved views
// =============================================================================

/// What a reference to a type means to an emitter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ValueType {
    /// XSD builtin datatype, by local name
    Builtin(String),
    Enumeration(QName),
    Complex(QName),
    List(Box<ValueType>),
}

/// Flattened member set of an enumeration-shaped type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEnumeration {
    pub name: QName,
    /// Restriction base the members were narrowed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<QName>,
    /// This type followed by its restriction ancestors
    pub chain: Vec<QName>,
    pub members: Vec<EnumerationMember>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainTag>,
    pub location: SourceLocation,
}

impl ResolvedEnumeration {
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    /// XML name as written in the schema
    pub name: String,
    pub value_type: ValueType,
    pub kind: FieldKind,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl ResolvedField {
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }

    pub fn is_many(&self) -> bool {
        self.max_occurs.is_many()
    }
}

/// Complex type with its effective (inherited + own) fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedComplexType {
    pub name: QName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<QName>,
    pub fields: Vec<ResolvedField>,
    pub is_abstract: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<String>,
    pub location: SourceLocation,
}

/// One emitted declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedType<'a> {
    Enumeration(&'a ResolvedEnumeration),
    Complex(&'a ResolvedComplexType),
}

impl<'a> ResolvedType<'a> {
    pub fn name(&self) -> &'a QName {
        match self {
            ResolvedType::Enumeration(e) => &e.name,
            ResolvedType::Complex(c) => &c.name,
        }
    }
}

/// Immutable result of one resolution pass, shared read-only by all emitters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedModel {
    enumerations: IndexMap<QName, ResolvedEnumeration>,
    complex_types: IndexMap<QName, ResolvedComplexType>,
    simple_types: IndexMap<QName, ValueType>,
    /// Emitted declarations in canonical source order
    order: Vec<QName>,
    failed: BTreeSet<QName>,
}

impl ResolvedModel {
    pub fn enumeration(&self, name: &QName) -> Option<&ResolvedEnumeration> {
        self.enumerations.get(name)
    }

    pub fn complex_type(&self, name: &QName) -> Option<&ResolvedComplexType> {
        self.complex_types.get(name)
    }

    pub fn simple_type(&self, name: &QName) -> Option<&ValueType> {
        self.simple_types.get(name)
    }

    /// Emitted declarations in source declaration order
    pub fn types(&self) -> impl Iterator<Item = ResolvedType<'_>> {
        self.order.iter().filter_map(move |name| {
            if let Some(e) = self.enumerations.get(name) {
                Some(ResolvedType::Enumeration(e))
            } else {
                self.complex_types.get(name).map(ResolvedType::Complex)
            }
        })
    }

    pub fn enumerations(&self) -> impl Iterator<Item = &ResolvedEnumeration> {
        self.enumerations.values()
    }

    pub fn complex_types(&self) -> impl Iterator<Item = &ResolvedComplexType> {
        self.complex_types.values()
    }

    /// Types excluded from output because they (or a dependency) failed
    pub fn failed(&self) -> &BTreeSet<QName> {
        &self.failed
    }

    pub fn is_failed(&self, name: &QName) -> bool {
        self.failed.contains(name)
    }

    pub fn type_count(&self) -> usize {
        self.order.len()
    }

    /// Emitted type by Clark-notation or local name
    pub fn find(&self, local_or_qualified: &str) -> Option<ResolvedType<'_>> {
        self.types()
            .find(|t| t.name().to_string() == local_or_qualified)
            .or_else(|| self.types().find(|t| t.name().local == local_or_qualified))
    }
}

/// Structural errors (fatal per type) plus every diagnostic raised while resolving
#[derive(Debug, Default)]
pub struct ResolveReport {
    pub errors: Vec<GenerateError>,
    pub diagnostics: Diagnostics,
}

// =============================================================================
// Resolver
// =============================================================================

/// Intermediate result for simple and enumeration-shaped types
#[derive(Debug, Clone)]
enum SimpleEntry {
    Enumeration(ResolvedEnumeration),
    Value(ValueType),
}

/// Resolves a frozen model; holds no state between runs
pub struct TypeResolver<'m> {
    model: &'m SchemaModel,
    graph: TypeGraph,
}

impl<'m> TypeResolver<'m> {
    pub fn new(model: &'m SchemaModel) -> Self {
        Self {
            model,
            graph: TypeGraph::build(model),
        }
    }

    /// Resolve every type in the model
    pub fn resolve(&self) -> (ResolvedModel, ResolveReport) {
        let mut report = ResolveReport::default();
        let mut failed: BTreeSet<QName> = BTreeSet::new();

        for chain in self.graph.cycles() {
            let err = GenerateError::CyclicTypeHierarchy { chain: chain.clone() };
            report.diagnostics.push_error(&err);
            report.errors.push(err);
        }
        // Every member of a cyclic component fails, not only the reported chain
        let order = self.graph.resolution_order();
        for component in &order {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|n| self.graph.dependencies(n).iter().any(|(d, k)| *d == n && k.is_hierarchy()));
            if cyclic {
                failed.extend(component.iter().cloned());
            }
        }

        let ordered: Vec<&TypeDeclaration> = order
            .iter()
            .flatten()
            .filter_map(|name| self.model.get(name))
            .collect();

        // Pass 1: simple and enumeration-shaped types
        let mut simple: HashMap<QName, SimpleEntry> = HashMap::new();
        for decl in &ordered {
            if matches!(decl.kind, TypeKind::Complex(_) | TypeKind::Group(_)) || failed.contains(&decl.name) {
                continue;
            }
            if let Some(dep) = self.failed_dependency(decl, &failed) {
                skip(&mut report, &mut failed, &decl.name, &dep);
                continue;
            }
            match self.resolve_simple(decl, &simple, &mut report) {
                Ok(entry) => {
                    simple.insert(decl.name.clone(), entry);
                }
                Err(err) => {
                    report.diagnostics.push_error(&err);
                    report.errors.push(err);
                    failed.insert(decl.name.clone());
                }
            }
        }

        // Pass 2: groups and complex types (field types may point anywhere)
        let mut groups: HashMap<QName, Vec<ResolvedField>> = HashMap::new();
        let mut complex: HashMap<QName, ResolvedComplexType> = HashMap::new();
        for decl in &ordered {
            if failed.contains(&decl.name) {
                continue;
            }
            let content = match &decl.kind {
                TypeKind::Group(g) => &g.content,
                TypeKind::Complex(c) => &c.content,
                _ => continue,
            };
            if let Some(dep) = self.failed_dependency(decl, &failed) {
                skip(&mut report, &mut failed, &decl.name, &dep);
                continue;
            }
            let own = self.expand_particles(content, &simple, &groups);
            match &decl.kind {
                TypeKind::Group(_) => {
                    groups.insert(decl.name.clone(), own);
                }
                TypeKind::Complex(c) => {
                    let mut fields = Vec::new();
                    if let Some(derivation) = &c.derivation {
                        let base = &derivation.base;
                        match complex.get(base) {
                            Some(base_type) => {
                                let keep_base = derivation.kind == DerivationKind::Extension
                                    || derivation.simple_content;
                                if keep_base {
                                    fields = base_type.fields.clone();
                                }
                            }
                            None if derivation.simple_content => fields.push(ResolvedField {
                                name: "value".to_string(),
                                value_type: self.value_type(base, &simple),
                                kind: FieldKind::Value,
                                min_occurs: 1,
                                max_occurs: MaxOccurs::Bounded(1),
                                documentation: None,
                            }),
                            // complexContent over xs:anyType
                            None => {}
                        }
                    }
                    merge_fields(&mut fields, own);
                    complex.insert(
                        decl.name.clone(),
                        ResolvedComplexType {
                            name: decl.name.clone(),
                            base: c.derivation.as_ref().map(|d| d.base.clone()),
                            fields,
                            is_abstract: c.is_abstract,
                            documentation: decl.documentation.clone(),
                            location: decl.location.clone(),
                        },
                    );
                }
                _ => {}
            }
        }

        // Field references to failed types make the referencing type unusable
        loop {
            let broken: Vec<(QName, QName)> = complex
                .values()
                .filter_map(|c| {
                    c.fields
                        .iter()
                        .find_map(|f| failed_target(&f.value_type, &failed))
                        .map(|dep| (c.name.clone(), dep))
                })
                .collect();
            if broken.is_empty() {
                break;
            }
            let mut broken = broken;
            broken.sort();
            for (name, dep) in broken {
                complex.remove(&name);
                skip(&mut report, &mut failed, &name, &dep);
            }
        }

        let resolved = self.assemble(simple, complex, failed);
        tracing::info!(
            enumerations = resolved.enumerations.len(),
            complex_types = resolved.complex_types.len(),
            failed = resolved.failed.len(),
            "Resolved type hierarchy"
        );
        (resolved, report)
    }

    /// First hierarchy dependency that already failed
    fn failed_dependency(&self, decl: &TypeDeclaration, failed: &BTreeSet<QName>) -> Option<QName> {
        self.graph
            .dependencies(&decl.name)
            .into_iter()
            .find(|(dep, kind)| kind.is_hierarchy() && failed.contains(*dep))
            .map(|(dep, _)| dep.clone())
    }

    fn value_type(&self, name: &QName, simple: &HashMap<QName, SimpleEntry>) -> ValueType {
        if name.is_builtin() {
            return ValueType::Builtin(name.local.clone());
        }
        match simple.get(name) {
            Some(SimpleEntry::Enumeration(_)) => ValueType::Enumeration(name.clone()),
            Some(SimpleEntry::Value(v)) => v.clone(),
            None => match self.model.get(name).map(|d| &d.kind) {
                Some(TypeKind::Complex(_)) => ValueType::Complex(name.clone()),
                // Failed or unknown; caught by the failed-reference sweep
                _ => ValueType::Enumeration(name.clone()),
            },
        }
    }

    fn resolve_simple(
        &self,
        decl: &TypeDeclaration,
        simple: &HashMap<QName, SimpleEntry>,
        report: &mut ResolveReport,
    ) -> Result<SimpleEntry, GenerateError> {
        match &decl.kind {
            TypeKind::Enumeration(e) => self.resolve_enumeration(decl, e, simple, report),
            TypeKind::Simple(s) => match &s.derivation {
                SimpleDerivation::Restriction { base, .. } => match simple.get(base) {
                    // Restriction without facets of an enumeration is an alias
                    Some(SimpleEntry::Enumeration(base_enum)) => Ok(SimpleEntry::Enumeration(ResolvedEnumeration {
                        name: decl.name.clone(),
                        base: Some(base.clone()),
                        chain: chain_from(&decl.name, base_enum),
                        members: base_enum.members.clone(),
                        documentation: decl.documentation.clone(),
                        domain: decl.domain.clone(),
                        location: decl.location.clone(),
                    })),
                    _ => Ok(SimpleEntry::Value(self.value_type(base, simple))),
                },
                SimpleDerivation::List { item } => {
                    Ok(SimpleEntry::Value(ValueType::List(Box::new(self.value_type(item, simple)))))
                }
                SimpleDerivation::Union { members } => {
                    match self.merge_union(decl, members, Vec::new(), simple, report) {
                        Some(members) => Ok(SimpleEntry::Enumeration(ResolvedEnumeration {
                            name: decl.name.clone(),
                            base: None,
                            chain: vec![decl.name.clone()],
                            members,
                            documentation: decl.documentation.clone(),
                            domain: decl.domain.clone(),
                            location: decl.location.clone(),
                        })),
                        None => Ok(SimpleEntry::Value(ValueType::Builtin("anySimpleType".to_string()))),
                    }
                }
            },
            _ => Ok(SimpleEntry::Value(ValueType::Builtin("anyType".to_string()))),
        }
    }

    fn resolve_enumeration(
        &self,
        decl: &TypeDeclaration,
        e: &EnumerationType,
        simple: &HashMap<QName, SimpleEntry>,
        report: &mut ResolveReport,
    ) -> Result<SimpleEntry, GenerateError> {
        let base_enum = e.base.as_ref().and_then(|b| match simple.get(b) {
            Some(SimpleEntry::Enumeration(be)) => Some(be),
            _ => None,
        });

        let (members, chain) = match base_enum {
            Some(base_enum) if e.members.is_empty() => (base_enum.members.clone(), chain_from(&decl.name, base_enum)),
            Some(base_enum) => {
                let chain = chain_from(&decl.name, base_enum);
                let members = self.intersect(decl, &e.members, base_enum, report);
                if members.is_empty() {
                    return Err(GenerateError::EmptyResolvedEnumeration {
                        type_name: decl.name.clone(),
                        chain,
                    });
                }
                (members, chain)
            }
            None if e.base.is_some() => {
                let mut members = Vec::new();
                let mut seen = HashMap::new();
                for m in &e.members {
                    push_unique(&decl.name, &mut members, &mut seen, m.clone(), report);
                }
                (members, vec![decl.name.clone()])
            }
            None => match self.merge_union(decl, &e.union_members, e.members.clone(), simple, report) {
                Some(members) => (members, vec![decl.name.clone()]),
                None => {
                    tracing::debug!(type_name = %decl.name, "Union has non-enumerated members; treating as plain simple type");
                    return Ok(SimpleEntry::Value(ValueType::Builtin("anySimpleType".to_string())));
                }
            },
        };

        tracing::debug!(type_name = %decl.name, members = members.len(), "Resolved enumeration");
        Ok(SimpleEntry::Enumeration(ResolvedEnumeration {
            name: decl.name.clone(),
            base: e.base.clone(),
            chain,
            members,
            documentation: decl.documentation.clone(),
            domain: decl.domain.clone(),
            location: decl.location.clone(),
        }))
    }

    /// Ordered intersection in the restriction's order; restriction labels win
    fn intersect(
        &self,
        decl: &TypeDeclaration,
        declared: &[EnumerationMember],
        base: &ResolvedEnumeration,
        report: &mut ResolveReport,
    ) -> Vec<EnumerationMember> {
        let base_index: HashMap<&str, &EnumerationMember> =
            base.members.iter().map(|m| (m.value.as_str(), m)).collect();
        let mut members = Vec::new();
        let mut seen = HashMap::new();
        for member in declared {
            match base_index.get(member.value.as_str()) {
                Some(base_member) => {
                    let mut kept = member.clone();
                    if kept.label.is_none() {
                        kept.label = base_member.label.clone();
                    }
                    push_unique(&decl.name, &mut members, &mut seen, kept, report);
                }
                None => report.diagnostics.warning(
                    decl.name.to_string(),
                    DiagnosticCode::MemberNotInBase,
                    format!(
                        "value '{}' at {} is not a member of base '{}' and was dropped",
                        member.value, member.location, base.name
                    ),
                ),
            }
        }
        members
    }

    /// Members of every union member type in order, then the inline members.
    /// `None` when a member type is not enumeration-shaped.
    fn merge_union(
        &self,
        decl: &TypeDeclaration,
        member_types: &[QName],
        inline: Vec<EnumerationMember>,
        simple: &HashMap<QName, SimpleEntry>,
        report: &mut ResolveReport,
    ) -> Option<Vec<EnumerationMember>> {
        let mut members = Vec::new();
        let mut seen = HashMap::new();
        for member_type in member_types {
            let Some(SimpleEntry::Enumeration(resolved)) = simple.get(member_type) else {
                return None;
            };
            for m in &resolved.members {
                push_unique(&decl.name, &mut members, &mut seen, m.clone(), report);
            }
        }
        for m in inline {
            push_unique(&decl.name, &mut members, &mut seen, m, report);
        }
        (!members.is_empty()).then_some(members)
    }

    fn expand_particles(
        &self,
        content: &[Particle],
        simple: &HashMap<QName, SimpleEntry>,
        groups: &HashMap<QName, Vec<ResolvedField>>,
    ) -> Vec<ResolvedField> {
        let mut fields = Vec::new();
        for particle in content {
            match particle {
                Particle::Field(f) => fields.push(ResolvedField {
                    name: f.name.clone(),
                    value_type: self.value_type(&f.type_ref, simple),
                    kind: f.kind,
                    min_occurs: f.min_occurs,
                    max_occurs: f.max_occurs,
                    documentation: f.documentation.clone(),
                }),
                Particle::ElementRef(r) => {
                    if let Some(element) = self.model.element(&r.element) {
                        fields.push(ResolvedField {
                            name: r.element.local.clone(),
                            value_type: self.value_type(&element.type_ref, simple),
                            kind: FieldKind::Element,
                            min_occurs: r.min_occurs,
                            max_occurs: r.max_occurs,
                            documentation: None,
                        });
                    }
                }
                Particle::GroupRef(g) => {
                    if let Some(group_fields) = groups.get(g) {
                        fields.extend(group_fields.iter().cloned());
                    }
                }
            }
        }
        fields
    }

    fn assemble(
        &self,
        mut simple: HashMap<QName, SimpleEntry>,
        mut complex: HashMap<QName, ResolvedComplexType>,
        failed: BTreeSet<QName>,
    ) -> ResolvedModel {
        let mut resolved = ResolvedModel {
            failed,
            ..ResolvedModel::default()
        };
        for name in self.model.type_names() {
            if let Some(entry) = simple.remove(name) {
                match entry {
                    SimpleEntry::Enumeration(e) => {
                        resolved.order.push(name.clone());
                        resolved.enumerations.insert(name.clone(), e);
                    }
                    SimpleEntry::Value(v) => {
                        resolved.simple_types.insert(name.clone(), v);
                    }
                }
            } else if let Some(c) = complex.remove(name) {
                resolved.order.push(name.clone());
                resolved.complex_types.insert(name.clone(), c);
            }
        }
        resolved
    }
}

fn skip(report: &mut ResolveReport, failed: &mut BTreeSet<QName>, name: &QName, dependency: &QName) {
    report.diagnostics.warning(
        name.to_string(),
        DiagnosticCode::DependsOnFailedType,
        format!("skipped because '{}' failed to resolve", dependency),
    );
    failed.insert(name.clone());
}

fn chain_from(name: &QName, base: &ResolvedEnumeration) -> Vec<QName> {
    std::iter::once(name.clone()).chain(base.chain.iter().cloned()).collect()
}

fn failed_target(value_type: &ValueType, failed: &BTreeSet<QName>) -> Option<QName> {
    match value_type {
        ValueType::Builtin(_) => None,
        ValueType::Enumeration(n) | ValueType::Complex(n) => failed.contains(n).then(|| n.clone()),
        ValueType::List(item) => failed_target(item, failed),
    }
}

/// Append a member unless its raw value is already present; duplicates are reported
fn push_unique(
    type_name: &QName,
    members: &mut Vec<EnumerationMember>,
    seen: &mut HashMap<String, usize>,
    member: EnumerationMember,
    report: &mut ResolveReport,
) {
    if let Some(&idx) = seen.get(&member.value) {
        let first: &EnumerationMember = &members[idx];
        report.diagnostics.warning(
            type_name.to_string(),
            DiagnosticCode::ValueCollision,
            format!(
                "value '{}' from '{}'{} collides with the one from '{}'{}; keeping the first",
                member.value,
                member.provenance.declared_in,
                describe_domain(member.provenance.domain.as_ref()),
                first.provenance.declared_in,
                describe_domain(first.provenance.domain.as_ref()),
            ),
        );
        return;
    }
    seen.insert(member.value.clone(), members.len());
    members.push(member);
}

fn describe_domain(domain: Option<&DomainTag>) -> String {
    domain.map(|d| format!(" ({})", d)).unwrap_or_default()
}

/// Derived fields replace inherited fields of the same name in place
fn merge_fields(fields: &mut Vec<ResolvedField>, own: Vec<ResolvedField>) {
    for field in own {
        match fields.iter_mut().find(|f| f.name == field.name && f.kind == field.kind) {
            Some(existing) => *existing = field,
            None => fields.push(field),
        }
    }
}
