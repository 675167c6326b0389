//! Parser/Normalizer
//!
//! Reads root schema documents and everything they import or include into a
//! frozen `SchemaModel`. Documents are parsed in breadth-first waves on a
//! bounded worker pool; results are merged in canonical order so the model
//! does not depend on which worker finished first.
//!
//! A document is rejected (and reported) when it is malformed or references a
//! type no accepted document declares. Rejection cascades: documents that
//! depended on a rejected document's declarations are rejected too.

pub mod source;
pub mod xsd;

pub use source::{FsSchemaSource, MemorySchemaSource, SchemaSource};

use std::collections::{BTreeSet, HashSet};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use rayon::prelude::*;

use crate::diagnostics::{DiagnosticItem, Diagnostics};
use crate::error::{Result, SchemaParseError, SourceLocation};
use crate::model::{QName, ReferenceKind, SchemaDocument, SchemaModel, SchemaModelBuilder};

/// A document waiting to be parsed, with the namespace it inherits if chameleon-included
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PendingDocument {
    location: String,
    chameleon_namespace: Option<String>,
}

/// Parses schema sets into a `SchemaModel`
pub struct SchemaParser<S: SchemaSource> {
    source: S,
    workers: usize,
}

impl<S: SchemaSource> SchemaParser<S> {
    pub fn new(source: S) -> Self {
        Self { source, workers: 0 }
    }

    /// Bound the worker pool (0 = one worker per core)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Parse `roots` and every document reachable from them.
    ///
    /// Per-document failures land in the returned `Diagnostics`; only
    /// infrastructure failures (the worker pool) are returned as `Err`.
    pub fn parse(&self, roots: &[String]) -> Result<(SchemaModel, Diagnostics)> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.workers).build()?;
        let mut diagnostics = Diagnostics::new();
        let mut builder = SchemaModelBuilder::new();

        let mut seen: HashSet<PendingDocument> = HashSet::new();
        let mut accepted: HashSet<(String, Option<String>)> = HashSet::new();
        let mut wave = Vec::new();

        for root in roots {
            match self.source.canonicalize(root) {
                Ok(location) => {
                    let pending = PendingDocument {
                        location,
                        chameleon_namespace: None,
                    };
                    if seen.insert(pending.clone()) {
                        wave.push(pending);
                    }
                }
                Err(e) => diagnostics.push(DiagnosticItem::from(&SchemaParseError::new(
                    SourceLocation::document(root.as_str()),
                    format!("cannot open schema: {}", e),
                ))),
            }
        }

        let mut wave_number = 0usize;
        while !wave.is_empty() {
            wave_number += 1;
            tracing::debug!(wave = wave_number, documents = wave.len(), "Parsing schema wave");

            let results: Vec<std::result::Result<SchemaDocument, Vec<SchemaParseError>>> =
                pool.install(|| wave.par_iter().map(|pending| self.parse_one(pending)).collect());

            let mut next = Vec::new();
            for result in results {
                let document = match result {
                    Ok(document) => document,
                    Err(errors) => {
                        for e in &errors {
                            diagnostics.push(DiagnosticItem::from(e));
                        }
                        continue;
                    }
                };

                for reference in &document.references {
                    let resolved = self.source.resolve(&document.location, &reference.schema_location);
                    let location = match self.source.canonicalize(&resolved) {
                        Ok(location) => location,
                        Err(e) => {
                            diagnostics.push(DiagnosticItem::from(&SchemaParseError::new(
                                reference.at.clone(),
                                format!("cannot load referenced schema '{}': {}", reference.schema_location, e),
                            )));
                            continue;
                        }
                    };
                    let chameleon_namespace = match reference.kind {
                        ReferenceKind::Include => document.target_namespace.clone(),
                        ReferenceKind::Import { .. } => None,
                    };
                    let pending = PendingDocument {
                        location,
                        chameleon_namespace,
                    };
                    if seen.insert(pending.clone()) {
                        next.push(pending);
                    }
                }

                // An explicitly namespaced document reached both directly and by include
                let key = (document.location.clone(), document.target_namespace.clone());
                if accepted.insert(key) {
                    builder.add_document(document);
                }
            }
            wave = next;
        }

        self.reject_unresolved(&mut builder, &mut diagnostics);

        let (model, duplicates) = builder.freeze();
        for e in &duplicates {
            diagnostics.push(DiagnosticItem::from(e));
        }

        tracing::info!(
            documents = model.documents().len(),
            types = model.type_count(),
            errors = diagnostics.error_count(),
            "Parsed schema set"
        );
        Ok((model, diagnostics))
    }

    fn parse_one(&self, pending: &PendingDocument) -> std::result::Result<SchemaDocument, Vec<SchemaParseError>> {
        let text = self.source.load(&pending.location).map_err(|e| {
            vec![SchemaParseError::new(
                SourceLocation::document(pending.location.as_str()),
                format!("cannot read schema: {}", e),
            )]
        })?;
        xsd::parse_document(&pending.location, &text, pending.chameleon_namespace.as_deref())
    }

    /// Drop documents whose references do not resolve, until nothing changes
    fn reject_unresolved(&self, builder: &mut SchemaModelBuilder, diagnostics: &mut Diagnostics) {
        loop {
            let declared: BTreeSet<&QName> = builder
                .documents()
                .iter()
                .flat_map(|d| d.types.iter().map(|t| &t.name))
                .collect();
            let elements: BTreeSet<&QName> = builder
                .documents()
                .iter()
                .flat_map(|d| d.elements.iter().map(|e| &e.name))
                .collect();

            let mut failures: Vec<(String, Vec<SchemaParseError>)> = Vec::new();
            for document in builder.documents() {
                let mut errors = Vec::new();
                for decl in &document.types {
                    for reference in decl.referenced_types() {
                        if !reference.is_builtin() && !declared.contains(reference) {
                            let mut reason = format!("'{}' references undeclared type '{}'", decl.name, reference);
                            if let Some(hint) = suggest(reference, declared.iter().copied()) {
                                reason.push_str(&format!(" (did you mean '{}'?)", hint));
                            }
                            errors.push(SchemaParseError::new(decl.location.clone(), reason));
                        }
                    }
                    for element in decl.referenced_elements() {
                        if !elements.contains(element) {
                            errors.push(SchemaParseError::new(
                                decl.location.clone(),
                                format!("'{}' references undeclared element '{}'", decl.name, element),
                            ));
                        }
                    }
                }
                for element in &document.elements {
                    if !element.type_ref.is_builtin() && !declared.contains(&element.type_ref) {
                        errors.push(SchemaParseError::new(
                            element.location.clone(),
                            format!("element '{}' has undeclared type '{}'", element.name, element.type_ref),
                        ));
                    }
                }
                if !errors.is_empty() {
                    failures.push((document.location.clone(), errors));
                }
            }

            if failures.is_empty() {
                return;
            }
            for (location, errors) in failures {
                tracing::warn!(document = %location, unresolved = errors.len(), "Rejecting schema document");
                for e in &errors {
                    diagnostics.push(DiagnosticItem::from(e));
                }
                builder.reject_document(&location);
            }
        }
    }
}

/// Closest declared name to an unresolved reference
fn suggest<'a>(missing: &QName, declared: impl Iterator<Item = &'a QName>) -> Option<String> {
    let matcher = SkimMatcherV2::default();
    declared
        .filter_map(|candidate| {
            matcher
                .fuzzy_match(&candidate.local, &missing.local)
                .map(|score| (score, candidate))
        })
        .max_by(|(a, qa), (b, qb)| a.cmp(b).then_with(|| qb.cmp(qa)))
        .map(|(_, candidate)| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;

    const XS: &str = r#"xmlns:xs="http://www.w3.org/2001/XMLSchema""#;

    fn schema(body: &str) -> String {
        format!("<xs:schema {}>{}</xs:schema>", XS, body)
    }

    fn parse(source: MemorySchemaSource, roots: &[&str]) -> (SchemaModel, Diagnostics) {
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        SchemaParser::new(source).with_workers(2).parse(&roots).unwrap()
    }

    #[test]
    fn test_follows_includes() {
        let source = MemorySchemaSource::new()
            .with_document(
                "root.xsd",
                schema(
                    r#"<xs:include schemaLocation="voc/a.xsd"/>
                       <xs:simpleType name="B"><xs:restriction base="A"/></xs:simpleType>"#,
                ),
            )
            .with_document(
                "voc/a.xsd",
                schema(r#"<xs:simpleType name="A"><xs:restriction base="xs:string"/></xs:simpleType>"#),
            );
        let (model, diags) = parse(source, &["root.xsd"]);
        assert!(diags.is_empty(), "{}", diags);
        assert_eq!(model.documents().len(), 2);
        assert!(model.contains(&QName::local("A")));
        assert!(model.contains(&QName::local("B")));
    }

    #[test]
    fn test_undeclared_reference_rejects_document_with_hint() {
        let source = MemorySchemaSource::new()
            .with_document(
                "good.xsd",
                schema(r#"<xs:simpleType name="ActStatus"><xs:restriction base="xs:string"/></xs:simpleType>"#),
            )
            .with_document(
                "bad.xsd",
                schema(r#"<xs:simpleType name="Broken"><xs:restriction base="ActStatu"/></xs:simpleType>"#),
            );
        let (model, diags) = parse(source, &["good.xsd", "bad.xsd"]);

        assert!(model.contains(&QName::local("ActStatus")));
        assert!(!model.contains(&QName::local("Broken")));
        let errors: Vec<_> = diags.with_code(DiagnosticCode::SchemaParse).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("undeclared type 'ActStatu'"));
        assert!(errors[0].message.contains("did you mean 'ActStatus'"));
        assert!(errors[0].subject.starts_with("bad.xsd:"));
    }

    #[test]
    fn test_rejection_cascades() {
        let source = MemorySchemaSource::new()
            .with_document(
                "a.xsd",
                schema(r#"<xs:simpleType name="A"><xs:restriction base="Missing"/></xs:simpleType>"#),
            )
            .with_document(
                "b.xsd",
                schema(r#"<xs:simpleType name="B"><xs:restriction base="A"/></xs:simpleType>"#),
            );
        let (model, diags) = parse(source, &["a.xsd", "b.xsd"]);
        assert_eq!(model.type_count(), 0);
        assert_eq!(diags.error_count(), 2);
    }

    #[test]
    fn test_malformed_document_does_not_stop_others() {
        let source = MemorySchemaSource::new()
            .with_document("broken.xsd", "<xs:schema")
            .with_document(
                "fine.xsd",
                schema(r#"<xs:simpleType name="Fine"><xs:restriction base="xs:string"/></xs:simpleType>"#),
            );
        let (model, diags) = parse(source, &["broken.xsd", "fine.xsd", "missing.xsd"]);
        assert!(model.contains(&QName::local("Fine")));
        assert_eq!(diags.error_count(), 2);
    }

    #[test]
    fn test_root_order_does_not_change_model() {
        let source = MemorySchemaSource::new()
            .with_document(
                "x.xsd",
                schema(r#"<xs:simpleType name="X"><xs:restriction base="xs:string"/></xs:simpleType>"#),
            )
            .with_document(
                "y.xsd",
                schema(r#"<xs:simpleType name="Y"><xs:restriction base="xs:string"/></xs:simpleType>"#),
            );
        let (m1, _) = parse(source.clone(), &["x.xsd", "y.xsd"]);
        let (m2, _) = parse(source, &["y.xsd", "x.xsd"]);
        let n1: Vec<_> = m1.type_names().cloned().collect();
        let n2: Vec<_> = m2.type_names().cloned().collect();
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_include_cycle_terminates() {
        let source = MemorySchemaSource::new()
            .with_document("a.xsd", schema(r#"<xs:include schemaLocation="b.xsd"/>"#))
            .with_document("b.xsd", schema(r#"<xs:include schemaLocation="a.xsd"/>"#));
        let (model, diags) = parse(source, &["a.xsd"]);
        assert_eq!(model.documents().len(), 2);
        assert!(diags.is_empty());
    }
}
