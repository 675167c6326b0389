//! XSD document reader
//!
//! Turns one XSD text into a `SchemaDocument`. Anonymous inline types are
//! lifted to synthesized top-level declarations named after their owner.

use roxmltree::{Document, Node};

use crate::error::{SchemaParseError, SourceLocation};
use crate::model::{
    ComplexDerivation, ComplexType, DerivationKind, DocumentReference, DomainTag, ElementDeclaration,
    ElementRef, EnumerationMember, EnumerationType, Facet, FieldDecl, FieldKind, GroupType, MaxOccurs,
    Particle, Provenance, QName, ReferenceKind, SchemaDocument, SimpleDerivation, SimpleType,
    TypeDeclaration, TypeKind, XSD_NAMESPACE,
};

/// Parse a schema document.
///
/// `chameleon_namespace` is the namespace of the including document; it is
/// adopted when this document declares no `targetNamespace`.
pub fn parse_document(
    location: &str,
    text: &str,
    chameleon_namespace: Option<&str>,
) -> Result<SchemaDocument, Vec<SchemaParseError>> {
    let doc = Document::parse(text).map_err(|e| {
        let pos = e.pos();
        vec![SchemaParseError::new(
            SourceLocation::new(location, pos.row, pos.col),
            format!("malformed XML: {}", e),
        )]
    })?;

    let root = doc.root_element();
    if !is_xs(root, "schema") {
        return Err(vec![SchemaParseError::new(
            SourceLocation::new(location, 1, 1),
            format!(
                "root element is '{}', expected xs:schema",
                root.tag_name().name()
            ),
        )]);
    }

    let declared_namespace = root.attribute("targetNamespace").filter(|ns| !ns.is_empty());
    let chameleon = declared_namespace.is_none() && chameleon_namespace.is_some();
    let namespace = declared_namespace.or(chameleon_namespace).map(str::to_string);

    let mut reader = DocumentReader {
        doc: &doc,
        location,
        namespace,
        chameleon,
        types: Vec::new(),
        elements: Vec::new(),
        errors: Vec::new(),
    };
    let references = reader.read_schema(root);

    if !reader.errors.is_empty() {
        return Err(reader.errors);
    }
    Ok(SchemaDocument {
        location: location.to_string(),
        target_namespace: reader.namespace,
        types: reader.types,
        elements: reader.elements,
        references,
    })
}

fn is_xs(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XSD_NAMESPACE)
        && node.tag_name().name() == name
}

fn xs_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XSD_NAMESPACE))
}

fn first_upper(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

struct DocumentReader<'a, 'input> {
    doc: &'a Document<'input>,
    location: &'a str,
    namespace: Option<String>,
    chameleon: bool,
    types: Vec<TypeDeclaration>,
    elements: Vec<ElementDeclaration>,
    errors: Vec<SchemaParseError>,
}

impl<'a, 'input> DocumentReader<'a, 'input> {
    fn loc(&self, node: Node) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation::new(self.location, pos.row, pos.col)
    }

    fn error(&mut self, node: Node, reason: impl Into<String>) {
        let location = self.loc(node);
        self.errors.push(SchemaParseError::new(location, reason));
    }

    fn declared_name(&self, local: &str) -> QName {
        QName::new(self.namespace.as_deref(), local)
    }

    /// Resolve a QName-valued attribute against the in-scope namespace bindings
    fn resolve_qname(&mut self, node: Node, value: &str) -> Option<QName> {
        let value = value.trim();
        let (prefix, local) = match value.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, value),
        };
        let namespace = match prefix {
            Some(p) => match node.lookup_namespace_uri(Some(p)) {
                Some(ns) => Some(ns),
                None => {
                    self.error(node, format!("unbound namespace prefix '{}' in '{}'", p, value));
                    return None;
                }
            },
            None => node.lookup_namespace_uri(None),
        };
        let namespace = match namespace {
            None if self.chameleon => self.namespace.as_deref(),
            other => other,
        };
        Some(QName::new(namespace, local))
    }

    fn qname_attr(&mut self, node: Node, attr: &str) -> Option<QName> {
        let value = node.attribute(attr)?;
        self.resolve_qname(node, value)
    }

    fn required_attr<'n>(&mut self, node: Node<'n, 'input>, attr: &str) -> Option<&'n str> {
        match node.attribute(attr) {
            Some(v) => Some(v),
            None => {
                self.error(
                    node,
                    format!("xs:{} is missing required attribute '{}'", node.tag_name().name(), attr),
                );
                None
            }
        }
    }

    /// Text of the `xs:annotation/xs:documentation` children, one entry per block
    fn documentation(&self, node: Node) -> Vec<String> {
        xs_children(node)
            .filter(|n| is_xs(*n, "annotation"))
            .flat_map(xs_children)
            .filter(|n| is_xs(*n, "documentation"))
            .filter_map(|doc| {
                let text: String = doc
                    .descendants()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect();
                let text = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                (!text.is_empty()).then_some(text)
            })
            .collect()
    }

    fn occurs(&mut self, node: Node) -> (u32, MaxOccurs) {
        let min = match node.attribute("minOccurs") {
            Some(v) => v.trim().parse::<u32>().unwrap_or_else(|_| {
                self.error(node, format!("invalid minOccurs '{}'", v));
                1
            }),
            None => 1,
        };
        let max = match node.attribute("maxOccurs").map(str::trim) {
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(v) => match v.parse::<u32>() {
                Ok(n) => MaxOccurs::Bounded(n),
                Err(_) => {
                    self.error(node, format!("invalid maxOccurs '{}'", v));
                    MaxOccurs::Bounded(1)
                }
            },
            None => MaxOccurs::Bounded(1),
        };
        (min, max)
    }

    // =========================================================================
    // Top level
    // =========================================================================

    fn read_schema(&mut self, root: Node<'a, 'input>) -> Vec<DocumentReference> {
        let mut references = Vec::new();
        for child in xs_children(root) {
            match child.tag_name().name() {
                "import" | "include" | "redefine" => {
                    let Some(schema_location) = child.attribute("schemaLocation") else {
                        // Imports without a location name namespaces resolved elsewhere
                        continue;
                    };
                    let kind = if child.tag_name().name() == "import" {
                        ReferenceKind::Import {
                            namespace: child.attribute("namespace").map(str::to_string),
                        }
                    } else {
                        ReferenceKind::Include
                    };
                    references.push(DocumentReference {
                        kind,
                        schema_location: schema_location.to_string(),
                        at: self.loc(child),
                    });
                }
                "simpleType" => {
                    if let Some(name) = self.required_attr(child, "name") {
                        let qname = self.declared_name(name);
                        self.read_simple_type(child, qname);
                    }
                }
                "complexType" => {
                    if let Some(name) = self.required_attr(child, "name") {
                        let qname = self.declared_name(name);
                        self.read_complex_type(child, qname);
                    }
                }
                "group" | "attributeGroup" => {
                    if let Some(name) = self.required_attr(child, "name") {
                        let qname = self.declared_name(name);
                        self.read_group(child, qname);
                    }
                }
                "element" => self.read_top_element(child),
                _ => {}
            }
        }
        references
    }

    fn read_top_element(&mut self, node: Node<'a, 'input>) {
        let Some(name) = self.required_attr(node, "name") else {
            return;
        };
        let qname = self.declared_name(name);
        let type_ref = match self.qname_attr(node, "type") {
            Some(t) => t,
            None => self
                .inline_type(node, name)
                .unwrap_or_else(|| QName::xsd("anyType")),
        };
        self.elements.push(ElementDeclaration {
            name: qname,
            type_ref,
            location: self.loc(node),
        });
    }

    /// Lift an inline `xs:simpleType`/`xs:complexType` child into a named declaration
    fn inline_type(&mut self, node: Node<'a, 'input>, synthesized: &str) -> Option<QName> {
        let child = xs_children(node).find(|n| is_xs(*n, "simpleType") || is_xs(*n, "complexType"))?;
        let qname = self.declared_name(synthesized);
        if is_xs(child, "simpleType") {
            self.read_simple_type(child, qname.clone());
        } else {
            self.read_complex_type(child, qname.clone());
        }
        Some(qname)
    }

    // =========================================================================
    // Simple types
    // =========================================================================

    fn read_simple_type(&mut self, node: Node<'a, 'input>, name: QName) {
        let documentation = self.documentation(node);
        let domain = DomainTag::parse(&documentation.join("\n"));
        let location = self.loc(node);

        let Some(derivation) =
            xs_children(node).find(|n| matches!(n.tag_name().name(), "restriction" | "list" | "union"))
        else {
            self.error(node, format!("simple type '{}' has no restriction, list or union", name));
            return;
        };

        let kind = match derivation.tag_name().name() {
            "restriction" => self.read_restriction(derivation, &name, domain.as_ref()),
            "list" => {
                let item = match self.qname_attr(derivation, "itemType") {
                    Some(item) => item,
                    None => {
                        let synthesized = format!("{}Item", name.local);
                        match self.inline_type(derivation, &synthesized) {
                            Some(item) => item,
                            None => {
                                self.error(derivation, "xs:list needs itemType or an inline simpleType");
                                return;
                            }
                        }
                    }
                };
                TypeKind::Simple(SimpleType {
                    derivation: SimpleDerivation::List { item },
                })
            }
            _ => self.read_union(derivation, &name, domain.as_ref()),
        };

        self.types.push(TypeDeclaration {
            name,
            kind,
            documentation,
            domain,
            location,
        });
    }

    fn restriction_base(&mut self, node: Node<'a, 'input>, owner: &QName) -> QName {
        if let Some(base) = self.qname_attr(node, "base") {
            return base;
        }
        let synthesized = format!("{}Base", owner.local);
        self.inline_type(node, &synthesized)
            .unwrap_or_else(|| QName::xsd("anySimpleType"))
    }

    fn read_restriction(
        &mut self,
        node: Node<'a, 'input>,
        owner: &QName,
        type_domain: Option<&DomainTag>,
    ) -> TypeKind {
        let base = self.restriction_base(node, owner);
        let members = self.read_members(node, owner, type_domain);
        if members.is_empty() {
            let facets = xs_children(node)
                .filter(|n| !matches!(n.tag_name().name(), "annotation" | "simpleType"))
                .filter_map(|n| {
                    n.attribute("value").map(|v| Facet {
                        name: n.tag_name().name().to_string(),
                        value: v.to_string(),
                    })
                })
                .collect();
            TypeKind::Simple(SimpleType {
                derivation: SimpleDerivation::Restriction { base, facets },
            })
        } else {
            TypeKind::Enumeration(EnumerationType {
                base: Some(base),
                union_members: Vec::new(),
                members,
            })
        }
    }

    fn read_members(
        &mut self,
        restriction: Node<'a, 'input>,
        declared_in: &QName,
        type_domain: Option<&DomainTag>,
    ) -> Vec<EnumerationMember> {
        let mut members = Vec::new();
        for facet in xs_children(restriction).filter(|n| is_xs(*n, "enumeration")) {
            let Some(value) = self.required_attr(facet, "value") else {
                continue;
            };
            let docs = self.documentation(facet);
            let joined = docs.join("\n");
            let domain = DomainTag::parse(&joined).or_else(|| type_domain.cloned());
            let label = joined
                .lines()
                .find(|line| DomainTag::parse(line).is_none())
                .map(str::to_string);
            members.push(EnumerationMember {
                value: value.to_string(),
                label,
                provenance: Provenance {
                    declared_in: declared_in.clone(),
                    domain,
                },
                location: self.loc(facet),
            });
        }
        members
    }

    fn read_union(
        &mut self,
        node: Node<'a, 'input>,
        owner: &QName,
        type_domain: Option<&DomainTag>,
    ) -> TypeKind {
        let mut member_types = Vec::new();
        if let Some(list) = node.attribute("memberTypes") {
            for token in list.split_whitespace() {
                if let Some(q) = self.resolve_qname(node, token) {
                    member_types.push(q);
                }
            }
        }

        let mut members = Vec::new();
        let mut anonymous = 0usize;
        for inline in xs_children(node).filter(|n| is_xs(*n, "simpleType")) {
            let inline_domain = DomainTag::parse(&self.documentation(inline).join("\n"));
            let domain = inline_domain.as_ref().or(type_domain);
            let restriction = xs_children(inline).find(|n| is_xs(*n, "restriction"));
            let inline_members = match restriction {
                Some(r) => self.read_members(r, owner, domain),
                None => Vec::new(),
            };
            if inline_members.is_empty() {
                // Non-enumerated inline member: lift it so it can be referenced
                anonymous += 1;
                let synthesized = self.declared_name(&format!("{}Member{}", owner.local, anonymous));
                self.read_simple_type(inline, synthesized.clone());
                member_types.push(synthesized);
            } else {
                members.extend(inline_members);
            }
        }

        if members.is_empty() {
            TypeKind::Simple(SimpleType {
                derivation: SimpleDerivation::Union {
                    members: member_types,
                },
            })
        } else {
            TypeKind::Enumeration(EnumerationType {
                base: None,
                union_members: member_types,
                members,
            })
        }
    }

    // =========================================================================
    // Complex types and groups
    // =========================================================================

    fn read_complex_type(&mut self, node: Node<'a, 'input>, name: QName) {
        let documentation = self.documentation(node);
        let domain = DomainTag::parse(&documentation.join("\n"));
        let location = self.loc(node);
        let is_abstract = matches!(node.attribute("abstract"), Some("true") | Some("1"));

        let mut content = Vec::new();
        let mut derivation = None;

        let content_model = xs_children(node)
            .find(|n| is_xs(*n, "complexContent") || is_xs(*n, "simpleContent"));
        match content_model {
            Some(model) => {
                let simple_content = is_xs(model, "simpleContent");
                let derived = xs_children(model).find(|n| is_xs(*n, "extension") || is_xs(*n, "restriction"));
                match derived {
                    Some(derived) => {
                        let kind = if is_xs(derived, "extension") {
                            DerivationKind::Extension
                        } else {
                            DerivationKind::Restriction
                        };
                        let base = self.restriction_base(derived, &name);
                        derivation = Some(ComplexDerivation {
                            kind,
                            base,
                            simple_content,
                        });
                        self.read_particles(derived, &name, false, &mut content);
                    }
                    None => self.error(model, format!("content model of '{}' has no extension or restriction", name)),
                }
            }
            None => self.read_particles(node, &name, false, &mut content),
        }

        self.types.push(TypeDeclaration {
            name,
            kind: TypeKind::Complex(ComplexType {
                derivation,
                content,
                is_abstract,
            }),
            documentation,
            domain,
            location,
        });
    }

    fn read_group(&mut self, node: Node<'a, 'input>, name: QName) {
        let documentation = self.documentation(node);
        let location = self.loc(node);
        let mut content = Vec::new();
        self.read_particles(node, &name, false, &mut content);
        self.types.push(TypeDeclaration {
            name,
            kind: TypeKind::Group(GroupType {
                content,
                attribute_group: is_xs(node, "attributeGroup"),
            }),
            documentation,
            domain: None,
            location,
        });
    }

    /// Flatten compositors into particles. Everything under `xs:choice` is optional.
    fn read_particles(
        &mut self,
        node: Node<'a, 'input>,
        owner: &QName,
        in_choice: bool,
        out: &mut Vec<Particle>,
    ) {
        for child in xs_children(node) {
            match child.tag_name().name() {
                "sequence" | "all" => self.read_particles(child, owner, in_choice, out),
                "choice" => self.read_particles(child, owner, true, out),
                "element" => {
                    if let Some(particle) = self.read_element_particle(child, owner, in_choice) {
                        out.push(particle);
                    }
                }
                "attribute" => {
                    if let Some(field) = self.read_attribute(child, owner) {
                        out.push(Particle::Field(field));
                    }
                }
                "group" | "attributeGroup" => {
                    if let Some(group) = self.qname_attr(child, "ref") {
                        out.push(Particle::GroupRef(group));
                    }
                }
                _ => {}
            }
        }
    }

    fn read_element_particle(
        &mut self,
        node: Node<'a, 'input>,
        owner: &QName,
        in_choice: bool,
    ) -> Option<Particle> {
        let (min, max_occurs) = self.occurs(node);
        let min_occurs = if in_choice { 0 } else { min };

        if node.attribute("name").is_none() {
            if let Some(element) = self.qname_attr(node, "ref") {
                return Some(Particle::ElementRef(ElementRef {
                    element,
                    min_occurs,
                    max_occurs,
                }));
            }
        }

        let name = self.required_attr(node, "name")?;
        let type_ref = match self.qname_attr(node, "type") {
            Some(t) => t,
            None => {
                let synthesized = format!("{}{}", owner.local, first_upper(name));
                self.inline_type(node, &synthesized)
                    .unwrap_or_else(|| QName::xsd("anyType"))
            }
        };
        Some(Particle::Field(FieldDecl {
            name: name.to_string(),
            type_ref,
            kind: FieldKind::Element,
            min_occurs,
            max_occurs,
            documentation: self.documentation(node).first().cloned(),
        }))
    }

    fn read_attribute(&mut self, node: Node<'a, 'input>, owner: &QName) -> Option<FieldDecl> {
        let required = node.attribute("use") == Some("required");
        if node.attribute("name").is_none() {
            // Attribute references (xml:lang and friends) surface as plain strings
            let reference = self.qname_attr(node, "ref")?;
            return Some(FieldDecl {
                name: reference.local,
                type_ref: QName::xsd("string"),
                kind: FieldKind::Attribute,
                min_occurs: u32::from(required),
                max_occurs: MaxOccurs::Bounded(1),
                documentation: None,
            });
        }
        let name = self.required_attr(node, "name")?;
        let type_ref = match self.qname_attr(node, "type") {
            Some(t) => t,
            None => {
                let synthesized = format!("{}{}", owner.local, first_upper(name));
                self.inline_type(node, &synthesized)
                    .unwrap_or_else(|| QName::xsd("anySimpleType"))
            }
        };
        Some(FieldDecl {
            name: name.to_string(),
            type_ref,
            kind: FieldKind::Attribute,
            min_occurs: u32::from(required),
            max_occurs: MaxOccurs::Bounded(1),
            documentation: self.documentation(node).first().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DomainKind;

    const HL7: &str = "urn:hl7-org:v3";

    fn parse(text: &str) -> SchemaDocument {
        parse_document("voc.xsd", text, None).unwrap()
    }

    #[test]
    fn test_enumeration_with_labels_and_domains() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                         xmlns="urn:hl7-org:v3" targetNamespace="urn:hl7-org:v3">
  <xs:simpleType name="ActStatus">
    <xs:annotation><xs:documentation>abstDomain: A15933 (C-0-T15933-cpt)</xs:documentation></xs:annotation>
    <xs:restriction base="cs">
      <xs:enumeration value="normal">
        <xs:annotation><xs:documentation>normal</xs:documentation></xs:annotation>
      </xs:enumeration>
      <xs:enumeration value="EVN.CRT"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#,
        );
        assert_eq!(doc.target_namespace.as_deref(), Some(HL7));
        let decl = &doc.types[0];
        assert_eq!(decl.name, QName::new(Some(HL7), "ActStatus"));
        assert_eq!(decl.domain.as_ref().unwrap().kind, DomainKind::AbstDomain);

        let e = decl.as_enumeration().unwrap();
        assert_eq!(e.base, Some(QName::new(Some(HL7), "cs")));
        assert_eq!(e.members.len(), 2);
        assert_eq!(e.members[0].label.as_deref(), Some("normal"));
        assert_eq!(e.members[1].value, "EVN.CRT");
        assert_eq!(e.members[1].provenance.domain.as_ref().unwrap().id, "A15933");
        assert_eq!(e.members[0].location.line, 6);
    }

    #[test]
    fn test_union_with_inline_members() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="ActClass">
    <xs:union memberTypes="ActClassRecordOrganizer">
      <xs:simpleType>
        <xs:restriction base="xs:string">
          <xs:enumeration value="ACT"/>
        </xs:restriction>
      </xs:simpleType>
    </xs:union>
  </xs:simpleType>
</xs:schema>"#,
        );
        let e = doc.types[0].as_enumeration().unwrap();
        assert_eq!(e.base, None);
        assert_eq!(e.union_members, vec![QName::local("ActClassRecordOrganizer")]);
        assert_eq!(e.members[0].value, "ACT");
        assert_eq!(e.members[0].provenance.declared_in, QName::local("ActClass"));
    }

    #[test]
    fn test_complex_type_with_extension_and_choice() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="Derived">
    <xs:complexContent>
      <xs:extension base="Base">
        <xs:choice>
          <xs:element name="code" type="xs:string"/>
          <xs:element name="item" maxOccurs="unbounded">
            <xs:complexType><xs:sequence/></xs:complexType>
          </xs:element>
        </xs:choice>
        <xs:attribute name="status" type="ActStatus" use="required"/>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>"#,
        );
        // Inline item type is lifted before its owner is pushed
        assert_eq!(doc.types.len(), 2);
        assert_eq!(doc.types[0].name, QName::local("DerivedItem"));
        let TypeKind::Complex(c) = &doc.types[1].kind else {
            panic!("expected complex type");
        };
        let derivation = c.derivation.as_ref().unwrap();
        assert_eq!(derivation.kind, DerivationKind::Extension);
        assert_eq!(derivation.base, QName::local("Base"));
        let fields: Vec<_> = c
            .content
            .iter()
            .map(|p| match p {
                Particle::Field(f) => (f.name.as_str(), f.min_occurs, f.max_occurs),
                other => panic!("unexpected particle {:?}", other),
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                ("code", 0, MaxOccurs::Bounded(1)),
                ("item", 0, MaxOccurs::Unbounded),
                ("status", 1, MaxOccurs::Bounded(1)),
            ]
        );
    }

    #[test]
    fn test_unbound_prefix_is_reported_with_position() {
        let errors = parse_document(
            "bad.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="T"><xs:restriction base="nope:cs"/></xs:simpleType>
</xs:schema>"#,
            None,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("unbound namespace prefix 'nope'"));
        assert_eq!(errors[0].location.line, 2);
    }

    #[test]
    fn test_malformed_xml() {
        let errors = parse_document("bad.xsd", "<xs:schema", None).unwrap_err();
        assert!(errors[0].reason.starts_with("malformed XML"));
    }

    #[test]
    fn test_chameleon_include_adopts_namespace() {
        let doc = parse_document(
            "inc.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="Code"><xs:restriction base="Base"/></xs:simpleType>
</xs:schema>"#,
            Some(HL7),
        )
        .unwrap();
        assert_eq!(doc.types[0].name, QName::new(Some(HL7), "Code"));
        assert_eq!(doc.types[0].base(), Some(&QName::new(Some(HL7), "Base")));
    }

    #[test]
    fn test_references_collected() {
        let doc = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="datatypes.xsd"/>
  <xs:import namespace="urn:other" schemaLocation="../other.xsd"/>
  <xs:import namespace="http://www.w3.org/XML/1998/namespace"/>
</xs:schema>"#,
        );
        assert_eq!(doc.references.len(), 2);
        assert_eq!(doc.references[0].kind, ReferenceKind::Include);
        assert_eq!(doc.references[1].schema_location, "../other.xsd");
    }
}
