//! Python Code Emitter
//!
//! Stdlib-only output: `Enum` classes for enumerations, `@dataclass` classes
//! for complex types. Member docs go into the class docstring as `:cvar`
//! lines, field docs as `:ivar` lines.

use super::config::{BuiltinFamily, Language, RenderProfile};
use super::{CodeEmitter, CodegenContext};
use crate::model::FieldKind;
use crate::resolver::{ResolvedComplexType, ResolvedEnumeration, ResolvedModel, ValueType};

const INDENT: &str = "    ";

pub struct PythonEmitter {
    profile: RenderProfile,
}

impl PythonEmitter {
    pub fn new(profile: RenderProfile) -> Self {
        Self { profile }
    }
}

impl CodeEmitter for PythonEmitter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    fn type_separator(&self) -> &'static str {
        "\n\n"
    }

    fn emit_module_header(&self, ctx: &CodegenContext<'_>) -> String {
        let has_enums = ctx.resolved.enumerations().next().is_some();
        let has_classes = ctx.resolved.complex_types().next().is_some();

        let mut out = String::from("\"\"\"Generated by schema-bindgen. Do not edit.\"\"\"\n");
        out.push_str("from __future__ import annotations\n");
        if has_enums || has_classes {
            out.push('\n');
        }
        if has_classes {
            out.push_str("from dataclasses import dataclass, field\n");
            if uses_decimal(ctx.resolved) {
                out.push_str("from decimal import Decimal\n");
            }
        }
        if has_enums {
            out.push_str("from enum import Enum\n");
        }
        if has_classes {
            out.push_str("from typing import List, Optional\n");
        }
        out
    }

    fn emit_doc_comment(&self, lines: &[String], indent: usize) -> String {
        if lines.is_empty() {
            return String::new();
        }
        let pad = " ".repeat(indent);
        let mut out = format!("{}\"\"\"\n", pad);
        for line in lines {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str(&format!("{}{}\n", pad, escape_docstring(line)));
            }
        }
        out.push_str(&format!("{}\"\"\"\n", pad));
        out
    }

    fn emit_enum_type(&self, enumeration: &ResolvedEnumeration, ctx: &CodegenContext<'_>) -> String {
        let symbols = ctx.symbols(enumeration);

        let mut doc = ctx.enum_documentation(enumeration);
        let cvars: Vec<String> = symbols
            .iter()
            .filter_map(|s| {
                s.documentation
                    .as_ref()
                    .map(|d| format!(":cvar {}: {}", s.identifier, d))
            })
            .collect();
        if !cvars.is_empty() && !doc.is_empty() {
            doc.push(String::new());
        }
        doc.extend(cvars);

        let mut out = format!("class {}(Enum):\n", ctx.type_name(&enumeration.name));
        out.push_str(&self.emit_doc_comment(&doc, INDENT.len()));
        for symbol in &symbols {
            out.push_str(&format!("{}{} = {}\n", INDENT, symbol.identifier, string_literal(&symbol.value)));
        }
        if symbols.is_empty() && doc.is_empty() {
            out.push_str(&format!("{}pass\n", INDENT));
        }
        out
    }

    fn emit_complex_type(&self, complex: &ResolvedComplexType, ctx: &CodegenContext<'_>) -> String {
        let identifiers = ctx.names.fields(&complex.name);

        let mut doc = complex.documentation.clone();
        let ivars: Vec<String> = complex
            .fields
            .iter()
            .zip(identifiers)
            .filter_map(|(f, id)| f.documentation.as_ref().map(|d| format!(":ivar {}: {}", id, d)))
            .collect();
        if !ivars.is_empty() && !doc.is_empty() {
            doc.push(String::new());
        }
        doc.extend(ivars);

        let mut out = String::from("@dataclass\n");
        out.push_str(&format!("class {}:\n", ctx.type_name(&complex.name)));
        out.push_str(&self.emit_doc_comment(&doc, INDENT.len()));

        for (f, identifier) in complex.fields.iter().zip(identifiers) {
            let target = ctx.render_value_type(&f.value_type);
            let (annotation, default) = if f.is_many() {
                (self.profile.wrap_array(&target), "default_factory=list")
            } else {
                (self.profile.wrap_optional(&target), "default=None")
            };

            let mut metadata = vec![
                format!("\"name\": {}", string_literal(&f.name)),
                format!("\"type\": \"{}\"", field_kind(f.kind)),
            ];
            if f.is_many() {
                if f.min_occurs > 0 {
                    metadata.push(format!("\"min_occurs\": {}", f.min_occurs));
                }
                if let crate::model::MaxOccurs::Bounded(max) = f.max_occurs {
                    metadata.push(format!("\"max_occurs\": {}", max));
                }
            } else if !f.is_optional() {
                metadata.push("\"required\": True".to_string());
            }

            out.push_str(&format!("{}{}: {} = field(\n", INDENT, identifier, annotation));
            out.push_str(&format!("{}{}{},\n", INDENT, INDENT, default));
            out.push_str(&format!("{}{}metadata={{\n", INDENT, INDENT));
            for entry in metadata {
                out.push_str(&format!("{}{}{}{},\n", INDENT, INDENT, INDENT, entry));
            }
            out.push_str(&format!("{}{}}}\n", INDENT, INDENT));
            out.push_str(&format!("{})\n", INDENT));
        }
        if complex.fields.is_empty() && doc.is_empty() {
            out.push_str(&format!("{}pass\n", INDENT));
        }
        out
    }
}

fn field_kind(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Element => "Element",
        FieldKind::Attribute => "Attribute",
        FieldKind::Value => "Value",
    }
}

fn uses_decimal(resolved: &ResolvedModel) -> bool {
    fn is_decimal(value_type: &ValueType) -> bool {
        match value_type {
            ValueType::Builtin(local) => BuiltinFamily::of(local) == BuiltinFamily::Decimal,
            ValueType::List(inner) => is_decimal(inner),
            _ => false,
        }
    }
    resolved
        .complex_types()
        .flat_map(|c| c.fields.iter())
        .any(|f| is_decimal(&f.value_type))
}

/// Double-quoted literal that evaluates to exactly `value`
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn escape_docstring(line: &str) -> String {
    line.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::NamingResolver;
    use crate::error::SourceLocation;
    use crate::model::test_support::{enum_decl, model};
    use crate::model::{
        ComplexType, DomainKind, DomainTag, FieldDecl, MaxOccurs, Particle, QName, TypeDeclaration, TypeKind,
    };
    use crate::resolver::TypeResolver;
    use pretty_assertions::assert_eq;

    fn emit(types: Vec<TypeDeclaration>) -> String {
        let m = model(types);
        let (resolved, _) = TypeResolver::new(&m).resolve();
        PythonEmitter::new(RenderProfile::python())
            .emit_module(&resolved, &NamingResolver::default(), "voc")
            .unwrap()
            .content
    }

    #[test]
    fn test_enum_with_provenance_docstring() {
        let mut decl = enum_decl("ActMood", None, &["EVN.CRT", "IN", "1"]);
        decl.domain = Some(DomainTag {
            kind: DomainKind::AbstDomain,
            id: "A10196".to_string(),
            path: Some("C-0-T10196-cpt".to_string()),
        });
        if let TypeKind::Enumeration(e) = &mut decl.kind {
            e.members[1].label = Some("intent".to_string());
        }

        let expected = r#""""Generated by schema-bindgen. Do not edit."""
from __future__ import annotations

from enum import Enum


class ActMood(Enum):
    """
    abstDomain: A10196 (C-0-T10196-cpt)

    :cvar IN_VALUE: intent
    """
    EVN_CRT = "EVN.CRT"
    IN_VALUE = "IN"
    VALUE_1 = "1"
"#;
        assert_eq!(emit(vec![decl]), expected);
    }

    #[test]
    fn test_dataclass_fields() {
        let field = |name: &str, type_ref: QName, kind, min, max| {
            Particle::Field(FieldDecl {
                name: name.to_string(),
                type_ref,
                kind,
                min_occurs: min,
                max_occurs: max,
                documentation: None,
            })
        };
        let act = TypeDeclaration {
            name: QName::local("Act"),
            kind: TypeKind::Complex(ComplexType {
                derivation: None,
                content: vec![
                    field("classCode", QName::local("ActClass"), FieldKind::Attribute, 1, MaxOccurs::Bounded(1)),
                    field("id", QName::xsd("string"), FieldKind::Element, 0, MaxOccurs::Unbounded),
                    field("amount", QName::xsd("decimal"), FieldKind::Element, 0, MaxOccurs::Bounded(1)),
                ],
                is_abstract: false,
            }),
            documentation: vec!["An act.".to_string()],
            domain: None,
            location: SourceLocation::document("test.xsd"),
        };
        let out = emit(vec![enum_decl("ActClass", None, &["ACT"]), act]);

        assert!(out.contains("from dataclasses import dataclass, field\nfrom decimal import Decimal\nfrom enum import Enum\nfrom typing import List, Optional\n"));
        let expected = r#"@dataclass
class Act:
    """
    An act.
    """
    class_code: Optional[ActClass] = field(
        default=None,
        metadata={
            "name": "classCode",
            "type": "Attribute",
            "required": True,
        }
    )
    id: List[str] = field(
        default_factory=list,
        metadata={
            "name": "id",
            "type": "Element",
        }
    )
    amount: Optional[Decimal] = field(
        default=None,
        metadata={
            "name": "amount",
            "type": "Element",
        }
    )
"#;
        assert!(out.ends_with(expected), "{}", out);
    }

    #[test]
    fn test_underscore_literals_stay_public_members() {
        let out = emit(vec![enum_decl("Code", None, &["-x-", "..y", "_a_", "ok"])]);

        let members: Vec<&str> = out
            .lines()
            .filter(|line| line.starts_with(INDENT) && line.contains(" = \""))
            .map(str::trim)
            .collect();
        assert_eq!(
            members,
            vec![
                "VALUE__X_ = \"-x-\"",
                "VALUE___Y = \"..y\"",
                "VALUE__A_ = \"_a_\"",
                "OK = \"ok\"",
            ]
        );
        // `_sunder_` names fail at import, `__dunder` names are mangled out of the enum
        assert!(members.iter().all(|m| !m.starts_with('_')));
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("EVN.CRT"), "\"EVN.CRT\"");
        assert_eq!(string_literal("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(string_literal("tab\there"), "\"tab\\there\"");
    }

    #[test]
    fn test_empty_module_has_only_header() {
        assert_eq!(
            emit(vec![]),
            "\"\"\"Generated by schema-bindgen. Do not edit.\"\"\"\nfrom __future__ import annotations\n"
        );
    }
}
