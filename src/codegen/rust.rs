//! Rust Code Emitter
//!
//! Enumerations become fieldless enums whose serde names are the exact schema
//! literals, with an `as_str()` accessor. Complex types become structs;
//! single-valued fields that close a reference cycle are boxed.

use super::config::{Language, RenderProfile};
use super::{CodeEmitter, CodegenContext};
use crate::resolver::{ResolvedComplexType, ResolvedEnumeration};

pub struct RustEmitter {
    profile: RenderProfile,
}

impl RustEmitter {
    pub fn new(profile: RenderProfile) -> Self {
        Self { profile }
    }
}

impl CodeEmitter for RustEmitter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    fn emit_module_header(&self, ctx: &CodegenContext<'_>) -> String {
        let mut out = String::from("//! Generated by schema-bindgen. Do not edit.\n");
        if ctx.resolved.type_count() > 0 {
            out.push_str("\nuse serde::{Deserialize, Serialize};\n");
        }
        out
    }

    fn emit_doc_comment(&self, lines: &[String], indent: usize) -> String {
        let pad = " ".repeat(indent);
        lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    format!("{}///\n", pad)
                } else {
                    format!("{}/// {}\n", pad, line)
                }
            })
            .collect()
    }

    fn emit_enum_type(&self, enumeration: &ResolvedEnumeration, ctx: &CodegenContext<'_>) -> String {
        let name = ctx.type_name(&enumeration.name);
        let symbols = ctx.symbols(enumeration);

        let mut out = self.emit_doc_comment(&ctx.enum_documentation(enumeration), 0);
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
        out.push_str("#[allow(non_camel_case_types)]\n");
        out.push_str(&format!("pub enum {} {{\n", name));
        for symbol in &symbols {
            if let Some(doc) = &symbol.documentation {
                out.push_str(&self.emit_doc_comment(std::slice::from_ref(doc), 4));
            }
            out.push_str(&format!("    #[serde(rename = {:?})]\n", symbol.value));
            out.push_str(&format!("    {},\n", symbol.identifier));
        }
        out.push_str("}\n\n");

        out.push_str(&format!("impl {} {{\n", name));
        out.push_str("    /// Exact schema literal of this value\n");
        out.push_str("    pub fn as_str(&self) -> &'static str {\n");
        out.push_str("        match *self {\n");
        for symbol in &symbols {
            out.push_str(&format!("            Self::{} => {:?},\n", symbol.identifier, symbol.value));
        }
        out.push_str("        }\n");
        out.push_str("    }\n");
        out.push_str("}\n");
        out
    }

    fn emit_complex_type(&self, complex: &ResolvedComplexType, ctx: &CodegenContext<'_>) -> String {
        let identifiers = ctx.names.fields(&complex.name);

        let mut out = self.emit_doc_comment(&complex.documentation, 0);
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub struct {} {{\n", ctx.type_name(&complex.name)));
        for (field, identifier) in complex.fields.iter().zip(identifiers) {
            if let Some(doc) = &field.documentation {
                out.push_str(&self.emit_doc_comment(std::slice::from_ref(doc), 4));
            }

            let mut serde_args = Vec::new();
            if identifier != &field.name {
                serde_args.push(format!("rename = {:?}", field.name));
            }
            let target = ctx.render_value_type(&field.value_type);
            let rust_type = if field.is_many() {
                serde_args.push("default".to_string());
                serde_args.push("skip_serializing_if = \"Vec::is_empty\"".to_string());
                self.profile.wrap_array(&target)
            } else {
                let inner = if ctx.needs_boxing(&complex.name, field) {
                    self.profile.wrap_box(&target)
                } else {
                    target
                };
                if field.is_optional() {
                    serde_args.push("default".to_string());
                    serde_args.push("skip_serializing_if = \"Option::is_none\"".to_string());
                    self.profile.wrap_optional(&inner)
                } else {
                    inner
                }
            };

            if !serde_args.is_empty() {
                out.push_str(&format!("    #[serde({})]\n", serde_args.join(", ")));
            }
            out.push_str(&format!("    pub {}: {},\n", identifier, rust_type));
        }
        out.push_str("}\n");
        out
    }
}
