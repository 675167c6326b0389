//! Golden Tests for Generated Bindings
//!
//! Generates the HL7-style vocabulary fixture and compares it against the
//! checked-in expected output. Set `BINDGEN_BLESS=1` to rewrite the expected
//! files after an intentional output change.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use schema_bindgen::{
    FsSchemaSource, GenerateOptions, Generator, Language, MemorySchemaSource, MemorySink, QName,
};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn voc_root() -> Vec<String> {
    vec![fixtures_path().join("voc.xsd").to_string_lossy().into_owned()]
}

fn generator(languages: Vec<Language>) -> Generator<FsSchemaSource> {
    let options = GenerateOptions {
        languages,
        module_name: "voc".to_string(),
        write_manifest: false,
        ..Default::default()
    };
    Generator::new(FsSchemaSource::new(), options)
}

fn assert_golden(name: &str, actual: &str) {
    let path = fixtures_path().join("expected").join(name);
    if std::env::var_os("BINDGEN_BLESS").is_some() {
        std::fs::write(&path, actual).unwrap();
        return;
    }
    let expected = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing golden file {}: {}", path.display(), e));
    assert_eq!(expected, actual);
}

// =============================================================================
// Golden output
// =============================================================================

#[test]
fn test_python_golden() {
    let mut sink = MemorySink::new();
    let report = generator(vec![Language::Python]).generate(&voc_root(), &mut sink).unwrap();
    assert!(report.is_success(), "{}", report.diagnostics);
    assert_golden("voc.py", sink.get("voc.py").unwrap());
}

#[test]
fn test_rust_output_shape() {
    let mut sink = MemorySink::new();
    let report = generator(vec![Language::Rust]).generate(&voc_root(), &mut sink).unwrap();
    assert!(report.is_success(), "{}", report.diagnostics);

    let rust = sink.get("voc.rs").unwrap();
    assert!(rust.starts_with("//! Generated by schema-bindgen. Do not edit.\n"));
    assert!(rust.contains("pub enum ActStatusNormal {"));
    assert!(rust.contains("    #[serde(rename = \"EVN.CRT\")]\n    EVN_CRT,\n"));
    assert!(rust.contains("Self::VALUE_1 => \"1\","));
    assert!(rust.contains("pub struct Observation {"));
    assert!(rust.contains("#[serde(rename = \"moodCode\")]\n    pub mood_code: ActMood,"));
    assert!(rust.contains("pub status_code: Option<ActStatusNormal>,"));
    // `cs` is a plain restricted token, not an emitted type
    assert!(!rust.contains("pub enum Cs"));
}

// =============================================================================
// Resolution over the fixture
// =============================================================================

#[test]
fn test_specialized_domain_is_subset_of_abstract_domain() {
    let analysis = generator(vec![Language::Python]).analyze(&voc_root()).unwrap();
    assert!(!analysis.diagnostics.has_errors(), "{}", analysis.diagnostics);

    let hl7 = Some("urn:hl7-org:v3");
    let status = analysis.resolved.enumeration(&QName::new(hl7, "ActStatus")).unwrap();
    let normal = analysis.resolved.enumeration(&QName::new(hl7, "ActStatusNormal")).unwrap();

    let all: Vec<&str> = status.values().collect();
    let subset: Vec<&str> = normal.values().collect();
    assert_eq!(all, vec!["normal", "active", "completed", "nullified"]);
    assert_eq!(subset, vec!["normal", "active", "completed"]);
    assert!(subset.iter().all(|v| all.contains(v)));
    assert_eq!(normal.chain.len(), 2);
}

#[test]
fn test_generation_is_byte_identical_across_runs() {
    let generator = generator(vec![Language::Python, Language::Rust]);
    let mut first = MemorySink::new();
    let mut second = MemorySink::new();
    generator.generate(&voc_root(), &mut first).unwrap();
    generator.generate(&voc_root(), &mut second).unwrap();
    assert_eq!(first.files(), second.files());
}

// =============================================================================
// Restricted status domain
// =============================================================================

const ACT_STATUS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="ActStatus">
    <xs:restriction base="xs:token">
      <xs:enumeration value="ACTIVE"/>
      <xs:enumeration value="CANCELLED"/>
      <xs:enumeration value="COMPLETED"/>
      <xs:enumeration value="HELD"/>
      <xs:enumeration value="NEW"/>
      <xs:enumeration value="SUSPENDED"/>
      <xs:enumeration value="OBSOLETE"/>
      <xs:enumeration value="NULLIFIED"/>
      <xs:enumeration value="ABORTED"/>
      <xs:enumeration value="NORMAL"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="ActStatusNormal">
    <xs:restriction base="ActStatus">
      <xs:enumeration value="ACTIVE"/>
      <xs:enumeration value="CANCELLED"/>
      <xs:enumeration value="COMPLETED"/>
      <xs:enumeration value="HELD"/>
      <xs:enumeration value="NEW"/>
      <xs:enumeration value="SUSPENDED"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

/// Lines of the block that starts at `header` and ends at `end`
fn block<'a>(content: &'a str, header: &str, end: &str) -> Vec<&'a str> {
    content
        .lines()
        .skip_while(|line| *line != header)
        .skip(1)
        .take_while(|line| *line != end)
        .collect()
}

#[test]
fn test_restricted_status_exposes_six_constants() {
    let options = GenerateOptions {
        languages: vec![Language::Python, Language::Rust],
        module_name: "status".to_string(),
        write_manifest: false,
        ..Default::default()
    };
    let source = MemorySchemaSource::new().with_document("status.xsd", ACT_STATUS);
    let mut sink = MemorySink::new();
    let report = Generator::new(source, options)
        .generate(&["status.xsd".to_string()], &mut sink)
        .unwrap();
    assert!(report.is_success(), "{}", report.diagnostics);

    let python = sink.get("status.py").unwrap();
    let constants: Vec<&str> = block(python, "class ActStatusNormal(Enum):", "")
        .into_iter()
        .filter(|line| line.contains(" = \""))
        .map(str::trim)
        .collect();
    assert_eq!(
        constants,
        vec![
            "ACTIVE = \"ACTIVE\"",
            "CANCELLED = \"CANCELLED\"",
            "COMPLETED = \"COMPLETED\"",
            "HELD = \"HELD\"",
            "NEW = \"NEW\"",
            "SUSPENDED = \"SUSPENDED\"",
        ]
    );
    let base = block(python, "class ActStatus(Enum):", "");
    assert_eq!(base.iter().filter(|line| line.contains(" = \"")).count(), 10);

    let rust = sink.get("status.rs").unwrap();
    let variants: Vec<&str> = block(rust, "pub enum ActStatusNormal {", "}")
        .into_iter()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| line.trim().trim_end_matches(','))
        .collect();
    assert_eq!(variants, vec!["ACTIVE", "CANCELLED", "COMPLETED", "HELD", "NEW", "SUSPENDED"]);
}
