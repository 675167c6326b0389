//! Generation pipeline
//!
//! Parse → Resolve → Emit, with cooperative cancellation checkpoints after
//! Parse, after Resolve and before each emitter. Per-document and per-type
//! failures are aggregated into one `Diagnostics`; only run-fatal errors
//! (cancellation, naming exhaustion, worker pool startup) are returned as `Err`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use similar::TextDiff;

use crate::codegen::{EmitterRegistry, GeneratedArtifact, Language, NamingConfig, NamingResolver};
use crate::config::BindgenConfig;
use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::{GenerateError, Result};
use crate::model::SchemaModel;
use crate::output::{ArtifactSink, GenerationManifest, MANIFEST_FILE};
use crate::parser::{SchemaParser, SchemaSource};
use crate::resolver::{ResolvedModel, TypeResolver};

// =============================================================================
// Cancellation
// =============================================================================

/// Shared flag checked between pipeline stages
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been cancelled
    pub fn checkpoint(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            tracing::info!(stage, "Generation cancelled");
            Err(GenerateError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Options and reports
// =============================================================================

/// Per-run settings, usually derived from `BindgenConfig`
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub languages: Vec<Language>,
    pub module_name: String,
    pub write_manifest: bool,
    pub warnings_as_errors: bool,
    pub workers: usize,
    pub naming: NamingConfig,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::from(&BindgenConfig::default())
    }
}

impl From<&BindgenConfig> for GenerateOptions {
    fn from(config: &BindgenConfig) -> Self {
        Self {
            languages: config.output.languages.clone(),
            module_name: config.output.module_name.clone(),
            write_manifest: config.output.write_manifest,
            warnings_as_errors: config.diagnostics.warnings_as_errors,
            workers: config.parse.workers,
            naming: config.naming.clone(),
        }
    }
}

/// Parsed and resolved schema set
#[derive(Debug)]
pub struct Analysis {
    pub model: SchemaModel,
    pub resolved: ResolvedModel,
    pub diagnostics: Diagnostics,
}

/// Result of a `generate` run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub diagnostics: Diagnostics,
    /// Every rendered artifact, in language order
    pub artifacts: Vec<GeneratedArtifact>,
    /// Paths committed to the sink
    pub written: Vec<PathBuf>,
    /// Languages whose output could not be written
    pub failed_languages: BTreeSet<Language>,
    pub manifest: Option<GenerationManifest>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    pub fn artifact(&self, language: Language) -> Option<&GeneratedArtifact> {
        self.artifacts.iter().find(|a| a.language == language)
    }
}

/// One file whose on-disk content differs from a fresh generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDrift {
    pub path: PathBuf,
    /// Not present on disk at all
    pub missing: bool,
    /// Unified diff from the on-disk content to the generated content
    pub diff: String,
}

/// Result of a `check` run
#[derive(Debug, Default)]
pub struct DriftReport {
    pub diagnostics: Diagnostics,
    pub drifted: Vec<FileDrift>,
    pub checked: usize,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.drifted.is_empty() && !self.diagnostics.has_errors()
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Drives one schema set through parsing, resolution and emission
pub struct Generator<S: SchemaSource> {
    parser: SchemaParser<S>,
    registry: EmitterRegistry,
    naming: NamingResolver,
    options: GenerateOptions,
    cancel: CancellationToken,
}

impl<S: SchemaSource> Generator<S> {
    pub fn new(source: S, options: GenerateOptions) -> Self {
        Self {
            parser: SchemaParser::new(source).with_workers(options.workers),
            registry: EmitterRegistry::with_defaults(),
            naming: NamingResolver::new(options.naming.clone()),
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the emitter registry
    pub fn with_registry(mut self, registry: EmitterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Observe an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Parse and resolve `roots`
    pub fn analyze(&self, roots: &[String]) -> Result<Analysis> {
        let (model, mut diagnostics) = self.parser.parse(roots)?;
        self.cancel.checkpoint("after parse")?;

        let (resolved, report) = TypeResolver::new(&model).resolve();
        diagnostics.merge(report.diagnostics);
        self.cancel.checkpoint("after resolve")?;

        tracing::info!(
            documents = model.documents().len(),
            types = resolved.type_count(),
            failed = resolved.failed().len(),
            errors = diagnostics.error_count(),
            warnings = diagnostics.warning_count(),
            "Analyzed schema set"
        );
        Ok(Analysis {
            model,
            resolved,
            diagnostics,
        })
    }

    /// Render every requested language in parallel over the shared resolved model
    pub fn render(&self, resolved: &ResolvedModel) -> Result<(Vec<GeneratedArtifact>, Diagnostics)> {
        let mut diagnostics = Diagnostics::new();
        let languages: Vec<Language> = self
            .options
            .languages
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let results: Vec<(Language, Result<Option<GeneratedArtifact>>)> = languages
            .par_iter()
            .map(|&language| {
                let result = self.cancel.checkpoint("before emit").and_then(|()| match self.registry.get(language) {
                    Some(emitter) => emitter
                        .emit_module(resolved, &self.naming, &self.options.module_name)
                        .map(Some),
                    None => Ok(None),
                });
                (language, result)
            })
            .collect();

        let mut artifacts = Vec::new();
        for (language, result) in results {
            match result {
                Ok(Some(artifact)) => artifacts.push(artifact),
                Ok(None) => diagnostics.push(DiagnosticItem::new(
                    language.as_str(),
                    DiagnosticCode::Config,
                    format!("no emitter registered for {}", language),
                )),
                Err(e) if e.is_fatal_to_run() => return Err(e),
                Err(e) => diagnostics.push_error(&e),
            }
        }
        Ok((artifacts, diagnostics))
    }

    /// Full run: analyze, render, stage into `sink` and commit
    pub fn generate(&self, roots: &[String], sink: &mut dyn ArtifactSink) -> Result<GenerationReport> {
        let analysis = self.analyze(roots)?;
        let mut report = GenerationReport {
            diagnostics: analysis.diagnostics,
            ..Default::default()
        };

        let (artifacts, render_diagnostics) = self.render(&analysis.resolved)?;
        report.diagnostics.merge(render_diagnostics);

        let mut languages_by_path: BTreeMap<PathBuf, Language> = BTreeMap::new();
        let mut staged = Vec::new();
        for artifact in &artifacts {
            match sink.stage(&artifact.path, &artifact.content) {
                Ok(()) => {
                    languages_by_path.insert(artifact.path.clone(), artifact.language);
                    staged.push(artifact);
                }
                Err(source) => {
                    report.failed_languages.insert(artifact.language);
                    report.diagnostics.push_error(&GenerateError::EmissionIo {
                        language: artifact.language,
                        path: artifact.path.clone(),
                        source,
                    });
                }
            }
        }

        if self.options.write_manifest && !staged.is_empty() {
            let manifest = GenerationManifest::new(staged.iter().copied());
            let json = manifest.to_json()?;
            if let Err(e) = sink.stage(Path::new(MANIFEST_FILE), &json) {
                report.diagnostics.push_error(&GenerateError::Io(e));
            } else {
                report.manifest = Some(manifest);
            }
        }

        if let Err(e) = self.cancel.checkpoint("before commit") {
            sink.rollback();
            return Err(e);
        }

        let commit = sink.commit();
        for (path, source) in commit.failed {
            match languages_by_path.get(&path) {
                Some(&language) => {
                    report.failed_languages.insert(language);
                    report.diagnostics.push_error(&GenerateError::EmissionIo { language, path, source });
                }
                None => report.diagnostics.push_error(&GenerateError::Io(source)),
            }
        }
        report.written = commit.written;
        report.artifacts = artifacts;

        if self.options.warnings_as_errors {
            report.diagnostics.promote_warnings();
        }

        tracing::info!(
            artifacts = report.artifacts.len(),
            written = report.written.len(),
            errors = report.diagnostics.error_count(),
            "Generation finished"
        );
        Ok(report)
    }

    /// Regenerate in memory and compare against the files under `out_dir`
    pub fn check(&self, roots: &[String], out_dir: &Path) -> Result<DriftReport> {
        let analysis = self.analyze(roots)?;
        let mut report = DriftReport {
            diagnostics: analysis.diagnostics,
            ..Default::default()
        };

        let (artifacts, render_diagnostics) = self.render(&analysis.resolved)?;
        report.diagnostics.merge(render_diagnostics);

        let mut expected: Vec<(PathBuf, String)> = artifacts
            .iter()
            .map(|a| (a.path.clone(), a.content.clone()))
            .collect();
        if self.options.write_manifest && !artifacts.is_empty() {
            expected.push((PathBuf::from(MANIFEST_FILE), GenerationManifest::new(&artifacts).to_json()?));
        }

        for (path, generated) in expected {
            report.checked += 1;
            let on_disk = match std::fs::read_to_string(out_dir.join(&path)) {
                Ok(content) => Some(content),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => return Err(GenerateError::Io(e)),
            };
            if on_disk.as_deref() == Some(generated.as_str()) {
                continue;
            }

            let old = on_disk.as_deref().unwrap_or("");
            let diff = TextDiff::from_lines(old, generated.as_str())
                .unified_diff()
                .context_radius(3)
                .header(&format!("a/{}", path.display()), &format!("b/{}", path.display()))
                .to_string();
            report.diagnostics.push(DiagnosticItem::new(
                path.display().to_string(),
                DiagnosticCode::Drift,
                if on_disk.is_none() {
                    "generated file is missing".to_string()
                } else {
                    "generated file is out of date".to_string()
                },
            ));
            report.drifted.push(FileDrift {
                path,
                missing: on_disk.is_none(),
                diff,
            });
        }

        if self.options.warnings_as_errors {
            report.diagnostics.promote_warnings();
        }
        tracing::info!(checked = report.checked, drifted = report.drifted.len(), "Drift check finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{CodeEmitter, CodegenContext, RenderProfile};
    use crate::output::MemorySink;
    use crate::parser::MemorySchemaSource;
    use crate::resolver::{ResolvedComplexType, ResolvedEnumeration};

    const VOC: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="ActMood">
    <xs:restriction base="xs:token">
      <xs:enumeration value="EVN"/>
      <xs:enumeration value="INT"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    fn generator(languages: Vec<Language>) -> Generator<MemorySchemaSource> {
        let options = GenerateOptions {
            languages,
            module_name: "voc".to_string(),
            ..Default::default()
        };
        Generator::new(MemorySchemaSource::new().with_document("voc.xsd", VOC), options)
    }

    #[test]
    fn test_generate_writes_every_language_and_manifest() {
        let mut sink = MemorySink::new();
        let report = generator(vec![Language::Rust, Language::Python])
            .generate(&["voc.xsd".to_string()], &mut sink)
            .unwrap();
        assert!(report.is_success(), "{}", report.diagnostics);
        assert!(sink.get("voc.py").unwrap().contains("class ActMood(Enum):"));
        assert!(sink.get("voc.rs").unwrap().contains("pub enum ActMood {"));
        let manifest = sink.get(MANIFEST_FILE).unwrap();
        assert!(manifest.contains("\"voc.py\""));
        assert_eq!(report.written.len(), 3);
    }

    #[test]
    fn test_cancelled_run_writes_nothing() {
        let generator = generator(vec![Language::Python]);
        generator.cancellation().cancel();
        let mut sink = MemorySink::new();
        let err = generator.generate(&["voc.xsd".to_string()], &mut sink).unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled { stage: "after parse" }));
        assert!(sink.files().is_empty());
    }

    #[test]
    fn test_check_reports_missing_and_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(vec![Language::Python]);
        let roots = vec!["voc.xsd".to_string()];

        let report = generator.check(&roots, dir.path()).unwrap();
        assert_eq!(report.drifted.len(), 2);
        assert!(report.drifted.iter().all(|d| d.missing));

        let mut sink = crate::output::StagedDirSink::new(dir.path()).unwrap();
        generator.generate(&roots, &mut sink).unwrap();
        assert!(generator.check(&roots, dir.path()).unwrap().is_clean());

        std::fs::write(dir.path().join("voc.py"), "stale\n").unwrap();
        let report = generator.check(&roots, dir.path()).unwrap();
        assert_eq!(report.drifted.len(), 1);
        assert!(report.drifted[0].diff.contains("-stale"));
        assert!(report.drifted[0].diff.contains("+class ActMood(Enum):"));
        assert!(report.diagnostics.has_code(DiagnosticCode::Drift));
    }

    #[test]
    fn test_duplicate_languages_render_once() {
        let generator = generator(vec![Language::Python, Language::Python]);
        let analysis = generator.analyze(&["voc.xsd".to_string()]).unwrap();
        let (artifacts, diagnostics) = generator.render(&analysis.resolved).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(diagnostics.is_empty());
    }

    /// Python backend whose module rendering always fails
    struct BrokenEmitter {
        profile: RenderProfile,
        fatal: bool,
    }

    impl CodeEmitter for BrokenEmitter {
        fn language(&self) -> Language {
            Language::Python
        }

        fn profile(&self) -> &RenderProfile {
            &self.profile
        }

        fn emit_module_header(&self, _ctx: &CodegenContext<'_>) -> String {
            String::new()
        }

        fn emit_doc_comment(&self, _lines: &[String], _indent: usize) -> String {
            String::new()
        }

        fn emit_enum_type(&self, _enumeration: &ResolvedEnumeration, _ctx: &CodegenContext<'_>) -> String {
            String::new()
        }

        fn emit_complex_type(&self, _complex: &ResolvedComplexType, _ctx: &CodegenContext<'_>) -> String {
            String::new()
        }

        fn emit_module(
            &self,
            _resolved: &ResolvedModel,
            _naming: &NamingResolver,
            _module_name: &str,
        ) -> Result<GeneratedArtifact> {
            if self.fatal {
                Err(GenerateError::CollisionResolution {
                    type_name: "ActMood".to_string(),
                    raw_value: "EVN".to_string(),
                })
            } else {
                Err(GenerateError::Io(std::io::Error::new(std::io::ErrorKind::Other, "render failed")))
            }
        }
    }

    fn with_broken_python(fatal: bool) -> Generator<MemorySchemaSource> {
        let mut registry = EmitterRegistry::with_defaults();
        registry.register(Arc::new(BrokenEmitter {
            profile: RenderProfile::python(),
            fatal,
        }));
        generator(vec![Language::Python, Language::Rust]).with_registry(registry)
    }

    #[test]
    fn test_fatal_render_error_aborts_run() {
        let generator = with_broken_python(true);
        let analysis = generator.analyze(&["voc.xsd".to_string()]).unwrap();
        let err = generator.render(&analysis.resolved).unwrap_err();
        assert!(matches!(err, GenerateError::CollisionResolution { .. }));
    }

    #[test]
    fn test_non_fatal_render_error_is_aggregated() {
        let generator = with_broken_python(false);
        let analysis = generator.analyze(&["voc.xsd".to_string()]).unwrap();
        let (artifacts, diagnostics) = generator.render(&analysis.resolved).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].language, Language::Rust);
        assert!(diagnostics.has_errors());
    }
}
