//! Configuration management for the binding generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (bindgen.toml)
//! - Environment variables (BINDGEN__*)
//!
//! ## Example config file (bindgen.toml):
//! ```toml
//! [output]
//! dir = "generated"
//! languages = ["python", "rust"]
//! module_name = "voc"
//! write_manifest = true
//!
//! [parse]
//! workers = 4
//! schema_extensions = ["xsd"]
//!
//! [naming]
//! reserved_suffix = "_VALUE"
//! digit_prefix = "VALUE_"
//!
//! [diagnostics]
//! warnings_as_errors = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codegen::{Language, NamingConfig};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindgenConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub parse: ParseConfig,

    /// Identifier conventions shared by all backends
    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated modules are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Target languages
    #[serde(default = "default_languages")]
    pub languages: Vec<Language>,

    /// Module file stem (`voc` -> `voc.py`, `voc.rs`)
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Write bindgen-manifest.json next to the modules
    #[serde(default = "default_true")]
    pub write_manifest: bool,
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Parser worker threads (0 = one per core)
    #[serde(default)]
    pub workers: usize,

    /// Extensions picked up when a schema path is a directory
    #[serde(default = "default_extensions")]
    pub schema_extensions: Vec<String>,
}

/// Diagnostics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Treat warnings (dropped members, value collisions, skipped types) as errors
    #[serde(default)]
    pub warnings_as_errors: bool,
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_languages() -> Vec<Language> {
    vec![Language::Python]
}

fn default_module_name() -> String {
    "bindings".to_string()
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["xsd".to_string()]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            languages: default_languages(),
            module_name: default_module_name(),
            write_manifest: true,
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            schema_extensions: default_extensions(),
        }
    }
}

impl BindgenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["bindgen.toml", ".bindgen.toml", "config/bindgen.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-bindgen", "schema-bindgen") {
            let xdg_config = config_dir.config_dir().join("bindgen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // BINDGEN__OUTPUT__DIR=out, BINDGEN__DIAGNOSTICS__WARNINGS_AS_ERRORS=true
        builder = builder.add_source(
            Environment::with_prefix("BINDGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Whether `path` has one of the configured schema extensions
    pub fn is_schema_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.parse.schema_extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BindgenConfig::default();
        assert_eq!(config.output.languages, vec![Language::Python]);
        assert!(config.output.write_manifest);
        assert_eq!(config.naming.reserved_suffix, "_VALUE");
        assert!(!config.diagnostics.warnings_as_errors);
    }

    #[test]
    fn test_serialize_config() {
        let config = BindgenConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[naming]"));
        assert!(toml_str.contains("languages"));
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[output]\nlanguages = [\"rust\", \"python\"]\nmodule_name = \"voc\"\n\n[naming]\nreserved_suffix = \"_KW\"\n",
        )
        .unwrap();

        let config = BindgenConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.output.languages, vec![Language::Rust, Language::Python]);
        assert_eq!(config.output.module_name, "voc");
        assert_eq!(config.naming.reserved_suffix, "_KW");
        // Untouched keys keep their defaults
        assert_eq!(config.naming.digit_prefix, "VALUE_");
        assert_eq!(config.parse.schema_extensions, vec!["xsd".to_string()]);
    }

    #[test]
    fn test_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = BindgenConfig::default();
        config.parse.workers = 3;
        config.save(&path).unwrap();

        let loaded = BindgenConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.parse.workers, 3);
    }

    #[test]
    fn test_schema_file_filter() {
        let config = BindgenConfig::default();
        assert!(config.is_schema_file(Path::new("voc.xsd")));
        assert!(config.is_schema_file(Path::new("VOC.XSD")));
        assert!(!config.is_schema_file(Path::new("voc.xml")));
    }
}
