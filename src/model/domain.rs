//! HL7 vocabulary domain tags
//!
//! Vocabulary schemas annotate types and enumeration members with the layer
//! they came from, e.g. `abstDomain: A10066 (C-0-T11527-A10066-cpt)`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Which restriction layer a declaration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainKind {
    AbstDomain,
    SpecDomain,
    VocSet,
}

impl DomainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::AbstDomain => "abstDomain",
            DomainKind::SpecDomain => "specDomain",
            DomainKind::VocSet => "vocSet",
        }
    }
}

/// A parsed `<kind>: <id> (<path>)` annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainTag {
    pub kind: DomainKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(abstDomain|specDomain|vocSet):\s*(\S+)(?:\s+\(([^)]*)\))?").expect("valid regex")
    })
}

impl DomainTag {
    /// Parse the first domain tag found at the start of any line of `text`
    pub fn parse(text: &str) -> Option<Self> {
        text.lines().find_map(|line| {
            let caps = domain_regex().captures(line)?;
            let kind = match &caps[1] {
                "abstDomain" => DomainKind::AbstDomain,
                "specDomain" => DomainKind::SpecDomain,
                _ => DomainKind::VocSet,
            };
            Some(DomainTag {
                kind,
                id: caps[2].to_string(),
                path: caps.get(3).map(|m| m.as_str().trim().to_string()).filter(|p| !p.is_empty()),
            })
        })
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.id)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        Ok(())
    }
}
