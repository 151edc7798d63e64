//! The package configuration read from `tree-sitter.json`.

use serde::Deserialize;

use crate::error::{GenerateError, GenerateResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub grammars: Vec<GrammarConfig>,
    pub metadata: PackageMetadata,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrammarConfig {
    pub name: String,
    #[serde(default)]
    pub camelcase: Option<String>,
    pub scope: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub file_types: Vec<String>,
    #[serde(default)]
    pub highlights: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    pub version: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `major.minor.patch`, each part small enough for `TSLanguageMetadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Config {
    pub fn from_json(json: &str) -> GenerateResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GenerateError::Config(format!("tree-sitter.json: {e}")))?;
        if config.grammars.is_empty() {
            return Err(GenerateError::Config(
                "tree-sitter.json declares no grammars".into(),
            ));
        }
        config.version()?;
        Ok(config)
    }

    pub fn grammar(&self, name: &str) -> GenerateResult<&GrammarConfig> {
        self.grammars
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| {
                GenerateError::Config(format!(
                    "grammar `{name}` is not listed in tree-sitter.json"
                ))
            })
    }

    pub fn version(&self) -> GenerateResult<LanguageVersion> {
        parse_version(&self.metadata.version)
    }
}

fn parse_version(version: &str) -> GenerateResult<LanguageVersion> {
    let invalid = || GenerateError::Config(format!("invalid version `{version}`"));
    // Pre-release and build suffixes do not fit in the language metadata.
    let core = version.split(['-', '+']).next().unwrap_or_default();
    let mut parts = core.split('.').map(str::parse::<u8>);
    let mut next = || parts.next().ok_or_else(invalid)?.map_err(|_| invalid());
    let result = LanguageVersion {
        major: next()?,
        minor: next()?,
        patch: next()?,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(result)
}
