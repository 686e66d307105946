//! Language configuration for submission execution

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;

use crate::harness::HarnessKind;

/// Configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Canonical language name (registry key, not an alias)
    pub name: String,
    /// Name of the source file written into the workspace (e.g., "main.py")
    pub source_file: String,
    /// Run command, executed inside the workspace
    pub run_command: Vec<String>,
    /// Harness dialect (None for languages without a generator yet)
    pub harness: Option<HarnessKind>,
    /// Per-test-case wall-clock budget in milliseconds
    pub time_limit_ms: u64,
    /// Address-space limit applied to the child process (None = unlimited)
    pub memory_limit_mb: Option<u64>,
    /// Disabled languages are rejected before any execution
    pub enabled: bool,
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    run_command: String,
    harness: Option<HarnessKind>,
    time_limit_ms: u64,
    memory_limit_mb: Option<u64>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    aliases: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Global language configurations
static LANGUAGES: OnceLock<HashMap<String, LanguageConfig>> = OnceLock::new();

/// Parse a languages.toml document into a registry keyed by canonical name
/// and every alias, all lowercased.
fn parse_languages(content: &str) -> anyhow::Result<HashMap<String, LanguageConfig>> {
    let raw_configs: HashMap<String, RawLanguageConfig> =
        toml::from_str(content).context("invalid languages config")?;

    let mut languages = HashMap::new();

    for (name, raw) in raw_configs {
        let config = LanguageConfig {
            name: name.to_lowercase(),
            source_file: raw.source_file,
            run_command: into_command(&raw.run_command),
            harness: raw.harness,
            time_limit_ms: raw.time_limit_ms,
            memory_limit_mb: raw.memory_limit_mb,
            enabled: raw.enabled,
        };

        // Add main language name
        languages.insert(name.to_lowercase(), config.clone());

        // Add aliases
        for alias in raw.aliases {
            languages.insert(alias.to_lowercase(), config.clone());
        }
    }

    Ok(languages)
}

/// Initialize language configurations from a TOML file on disk, or from the
/// bundled default when `path` is None. Later calls are no-ops: the first
/// registry to land wins, which keeps concurrent test setup harmless.
pub fn init_languages(path: Option<&str>) -> anyhow::Result<()> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read languages config at {}", path))?,
        None => include_str!("../files/languages.toml").to_string(),
    };

    let languages = parse_languages(&content)?;
    let _ = LANGUAGES.set(languages);

    Ok(())
}

/// Get language configuration by language name or alias
pub fn get_language_config(language: &str) -> Option<LanguageConfig> {
    LANGUAGES.get()?.get(&language.to_lowercase()).cloned()
}

/// Get all supported language names (including aliases)
pub fn get_supported_languages() -> Vec<String> {
    LANGUAGES
        .get()
        .map(|langs| langs.keys().cloned().collect())
        .unwrap_or_default()
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
