//! Custom detail-view treatments keyed by offer name.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A non-default detail-view treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Substring matched against the normalized offer name, e.g. `"perplexity"`.
    pub identifier: String,
    /// Name of the view the UI should render, e.g. `"airtel-perplexity-modal"`.
    pub treatment: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PresentationsFile {
    presentations: Vec<PresentationConfig>,
}

/// Lowercases the name and replaces spaces with hyphens.
#[must_use]
pub fn normalize_offer_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// First enabled configuration whose identifier occurs in the normalized name.
///
/// List order is the priority order.
#[must_use]
pub fn resolve_presentation<'a>(
    name: &str,
    configs: &'a [PresentationConfig],
) -> Option<&'a PresentationConfig> {
    let normalized = normalize_offer_name(name);
    configs
        .iter()
        .find(|config| config.enabled && normalized.contains(config.identifier.as_str()))
}

/// Load and validate presentation configs from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_presentations(path: &Path) -> Result<Vec<PresentationConfig>, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::PresentationsFileIo {
            path: path.display().to_string(),
            source: e,
        })?;
    parse_presentations(&content)
}

/// Parse and validate presentation configs from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_presentations(content: &str) -> Result<Vec<PresentationConfig>, ConfigError> {
    let file: PresentationsFile = serde_yaml::from_str(content)?;
    validate_presentations(&file.presentations)?;
    Ok(file.presentations)
}

fn validate_presentations(configs: &[PresentationConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for config in configs {
        if config.identifier.trim().is_empty() {
            return Err(ConfigError::Validation(
                "presentation identifier must be non-empty".to_string(),
            ));
        }
        if config.identifier != normalize_offer_name(&config.identifier) {
            return Err(ConfigError::Validation(format!(
                "presentation identifier '{}' must be lowercase with hyphens for spaces",
                config.identifier
            )));
        }
        if config.treatment.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "presentation '{}' has an empty treatment",
                config.identifier
            )));
        }
        if !seen.insert(config.identifier.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate presentation identifier: '{}'",
                config.identifier
            )));
        }
    }

    Ok(())
}
