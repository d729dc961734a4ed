//! Configuration
//!
//! Loads the Azure DevOps organization and default project from
//! `~/.config/ado/settings.toml`, with environment overrides.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment override for the organization
pub const ORG_VAR: &str = "AZURE_DEVOPS_ORG";
/// Environment override for the default project
pub const PROJECT_VAR: &str = "AZURE_DEVOPS_PROJECT";

/// Azure DevOps settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureSettings {
    /// Organization name (the `contoso` in https://dev.azure.com/contoso)
    pub organization: Option<String>,
    /// Default project
    pub project: Option<String>,
}

/// Settings file structure
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    azure: Option<AzureSettings>,
}

/// Get path to the settings file
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config").join("ado").join("settings.toml"))
}

/// Load settings from the file and apply environment overrides
pub fn load_settings() -> Result<AzureSettings> {
    let mut settings = AzureSettings::default();

    if let Some(path) = config_path() {
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            settings = parse_settings(&contents)?;
        }
    }

    if let Ok(org) = std::env::var(ORG_VAR) {
        if !org.trim().is_empty() {
            settings.organization = Some(org.trim().to_string());
        }
    }
    if let Ok(project) = std::env::var(PROJECT_VAR) {
        if !project.trim().is_empty() {
            settings.project = Some(project.trim().to_string());
        }
    }

    settings.organization = settings.organization.map(|o| org_slug(&o).to_string());
    Ok(settings)
}

/// Parse the settings file contents
fn parse_settings(contents: &str) -> Result<AzureSettings> {
    let file: SettingsFile = toml::from_str(contents)?;
    Ok(file.azure.unwrap_or_default())
}

/// Accept either a bare organization name or a full dev.azure.com URL
fn org_slug(org: &str) -> &str {
    org.trim()
        .trim_start_matches("https://dev.azure.com/")
        .trim_start_matches("http://dev.azure.com/")
        .trim_end_matches('/')
}
