//! Demo data loaded by `aeo-cli db seed`.

use std::path::Path;

use serde::Deserialize;

use crate::model::{NewProject, ProjectError};
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedOwner {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProject {
    pub name: String,
    pub domain: String,
    pub locale_country: String,
    pub locale_language: String,
}

impl SeedProject {
    /// # Errors
    ///
    /// Returns [`ProjectError`] if the entry does not describe a valid project.
    pub fn to_new_project(&self) -> Result<NewProject, ProjectError> {
        NewProject::parse(
            &self.name,
            &self.domain,
            &self.locale_country,
            &self.locale_language,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    pub owner: SeedOwner,
    pub workspace: String,
    #[serde(default)]
    pub projects: Vec<SeedProject>,
}

impl Default for SeedFile {
    fn default() -> Self {
        Self {
            owner: SeedOwner {
                email: "owner@demo.local".to_string(),
                name: "Demo Owner".to_string(),
            },
            workspace: "Default Workspace".to_string(),
            projects: vec![SeedProject {
                name: "Demo Project".to_string(),
                domain: "example.com".to_string(),
                locale_country: "US".to_string(),
                locale_language: "en".to_string(),
            }],
        }
    }
}

/// Load and validate a seed file from YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_seed(&content)
}

/// Parse and validate seed YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or an entry is invalid.
pub fn parse_seed(content: &str) -> Result<SeedFile, ConfigError> {
    let seed: SeedFile = serde_yaml::from_str(content).map_err(ConfigError::SeedFileParse)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &SeedFile) -> Result<(), ConfigError> {
    if seed.owner.email.trim().is_empty() || !seed.owner.email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "owner email '{}' is invalid",
            seed.owner.email
        )));
    }
    if seed.workspace.trim().is_empty() {
        return Err(ConfigError::Validation(
            "workspace name must not be empty".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for project in &seed.projects {
        project.to_new_project().map_err(|e| {
            ConfigError::Validation(format!("project '{}': {e}", project.name))
        })?;
        if !seen.insert(project.name.trim().to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate project name '{}'",
                project.name
            )));
        }
    }

    Ok(())
}
