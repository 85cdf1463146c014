//! Domain types shared by the storage, server and CLI crates.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CoreError;

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)+$")
        .expect("valid hostname regex")
});

const MAX_PROJECT_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("Project name, domain, country and language are all required.")]
    MissingFields,
    #[error("Project name must be at most 200 characters.")]
    NameTooLong,
    #[error("'{0}' is not a valid domain.")]
    InvalidDomain(String),
    #[error("'{0}' is not a valid locale country code.")]
    InvalidCountry(String),
    #[error("'{0}' is not a valid locale language code.")]
    InvalidLanguage(String),
}

/// Lifecycle of a scan row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Done,
}

impl ScanStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "running" => Ok(ScanStatus::Running),
            "done" => Ok(ScanStatus::Done),
            other => Err(CoreError::UnknownScanStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ScanStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Desktop,
    Mobile,
}

impl Device {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Mobile => "mobile",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Country + language a project is tracked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub country: String,
    pub language: String,
}

impl Locale {
    /// Validate and normalize: country upper-case, language lower-case,
    /// each 2–3 ASCII letters.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::InvalidCountry`] or
    /// [`ProjectError::InvalidLanguage`] for malformed codes.
    pub fn new(country: &str, language: &str) -> Result<Self, ProjectError> {
        let country = country.trim();
        let language = language.trim();
        if !is_locale_code(country) {
            return Err(ProjectError::InvalidCountry(country.to_string()));
        }
        if !is_locale_code(language) {
            return Err(ProjectError::InvalidLanguage(language.to_string()));
        }
        Ok(Self {
            country: country.to_ascii_uppercase(),
            language: language.to_ascii_lowercase(),
        })
    }

    /// Display label such as `EN-US`.
    #[must_use]
    pub fn label(&self) -> String {
        locale_label(&self.language, &self.country)
    }
}

/// Display label for a stored language/country pair.
#[must_use]
pub fn locale_label(language: &str, country: &str) -> String {
    format!(
        "{}-{}",
        language.to_ascii_uppercase(),
        country.to_ascii_uppercase()
    )
}

fn is_locale_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Reduce user input to a bare lower-case hostname.
///
/// Strips an `http://` or `https://` scheme, any path, query or fragment,
/// and trailing dots.
///
/// # Errors
///
/// Returns [`ProjectError::InvalidDomain`] if the remainder is not a
/// dotted hostname.
pub fn normalize_domain(input: &str) -> Result<String, ProjectError> {
    let lowered = input.trim().to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');

    if host.len() > 253 || !HOSTNAME_RE.is_match(host) {
        return Err(ProjectError::InvalidDomain(input.trim().to_string()));
    }
    Ok(host.to_string())
}

/// Validated input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub domain: String,
    pub locale: Locale,
}

impl NewProject {
    /// # Errors
    ///
    /// Returns [`ProjectError`] when a field is blank or malformed.
    pub fn parse(
        name: &str,
        domain: &str,
        country: &str,
        language: &str,
    ) -> Result<Self, ProjectError> {
        let name = name.trim();
        if [name, domain.trim(), country.trim(), language.trim()]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(ProjectError::MissingFields);
        }
        if name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(ProjectError::NameTooLong);
        }

        Ok(Self {
            name: name.to_string(),
            domain: normalize_domain(domain)?,
            locale: Locale::new(country, language)?,
        })
    }
}
