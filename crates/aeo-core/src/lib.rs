//! Domain logic for AEO visibility tracking: configuration, CSV ingestion,
//! scan synthesis and the shared domain types.

pub mod app_config;
pub mod config;
pub mod csv_text;
pub mod export;
pub mod import;
pub mod model;
pub mod seed;
pub mod synth;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use csv_text::CsvWriteError;
pub use export::{scan_results_csv, ExportRecord, EXPORT_HEADER};
pub use import::{
    decode_upload, default_query_set_name, validate_upload, ImportError, ImportedQuery,
    DEFAULT_MAX_ROWS, SAMPLE_CSV, SAMPLE_CSV_FILENAME,
};
pub use model::{
    locale_label, normalize_domain, Device, Locale, NewProject, ProjectError, ScanStatus,
};
pub use seed::{load_seed, SeedFile};
pub use synth::{
    percent, synthesize_results, ResultFlags, ScanSummary, SynthesisProfile, SynthesizedResult,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[source] serde_yaml::Error),
    #[error("seed validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown scan status '{0}'")]
    UnknownScanStatus(String),
}
