//! Shared domain types and configuration for the channel ledger sync job.

pub mod app_config;
pub mod config;
pub mod duration;
pub mod job;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use duration::{classify_duration, parse_iso8601_duration, SHORT_FORM_MAX_SECONDS};
pub use job::{load_job_config, CostSchedule, JobConfig, SheetNames};
pub use types::{Category, CostRule, VideoRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read job config at {path}: {source}")]
    JobFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job config: {0}")]
    JobFileParse(#[source] serde_yaml::Error),

    #[error("invalid job config: {0}")]
    Validation(String),
}
