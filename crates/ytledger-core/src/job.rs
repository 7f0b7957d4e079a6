//! Per-channel job configuration: the channel to sync and the cost rules for
//! each ledger category.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Category, CostRule};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Canonical channel ID or an `@handle`.
    pub channel: String,
    #[serde(default)]
    pub costs: CostSchedule,
    #[serde(default)]
    pub sheets: SheetNames,
}

/// Ordered cost rules per category. Order determines ledger column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSchedule {
    #[serde(default)]
    pub long_form: Vec<CostRule>,
    #[serde(default)]
    pub short_form: Vec<CostRule>,
}

impl CostSchedule {
    #[must_use]
    pub fn rules(&self, category: Category) -> &[CostRule] {
        match category {
            Category::LongForm => &self.long_form,
            Category::ShortForm => &self.short_form,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub dashboard: String,
    pub long_form: String,
    pub short_form: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            dashboard: "Dashboard".to_string(),
            long_form: "Videos_Longos".to_string(),
            short_form: "Shorts".to_string(),
        }
    }
}

impl SheetNames {
    #[must_use]
    pub fn ledger(&self, category: Category) -> &str {
        match category {
            Category::LongForm => &self.long_form,
            Category::ShortForm => &self.short_form,
        }
    }
}

impl JobConfig {
    /// Trims the channel identifier and checks every invariant of the job.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on the first violated rule.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.channel = self.channel.trim().to_string();
        if self.channel.is_empty() {
            return Err(ConfigError::Validation(
                "channel must be non-empty".to_string(),
            ));
        }

        for category in Category::ALL {
            for rule in self.costs.rules(category) {
                if rule.role.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "{category} cost role must be non-empty"
                    )));
                }
                if rule.value < Decimal::ZERO {
                    return Err(ConfigError::Validation(format!(
                        "{category} cost '{}' has negative value {}",
                        rule.role, rule.value
                    )));
                }
            }
        }

        let names = [
            &self.sheets.dashboard,
            &self.sheets.long_form,
            &self.sheets.short_form,
        ];
        let mut seen = HashSet::new();
        for name in names {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "sheet names must be non-empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate sheet name: '{name}'"
                )));
            }
        }

        Ok(())
    }
}

/// Load and validate the job configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_job_config(path: &Path) -> Result<JobConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::JobFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_job_config(&content)
}

fn parse_job_config(content: &str) -> Result<JobConfig, ConfigError> {
    let mut job: JobConfig = serde_yaml::from_str(content).map_err(ConfigError::JobFileParse)?;
    job.validate()?;
    Ok(job)
}

#[cfg(test)]
#[path = "job_test.rs"]
mod tests;
