use log::debug;
use serde::Deserialize;
use snafu::prelude::*;
use std::fs;

use council_voting::ElectionRules;

use crate::app::*;

/// The settings of the narrative summary collaborator.
///
/// Every field is optional and defaults to the Google generative language
/// endpoint documented in the `council_voting` manual.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SummarySettings {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
}

impl SummarySettings {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("gemini-2.5-pro")
    }

    /// The name of the environment variable holding the API key. The key
    /// itself never appears in the configuration file.
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or("SUMMARY_API_KEY")
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }
}

/// The deserialized JSON configuration of the program.
///
/// All fields are optional; the accessor methods apply the documented
/// defaults.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "dataDirectory")]
    pub data_directory: Option<String>,
    #[serde(rename = "maxSelections")]
    pub max_selections: Option<usize>,
    #[serde(rename = "electedSeats")]
    pub elected_seats: Option<usize>,
    #[serde(rename = "adminPassword")]
    pub admin_password: Option<String>,
    pub summary: Option<SummarySettings>,
}

impl AppConfig {
    pub fn contest_name(&self) -> &str {
        self.contest_name.as_deref().unwrap_or("Council election")
    }

    pub fn data_directory(&self) -> &str {
        self.data_directory.as_deref().unwrap_or("election-data")
    }

    pub fn admin_password(&self) -> &str {
        self.admin_password.as_deref().unwrap_or("admin")
    }

    pub fn rules(&self) -> ElectionRules {
        ElectionRules {
            max_selections: self
                .max_selections
                .unwrap_or(ElectionRules::DEFAULT_RULES.max_selections),
            elected_seats: self
                .elected_seats
                .unwrap_or(ElectionRules::DEFAULT_RULES.elected_seats),
        }
    }

    pub fn summary(&self) -> SummarySettings {
        self.summary.clone().unwrap_or_default()
    }
}

/// Reads the configuration file, or falls back to the built-in defaults when
/// no path was given.
pub fn load_config(path: &Option<String>) -> AppResult<AppConfig> {
    match path {
        None => {
            debug!("load_config: no configuration file, using defaults");
            Ok(AppConfig::default())
        }
        Some(p) => {
            let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path: p.clone() })?;
            let config: AppConfig =
                serde_json::from_str(&contents).context(ParsingJsonSnafu { path: p.clone() })?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.contest_name(), "Council election");
        assert_eq!(config.data_directory(), "election-data");
        assert_eq!(config.admin_password(), "admin");
        assert_eq!(config.rules(), ElectionRules::DEFAULT_RULES);
        let summary = config.summary();
        assert_eq!(summary.model(), "gemini-2.5-pro");
        assert_eq!(summary.api_key_env(), "SUMMARY_API_KEY");
        assert_eq!(summary.timeout_seconds(), 30);
    }

    #[test]
    fn parses_camel_case_fields() {
        let raw = r#"{
            "contestName": "Staff council election",
            "dataDirectory": "/tmp/council",
            "maxSelections": 3,
            "electedSeats": 2,
            "adminPassword": "s3cret",
            "summary": { "model": "gemini-2.5-flash", "timeoutSeconds": 5 }
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.contest_name(), "Staff council election");
        assert_eq!(config.data_directory(), "/tmp/council");
        assert_eq!(
            config.rules(),
            ElectionRules {
                max_selections: 3,
                elected_seats: 2
            }
        );
        assert_eq!(config.admin_password(), "s3cret");
        let summary = config.summary();
        assert_eq!(summary.model(), "gemini-2.5-flash");
        assert_eq!(summary.timeout_seconds(), 5);
        // Unset nested fields still fall back to the defaults.
        assert_eq!(summary.api_key_env(), "SUMMARY_API_KEY");
    }
}
