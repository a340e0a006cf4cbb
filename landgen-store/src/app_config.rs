use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    /// JSON dataset loaded into the memory backend
    pub fixture_path: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: None,
            fixture_path: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_min_keyword_len")]
    pub min_keyword_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            min_keyword_len: default_min_keyword_len(),
        }
    }
}

fn default_batch_size() -> usize { 50 }
fn default_min_keyword_len() -> usize { 3 }

/// Export output plus the fallbacks used when a page lacks a value
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_error_report_limit")]
    pub error_report_limit: usize,
    /// Token in the CTA action value replaced by the branch phone
    #[serde(default = "default_phone_placeholder")]
    pub phone_placeholder: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_cta_text")]
    pub cta_text: String,
    #[serde(default = "default_cta_action_type")]
    pub cta_action_type: String,
    #[serde(default = "default_cta_action_value")]
    pub cta_action_value: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            error_report_limit: default_error_report_limit(),
            phone_placeholder: default_phone_placeholder(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            font: default_font(),
            cta_text: default_cta_text(),
            cta_action_type: default_cta_action_type(),
            cta_action_value: default_cta_action_value(),
        }
    }
}

fn default_output_path() -> String { "content.json".into() }
fn default_error_report_limit() -> usize { 10 }
fn default_phone_placeholder() -> String { "{client_phone}".into() }
fn default_primary_color() -> String { "#0ea5e9".into() }
fn default_secondary_color() -> String { "#8b5cf6".into() }
fn default_font() -> String { "Inter".into() }
fn default_cta_text() -> String { "Get Free Quote".into() }
fn default_cta_action_type() -> String { "form".into() }
fn default_cta_action_value() -> String { "#contact-form".into() }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `LANDGEN__STORE__BACKEND=postgres`
            .add_source(config::Environment::with_prefix("LANDGEN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
