use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub business_type: String,
    pub city: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub google_places_api_key: Option<String>,
    pub geoapify_api_key: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,
    #[serde(default = "default_max_handle_candidates")]
    pub max_handle_candidates: usize,
    #[serde(default)]
    pub export_csv_path: Option<String>,
    pub queries: Vec<QueryConfig>,
}

fn default_limit() -> usize {
    10
}

fn default_radius_km() -> f64 {
    5.0
}

fn default_language() -> String {
    "en".to_string()
}

fn default_user_agent() -> String {
    "leadscout/0.1".to_string()
}

fn default_db_path() -> String {
    "data/leads.db".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_probe_delay_ms() -> u64 {
    300
}

fn default_max_handle_candidates() -> usize {
    12
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
