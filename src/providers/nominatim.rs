// OpenStreetMap Nominatim search (no credentials, lowest rank)
use crate::model::{Candidate, DiscoveryQuery, ProviderError};
use crate::providers::SourceProvider;
use crate::utils::retry;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

pub struct NominatimProvider {
    client: Client,
}

impl NominatimProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SourceProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        "osm"
    }

    async fn search(&self, query: &DiscoveryQuery) -> Result<Vec<Candidate>, ProviderError> {
        let q = if query.city.trim().is_empty() {
            query.business_type.clone()
        } else {
            format!("{}, {}", query.business_type, query.city)
        };
        let params = [
            ("q", q),
            ("format", "json".to_string()),
            ("limit", query.limit.to_string()),
        ];

        let data: Value = retry(3, Duration::from_millis(500), || async {
            let response = self
                .client
                .get(NOMINATIM_URL)
                .query(&params)
                .send()
                .await
                .map_err(|e| ProviderError::Transient(e.to_string()))?;
            let status = response.status();
            if status.is_server_error() {
                return Err(ProviderError::Transient(format!("HTTP status {}", status)));
            }
            if !status.is_success() {
                return Err(ProviderError::Parse(format!("HTTP status {}", status)));
            }
            response
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::Parse(e.to_string()))
        })
        .await?;

        let items = data
            .as_array()
            .ok_or_else(|| ProviderError::Parse("expected a JSON array".to_string()))?;

        let mut out = Vec::new();
        for item in items {
            let display_name = item
                .get("display_name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let lat = item
                .get("lat")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<f64>().ok());
            let lng = item
                .get("lon")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<f64>().ok());
            let (lat, lng) = match (lat, lng) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => continue,
            };

            out.push(Candidate {
                name: display_name
                    .split(',')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                lat,
                lng,
                address: display_name.to_string(),
                website: None,
                phone: None,
                source_tag: self.name().to_string(),
            });
        }
        Ok(out)
    }
}
