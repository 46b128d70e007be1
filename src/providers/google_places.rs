// Google Places text search (needs an API key)
use crate::model::{Candidate, DiscoveryQuery, ProviderError};
use crate::providers::SourceProvider;
use crate::utils::retry;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

pub struct GooglePlacesProvider {
    client: Client,
    api_key: Option<String>,
}

impl GooglePlacesProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        let api_key = api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        Self { client, api_key }
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        retry(3, Duration::from_millis(500), || async {
            let response = self
                .client
                .get(url)
                .query(params)
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
        .await
    }

    /// Fetches phone and website for one place. Details failures are not worth
    /// a retry cascade; the candidate just stays without them.
    async fn place_details(&self, key: &str, place_id: &str) -> Option<Value> {
        let params = [
            ("place_id", place_id.to_string()),
            ("key", key.to_string()),
            (
                "fields",
                "name,formatted_phone_number,website,formatted_address".to_string(),
            ),
        ];
        match self.get_json(DETAILS_URL, &params).await {
            Ok(data) => data.get("result").cloned(),
            Err(e) => {
                debug!("place details lookup failed for {}: {}", place_id, e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl SourceProvider for GooglePlacesProvider {
    fn name(&self) -> &'static str {
        "google_places"
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &DiscoveryQuery) -> Result<Vec<Candidate>, ProviderError> {
        let key = self.api_key.as_ref().ok_or(ProviderError::Unavailable)?;

        let text = format!("{} in {}", query.business_type, query.city);
        let params = [
            ("query", text),
            ("key", key.clone()),
            ("language", "en".to_string()),
            ("type", "establishment".to_string()),
            ("radius", format!("{}", (query.radius_km * 1000.0) as u64)),
        ];
        let data = self.get_json(TEXT_SEARCH_URL, &params).await?;

        let results = data
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("missing results array".to_string()))?;

        let mut out = Vec::new();
        for r in results.iter().take(query.limit) {
            let name = r.get("name").and_then(Value::as_str).unwrap_or_default();
            let location = r.pointer("/geometry/location");
            let (lat, lng) = match (
                location.and_then(|l| l.get("lat")).and_then(Value::as_f64),
                location.and_then(|l| l.get("lng")).and_then(Value::as_f64),
            ) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => continue,
            };

            let details = match r.get("place_id").and_then(Value::as_str) {
                Some(place_id) => self.place_details(key, place_id).await,
                None => None,
            };
            let detail_str = |field: &str| {
                details
                    .as_ref()
                    .and_then(|d| d.get(field))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };

            out.push(Candidate {
                name: name.to_string(),
                lat,
                lng,
                address: r
                    .get("formatted_address")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                website: detail_str("website"),
                phone: detail_str("formatted_phone_number"),
                source_tag: self.name().to_string(),
            });
        }
        Ok(out)
    }
}
