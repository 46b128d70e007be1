// Geoapify places search (needs an API key)
use crate::model::{Candidate, DiscoveryQuery, ProviderError};
use crate::providers::SourceProvider;
use crate::utils::retry;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const GEOCODE_URL: &str = "https://api.geoapify.com/v1/geocode/search";
const PLACES_URL: &str = "https://api.geoapify.com/v2/places";

pub struct GeoapifyProvider {
    client: Client,
    api_key: Option<String>,
}

impl GeoapifyProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        let api_key = api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        Self { client, api_key }
    }

    /// Common business types mapped to Geoapify category ids; everything else
    /// falls into the generic commercial bucket.
    fn category_for(business_type: &str) -> &'static str {
        match business_type.to_lowercase().as_str() {
            "dental clinic" => "healthcare.dentist",
            "clinic" => "healthcare.clinic",
            "hospital" => "healthcare.hospital",
            "pharmacy" => "healthcare.pharmacy",
            "optical" => "healthcare.optician",
            "salon" => "beauty.salon",
            _ => "commercial.services",
        }
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

    /// Resolves the city to coordinates; the places endpoint filters by circle.
    async fn geocode_city(&self, key: &str, city: &str) -> Result<(f64, f64), ProviderError> {
        let params = [("text", city.to_string()), ("apiKey", key.to_string())];
        let data = self.get_json(GEOCODE_URL, &params).await?;
        let feature = data
            .pointer("/features/0/geometry/coordinates")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse(format!("no geocode result for '{}'", city)))?;
        match (
            feature.first().and_then(Value::as_f64),
            feature.get(1).and_then(Value::as_f64),
        ) {
            (Some(lon), Some(lat)) => Ok((lat, lon)),
            _ => Err(ProviderError::Parse("malformed geocode coordinates".to_string())),
        }
    }
}

#[async_trait::async_trait]
impl SourceProvider for GeoapifyProvider {
    fn name(&self) -> &'static str {
        "geoapify"
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &DiscoveryQuery) -> Result<Vec<Candidate>, ProviderError> {
        let key = self.api_key.clone().ok_or(ProviderError::Unavailable)?;
        let (lat, lon) = self.geocode_city(&key, &query.city).await?;
        let radius_m = (query.radius_km * 1000.0) as u64;

        let params = [
            ("categories", Self::category_for(&query.business_type).to_string()),
            ("filter", format!("circle:{},{},{}", lon, lat, radius_m)),
            ("limit", query.limit.min(50).to_string()),
            ("apiKey", key),
        ];
        let data = self.get_json(PLACES_URL, &params).await?;

        let features = data
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("missing features array".to_string()))?;

        let mut out = Vec::new();
        for f in features.iter().take(query.limit) {
            let props = f.get("properties");
            let prop_str = |field: &str| {
                props
                    .and_then(|p| p.get(field))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            let coords = f
                .pointer("/geometry/coordinates")
                .and_then(Value::as_array);
            let (lat, lng) = match coords.map(|c| {
                (
                    c.get(1).and_then(Value::as_f64),
                    c.first().and_then(Value::as_f64),
                )
            }) {
                Some((Some(lat), Some(lng))) => (lat, lng),
                _ => continue,
            };

            let name = match prop_str("name") {
                Some(n) if !n.trim().is_empty() => n,
                _ => continue,
            };
            out.push(Candidate {
                name,
                lat,
                lng,
                address: prop_str("formatted").unwrap_or_default(),
                website: prop_str("website"),
                phone: prop_str("phone"),
                source_tag: self.name().to_string(),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mapping() {
        assert_eq!(GeoapifyProvider::category_for("Dental Clinic"), "healthcare.dentist");
        assert_eq!(GeoapifyProvider::category_for("bakery"), "commercial.services");
    }
}
