// DuckDuckGo HTML search fallback for websites and profiles
use crate::enrich::WebSearcher;
use crate::model::EnrichError;
use crate::utils::retry;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

pub struct DuckDuckGoSearcher {
    client: Client,
}

impl DuckDuckGoSearcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl WebSearcher for DuckDuckGoSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, EnrichError> {
        let body = retry(2, Duration::from_millis(500), || async {
            let response = self
                .client
                .post(DDG_HTML_URL)
                .form(&[("q", query)])
                .send()
                .await
                .map_err(|e| EnrichError::Transient(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(EnrichError::Transient(format!("HTTP status {}", status)));
            }
            response
                .text()
                .await
                .map_err(|e| EnrichError::Transient(e.to_string()))
        })
        .await?;

        Ok(extract_result_urls(&body, max_results))
    }
}

fn extract_result_urls(body: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(body);
    let result_sel = Selector::parse("a.result__a").expect("static selector");
    let any_sel = Selector::parse("a[href]").expect("static selector");

    let mut out: Vec<String> = document
        .select(&result_sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .take(max_results)
        .collect();

    // Markup changes occasionally; fall back to any absolute link.
    if out.is_empty() {
        out = document
            .select(&any_sel)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.starts_with("http"))
            .map(str::to_string)
            .take(max_results)
            .collect();
    }
    out
}

/// Search results bucketed by what they point at.
#[derive(Debug, Default, Clone)]
pub struct ProfileCandidates {
    pub website_candidates: Vec<String>,
    pub facebook: Vec<String>,
    pub instagram: Vec<String>,
    pub twitter: Vec<String>,
    pub linkedin: Vec<String>,
}

/// Splits raw search result URLs into social profiles and plain website
/// candidates. Directory-style aggregator domains are not filtered; the
/// reconciler tolerates an occasional bad guess.
pub fn classify_profile_urls(urls: &[String]) -> ProfileCandidates {
    let mut out = ProfileCandidates::default();
    for url in urls {
        let lower = url.to_lowercase();
        if lower.contains("facebook.com") {
            out.facebook.push(url.clone());
        } else if lower.contains("instagram.com") {
            out.instagram.push(url.clone());
        } else if lower.contains("twitter.com") || lower.contains("x.com") {
            out.twitter.push(url.clone());
        } else if lower.contains("linkedin.com") {
            out.linkedin.push(url.clone());
        } else if lower.starts_with("http") {
            out.website_candidates.push(url.clone());
        }
    }
    out
}
