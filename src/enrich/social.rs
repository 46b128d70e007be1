// Public social profile probing via profile page metadata
use crate::enrich::SocialProber;
use crate::model::{EnrichError, FacebookMetrics, InstagramMetrics, TwitterMetrics};
use crate::utils::retry;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

static FOLLOWERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.,]+[KM]?)\s+followers").unwrap());
static LIKES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.,]+[KM]?)\s+likes").unwrap());
static POSTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.,]+[KM]?)\s+posts").unwrap());

pub struct HttpSocialProber {
    client: Client,
}

impl HttpSocialProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a profile page; a 404/410 is the no-profile marker, everything
    /// else non-2xx is treated as transient (profile pages throttle hard).
    async fn fetch_profile(&self, url: &str, handle: &str) -> Result<String, EnrichError> {
        retry(2, Duration::from_millis(500), || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| EnrichError::Transient(e.to_string()))?;
            match response.status().as_u16() {
                404 | 410 => Err(EnrichError::NoProfile(handle.to_string())),
                s if (200..300).contains(&s) => response
                    .text()
                    .await
                    .map_err(|e| EnrichError::Transient(e.to_string())),
                s => Err(EnrichError::Transient(format!("HTTP status {}", s))),
            }
        })
        .await
    }
}

#[async_trait::async_trait]
impl SocialProber for HttpSocialProber {
    async fn probe_facebook(&self, handle: &str) -> Result<FacebookMetrics, EnrichError> {
        let url = format!("https://www.facebook.com/{}/", handle);
        let body = self.fetch_profile(&url, handle).await?;
        let description = og_description(&body)
            .ok_or_else(|| EnrichError::NoProfile(handle.to_string()))?;
        Ok(FacebookMetrics {
            page: handle.to_string(),
            followers: extract_count(&FOLLOWERS_RE, &description),
            likes: extract_count(&LIKES_RE, &description),
            about: Some(description),
        })
    }

    async fn probe_instagram(&self, handle: &str) -> Result<InstagramMetrics, EnrichError> {
        let url = format!("https://www.instagram.com/{}/", handle);
        let body = self.fetch_profile(&url, handle).await?;
        let description = og_description(&body)
            .ok_or_else(|| EnrichError::NoProfile(handle.to_string()))?;
        let followers = extract_count(&FOLLOWERS_RE, &description)
            .ok_or_else(|| EnrichError::NoProfile(handle.to_string()))?;
        Ok(InstagramMetrics {
            username: handle.to_string(),
            followers,
            posts: extract_count(&POSTS_RE, &description).unwrap_or(0),
            last_post: None,
        })
    }

    async fn probe_twitter(&self, handle: &str) -> Result<TwitterMetrics, EnrichError> {
        let url = format!("https://x.com/{}", handle);
        let body = self.fetch_profile(&url, handle).await?;
        // X exposes no engagement numbers on the public shell page; a resolved
        // profile still counts as presence with unknown engagement.
        og_description(&body).ok_or_else(|| EnrichError::NoProfile(handle.to_string()))?;
        Ok(TwitterMetrics {
            username: handle.to_string(),
            avg_likes: 0.0,
            tweets_sampled: 0,
        })
    }
}

fn og_description(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(r#"meta[property="og:description"]"#).expect("static selector");
    document
        .select(&selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string)
        .filter(|d| !d.trim().is_empty())
}

fn extract_count(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_compact_count(m.as_str()))
}

/// Parses "1,234", "5.2K" or "3M" style counts as rendered in profile
/// descriptions.
fn parse_compact_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last() {
        Some('k') | Some('K') => (&raw[..raw.len() - 1], 1_000.0),
        Some('m') | Some('M') => (&raw[..raw.len() - 1], 1_000_000.0),
        _ => (raw, 1.0),
    };
    let cleaned: String = digits.chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .map(|n| (n * multiplier).round() as u64)
}
