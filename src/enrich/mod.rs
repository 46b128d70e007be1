// Enrichment collaborators: website scraping, social probing, web search.

pub mod site;
pub mod social;
pub mod web_search;

use crate::model::{
    EnrichError, FacebookMetrics, InstagramMetrics, SiteReport, TwitterMetrics,
};

pub use site::HttpSiteScraper;
pub use social::HttpSocialProber;
pub use web_search::{classify_profile_urls, DuckDuckGoSearcher, ProfileCandidates};

/// Fetches a business website and extracts health signals, social links and
/// contact details. May fail; the pipeline degrades the affected findings.
#[async_trait::async_trait]
pub trait SiteScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<SiteReport, EnrichError>;
}

/// Looks up public metrics for a handle on one platform. `NoProfile` is the
/// error-marker for a handle that does not resolve to an account.
#[async_trait::async_trait]
pub trait SocialProber: Send + Sync {
    async fn probe_facebook(&self, handle: &str) -> Result<FacebookMetrics, EnrichError>;
    async fn probe_instagram(&self, handle: &str) -> Result<InstagramMetrics, EnrichError>;
    async fn probe_twitter(&self, handle: &str) -> Result<TwitterMetrics, EnrichError>;
}

/// Generic web search returning result URLs in rank order.
#[async_trait::async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, EnrichError>;
}
