// Core structs: Candidate, Findings, Score, Lead
use crate::utils::Retryable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One discovery request as issued to a source provider.
#[derive(Debug, Clone)]
pub struct DiscoveryQuery {
    pub business_type: String,
    pub city: String,
    pub radius_km: f64,
    pub limit: usize,
}

/// Raw discovery result from a source provider, before enrichment.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub source_tag: String,
}

/// Basic health check of a business website. `score` is 100 minus 20 per issue,
/// floored at 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteHealth {
    pub reachable: bool,
    pub status_code: Option<u16>,
    pub title: String,
    pub has_contact: bool,
    pub ssl: bool,
    pub issues: Vec<String>,
    pub score: f64,
}

/// Social profile URLs found on a website, grouped by platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: Vec<String>,
    pub instagram: Vec<String>,
    pub twitter: Vec<String>,
    pub linkedin: Vec<String>,
    pub youtube: Vec<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.facebook.is_empty()
            && self.instagram.is_empty()
            && self.twitter.is_empty()
            && self.linkedin.is_empty()
            && self.youtube.is_empty()
    }
}

/// Everything extracted from one website fetch.
#[derive(Debug, Clone, Default)]
pub struct SiteReport {
    pub health: SiteHealth,
    pub social_links: SocialLinks,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub meta_description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacebookMetrics {
    pub page: String,
    pub followers: Option<u64>,
    pub likes: Option<u64>,
    pub about: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstagramMetrics {
    pub username: String,
    pub followers: u64,
    pub posts: u64,
    pub last_post: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterMetrics {
    pub username: String,
    pub avg_likes: f64,
    pub tweets_sampled: usize,
}

/// Per-platform metrics for one candidate. `None` means no profile was found,
/// or every lookup for that platform failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialFindings {
    pub facebook: Option<FacebookMetrics>,
    pub instagram: Option<InstagramMetrics>,
    pub twitter: Option<TwitterMetrics>,
}

impl SocialFindings {
    pub fn platforms_found(&self) -> usize {
        self.facebook.is_some() as usize
            + self.instagram.is_some() as usize
            + self.twitter.is_some() as usize
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorInfo {
    pub competitor_count: u32,
    pub sample: Vec<String>,
}

/// Aggregated enrichment signals for one candidate. Owned by a single pipeline
/// run; not mutated after scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    pub site_health: Option<SiteHealth>,
    pub social: SocialFindings,
    pub competitor: CompetitorInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    Low,
    Medium,
    High,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Low => "LOW",
            Grade::Medium => "MEDIUM",
            Grade::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub opportunity_score: f64,
    pub grade: Grade,
}

/// One outreach attempt. Events are append-only and ordered by occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEvent {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub email: Option<String>,
    pub note: Option<String>,
}

/// Computed state carried alongside a lead as a JSON blob. Findings, score and
/// pitch are replaced on every run; contact history is only touched by
/// `mark_contacted`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadMeta {
    pub findings: Findings,
    pub score: Option<Score>,
    pub pitch: Option<String>,
    #[serde(default)]
    pub contacted: bool,
    #[serde(default)]
    pub contact_history: Vec<ContactEvent>,
    pub last_contacted: Option<DateTime<Utc>>,
}

/// Finalized, persisted business record. `id` is assigned at first insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Option<i64>,
    pub name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub city: String,
    pub business_type: String,
    pub source: String,
    pub meta: LeadMeta,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider disabled (missing credentials)")]
    Unavailable,
    #[error("transient network error: {0}")]
    Transient(String),
    #[error("malformed provider response: {0}")]
    Parse(String),
}

impl Retryable for ProviderError {
    fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("transient network error: {0}")]
    Transient(String),
    #[error("malformed page or response: {0}")]
    Parse(String),
    #[error("no profile for handle '{0}'")]
    NoProfile(String),
}

impl Retryable for EnrichError {
    fn is_transient(&self) -> bool {
        matches!(self, EnrichError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("lead {0} not found")]
    NotFound(i64),
    #[error("corrupt meta blob: {0}")]
    CorruptMeta(#[from] serde_json::Error),
}
