// Pipeline controller: discovery fan-out, per-candidate enrichment, scoring,
// reconciliation.
use crate::config::QueryConfig;
use crate::enrich::{classify_profile_urls, site, SiteScraper, SocialProber, WebSearcher};
use crate::handles::guess_handles;
use crate::model::{
    Candidate, CompetitorInfo, DiscoveryQuery, Findings, Grade, Lead, LeadMeta, ProviderError,
    SocialFindings, SocialLinks, StorageError,
};
use crate::outreach::{check_compliance, PitchGenerator, MISSING_OPT_OUT, OPT_OUT_SENTENCE};
use crate::providers::SourceProvider;
use crate::scoring;
use crate::storage::SqliteStorage;
use crate::utils::handle_from_url;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const WEB_SEARCH_RESULTS: usize = 6;
const COMPETITOR_LIMIT: usize = 10;
const COMPETITOR_SAMPLE: usize = 5;

pub struct Pipeline {
    providers: Vec<Arc<dyn SourceProvider>>,
    competitor_source: Arc<dyn SourceProvider>,
    site_scraper: Arc<dyn SiteScraper>,
    social_prober: Arc<dyn SocialProber>,
    web_searcher: Arc<dyn WebSearcher>,
    pitch_generator: Arc<dyn PitchGenerator>,
    storage: Arc<Mutex<SqliteStorage>>,
    probe_delay: Duration,
    max_handle_candidates: usize,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        providers: Vec<Arc<dyn SourceProvider>>,
        competitor_source: Arc<dyn SourceProvider>,
        site_scraper: Arc<dyn SiteScraper>,
        social_prober: Arc<dyn SocialProber>,
        web_searcher: Arc<dyn WebSearcher>,
        pitch_generator: Arc<dyn PitchGenerator>,
        storage: Arc<Mutex<SqliteStorage>>,
        probe_delay: Duration,
        max_handle_candidates: usize,
    ) -> Self {
        Self {
            providers,
            competitor_source,
            site_scraper,
            social_prober,
            web_searcher,
            pitch_generator,
            storage,
            probe_delay,
            max_handle_candidates,
        }
    }

    /// Discovers, enriches, scores and persists leads for one query. A failed
    /// enrichment step degrades that candidate's findings; only persistence
    /// errors abort the batch.
    pub async fn run(&self, query: &QueryConfig) -> Result<Vec<Lead>, StorageError> {
        info!(
            "running query: '{}' in {} (limit {})",
            query.business_type, query.city, query.limit
        );
        let candidates = self.discover(query).await;
        info!("discovery produced {} candidates", candidates.len());

        let mut leads = Vec::new();
        for candidate in candidates {
            if candidate.name.trim().is_empty() {
                warn!("dropping unnamed candidate from {}", candidate.source_tag);
                continue;
            }
            info!("processing: {}", candidate.name);
            let mut lead = self.enrich(&candidate, query).await;
            let (id, created) = self.storage.lock().await.upsert(&lead)?;
            lead.id = Some(id);
            info!(
                "{} lead {} | {}",
                if created { "created" } else { "updated" },
                id,
                lead.name
            );
            leads.push(lead);
        }
        Ok(leads)
    }

    /// Queries providers in ranked order until `limit` is reached, deduping on
    /// (lowercased name, lat, lng). A failing provider is skipped for the rest
    /// of the run; a disabled one silently.
    async fn discover(&self, query: &QueryConfig) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        let mut seen: HashSet<(String, u64, u64)> = HashSet::new();

        for provider in &self.providers {
            if out.len() >= query.limit {
                break;
            }
            if !provider.is_enabled() {
                debug!("provider {} disabled, skipping", provider.name());
                continue;
            }
            let request = DiscoveryQuery {
                business_type: query.business_type.clone(),
                city: query.city.clone(),
                radius_km: query.radius_km,
                limit: query.limit - out.len(),
            };
            match provider.search(&request).await {
                Ok(found) => {
                    info!("{} returned {} candidates", provider.name(), found.len());
                    for candidate in found {
                        let key = (
                            candidate.name.trim().to_lowercase(),
                            candidate.lat.to_bits(),
                            candidate.lng.to_bits(),
                        );
                        if seen.insert(key) {
                            out.push(candidate);
                            if out.len() >= query.limit {
                                break;
                            }
                        }
                    }
                }
                Err(ProviderError::Unavailable) => {
                    debug!("provider {} unavailable", provider.name());
                }
                Err(e) => {
                    warn!("provider {} failed, skipping for this run: {}", provider.name(), e);
                }
            }
        }
        out
    }

    /// Builds a finalized (unpersisted) lead from one candidate.
    async fn enrich(&self, candidate: &Candidate, query: &QueryConfig) -> Lead {
        let mut findings = Findings::default();
        let mut links = SocialLinks::default();
        let mut website = candidate.website.clone();
        let mut phone = candidate.phone.clone();
        let mut email = None;

        // No known website: try a generic web search for the site and any
        // public profiles.
        if website.is_none() {
            info!("no website for '{}', trying web search", candidate.name);
            let search_query = format!("{} {}", candidate.name, query.city);
            match self
                .web_searcher
                .search(&search_query, WEB_SEARCH_RESULTS)
                .await
            {
                Ok(urls) => {
                    let buckets = classify_profile_urls(&urls);
                    website = buckets.website_candidates.first().cloned();
                    if let Some(url) = &website {
                        info!("website candidate from search: {}", url);
                    }
                    links.facebook.extend(buckets.facebook);
                    links.instagram.extend(buckets.instagram);
                    links.twitter.extend(buckets.twitter);
                    links.linkedin.extend(buckets.linkedin);
                }
                Err(e) => warn!("web search failed for '{}': {}", candidate.name, e),
            }
        }

        if let Some(url) = &website {
            match self.site_scraper.scrape(url).await {
                Ok(report) => {
                    findings.site_health = Some(report.health);
                    links.facebook.extend(report.social_links.facebook);
                    links.instagram.extend(report.social_links.instagram);
                    links.twitter.extend(report.social_links.twitter);
                    links.linkedin.extend(report.social_links.linkedin);
                    links.youtube.extend(report.social_links.youtube);
                    if email.is_none() {
                        email = report.emails.first().cloned();
                    }
                    if phone.is_none() {
                        phone = report.phones.first().cloned();
                    }
                }
                Err(e) => warn!("site scrape failed for {}: {}", url, e),
            }
        }

        self.gather_social(&candidate.name, &links, &mut findings.social)
            .await;

        // Last-ditch email source: the Facebook about text.
        if email.is_none() {
            email = findings
                .social
                .facebook
                .as_ref()
                .and_then(|fb| fb.about.as_deref())
                .and_then(site::find_email);
        }

        findings.competitor = self.count_competitors(&candidate.name).await;
        let score = scoring::score(&findings);
        info!(
            "scored '{}': {:.1} ({:?})",
            candidate.name, score.opportunity_score, score.grade
        );

        let instagram = findings
            .social
            .instagram
            .as_ref()
            .map(|ig| ig.username.clone())
            .or_else(|| links.instagram.first().cloned());
        let linkedin = links.linkedin.first().cloned();
        let grade = score.grade;

        let mut lead = Lead {
            id: None,
            name: candidate.name.clone(),
            address: candidate.address.clone(),
            lat: Some(candidate.lat),
            lng: Some(candidate.lng),
            phone,
            email,
            website,
            instagram,
            linkedin,
            city: query.city.clone(),
            business_type: query.business_type.clone(),
            source: candidate.source_tag.clone(),
            meta: LeadMeta {
                findings,
                score: Some(score),
                pitch: None,
                contacted: false,
                contact_history: Vec::new(),
                last_contacted: None,
            },
        };

        if matches!(grade, Grade::Medium | Grade::High) {
            lead.meta.pitch = self.generate_pitch(&lead, &query.language).await;
        }
        lead
    }

    /// Pitch plus compliance pass. The missing opt-out sentence is the only
    /// issue repaired automatically; everything else is reported and left.
    async fn generate_pitch(&self, lead: &Lead, language: &str) -> Option<String> {
        match self
            .pitch_generator
            .generate(lead, &lead.meta.findings, language)
            .await
        {
            Ok(text) => {
                let report = check_compliance(&text);
                let mut final_text = text;
                if !report.ok {
                    warn!("compliance issues for '{}': {:?}", lead.name, report.issues);
                    if report.issues.iter().any(|i| i == MISSING_OPT_OUT) {
                        final_text.push_str(OPT_OUT_SENTENCE);
                    }
                }
                Some(final_text)
            }
            Err(e) => {
                warn!("pitch generation failed for '{}': {}", lead.name, e);
                None
            }
        }
    }

    /// Probes known profile links first; guesses handles from the name only
    /// when no link of any kind was found.
    async fn gather_social(&self, name: &str, links: &SocialLinks, social: &mut SocialFindings) {
        if let Some(handle) = links.instagram.first().and_then(|u| handle_from_url(u)) {
            match self.social_prober.probe_instagram(&handle).await {
                Ok(metrics) => social.instagram = Some(metrics),
                Err(e) => warn!("instagram lookup '{}' failed: {}", handle, e),
            }
        }
        if let Some(handle) = links.facebook.first().and_then(|u| handle_from_url(u)) {
            match self.social_prober.probe_facebook(&handle).await {
                Ok(metrics) => social.facebook = Some(metrics),
                Err(e) => warn!("facebook lookup '{}' failed: {}", handle, e),
            }
        }
        if let Some(handle) = links.twitter.first().and_then(|u| handle_from_url(u)) {
            match self.social_prober.probe_twitter(&handle).await {
                Ok(metrics) => social.twitter = Some(metrics),
                Err(e) => warn!("twitter lookup '{}' failed: {}", handle, e),
            }
        }

        if links.is_empty() && social.platforms_found() == 0 {
            self.probe_guessed_handles(name, social).await;
        }
    }

    /// Tries guessed handles per platform, first valid profile wins. Stops
    /// once two platforms have profiles or candidates run out; sleeps briefly
    /// after each failed probe. False positives are an accepted risk.
    async fn probe_guessed_handles(&self, name: &str, social: &mut SocialFindings) {
        let candidates = guess_handles(name, self.max_handle_candidates);
        info!("trying {} guessed handles for '{}'", candidates.len(), name);

        'handles: for handle in &candidates {
            if social.platforms_found() >= 2 {
                break;
            }
            if social.instagram.is_none() {
                match self.social_prober.probe_instagram(handle).await {
                    Ok(metrics) => {
                        info!("found instagram profile: {}", handle);
                        social.instagram = Some(metrics);
                    }
                    Err(e) => {
                        debug!("instagram probe '{}': {}", handle, e);
                        tokio::time::sleep(self.probe_delay).await;
                    }
                }
            }
            if social.platforms_found() >= 2 {
                break 'handles;
            }
            if social.facebook.is_none() {
                match self.social_prober.probe_facebook(handle).await {
                    Ok(metrics) => {
                        info!("found facebook page: {}", handle);
                        social.facebook = Some(metrics);
                    }
                    Err(e) => {
                        debug!("facebook probe '{}': {}", handle, e);
                        tokio::time::sleep(self.probe_delay).await;
                    }
                }
            }
            if social.platforms_found() >= 2 {
                break 'handles;
            }
            if social.twitter.is_none() {
                match self.social_prober.probe_twitter(handle).await {
                    Ok(metrics) => {
                        info!("found twitter profile: {}", handle);
                        social.twitter = Some(metrics);
                    }
                    Err(e) => {
                        debug!("twitter probe '{}': {}", handle, e);
                        tokio::time::sleep(self.probe_delay).await;
                    }
                }
            }
        }
    }

    /// Rough competitor density: search the candidate's leading name token
    /// nearby and count hits. Degrades to zero on failure.
    async fn count_competitors(&self, name: &str) -> CompetitorInfo {
        let first_token = name.split_whitespace().next().unwrap_or("");
        if first_token.is_empty() {
            return CompetitorInfo::default();
        }
        let request = DiscoveryQuery {
            business_type: first_token.to_string(),
            city: String::new(),
            radius_km: 2.0,
            limit: COMPETITOR_LIMIT,
        };
        match self.competitor_source.search(&request).await {
            Ok(found) => CompetitorInfo {
                competitor_count: found.len() as u32,
                sample: found
                    .iter()
                    .take(COMPETITOR_SAMPLE)
                    .map(|c| c.name.clone())
                    .collect(),
            },
            Err(e) => {
                warn!("competitor lookup for '{}' failed: {}", name, e);
                CompetitorInfo::default()
            }
        }
    }
}
