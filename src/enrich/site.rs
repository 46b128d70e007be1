// Website health check + contact/social extraction
use crate::enrich::SiteScraper;
use crate::model::{EnrichError, SiteHealth, SiteReport, SocialLinks};
use crate::utils::retry;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").unwrap()
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,4}[\s-]?)?\d{2,4}[\s-]?\d{3,4}[\s-]?\d{3,4}").unwrap()
});

const HEALTH_POINTS_PER_ISSUE: f64 = 20.0;

pub struct HttpSiteScraper {
    client: Client,
}

impl HttpSiteScraper {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SiteScraper for HttpSiteScraper {
    async fn scrape(&self, url: &str) -> Result<SiteReport, EnrichError> {
        let (status, body) = retry(2, Duration::from_millis(500), || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| EnrichError::Transient(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| EnrichError::Transient(e.to_string()))?;
            Ok::<_, EnrichError>((status, body))
        })
        .await?;

        Ok(analyze_page(url, status, &body))
    }
}

/// Builds the full report from one fetched page. Split out of the trait impl
/// so the signal extraction is testable without a server.
pub fn analyze_page(url: &str, status: u16, body: &str) -> SiteReport {
    let document = Html::parse_document(body);
    let anchor_sel = Selector::parse("a[href]").expect("static selector");
    let title_sel = Selector::parse("title").expect("static selector");
    let desc_sel = Selector::parse(r#"meta[name="description"]"#).expect("static selector");

    let title = document
        .select(&title_sel)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let meta_description = document
        .select(&desc_sel)
        .next()
        .and_then(|m| m.value().attr("content"))
        .unwrap_or_default()
        .to_string();

    let mut has_contact = false;
    let mut social_links = SocialLinks::default();
    let mut emails: BTreeSet<String> = EMAIL_RE
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .collect();
    let mut phones: BTreeSet<String> = BTreeSet::new();

    for m in PHONE_RE.find_iter(body) {
        let normal: String = m
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if (6..=15).contains(&normal.len()) {
            phones.insert(normal);
        }
    }

    for a in document.select(&anchor_sel) {
        let href = a.value().attr("href").unwrap_or("").trim();
        let lower = href.to_lowercase();
        if lower.contains("contact") || lower.contains("book") || lower.contains("appointment") {
            has_contact = true;
        }
        if let Some(mail) = lower.strip_prefix("mailto:") {
            let mail = mail.split('?').next().unwrap_or("");
            if !mail.is_empty() {
                emails.insert(mail.to_string());
            }
        }
        if let Some(tel) = lower.strip_prefix("tel:") {
            let normal: String = tel
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '+')
                .collect();
            if (6..=15).contains(&normal.len()) {
                phones.insert(normal);
            }
        }
        collect_social_link(&mut social_links, href);
    }

    let reachable = (200..400).contains(&status);
    let ssl = url.starts_with("https");
    let mut issues = Vec::new();
    if !reachable {
        issues.push(format!("HTTP status {}", status));
    }
    if title.is_empty() {
        issues.push("No title".to_string());
    }
    if !has_contact {
        issues.push("No obvious contact/book CTA".to_string());
    }
    if !ssl {
        issues.push("No HTTPS".to_string());
    }
    let score = (100.0 - HEALTH_POINTS_PER_ISSUE * issues.len() as f64).max(0.0);

    SiteReport {
        health: SiteHealth {
            reachable,
            status_code: Some(status),
            title,
            has_contact,
            ssl,
            issues,
            score,
        },
        social_links,
        emails: emails.into_iter().collect(),
        phones: phones.into_iter().collect(),
        meta_description,
    }
}

/// First email address appearing in free text, if any.
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

fn collect_social_link(links: &mut SocialLinks, href: &str) {
    let lower = href.to_lowercase();
    let clean = || href.split('?').next().unwrap_or(href).to_string();
    if lower.contains("facebook.com") && !lower.contains("profile.php") {
        push_unique(&mut links.facebook, clean());
    } else if lower.contains("instagram.com") && !lower.contains("/p/") {
        push_unique(&mut links.instagram, clean());
    } else if lower.contains("twitter.com") || lower.contains("x.com") {
        push_unique(&mut links.twitter, clean());
    } else if lower.contains("linkedin.com") {
        push_unique(&mut links.linkedin, clean());
    } else if lower.contains("youtube.com") || lower.contains("youtu.be") {
        push_unique(&mut links.youtube, clean());
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
