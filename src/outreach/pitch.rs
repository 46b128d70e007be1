// Pitch generation collaborator
use crate::model::{EnrichError, Findings, Lead};
use tracing::warn;

const LOW_FOLLOWER_THRESHOLD: u64 = 200;

/// Produces outreach text for a scored lead. The production implementation may
/// call an external model; the pipeline only relies on this interface.
#[async_trait::async_trait]
pub trait PitchGenerator: Send + Sync {
    async fn generate(
        &self,
        lead: &Lead,
        findings: &Findings,
        language: &str,
    ) -> Result<String, EnrichError>;
}

/// Deterministic template pitch built from the observed issues. Languages
/// other than English fall back to English; translation is an external
/// concern.
pub struct TemplatePitchGenerator;

impl TemplatePitchGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Observations worth mentioning: site issues, a stale Instagram, a thin
    /// Facebook following.
    fn observations(findings: &Findings) -> Vec<String> {
        let mut issues = Vec::new();
        if let Some(health) = &findings.site_health {
            issues.extend(health.issues.iter().cloned());
        }
        if let Some(ig) = &findings.social.instagram {
            if let Some(last_post) = ig.last_post {
                issues.push(format!("Instagram last post: {}", last_post.to_rfc3339()));
            }
        }
        if let Some(fb) = &findings.social.facebook {
            if let Some(followers) = fb.followers {
                if followers < LOW_FOLLOWER_THRESHOLD {
                    issues.push(format!("Low Facebook followers: {}", followers));
                }
            }
        }
        issues
    }
}

#[async_trait::async_trait]
impl PitchGenerator for TemplatePitchGenerator {
    async fn generate(
        &self,
        lead: &Lead,
        findings: &Findings,
        language: &str,
    ) -> Result<String, EnrichError> {
        if !language.eq_ignore_ascii_case("en") {
            warn!(
                "pitch language '{}' not supported, falling back to English",
                language
            );
        }

        let issues = Self::observations(findings);
        let observed = if issues.is_empty() {
            "your online presence could reach more local customers".to_string()
        } else {
            format!("we noticed: {}", issues.join("; "))
        };

        Ok(format!(
            "Hi {name},\n\n\
             We took a look at {name}'s web presence and {observed}.\n\
             We help local businesses grow their visibility across search and \
             social with a few focused improvements.\n\n\
             Reply to this email and we'll send over a short, free assessment.\n\n\
             Regards,\nThe Leadscout team",
            name = lead.name,
            observed = observed
        ))
    }
}
