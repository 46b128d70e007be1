// Opportunity scoring: pure, no I/O
use crate::model::{Findings, Grade, Score};

const FB_FOLLOWER_DIVISOR: f64 = 10.0;
const FB_CAP: f64 = 50.0;
const IG_FOLLOWER_DIVISOR: f64 = 20.0;
const IG_CAP: f64 = 30.0;
const TW_LIKES_DIVISOR: f64 = 2.0;
const TW_CAP: f64 = 20.0;

/// Maps aggregated findings to an opportunity score and grade. A weak site,
/// thin social presence and few nearby competitors all push the score up.
pub fn score(findings: &Findings) -> Score {
    let site_score = findings
        .site_health
        .as_ref()
        .map(|h| h.score)
        .unwrap_or(0.0);
    let social_score = social_score(findings);
    let competitor_count = findings.competitor.competitor_count as f64;

    let raw = 100.0 - (site_score * 0.6 + social_score * 0.7)
        + (10.0 - competitor_count).max(0.0) * 5.0;
    let opportunity_score = raw.clamp(0.0, 100.0);

    let grade = if opportunity_score > 70.0 {
        Grade::High
    } else if opportunity_score > 40.0 {
        Grade::Medium
    } else {
        Grade::Low
    };

    Score {
        opportunity_score,
        grade,
    }
}

/// Sum of capped per-platform contributions; absent platforms contribute 0.
fn social_score(findings: &Findings) -> f64 {
    let mut total = 0.0;
    if let Some(fb) = &findings.social.facebook {
        if let Some(followers) = fb.followers {
            total += (followers as f64 / FB_FOLLOWER_DIVISOR).min(FB_CAP);
        }
    }
    if let Some(ig) = &findings.social.instagram {
        total += (ig.followers as f64 / IG_FOLLOWER_DIVISOR).min(IG_CAP);
    }
    if let Some(tw) = &findings.social.twitter {
        total += (tw.avg_likes / TW_LIKES_DIVISOR).min(TW_CAP);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CompetitorInfo, FacebookMetrics, InstagramMetrics, SiteHealth, SocialFindings,
        TwitterMetrics,
    };

    fn findings_with(site_score: Option<f64>, competitor_count: u32) -> Findings {
        Findings {
            site_health: site_score.map(|score| SiteHealth {
                score,
                ..Default::default()
            }),
            social: SocialFindings::default(),
            competitor: CompetitorInfo {
                competitor_count,
                sample: Vec::new(),
            },
        }
    }

    #[test]
    fn empty_findings_score_maximum() {
        // site 0, social 0, no competitors: 100 - 0 + 50 clamps to 100.
        let s = score(&Findings::default());
        assert!((s.opportunity_score - 100.0).abs() < 1e-9);
        assert_eq!(s.grade, Grade::High);
    }

    #[test]
    fn saturated_presence_scores_minimum() {
        let mut f = findings_with(Some(100.0), 20);
        f.social.facebook = Some(FacebookMetrics {
            followers: Some(10_000),
            ..Default::default()
        });
        f.social.instagram = Some(InstagramMetrics {
            followers: 10_000,
            ..Default::default()
        });
        f.social.twitter = Some(TwitterMetrics {
            avg_likes: 1_000.0,
            ..Default::default()
        });
        // site 100, social 100 (50+30+20 capped), 20 competitors:
        // 100 - (60 + 70) + 0 = -30, clamps to 0.
        let s = score(&f);
        assert!((s.opportunity_score - 0.0).abs() < 1e-9);
        assert_eq!(s.grade, Grade::Low);
    }

    #[test]
    fn end_to_end_formula_vector() {
        // site_score 60 (two issues), no social, 3 competitors:
        // 100 - 36 + 35 = 99, grade HIGH.
        let f = findings_with(Some(60.0), 3);
        let s = score(&f);
        assert!((s.opportunity_score - 99.0).abs() < 1e-9);
        assert_eq!(s.grade, Grade::High);
    }

    #[test]
    fn grade_thresholds() {
        // site 100, no social, 1 competitor: 100 - 60 + 45 = 85 -> HIGH.
        assert_eq!(score(&findings_with(Some(100.0), 1)).grade, Grade::High);
        // site 100, no social, 5 competitors: 100 - 60 + 25 = 65 -> MEDIUM.
        assert_eq!(score(&findings_with(Some(100.0), 5)).grade, Grade::Medium);
        // site 100, no social, 10 competitors: 100 - 60 + 0 = 40 -> LOW (> 40 is strict).
        assert_eq!(score(&findings_with(Some(100.0), 10)).grade, Grade::Low);
    }

    #[test]
    fn social_contributions_are_capped() {
        let mut f = Findings::default();
        f.social.facebook = Some(FacebookMetrics {
            followers: Some(1_000_000),
            ..Default::default()
        });
        assert!((social_score(&f) - 50.0).abs() < 1e-9);

        f.social.instagram = Some(InstagramMetrics {
            followers: 100,
            ..Default::default()
        });
        // 50 + 100/20 = 55
        assert!((social_score(&f) - 55.0).abs() < 1e-9);
    }

    #[test]
    fn score_always_in_bounds() {
        for comp in [0u32, 3, 10, 50] {
            for site in [None, Some(0.0), Some(40.0), Some(100.0)] {
                let s = score(&findings_with(site, comp));
                assert!((0.0..=100.0).contains(&s.opportunity_score));
            }
        }
    }
}
