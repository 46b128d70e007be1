// Outreach text compliance checks
const SPAM_KEYWORDS: [&str; 5] = [
    "make money fast",
    "guaranteed",
    "earn cash",
    "click here",
    "free trial",
];

const MAX_PITCH_LEN: usize = 1200;

/// Issue string for a pitch without an unsubscribe/opt-out sentence. This is
/// the only issue the pipeline repairs automatically.
pub const MISSING_OPT_OUT: &str = "Missing unsubscribe/opt-out sentence";

/// Canned sentence appended when the opt-out clause is missing.
pub const OPT_OUT_SENTENCE: &str = "\n\nTo opt out, reply 'unsubscribe'.";

#[derive(Debug, Clone)]
pub struct ComplianceReport {
    pub ok: bool,
    pub issues: Vec<String>,
}

/// Checks a pitch for spam keywords, a missing opt-out sentence and excessive
/// length. Pure; reports, never rewrites.
pub fn check_compliance(pitch_text: &str) -> ComplianceReport {
    let lower = pitch_text.to_lowercase();
    let mut issues = Vec::new();

    for kw in SPAM_KEYWORDS {
        if lower.contains(kw) {
            issues.push(format!("Contains spam keyword: {}", kw));
        }
    }
    if !lower.contains("unsubscribe") && !lower.contains("opt-out") {
        issues.push(MISSING_OPT_OUT.to_string());
    }
    if pitch_text.len() > MAX_PITCH_LEN {
        issues.push("Pitch too long".to_string());
    }

    ComplianceReport {
        ok: issues.is_empty(),
        issues,
    }
}
