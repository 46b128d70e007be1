// Lead matching and merge policy (dedup/upsert rules)
use crate::model::Lead;

/// Picks the stored lead a fresh lead should merge into, if any.
///
/// Among exact (trimmed) name matches, the first whose stored address contains
/// the fresh address's text before its first comma wins (case-insensitive
/// substring). If no address agrees but name matches exist, the first name
/// match wins. Matching is fuzzy on purpose; uniqueness is enforced here, not
/// by the schema.
pub fn find_match(stored: &[Lead], name: &str, address: &str) -> Option<usize> {
    let name = name.trim();
    let prefix = address
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let name_matches: Vec<usize> = stored
        .iter()
        .enumerate()
        .filter(|(_, lead)| lead.name.trim() == name)
        .map(|(i, _)| i)
        .collect();

    if !prefix.is_empty() {
        for &i in &name_matches {
            let stored_addr = stored[i].address.to_lowercase();
            if !stored_addr.is_empty() && stored_addr.contains(&prefix) {
                return Some(i);
            }
        }
    }
    name_matches.first().copied()
}

/// Merges a fresh run's lead into a stored one.
///
/// Scalar contact fields are filled only when the stored value is empty;
/// existing data is never clobbered. Computed meta (findings, score, pitch)
/// always takes the fresh value. Contact history, the contacted flag and
/// last_contacted stay untouched; only `mark_contacted` mutates those.
pub fn merge(existing: &mut Lead, fresh: &Lead) {
    fill_option(&mut existing.phone, &fresh.phone);
    fill_option(&mut existing.email, &fresh.email);
    fill_option(&mut existing.website, &fresh.website);
    fill_option(&mut existing.instagram, &fresh.instagram);
    fill_option(&mut existing.linkedin, &fresh.linkedin);
    if existing.lat.is_none() {
        existing.lat = fresh.lat;
    }
    if existing.lng.is_none() {
        existing.lng = fresh.lng;
    }
    fill_string(&mut existing.address, &fresh.address);
    fill_string(&mut existing.city, &fresh.city);
    fill_string(&mut existing.business_type, &fresh.business_type);
    fill_string(&mut existing.source, &fresh.source);

    existing.meta.findings = fresh.meta.findings.clone();
    existing.meta.score = fresh.meta.score.clone();
    existing.meta.pitch = fresh.meta.pitch.clone();
}

fn fill_option(existing: &mut Option<String>, fresh: &Option<String>) {
    let empty = existing.as_deref().map(str::trim).unwrap_or("").is_empty();
    if empty {
        if let Some(v) = fresh {
            if !v.trim().is_empty() {
                *existing = Some(v.clone());
            }
        }
    }
}

fn fill_string(existing: &mut String, fresh: &str) {
    if existing.trim().is_empty() && !fresh.trim().is_empty() {
        *existing = fresh.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContactEvent, Grade, LeadMeta, Score};
    use chrono::Utc;

    fn lead(name: &str, address: &str) -> Lead {
        Lead {
            id: None,
            name: name.to_string(),
            address: address.to_string(),
            lat: None,
            lng: None,
            phone: None,
            email: None,
            website: None,
            instagram: None,
            linkedin: None,
            city: String::new(),
            business_type: String::new(),
            source: "test".to_string(),
            meta: LeadMeta::default(),
        }
    }

    #[test]
    fn prefers_address_match_over_first_name_match() {
        let stored = vec![
            lead("Blue Cafe", "12 Other Road, Rajkot"),
            lead("Blue Cafe", "45 Main Street, Ahmedabad"),
        ];
        let idx = find_match(&stored, "Blue Cafe", "45 Main Street, near the park");
        assert_eq!(idx, Some(1));
    }

    #[test]
    fn falls_back_to_first_name_match() {
        let stored = vec![
            lead("Blue Cafe", "12 Other Road, Rajkot"),
            lead("Blue Cafe", "45 Main Street, Ahmedabad"),
        ];
        let idx = find_match(&stored, "Blue Cafe", "99 Nowhere Lane");
        assert_eq!(idx, Some(0));
    }

    #[test]
    fn no_match_on_different_name() {
        let stored = vec![lead("Blue Cafe", "45 Main Street")];
        assert_eq!(find_match(&stored, "Red Cafe", "45 Main Street"), None);
    }

    #[test]
    fn name_comparison_trims_whitespace() {
        let stored = vec![lead("Blue Cafe ", "45 Main Street")];
        assert_eq!(find_match(&stored, " Blue Cafe", "45 Main Street"), Some(0));
    }

    #[test]
    fn merge_never_clobbers_existing_contact_fields() {
        let mut existing = lead("Blue Cafe", "45 Main Street");
        existing.phone = Some("123456".to_string());
        let mut fresh = lead("Blue Cafe", "45 Main Street");
        fresh.phone = Some("999999".to_string());
        fresh.email = Some("hi@bluecafe.example".to_string());

        merge(&mut existing, &fresh);
        assert_eq!(existing.phone.as_deref(), Some("123456"));
        assert_eq!(existing.email.as_deref(), Some("hi@bluecafe.example"));
    }

    #[test]
    fn merge_fills_blank_over_whitespace() {
        let mut existing = lead("Blue Cafe", "45 Main Street");
        existing.website = Some("   ".to_string());
        let mut fresh = lead("Blue Cafe", "45 Main Street");
        fresh.website = Some("https://bluecafe.example".to_string());

        merge(&mut existing, &fresh);
        assert_eq!(existing.website.as_deref(), Some("https://bluecafe.example"));
    }

    #[test]
    fn merge_replaces_computed_meta_but_keeps_history() {
        let mut existing = lead("Blue Cafe", "45 Main Street");
        existing.meta.contacted = true;
        existing.meta.contact_history.push(ContactEvent {
            timestamp: Utc::now(),
            method: "email".to_string(),
            email: None,
            note: None,
        });
        existing.meta.score = Some(Score {
            opportunity_score: 10.0,
            grade: Grade::Low,
        });

        let mut fresh = lead("Blue Cafe", "45 Main Street");
        fresh.meta.score = Some(Score {
            opportunity_score: 90.0,
            grade: Grade::High,
        });
        fresh.meta.pitch = Some("hello".to_string());

        merge(&mut existing, &fresh);
        assert!((existing.meta.score.as_ref().unwrap().opportunity_score - 90.0).abs() < 1e-9);
        assert_eq!(existing.meta.pitch.as_deref(), Some("hello"));
        assert!(existing.meta.contacted);
        assert_eq!(existing.meta.contact_history.len(), 1);
    }
}
