// Name-based social handle guessing
use std::collections::HashSet;

const MIN_HANDLE_LEN: usize = 2;
const MAX_HANDLE_LEN: usize = 30;

/// Derives a bounded, deduplicated list of plausible social handles from a
/// business name. Purely deterministic; matching an unrelated account is an
/// accepted risk of the heuristic, not an error.
///
/// Variants: all tokens joined with "", "_" and "."; first+last token (with
/// and without "_"); each token alone; the bare concatenation with vowels
/// removed. Results are filtered to 2..=30 chars and truncated to
/// `max_candidates`.
pub fn guess_handles(business_name: &str, max_candidates: usize) -> Vec<String> {
    let cleaned = clean_name(business_name);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |candidate: String, out: &mut Vec<String>| {
        let len = candidate.chars().count();
        if (MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&len) && seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    };

    let joined = tokens.join("");
    push(joined.clone(), &mut out);
    push(tokens.join("_"), &mut out);
    push(tokens.join("."), &mut out);

    if tokens.len() >= 2 {
        let first = tokens[0];
        let last = tokens[tokens.len() - 1];
        push(format!("{}{}", first, last), &mut out);
        push(format!("{}_{}", first, last), &mut out);
    }

    for token in &tokens {
        push(token.to_string(), &mut out);
    }

    push(remove_vowels(&joined), &mut out);

    out.truncate(max_candidates);
    out
}

/// Lower-cases, folds common accented Latin letters to ASCII and strips
/// punctuation, keeping word characters and spaces.
fn clean_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(fold_accent)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

fn remove_vowels(s: &str) -> String {
    s.chars().filter(|c| !"aeiou".contains(*c)).collect()
}
