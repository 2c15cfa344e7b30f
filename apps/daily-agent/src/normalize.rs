use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One possible article subject with a relative strength score (0-100).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub term: String,
    pub score: f64,
}

/// Generic/ambiguous words that make poor article subjects.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "とは", "とは？", "いつ", "どこ", "なに", "何", "ニュース", "まとめ", "意味", "英語",
    "twitter", "x", "画像", "動画", "公式", "wiki", "価格", "値段",
];

pub fn default_stopwords() -> HashSet<String> {
    DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect()
}

/// Emoji and decorative symbol blocks stripped from raw queries.
fn is_decorative(c: char) -> bool {
    matches!(
        c,
        '\u{1F300}'..='\u{1F5FF}'
            | '\u{1F600}'..='\u{1F64F}'
            | '\u{1F680}'..='\u{1F6FF}'
            | '\u{1F700}'..='\u{1F77F}'
            | '\u{1F780}'..='\u{1F7FF}'
            | '\u{1F800}'..='\u{1F8FF}'
            | '\u{1F900}'..='\u{1F9FF}'
            | '\u{1FA00}'..='\u{1FA6F}'
            | '\u{1FA70}'..='\u{1FAFF}'
            | '\u{2700}'..='\u{27BF}'
    )
}

/// Strip decorative glyphs, trim, and collapse whitespace runs to one space.
/// Idempotent; never fails on malformed input.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !is_decorative(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reject terms that are too short (in characters, the terms are Japanese)
/// or match a stopword case-insensitively.
pub fn is_valid(term: &str, min_len: usize, stopwords: &HashSet<String>) -> bool {
    if term.chars().count() < min_len {
        return false;
    }
    !stopwords.contains(&term.to_lowercase())
}

/// Distinct terms ordered by descending occurrence frequency;
/// ties keep first-seen order (stable sort on frequency only).
pub fn dedup_rank(terms: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for term in terms {
        let count = counts.entry(term.as_str()).or_insert(0);
        if *count == 0 {
            order.push(term.as_str());
        }
        *count += 1;
    }

    order.sort_by_key(|t| std::cmp::Reverse(counts[t]));
    order.into_iter().map(|t| t.to_string()).collect()
}

/// Group raw rows by exact term, keeping the maximum observed score per term
/// and first-seen order among distinct terms; result capped at `max`.
pub fn merge_candidates(rows: &[(String, f64)], max: usize) -> Vec<Candidate> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (term, score) in rows {
        match best.get_mut(term.as_str()) {
            Some(existing) => {
                if *score > *existing {
                    *existing = *score;
                }
            }
            None => {
                best.insert(term.as_str(), *score);
                order.push(term.as_str());
            }
        }
    }

    order
        .into_iter()
        .take(max)
        .map(|term| Candidate {
            term: term.to_string(),
            score: best[term],
        })
        .collect()
}
