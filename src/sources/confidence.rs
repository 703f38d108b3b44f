use std::collections::HashSet;

use crate::nutrition::{name_words, normalize_name};

/// Per-source constants for the shared match-confidence heuristic.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceProfile {
    pub exact: f64,
    pub query_in_label: f64,
    pub label_in_query: f64,
    pub overlap_floor: f64,
    pub overlap_ceiling: f64,
}

pub const MAX_CATEGORY_BONUS: f64 = 0.1;

/// Scores how well `label` answers `query`, plus a data-category bonus.
pub fn match_confidence(query: &str, label: &str, profile: &ConfidenceProfile, bonus: f64) -> f64 {
    let q = normalize_name(query);
    let l = normalize_name(label);
    if q.is_empty() || l.is_empty() {
        return 0.0;
    }

    let base = if q == l {
        profile.exact
    } else if l.contains(&q) {
        profile.query_in_label
    } else if q.contains(&l) {
        profile.label_in_query
    } else {
        let ratio = word_overlap(&q, &l);
        if ratio == 0.0 {
            return 0.0;
        }
        profile.overlap_floor + ratio * (profile.overlap_ceiling - profile.overlap_floor)
    };

    (base + bonus.clamp(0.0, MAX_CATEGORY_BONUS)).min(1.0)
}

/// Share of query words present in the label.
pub fn word_overlap(query: &str, label: &str) -> f64 {
    let q: HashSet<String> = name_words(query).into_iter().collect();
    if q.is_empty() {
        return 0.0;
    }
    let l: HashSet<String> = name_words(label).into_iter().collect();
    q.intersection(&l).count() as f64 / q.len() as f64
}
