use std::collections::HashSet;

use crate::Trend;

const KEY_LEN: usize = 30;

/// Cheap fuzzy key: lowercase ASCII letters and digits only, first 30 of them.
pub fn dedupe_key(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .take(KEY_LEN)
        .collect()
}

/// Keeps the first trend for every key, preserving input order.
pub fn dedupe(trends: Vec<Trend>) -> Vec<Trend> {
    dedupe_by(trends, |trend| trend.title.as_str())
}

/// [`dedupe`] over any item that carries a title.
pub fn dedupe_by<T>(items: Vec<T>, title: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(dedupe_key(title(item))))
        .collect()
}
