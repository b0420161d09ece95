use std::collections::HashMap;

use dashmap::{DashMap, mapref::entry::Entry};

/// URLs claimed during one crawl, with how often each was reached.
///
/// Only the first [`VisitedUrls::claim`] for a URL wins; later ones just bump
/// the visit count, which is kept for diagnostics.
#[derive(Debug, Default)]
pub struct VisitedUrls {
    visits: DashMap<String, u64>,
}

impl VisitedUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the caller is the first to claim `url`.
    pub fn claim(&self, url: &str) -> bool {
        // the entry holds the shard lock, so test and set happen together
        match self.visits.entry(url.to_string()) {
            Entry::Occupied(mut seen) => {
                *seen.get_mut() += 1;
                false
            }
            Entry::Vacant(unseen) => {
                unseen.insert(1);
                true
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.visits.contains_key(url)
    }

    /// Number of distinct URLs claimed.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Claim attempts that lost because the URL was already taken.
    pub fn revisits(&self) -> u64 {
        self.visits.iter().map(|visit| *visit.value() - 1).sum()
    }
}

/// Running word totals across every page that was actually parsed.
#[derive(Debug, Default)]
pub struct WordCounts {
    counts: DashMap<String, u64>,
}

impl WordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one page's counts to the totals. Merges commute, so the final
    /// totals do not depend on which page finishes first.
    pub fn merge(&self, page: HashMap<String, u64>) {
        for (word, count) in page {
            self.counts
                .entry(word)
                .and_modify(|total| *total += count)
                .or_insert(count);
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.counts.get(word).map(|count| *count)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// The `limit` most popular words, see [`rank`].
    pub fn popular(&self, limit: usize) -> Vec<(String, u64)> {
        rank(self.snapshot(), limit)
    }
}

/// Orders words by count (highest first), then by length (longest first),
/// then alphabetically, and keeps the first `limit`.
pub fn rank<I>(counts: I, limit: usize) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = (String, u64)>,
{
    if limit == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_unstable_by(|(a_word, a_count), (b_word, b_count)| {
        b_count
            .cmp(a_count)
            .then_with(|| b_word.chars().count().cmp(&a_word.chars().count()))
            .then_with(|| a_word.cmp(b_word))
    });
    ranked.truncate(limit);
    ranked
}
