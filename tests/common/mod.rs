//! In-memory link graph used in place of real HTTP fetching.

use std::{collections::HashMap, sync::Arc, time::Duration};

use dashmap::DashMap;
use site_crawler::{CrawlerConfig, FakeClock, FetchError, PageContents, PageParser};

#[derive(Default)]
struct Page {
    words: Vec<(String, u64)>,
    links: Vec<String>,
    fails: bool,
    panics: bool,
}

#[derive(Default)]
pub struct GraphParser {
    pages: HashMap<String, Page>,
    fetches: DashMap<String, usize>,
    clock: Option<(Arc<FakeClock>, Duration)>,
}

#[allow(dead_code)]
impl GraphParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, words: &[(&str, u64)], links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            Page {
                words: words.iter().map(|(w, c)| (w.to_string(), *c)).collect(),
                links: links.iter().map(|l| l.to_string()).collect(),
                ..Page::default()
            },
        );
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Page {
                fails: true,
                ..Page::default()
            },
        );
        self
    }

    pub fn panicking(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Page {
                panics: true,
                ..Page::default()
            },
        );
        self
    }

    /// Every fetch moves `clock` forward by `cost`.
    pub fn costing(mut self, clock: Arc<FakeClock>, cost: Duration) -> Self {
        self.clock = Some((clock, cost));
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.get(url).map_or(0, |count| *count)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }
}

impl PageParser for GraphParser {
    fn parse(&self, url: &str) -> Result<PageContents, FetchError> {
        *self.fetches.entry(url.to_string()).or_insert(0) += 1;
        if let Some((clock, cost)) = &self.clock {
            clock.advance(*cost);
        }

        let page = self.pages.get(url).ok_or_else(|| FetchError::Parse {
            url: url.to_string(),
            message: "no such page".to_string(),
        })?;
        if page.panics {
            panic!("parser blew up on {url}");
        }
        if page.fails {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }

        let mut word_counts = HashMap::new();
        for (word, count) in &page.words {
            *word_counts.entry(word.clone()).or_insert(0) += count;
        }
        Ok(PageContents {
            word_counts,
            links: page.links.clone(),
        })
    }
}

#[allow(dead_code)]
pub fn config(max_depth: u32, popular_word_count: usize) -> CrawlerConfig {
    CrawlerConfig {
        max_depth,
        popular_word_count,
        parallelism: 4,
        timeout_seconds: 60,
        ..CrawlerConfig::default()
    }
}

#[allow(dead_code)]
pub fn seeds(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}
