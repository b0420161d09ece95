use std::{collections::HashMap, sync::Arc, time::Duration};

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::blocking::Client;
use tracing::debug;

use crate::{
    config::FullMatchPatterns,
    error::FetchError,
    profiler::{CapabilitySet, Operation, Profiled},
};

lazy_static! {
    static ref URL_RE: Regex = Regex::new(
        r"https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_\+.~#?&/=]*"
    )
    .unwrap();
    static ref MARKUP_RE: Regex =
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<[^>]*>").unwrap();
    static ref WORD_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

/// What a single page contributed to the crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContents {
    pub word_counts: HashMap<String, u64>,
    pub links: Vec<String>,
}

pub trait PageParser: Send + Sync {
    fn parse(&self, url: &str) -> Result<PageContents, FetchError>;
}

pub const PAGE_PARSER: CapabilitySet =
    CapabilitySet::new("PageParser", &[Operation::profiled("parse")]);

impl<P: PageParser + ?Sized> PageParser for Arc<P> {
    fn parse(&self, url: &str) -> Result<PageContents, FetchError> {
        (**self).parse(url)
    }
}

impl<P: PageParser> PageParser for Profiled<P> {
    fn parse(&self, url: &str) -> Result<PageContents, FetchError> {
        self.intercept("parse", |parser| parser.parse(url))
    }
}

/// Fetches pages over HTTP and pulls words and absolute links out of the raw
/// markup with regular expressions.
pub struct HttpPageParser {
    client: Client,
    ignored_words: FullMatchPatterns,
}

impl HttpPageParser {
    pub fn new(timeout: Duration, ignored_words: FullMatchPatterns) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("site_crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpPageParser {
            client,
            ignored_words,
        })
    }

    fn extract(&self, html: &str) -> PageContents {
        let mut links: Vec<String> = Vec::new();
        for found in URL_RE.find_iter(html) {
            let link = found.as_str();
            if !links.iter().any(|l| l == link) {
                links.push(link.to_string());
            }
        }

        let text = MARKUP_RE.replace_all(html, " ");
        let mut word_counts = HashMap::new();
        for word in WORD_RE.find_iter(&text) {
            let word = word.as_str().to_lowercase();
            if self.ignored_words.matches(&word) {
                continue;
            }
            *word_counts.entry(word).or_insert(0) += 1;
        }

        PageContents { word_counts, links }
    }
}

impl PageParser for HttpPageParser {
    fn parse(&self, url: &str) -> Result<PageContents, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        let contents = self.extract(&body);
        debug!(
            url,
            words = contents.word_counts.len(),
            links = contents.links.len(),
            "parsed page"
        );
        Ok(contents)
    }
}
