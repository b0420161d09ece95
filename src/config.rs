//! Crawl configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "startPages": ["https://example.com/"],
//!   "ignoredUrls": ["https://example\\.com/private/.*"],
//!   "ignoredWords": ["^.{1,3}$"],
//!   "parallelism": 4,
//!   "maxDepth": 3,
//!   "timeoutSeconds": 10,
//!   "requestTimeoutSeconds": 5,
//!   "popularWordCount": 20,
//!   "profileOutputPath": "profile.txt",
//!   "resultPath": "result.json"
//! }
//! ```

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default)]
    pub start_pages: Vec<String>,

    #[serde(default)]
    pub ignored_urls: Vec<String>,

    #[serde(default)]
    pub ignored_words: Vec<String>,

    /// Worker count target; capped by the hardware at crawl time.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Negative depths read as 0.
    #[serde(default, deserialize_with = "clamped_depth")]
    pub max_depth: u32,

    /// Budget for the whole crawl.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Budget for a single page fetch.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default)]
    pub popular_word_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_output_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
}

fn default_parallelism() -> usize {
    available_parallelism()
}

fn default_timeout_seconds() -> u64 {
    1
}

fn default_request_timeout_seconds() -> u64 {
    5
}

fn clamped_depth<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let depth = i64::deserialize(deserializer)?;
    Ok(u32::try_from(depth.max(0)).unwrap_or(u32::MAX))
}

pub(crate) fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            start_pages: Vec::new(),
            ignored_urls: Vec::new(),
            ignored_words: Vec::new(),
            parallelism: default_parallelism(),
            max_depth: 0,
            timeout_seconds: default_timeout_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            popular_word_count: 0,
            profile_output_path: None,
            result_path: None,
        }
    }
}

impl CrawlerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(BufReader::new(file))
    }

    pub fn read<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: CrawlerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that would otherwise only fail once a crawl is
    /// running.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        FullMatchPatterns::compile(&self.ignored_urls)?;
        FullMatchPatterns::compile(&self.ignored_words)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Per-fetch timeout, never longer than the crawl itself.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.min(self.timeout_seconds))
    }
}

/// Regular expressions that only count as a match when they cover the whole
/// input.
#[derive(Debug, Clone, Default)]
pub struct FullMatchPatterns(Vec<Regex>);

impl FullMatchPatterns {
    pub fn compile(patterns: &[String]) -> Result<Self, ConfigError> {
        patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                    ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FullMatchPatterns)
    }

    pub fn matches(&self, input: &str) -> bool {
        self.0.iter().any(|re| re.is_match(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_camel_case_json() {
        let json = r#"{
            "startPages": ["http://a.test/"],
            "ignoredUrls": ["http://a\\.test/skip.*"],
            "parallelism": 3,
            "maxDepth": 2,
            "timeoutSeconds": 7,
            "popularWordCount": 5,
            "resultPath": "out.json"
        }"#;

        let config = CrawlerConfig::read(json.as_bytes()).unwrap();
        assert_eq!(config.start_pages, vec!["http://a.test/"]);
        assert_eq!(config.parallelism, 3);
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.timeout(), Duration::from_secs(7));
        assert_eq!(config.popular_word_count, 5);
        assert_eq!(config.result_path, Some(PathBuf::from("out.json")));
        assert_eq!(config.profile_output_path, None);
        assert!(config.ignored_words.is_empty());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = CrawlerConfig::read("{}".as_bytes()).unwrap();
        assert_eq!(config, CrawlerConfig::default());
        assert_eq!(config.timeout_seconds, 1);
        assert!(config.parallelism >= 1);
    }

    #[test]
    fn negative_depth_reads_as_zero() {
        let config = CrawlerConfig::read(r#"{"maxDepth": -1}"#.as_bytes()).unwrap();
        assert_eq!(config.max_depth, 0);

        let config = CrawlerConfig::read(r#"{"maxDepth": 9999999999}"#.as_bytes()).unwrap();
        assert_eq!(config.max_depth, u32::MAX);
    }

    #[test]
    fn request_timeout_is_separate_from_crawl_timeout() {
        let config =
            CrawlerConfig::read(r#"{"timeoutSeconds": 60, "requestTimeoutSeconds": 3}"#.as_bytes())
                .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(3));

        let config = CrawlerConfig::read(r#"{"timeoutSeconds": 60}"#.as_bytes()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));

        // a short crawl caps the fetch budget
        let config = CrawlerConfig::read(r#"{"timeoutSeconds": 2}"#.as_bytes()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = CrawlerConfig::read(r#"{"maxDepth": "deep"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn rejects_invalid_patterns_before_crawling() {
        let err = CrawlerConfig::read(r#"{"ignoredUrls": ["(unclosed"]}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn rejects_zero_parallelism() {
        let err = CrawlerConfig::read(r#"{"parallelism": 0}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroParallelism));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = CrawlerConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn patterns_match_whole_string_only() {
        let patterns =
            FullMatchPatterns::compile(&["http://x\\.test/a".to_string(), "b|c".to_string()])
                .unwrap();
        assert!(patterns.matches("http://x.test/a"));
        assert!(!patterns.matches("http://x.test/ab"));
        assert!(!patterns.matches("xhttp://x.test/a"));
        // alternation stays inside the anchors
        assert!(patterns.matches("b"));
        assert!(!patterns.matches("bc"));
    }
}
