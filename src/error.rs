use std::{io, path::PathBuf};

use thiserror::Error;

/// A page could not be fetched or parsed. Recovered by the traversal engine:
/// the page contributes no words and no links.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not parse {url}: {message}")]
    Parse { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("parallelism must be greater than 0")]
    ZeroParallelism,
}

#[derive(Debug, Error)]
pub enum ProfilerError {
    /// Nothing in the capability set is marked as profiled.
    #[error("capability set '{0}' has no profiled operations")]
    InvalidTarget(&'static str),
}

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("could not start the worker pool: {0}")]
    WorkerPool(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
