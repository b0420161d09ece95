//! site_crawler: a parallel, deadline-bounded web crawler that counts words.
//!
//! - [`crawl`] - the traversal engine and the [`ParallelCrawler`] coordinator
//! - [`profiler`] - call timing for any capability trait
//! - [`parser`] - the [`PageParser`] capability and an HTTP implementation
//! - [`config`] - JSON configuration
//! - [`clock`] - injectable time source

pub mod clock;
pub mod config;
pub mod crawl;
pub mod error;
pub mod parser;
pub mod profiler;
pub mod result;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::CrawlerConfig;
pub use crawl::{ParallelCrawler, WEB_CRAWLER, WebCrawler};
pub use error::{ConfigError, CrawlerError, FetchError, ProfilerError};
pub use parser::{HttpPageParser, PAGE_PARSER, PageContents, PageParser};
pub use profiler::{CapabilitySet, Operation, Profiled, Profiler};
pub use result::CrawlResult;
