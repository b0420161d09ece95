//! Parallel, depth- and time-bounded crawling.
//!
//! [`ParallelCrawler`] owns a fixed-size worker pool. Every [`WebCrawler::crawl`]
//! call starts one traversal per seed URL. Each traversal node claims its URL,
//! parses the page, merges the words and fans out one child task per link,
//! waiting for all of them before it completes. All nodes of a call race
//! against one shared deadline.

mod state;
mod task;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    runtime::{Builder, Runtime},
    task::JoinSet,
};
use tracing::{debug, info, warn};

pub use state::{VisitedUrls, WordCounts, rank};

use crate::{
    clock::Clock,
    config::{CrawlerConfig, FullMatchPatterns, available_parallelism},
    error::CrawlerError,
    parser::PageParser,
    profiler::{CapabilitySet, Operation, Profiled},
    result::CrawlResult,
};
use task::{CrawlTask, Traversal};

// stands in for the deadline when now + timeout does not fit in an Instant
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

pub trait WebCrawler: Send + Sync {
    /// Crawls outward from `seeds`. Per-page failures never surface here.
    fn crawl(&self, seeds: &[String]) -> CrawlResult;

    /// Upper bound on the number of pages processed at the same time.
    fn max_parallelism(&self) -> usize;
}

pub const WEB_CRAWLER: CapabilitySet = CapabilitySet::new(
    "WebCrawler",
    &[
        Operation::profiled("crawl"),
        Operation::passthrough("max_parallelism"),
    ],
);

impl<C: WebCrawler> WebCrawler for Profiled<C> {
    fn crawl(&self, seeds: &[String]) -> CrawlResult {
        self.intercept("crawl", |crawler| crawler.crawl(seeds))
    }

    fn max_parallelism(&self) -> usize {
        self.intercept("max_parallelism", |crawler| crawler.max_parallelism())
    }
}

pub struct ParallelCrawler<P> {
    parser: Arc<P>,
    clock: Arc<dyn Clock>,
    runtime: Runtime,
    parallelism: usize,
    timeout: Duration,
    max_depth: u32,
    popular_word_count: usize,
    ignored_urls: FullMatchPatterns,
}

impl<P: PageParser + 'static> ParallelCrawler<P> {
    /// Builds the crawler and its worker pool. The pool lives as long as the
    /// crawler and is shared by every `crawl` call.
    pub fn new(
        config: &CrawlerConfig,
        parser: P,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CrawlerError> {
        let ignored_urls = FullMatchPatterns::compile(&config.ignored_urls)?;
        let parallelism = config.parallelism.min(available_parallelism()).max(1);

        let runtime = Builder::new_multi_thread()
            .worker_threads(parallelism)
            .max_blocking_threads(parallelism)
            .thread_name("crawl-worker")
            .enable_all()
            .build()?;

        Ok(ParallelCrawler {
            parser: Arc::new(parser),
            clock,
            runtime,
            parallelism,
            timeout: config.timeout(),
            max_depth: config.max_depth,
            popular_word_count: config.popular_word_count,
            ignored_urls,
        })
    }

    fn deadline(&self) -> Instant {
        let now = self.clock.now();
        now.checked_add(self.timeout)
            .unwrap_or_else(|| now + FAR_FUTURE)
    }
}

impl<P: PageParser + 'static> WebCrawler for ParallelCrawler<P> {
    /// Blocks on the crawler's own pool, so this must not be called from
    /// inside an async runtime.
    fn crawl(&self, seeds: &[String]) -> CrawlResult {
        let deadline = self.deadline();
        let traversal = Arc::new(Traversal::new(
            Arc::clone(&self.parser),
            Arc::clone(&self.clock),
            self.ignored_urls.clone(),
        ));

        info!(
            seeds = seeds.len(),
            max_depth = self.max_depth,
            parallelism = self.parallelism,
            timeout_secs = self.timeout.as_secs(),
            "starting crawl"
        );

        self.runtime.block_on(async {
            let mut roots = JoinSet::new();
            for seed in seeds {
                let root = CrawlTask {
                    url: seed.clone(),
                    remaining_depth: self.max_depth,
                    deadline,
                };
                roots.spawn(Arc::clone(&traversal).explore(root));
            }
            while let Some(joined) = roots.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "seed traversal did not complete");
                }
            }
        });

        let result = CrawlResult::new(
            traversal.counts.popular(self.popular_word_count),
            traversal.visited.len(),
        );
        info!(
            urls_visited = result.urls_visited(),
            revisits = traversal.visited.revisits(),
            distinct_words = traversal.counts.len(),
            "crawl finished"
        );
        if traversal.visited.is_empty() {
            if !seeds.is_empty() {
                warn!("no start page was visited, check maxDepth, timeoutSeconds and ignoredUrls");
            }
        } else if traversal.counts.is_empty() {
            debug!("visited pages contained no countable words");
        }
        result
    }

    fn max_parallelism(&self) -> usize {
        self.parallelism
    }
}
