use std::{sync::Arc, time::Instant};

use futures::future::{BoxFuture, FutureExt};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::state::{VisitedUrls, WordCounts};
use crate::{
    clock::Clock,
    config::FullMatchPatterns,
    parser::{PageContents, PageParser},
};

/// One URL to explore, and how many more hops are allowed below it.
#[derive(Debug, Clone)]
pub(crate) struct CrawlTask {
    pub url: String,
    pub remaining_depth: u32,
    pub deadline: Instant,
}

/// Shared state of a single crawl invocation.
pub(crate) struct Traversal<P> {
    parser: Arc<P>,
    clock: Arc<dyn Clock>,
    ignored_urls: FullMatchPatterns,
    pub visited: VisitedUrls,
    pub counts: WordCounts,
}

impl<P: PageParser + 'static> Traversal<P> {
    pub fn new(parser: Arc<P>, clock: Arc<dyn Clock>, ignored_urls: FullMatchPatterns) -> Self {
        Traversal {
            parser,
            clock,
            ignored_urls,
            visited: VisitedUrls::new(),
            counts: WordCounts::new(),
        }
    }

    /// Explores `task.url` and everything reachable from it within the
    /// remaining depth. Resolves once the whole subtree is done.
    ///
    /// Children run as separate tasks on the pool, so deep link chains never
    /// grow the call stack.
    pub fn explore(self: Arc<Self>, task: CrawlTask) -> BoxFuture<'static, ()> {
        async move {
            if task.remaining_depth == 0 || self.clock.now() >= task.deadline {
                return;
            }
            if self.ignored_urls.matches(&task.url) {
                debug!(url = %task.url, "skipping ignored url");
                return;
            }
            if !self.visited.claim(&task.url) {
                debug!(url = %task.url, "already visited");
                return;
            }

            let Some(page) = self.fetch(&task.url).await else {
                return;
            };
            self.counts.merge(page.word_counts);

            let next_depth = task.remaining_depth - 1;
            if next_depth == 0 || page.links.is_empty() {
                return;
            }

            let mut children = JoinSet::new();
            for link in page.links {
                let child = CrawlTask {
                    url: link,
                    remaining_depth: next_depth,
                    deadline: task.deadline,
                };
                children.spawn(Arc::clone(&self).explore(child));
            }
            while let Some(joined) = children.join_next().await {
                if let Err(e) = joined {
                    warn!(parent = %task.url, error = %e, "crawl task did not complete");
                }
            }
        }
        .boxed()
    }

    /// Runs the parser on the blocking pool. Failures are logged and the page
    /// counts as empty.
    async fn fetch(&self, url: &str) -> Option<PageContents> {
        let parser = Arc::clone(&self.parser);
        let target = url.to_string();
        match tokio::task::spawn_blocking(move || parser.parse(&target)).await {
            Ok(Ok(page)) => {
                debug!(url, links = page.links.len(), "visited");
                Some(page)
            }
            Ok(Err(e)) => {
                warn!(url, error = %e, "failed to fetch page");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "page parser panicked");
                None
            }
        }
    }
}
