use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use site_crawler::{
    Clock, CrawlerConfig, HttpPageParser, PAGE_PARSER, ParallelCrawler, Profiler, SystemClock,
    WEB_CRAWLER, WebCrawler, config::FullMatchPatterns,
};

#[derive(Parser)]
#[command(version, about = "A parallel web crawler that counts popular words", long_about = None)]
struct Args {
    #[arg(help = "Path to the JSON crawl configuration.")]
    config: PathBuf,
    #[clap(
        short,
        long,
        action,
        help = "Log every visited, skipped and failed URL."
    )]
    verbose: bool,
    #[clap(
        long,
        value_name = "FORMAT",
        default_value = "text",
        help = "Log format: text or json."
    )]
    log_format: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(&args.log_format, args.verbose);

    let config = CrawlerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let profiler = Profiler::new(Arc::clone(&clock));

    let ignored_words = FullMatchPatterns::compile(&config.ignored_words)?;
    let parser = HttpPageParser::new(config.request_timeout(), ignored_words)
        .context("building the HTTP client")?;
    let parser = profiler.wrap(PAGE_PARSER, parser)?;

    let crawler = ParallelCrawler::new(&config, parser, Arc::clone(&clock))?;
    let crawler = profiler.wrap(WEB_CRAWLER, crawler)?;
    tracing::info!(parallelism = crawler.max_parallelism(), "crawler ready");

    let result = crawler.crawl(&config.start_pages);

    match &config.result_path {
        Some(path) => result
            .write_json_to_path(path)
            .with_context(|| format!("writing crawl result to {}", path.display()))?,
        None => result.write_json(&mut io::stdout().lock())?,
    }

    match &config.profile_output_path {
        Some(path) => profiler
            .write_data_to_path(path)
            .with_context(|| format!("writing profile data to {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            profiler.write_data(&mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) {
    let default_filter = if verbose {
        "site_crawler=debug,info"
    } else {
        "site_crawler=info,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout may carry the crawl result, so logs go to stderr
    match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}
