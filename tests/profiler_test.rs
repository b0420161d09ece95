mod common;

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use common::{GraphParser, config, seeds};
use site_crawler::{
    CapabilitySet, CrawlerConfig, FakeClock, FetchError, Operation, PAGE_PARSER, PageParser, ParallelCrawler,
    Profiler, ProfilerError, WEB_CRAWLER, WebCrawler,
};

fn fake_clock() -> Arc<FakeClock> {
    Arc::new(FakeClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap(),
    ))
}

#[test]
fn profiled_crawl_reports_parser_and_crawl_time() {
    let clock = fake_clock();
    let profiler = Profiler::new(clock.clone());
    let graph = GraphParser::new()
        .page("A", &[("a", 1)], &["B", "C"])
        .page("B", &[("b", 1)], &[])
        .page("C", &[("c", 1)], &[])
        .costing(Arc::clone(&clock), Duration::from_millis(250));

    // one worker, so parse calls never overlap on the shared fake clock
    let config = CrawlerConfig {
        parallelism: 1,
        ..config(2, 5)
    };
    let parser = profiler.wrap(PAGE_PARSER, graph).unwrap();
    let crawler = ParallelCrawler::new(&config, parser, clock.clone()).unwrap();
    let crawler = profiler.wrap(WEB_CRAWLER, crawler).unwrap();

    let result = crawler.crawl(&seeds(&["A"]));
    assert_eq!(result.urls_visited(), 3);
    // passthrough operation, must not show up in the report
    assert!(crawler.max_parallelism() >= 1);

    let mut out = Vec::new();
    profiler.write_data(&mut out).unwrap();
    let report = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines.len(), 4, "unexpected report:\n{report}");
    assert_eq!(lines[0], "Run at Mon, 1 Jan 2024 08:30:00 GMT");
    assert_eq!(lines[1], "profiler_test::common::GraphParser#parse took 0m 0s 750ms");
    assert_eq!(lines[2], "site_crawler::crawl::ParallelCrawler#crawl took 0m 0s 750ms");
    assert_eq!(lines[3], "");
}

#[test]
fn shared_and_owned_parsers_report_under_one_key() {
    let clock = fake_clock();
    let profiler = Profiler::new(clock.clone());
    let graph = || {
        GraphParser::new()
            .page("A", &[], &[])
            .costing(Arc::clone(&clock), Duration::from_millis(100))
    };
    let shared = profiler.wrap(PAGE_PARSER, Arc::new(graph())).unwrap();
    let owned = profiler.wrap(PAGE_PARSER, graph()).unwrap();
    assert_eq!(shared.implementation(), owned.implementation());

    shared.parse("A").unwrap();
    owned.parse("A").unwrap();

    let records = profiler.state().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key(), "profiler_test::common::GraphParser#parse");
    assert_eq!(records[0].elapsed, Duration::from_millis(200));
}

#[test]
fn proxy_passes_parser_errors_through_unchanged() {
    let clock = fake_clock();
    let profiler = Profiler::new(clock.clone());
    let parser = profiler
        .wrap(
            PAGE_PARSER,
            GraphParser::new()
                .failing("BAD")
                .costing(Arc::clone(&clock), Duration::from_millis(5)),
        )
        .unwrap();

    let err = parser.parse("BAD").unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, ref url } if url == "BAD"));

    let records = profiler.state().snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].elapsed, Duration::from_millis(5));
}

#[test]
fn wrapping_without_profiled_operations_fails() {
    const QUIET_PARSER: CapabilitySet =
        CapabilitySet::new("PageParser", &[Operation::passthrough("parse")]);

    let profiler = Profiler::new(fake_clock());
    let result = profiler.wrap(QUIET_PARSER, GraphParser::new());

    assert!(matches!(result, Err(ProfilerError::InvalidTarget("PageParser"))));
}

#[test]
fn report_is_appended_to_file() {
    let clock = fake_clock();
    let profiler = Profiler::new(clock.clone());
    let parser = profiler
        .wrap(PAGE_PARSER, GraphParser::new().page("A", &[], &[]))
        .unwrap();
    parser.parse("A").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.txt");
    profiler.write_data_to_path(&path).unwrap();
    parser.parse("A").unwrap();
    profiler.write_data_to_path(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("Run at Mon, 1 Jan 2024 08:30:00 GMT").count(), 2);
    assert_eq!(contents.matches("GraphParser#parse took").count(), 2);
}
