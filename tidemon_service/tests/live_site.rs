/// Live checks against tabuademares.com
///
/// These tests verify that the page layouts the parsers rely on are still
/// served, and that the built-in port paths resolve. They are marked
/// #[ignore] so normal builds never depend on the site being reachable.
///
/// To run these tests manually:
///   cargo test --test live_site -- --ignored --test-threads=1

use std::time::Duration;

use tidemon_service::collect::{Collector, CollectorSettings};
use tidemon_service::ingest::fetch::{DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT, HttpFetcher, PageFetcher};
use tidemon_service::ingest::flatten::flatten_html;
use tidemon_service::model::{PATH_TIDES, Severity};
use tidemon_service::parse::dates::{RolloverPolicy, ScanContext};
use tidemon_service::parse::tides::parse_tides_page;
use tidemon_service::ports::default_registry;

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(DEFAULT_USER_AGENT, DEFAULT_ACCEPT_LANGUAGE, Duration::from_secs(20))
        .expect("client should build")
}

#[test]
#[ignore] // Don't run in CI - depends on external site
fn live_paranagua_tide_page_has_a_week_of_events() {
    let registry = default_registry();
    let port = registry.find("BR_PNG").expect("Paranaguá in registry");
    let html = fetcher()
        .fetch(&port.stage_url(PATH_TIDES))
        .unwrap_or_else(|e| panic!("tide page fetch failed: {}", e));

    let page = parse_tides_page(&flatten_html(&html), &ScanContext::local(RolloverPolicy::EarlyMonths));
    println!("markers={} skipped={} events={}", page.markers_found, page.markers_skipped, page.events().len());

    assert!(page.markers_found > 0, "no date markers: layout may have changed");
    assert!(page.events().len() >= 4, "expected at least 4 tide events");
}

#[test]
#[ignore] // Don't run in CI - depends on external site
fn live_paranagua_full_record_is_not_degraded() {
    let registry = default_registry().retain_ids(&["BR_PNG".to_string()]).unwrap();
    let collector = Collector::new(registry, CollectorSettings::default(), fetcher());
    let run = collector.run();
    let record = &run.ports[0];

    for err in &record.errors {
        println!("  {:?} {}: {}", err.severity, err.stage, err.message);
    }
    assert!(
        !record.errors.iter().any(|e| e.severity == Severity::Error),
        "Paranaguá record should have no stage errors"
    );
    assert!(!record.wind_hourly.is_empty(), "wind page produced no vectors");
}

#[test]
#[ignore] // Don't run in CI - depends on external site
fn live_verify_all_registry_tide_pages() {
    let fetcher = fetcher();
    let mut failures = Vec::new();

    for port in default_registry().ports() {
        let url = port.stage_url(PATH_TIDES);
        print!("  {} ... ", port.id);
        match fetcher.fetch(&url) {
            Ok(_) => println!("✓ OK"),
            Err(e) => {
                println!("✗ FAILED: {}", e);
                failures.push(format!("{} ({}): {}", port.name, url, e));
            }
        }
        std::thread::sleep(Duration::from_millis(700));
    }

    if !failures.is_empty() {
        for failure in &failures {
            println!("   - {}", failure);
        }
        panic!("tide page check failed for {} port(s)", failures.len());
    }
}
