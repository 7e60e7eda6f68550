/// Collection runs over the port registry.
///
/// Each port goes through three independent stages (tides, weather, wind).
/// A stage that cannot fetch its page records a `StageError` and yields an
/// empty list; the remaining stages and ports still run. Every registry port
/// gets a record, in registry order, whatever happened to it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::analysis::daily::summarize_day;
use crate::ingest::fetch::PageFetcher;
use crate::ingest::flatten::flatten_html;
use crate::ingest::throttle::HostThrottle;
use crate::logging::{self, LogSource};
use crate::model::{CollectionRun, PATH_TIDES, PATH_WEATHER, PATH_WIND, PortRecord, Stage, StageError};
use crate::parse::dates::{RolloverPolicy, ScanContext};
use crate::parse::hourly::{DEFAULT_LOOKAHEAD, extract_conditions, extract_hourly};
use crate::parse::tides::parse_tides_page;
use crate::ports::{Port, PortRegistry};

/// Fewer tide events than this in a record earns a low-confidence warning.
pub const DEFAULT_MIN_TIDE_EVENTS: usize = 4;

/// Spacing between requests to the same host.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    /// Ports processed concurrently; 0 or 1 means one after another.
    pub workers: usize,
    pub request_spacing: Duration,
    pub min_tide_events: usize,
    pub lookahead: usize,
    pub rollover: RolloverPolicy,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        CollectorSettings {
            workers: 1,
            request_spacing: DEFAULT_REQUEST_SPACING,
            min_tide_events: DEFAULT_MIN_TIDE_EVENTS,
            lookahead: DEFAULT_LOOKAHEAD,
            rollover: RolloverPolicy::default(),
        }
    }
}

pub struct Collector<F: PageFetcher> {
    registry: PortRegistry,
    settings: CollectorSettings,
    fetcher: F,
    throttle: HostThrottle,
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(registry: PortRegistry, settings: CollectorSettings, fetcher: F) -> Self {
        let throttle = HostThrottle::new(settings.request_spacing);
        Collector {
            registry,
            settings,
            fetcher,
            throttle,
        }
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Single port
    // -----------------------------------------------------------------------

    /// Fetches and flattens one stage page, or records why it could not.
    fn fetch_stage(&self, stage: Stage, port: &Port, path: &str, errors: &mut Vec<StageError>) -> Option<String> {
        let url = port.stage_url(path);
        self.throttle.wait(&url);

        match self.fetcher.fetch(&url) {
            Ok(body) => Some(flatten_html(&body)),
            Err(err) => {
                logging::log_stage_failure(stage, &port.id, &url, &err);
                errors.push(StageError::failed(stage, &url, err.to_string()));
                None
            }
        }
    }

    /// Runs the three stages and the sanity check for one port.
    ///
    /// `fetched_at` and `ctx` are the only time inputs, so identical page
    /// text always produces an identical record.
    pub fn collect_port(&self, port: &Port, fetched_at: DateTime<Utc>, ctx: &ScanContext) -> PortRecord {
        let mut errors = Vec::new();
        let mut record = PortRecord {
            id: port.id.clone(),
            name: port.name.clone(),
            base_locator: port.base_url.clone(),
            fetched_at,
            tides_7d: Vec::new(),
            tide_days: Vec::new(),
            weather_hourly: Vec::new(),
            wind_hourly: Vec::new(),
            errors: Vec::new(),
        };

        let tides_url = port.stage_url(PATH_TIDES);
        if let Some(text) = self.fetch_stage(Stage::Tides, port, PATH_TIDES, &mut errors) {
            let page = parse_tides_page(&text, ctx);
            if page.markers_found == 0 {
                logging::warn(LogSource::Tides, Some(&port.id), "no date markers on tide page");
                errors.push(StageError::warning(
                    Stage::Sanity,
                    Some(&tides_url),
                    "no date markers found on tide page; layout may have changed",
                ));
            }
            record.tides_7d = page.events();
            record.tide_days = page
                .days
                .iter()
                .filter(|d| !d.events.is_empty())
                .map(|d| summarize_day(&port.name, d))
                .collect();
        }

        if let Some(text) = self.fetch_stage(Stage::Weather, port, PATH_WEATHER, &mut errors) {
            record.weather_hourly = extract_conditions(&text, ctx, self.settings.lookahead);
        }

        if let Some(text) = self.fetch_stage(Stage::Wind, port, PATH_WIND, &mut errors) {
            record.wind_hourly = extract_hourly(&text, ctx, self.settings.lookahead);
        }

        if record.tides_7d.len() < self.settings.min_tide_events {
            let message = format!(
                "only {} tide events extracted (expected at least {})",
                record.tides_7d.len(),
                self.settings.min_tide_events
            );
            logging::warn(LogSource::Parser, Some(&port.id), &message);
            errors.push(StageError::warning(Stage::Sanity, Some(&tides_url), message));
        }

        logging::debug(
            LogSource::System,
            Some(&port.id),
            &format!(
                "{} tide events, {} weather hours, {} wind hours",
                record.tides_7d.len(),
                record.weather_hourly.len(),
                record.wind_hourly.len()
            ),
        );

        record.errors = errors;
        record
    }

    // -----------------------------------------------------------------------
    // Whole registry
    // -----------------------------------------------------------------------

    /// Collects every registry port using the system clock.
    pub fn run(&self) -> CollectionRun {
        self.run_with_clock(&Utc::now, &ScanContext::local(self.settings.rollover))
    }

    /// Collects every registry port, stamping records with `clock`.
    pub fn run_with_clock<C>(&self, clock: &C, ctx: &ScanContext) -> CollectionRun
    where
        C: Fn() -> DateTime<Utc> + Sync,
    {
        let started_at = clock();
        let ports = self.registry.ports();
        logging::info(
            LogSource::System,
            None,
            &format!("Collecting {} ports with {} worker(s)", ports.len(), self.settings.workers.max(1)),
        );

        let records = if self.settings.workers <= 1 || ports.len() <= 1 {
            ports.iter().map(|p| self.collect_port(p, clock(), ctx)).collect()
        } else {
            self.run_pool(ports, clock, ctx)
        };

        let run = CollectionRun { started_at, ports: records };
        let degraded = run.ports.iter().filter(|p| p.is_degraded()).count();
        logging::log_run_summary(run.ports.len(), run.ports.len() - degraded, degraded);
        run
    }

    /// Bounded pool of scoped threads pulling ports off a shared index.
    fn run_pool<C>(&self, ports: &[Port], clock: &C, ctx: &ScanContext) -> Vec<PortRecord>
    where
        C: Fn() -> DateTime<Utc> + Sync,
    {
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, PortRecord)>();
        let workers = self.settings.workers.min(ports.len());

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(port) = ports.get(index) else {
                            break;
                        };
                        if tx.send((index, self.collect_port(port, clock(), ctx))).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut indexed: Vec<(usize, PortRecord)> = rx.into_iter().collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, record)| record).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FetchError, Severity};
    use chrono::{NaiveDate, TimeZone};
    use std::collections::HashMap;

    /// Serves canned pages keyed by URL suffix; anything else is a 404.
    struct ScriptedFetcher {
        pages: HashMap<String, Result<String, FetchError>>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            ScriptedFetcher { pages: HashMap::new() }
        }

        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        fn fail(mut self, url: &str, err: FetchError) -> Self {
            self.pages.insert(url.to_string(), Err(err));
            self
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.pages.get(url).cloned().unwrap_or(Err(FetchError::HttpError(404)))
        }
    }

    const TIDES_HTML: &str = "<html><body>\
        <div>27 DEZ</div><span>3:14</span><span>0,7 m</span><span>56</span>\
        <span>9:41</span><span>1,3 m</span><span>58</span>\
        <div>28 DEZ</div><span>4:02</span><span>0,6 m</span><span>60</span>\
        <span>10:30</span><span>1,4 m</span><span>62</span>\
        </body></html>";

    const WIND_HTML: &str = "<html><body><p>14:00</p><p>WSW</p><p>7 km/h</p></body></html>";

    const WEATHER_HTML: &str = "<html><body><p>9:00</p><p>Céu limpo</p><p>24°</p></body></html>";

    fn port() -> Port {
        Port::new("BR_TST", "Teste", "https://example.test/br/teste")
    }

    fn settings(workers: usize) -> CollectorSettings {
        CollectorSettings {
            workers,
            request_spacing: Duration::ZERO,
            ..CollectorSettings::default()
        }
    }

    fn ctx() -> ScanContext {
        ScanContext::new(NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(), RolloverPolicy::EarlyMonths)
    }

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 27, 12, 0, 0).unwrap()
    }

    fn full_fetcher(base: &str) -> ScriptedFetcher {
        ScriptedFetcher::new()
            .page(&format!("{}/previsao/mares", base), TIDES_HTML)
            .page(&format!("{}/previsao/tempo", base), WEATHER_HTML)
            .page(&format!("{}/previsao/vento", base), WIND_HTML)
    }

    fn collector(fetcher: ScriptedFetcher, ports: Vec<Port>, workers: usize) -> Collector<ScriptedFetcher> {
        Collector::new(PortRegistry::new(ports).unwrap(), settings(workers), fetcher)
    }

    #[test]
    fn test_all_stages_succeed() {
        let p = port();
        let c = collector(full_fetcher(&p.base_url), vec![p.clone()], 1);
        let record = c.collect_port(&p, fetched_at(), &ctx());

        assert_eq!(record.tides_7d.len(), 4);
        assert_eq!(record.tide_days.len(), 2);
        assert_eq!(record.tide_days[0].location, "Teste");
        assert_eq!(record.weather_hourly.len(), 1);
        assert_eq!(record.weather_hourly[0].value, "Céu limpo");
        assert_eq!(record.wind_hourly.len(), 1);
        assert_eq!(record.wind_hourly[0].value, "3.8 kn");
        assert!(record.errors.is_empty(), "unexpected errors: {:?}", record.errors);
        assert!(!record.is_degraded());
    }

    #[test]
    fn test_tide_transport_error_keeps_other_stages() {
        let p = port();
        let fetcher = full_fetcher(&p.base_url).fail(
            &format!("{}/previsao/mares", p.base_url),
            FetchError::Transport("connection reset".into()),
        );
        let record = collector(fetcher, vec![p.clone()], 1).collect_port(&p, fetched_at(), &ctx());

        assert!(record.tides_7d.is_empty());
        assert_eq!(record.wind_hourly.len(), 1, "wind stage must still run");
        assert_eq!(record.weather_hourly.len(), 1, "weather stage must still run");

        let tide_errors: Vec<_> = record.errors_for(Stage::Tides).collect();
        assert_eq!(tide_errors.len(), 1);
        assert_eq!(tide_errors[0].severity, Severity::Error);
        assert_eq!(tide_errors[0].source.as_deref(), Some("https://example.test/br/teste/previsao/mares"));
        assert!(tide_errors[0].message.contains("connection reset"));
        assert!(record.is_degraded());
    }

    #[test]
    fn test_sparse_tide_page_gets_sanity_warning() {
        let p = port();
        let fetcher = ScriptedFetcher::new().page(
            &format!("{}/previsao/mares", p.base_url),
            "<p>27 DEZ</p><p>3:14</p><p>0,7 m</p><p>56</p>",
        );
        let record = collector(fetcher, vec![p.clone()], 1).collect_port(&p, fetched_at(), &ctx());

        assert_eq!(record.tides_7d.len(), 1);
        let sanity: Vec<_> = record.errors_for(Stage::Sanity).collect();
        assert_eq!(sanity.len(), 1);
        assert_eq!(sanity[0].severity, Severity::Warning);
        // Weather and wind 404s are still real errors.
        assert_eq!(record.errors_for(Stage::Wind).count(), 1);
    }

    #[test]
    fn test_tide_page_without_markers_is_low_confidence() {
        let p = port();
        let fetcher = ScriptedFetcher::new().page(&format!("{}/previsao/mares", p.base_url), "<p>sem dados</p>");
        let record = collector(fetcher, vec![p.clone()], 1).collect_port(&p, fetched_at(), &ctx());

        assert!(record.tides_7d.is_empty());
        assert!(record.errors_for(Stage::Tides).next().is_none(), "fetch succeeded");
        assert_eq!(record.errors_for(Stage::Sanity).count(), 2, "no markers plus too few events");
    }

    #[test]
    fn test_same_input_same_record() {
        let p = port();
        let c = collector(full_fetcher(&p.base_url), vec![p.clone()], 1);
        let a = serde_json::to_string(&c.collect_port(&p, fetched_at(), &ctx())).unwrap();
        let b = serde_json::to_string(&c.collect_port(&p, fetched_at(), &ctx())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pool_keeps_registry_order() {
        let ports: Vec<Port> = (0..7)
            .map(|i| Port::new(&format!("P{}", i), &format!("Port {}", i), &format!("https://example.test/p{}", i)))
            .collect();
        let mut fetcher = ScriptedFetcher::new();
        for p in &ports {
            fetcher = fetcher.page(&format!("{}/previsao/vento", p.base_url), WIND_HTML);
        }
        let c = collector(fetcher, ports.clone(), 3);
        let run = c.run_with_clock(&fetched_at, &ctx());

        let ids: Vec<&str> = run.ports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["P0", "P1", "P2", "P3", "P4", "P5", "P6"]);
        assert!(run.ports.iter().all(|r| r.wind_hourly.len() == 1));
    }

    #[test]
    fn test_every_port_gets_a_record_even_when_all_fail() {
        let ports = vec![
            Port::new("A", "A", "https://example.test/a"),
            Port::new("B", "B", "https://example.test/b"),
        ];
        let run = collector(ScriptedFetcher::new(), ports, 1).run_with_clock(&fetched_at, &ctx());
        assert_eq!(run.ports.len(), 2);
        assert!(run.ports.iter().all(|r| r.is_degraded()));
        assert_eq!(run.started_at, fetched_at());
    }
}
