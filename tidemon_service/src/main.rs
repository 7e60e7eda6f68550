use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use tidemon_service::analysis::interpolate::interpolate;
use tidemon_service::collect::Collector;
use tidemon_service::config::{Config, load_config};
use tidemon_service::export::{export_to_file, write_json, write_samples_csv, write_tides_csv};
use tidemon_service::ingest::fetch::HttpFetcher;
use tidemon_service::logging::{self, LogSource, init_logger};
use tidemon_service::model::{CollectionRun, TideEvent, parse_clock};

#[derive(Parser)]
#[command(name = "tidemon")]
#[command(about = "Tide and weather forecast collector for Brazilian ports", long_about = None)]
struct Cli {
    /// Config file (defaults to $TIDEMON_CONFIG, then tidemon.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every registry port and write the requested outputs
    Collect {
        /// Full run as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// One row per tide event
        #[arg(long)]
        tides_csv: Option<PathBuf>,
        /// One row per hourly wind/weather sample
        #[arg(long)]
        samples_csv: Option<PathBuf>,
        /// Ports collected concurrently (overrides the config file)
        #[arg(long)]
        workers: Option<usize>,
        /// Only collect these station ids
        #[arg(long = "port")]
        ports: Vec<String>,
    },
    /// List the configured ports
    Ports,
    /// Tide height at a time of day, from a previously written JSON run
    TideAt {
        #[arg(long)]
        json: PathBuf,
        #[arg(long)]
        port: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// HH:MM
        #[arg(long)]
        time: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logger(config.log_level()?, config.logging.file.as_deref(), config.logging.timestamps);

    match cli.command {
        Commands::Collect { json, tides_csv, samples_csv, workers, ports } => {
            collect(&config, json, tides_csv, samples_csv, workers, &ports)
        }
        Commands::Ports => {
            for port in config.registry()?.ports() {
                println!("{:<8} {:<24} {}", port.id, port.name, port.base_url);
            }
            Ok(())
        }
        Commands::TideAt { json, port, date, time } => tide_at(&json, &port, date, &time),
    }
}

fn collect(
    config: &Config,
    json: Option<PathBuf>,
    tides_csv: Option<PathBuf>,
    samples_csv: Option<PathBuf>,
    workers: Option<usize>,
    only: &[String],
) -> Result<(), Box<dyn Error>> {
    let mut registry = config.registry()?;
    if !only.is_empty() {
        registry = registry.retain_ids(only)?;
    }

    let mut settings = config.collector_settings()?;
    if let Some(workers) = workers {
        settings.workers = workers;
    }

    let fetcher = HttpFetcher::new(&config.collector.user_agent, &config.collector.accept_language, config.timeout())?;
    let run = Collector::new(registry, settings, fetcher).run();

    if let Some(path) = json.as_deref() {
        export_to_file(path, |f| write_json(&run, f))?;
    }
    if let Some(path) = tides_csv.as_deref() {
        let rows = export_to_file(path, |f| write_tides_csv(&run, f))?;
        logging::info(LogSource::Export, None, &format!("{} tide rows", rows));
    }
    if let Some(path) = samples_csv.as_deref() {
        let rows = export_to_file(path, |f| write_samples_csv(&run, f))?;
        logging::info(LogSource::Export, None, &format!("{} sample rows", rows));
    }
    if json.is_none() && tides_csv.is_none() && samples_csv.is_none() {
        write_json(&run, std::io::stdout().lock())?;
    }
    Ok(())
}

fn tide_at(json: &Path, port_id: &str, date: NaiveDate, time: &str) -> Result<(), Box<dyn Error>> {
    let target = parse_clock(time).ok_or_else(|| format!("invalid time '{}', expected HH:MM", time))?;
    let run: CollectionRun = serde_json::from_reader(BufReader::new(File::open(json)?))?;
    let record = run
        .find(port_id)
        .ok_or_else(|| format!("port '{}' not found in {}", port_id, json.display()))?;

    let day: Vec<TideEvent> = record.tides_7d.iter().filter(|e| e.date == date).cloned().collect();
    match interpolate(&day, target) {
        Some(height) => println!("{} {} {} {:.2} m", record.id, date, target.format("%H:%M"), height),
        None => println!(
            "{} {} {}: outside the published readings ({} events that day)",
            record.id,
            date,
            target.format("%H:%M"),
            day.len()
        ),
    }
    Ok(())
}
