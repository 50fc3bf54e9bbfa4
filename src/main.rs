//! Retail Emotion Agent CLI
//!
//! Runs a simulated emotion-detection session from the terminal.

use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use retail_emotion_agent::{
    config::Config,
    core::{ExportFormat, RecordQuery, EXPORT_FILE_NAME},
    notify::Notification,
    producers::MediaItem,
    session::DashboardSession,
    transparency::create_shared_log_with_persistence,
    SIMULATION_NOTICE, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retail-emotion")]
#[command(version = VERSION)]
#[command(about = "Simulated retail emotion detection session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a live detection session and export it
    Run {
        /// Stop after this many seconds (runs until Ctrl+C when omitted)
        #[arg(long)]
        duration: Option<u64>,

        /// Output file for the export
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (csv, json or jsonl)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Seed for reproducible sessions
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify uploaded image or MP4 files
    Classify {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Serve the dashboard API over HTTP (requires server feature)
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8470")]
        port: u16,
    },

    /// Show configuration and cumulative counters
    Status,

    /// Show configuration
    Config,

    /// Display the simulation notice
    Notice,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            duration,
            output,
            format,
            seed,
        } => {
            cmd_run(duration, output, &format, seed).await;
        }
        Commands::Classify { files } => {
            cmd_classify(files).await;
        }
        Commands::Serve { port } => {
            cmd_serve(port).await;
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Notice => {
            cmd_notice();
        }
    }
}

/// Load configuration, exiting on a malformed file.
fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config from {:?}: {e}", Config::config_path());
            std::process::exit(1);
        }
    }
}

fn open_session(config: Config) -> (DashboardSession, Receiver<Notification>) {
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    let log = create_shared_log_with_persistence(config.data_path.join("session_log.json"));

    match DashboardSession::with_log(config, log) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Print pending notifications, hiding detections below the threshold.
fn drain_notifications(receiver: &Receiver<Notification>, threshold: u8) {
    for note in receiver.try_iter() {
        match note {
            Notification::LatestDetection { ref event } if event.confidence() < threshold => {}
            _ => println!("{}", note.message()),
        }
    }
}

async fn cmd_run(duration: Option<u64>, output: Option<PathBuf>, format: &str, seed: Option<u64>) {
    let format: ExportFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut config = load_config();
    if seed.is_some() {
        config.seed = seed;
    }
    let threshold = config.confidence_threshold;

    println!("Retail Emotion Agent v{VERSION}");
    println!();
    println!(
        "  Live interval: {}-{} ms",
        config.live_interval.min_ms, config.live_interval.max_ms
    );
    println!("  History capacity: {} events", config.store_capacity);
    println!("  Sensitivity: {}", config.sensitivity);
    println!("  Confidence threshold: {threshold}%");
    println!();

    let output = output.unwrap_or_else(|| {
        if format == ExportFormat::Csv {
            config.export_path.join(EXPORT_FILE_NAME)
        } else {
            config
                .export_path
                .join(format!("retail_analytics_data.{}", format.extension()))
        }
    });

    let (session, receiver) = open_session(config);

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    match duration {
        Some(secs) => println!("Recording for {secs}s (Ctrl+C to stop early)"),
        None => println!("Press Ctrl+C to stop"),
    }
    println!();

    session.start_recording();
    let deadline = duration.map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
            break;
        }
        drain_notifications(&receiver, threshold);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    session.stop_recording();
    drain_notifications(&receiver, threshold);

    println!();
    println!("Emotion distribution:");
    for bucket in session.histogram().buckets() {
        println!(
            "  {:<10} {:>5} ({:>3}%)",
            bucket.category.to_string(),
            bucket.count,
            bucket.percentage
        );
    }

    let stats = session.stats();
    println!();
    println!("Store statistics:");
    println!("  Total detections: {}", stats.total_detections);
    println!("  Active customers: {}", stats.active_entities);
    println!("  Avg. stay time: {}", stats.dwell_label());
    println!("  Happiness score: {}%", stats.satisfaction_percent());

    if let Some(summary) = session.confidence_summary() {
        println!();
        println!(
            "Confidence: mean {:.1}%, sd {:.1}, range {}-{}% over {} records",
            summary.mean, summary.std_dev, summary.min, summary.max, summary.count
        );
        let shown = session
            .query(&RecordQuery::new().min_confidence(threshold))
            .len();
        println!("  {shown} records at or above the {threshold}% threshold");
    }

    println!();
    match session.export_to(&output, format) {
        Ok(rows) => println!("Exported {rows} records to {output:?}"),
        Err(e) => eprintln!("Error writing export: {e}"),
    }
    drain_notifications(&receiver, threshold);

    if let Err(e) = session.log().save() {
        eprintln!("Warning: Could not save session counters: {e}");
    }

    println!();
    println!("{}", session.log().summary());
}

async fn cmd_classify(files: Vec<PathBuf>) {
    let config = load_config();
    let threshold = config.confidence_threshold;
    let (session, receiver) = open_session(config);

    let mut failures = 0;
    for file in &files {
        let media = match MediaItem::from_path(file) {
            Ok(media) => media,
            Err(e) => {
                eprintln!("Error reading {file:?}: {e}");
                failures += 1;
                continue;
            }
        };

        println!("Analyzing {} ({})...", media.name(), media.mime());
        if let Err(e) = session.classify(&media).await {
            eprintln!("Error: {e}");
            failures += 1;
        }
        drain_notifications(&receiver, threshold);
    }

    if let Err(e) = session.log().save() {
        eprintln!("Warning: Could not save session counters: {e}");
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

async fn cmd_serve(port: u16) {
    #[cfg(feature = "server")]
    {
        use retail_emotion_agent::server::{run, ServerConfig};

        let config = load_config();
        let (addr, shutdown_tx) = match run(ServerConfig::new(port, config)).await {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("Error starting server: {e}");
                std::process::exit(1);
            }
        };

        println!("Serving dashboard API on http://{addr}");
        println!("Press Ctrl+C to stop");

        let running = Arc::new(AtomicBool::new(true));
        ctrlc_handler(running.clone());
        while running.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        let _ = shutdown_tx.send(());
        println!("Server stopped.");
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = port;
        eprintln!("Error: serve requires the server feature (rebuild with --features server)");
        std::process::exit(1);
    }
}

fn cmd_status() {
    let config = load_config();

    println!("Retail Emotion Agent Status");
    println!("===========================");
    println!();
    println!("Configuration:");
    println!("  Sensitivity: {}", config.sensitivity);
    println!("  Confidence threshold: {}%", config.confidence_threshold);
    println!("  History capacity: {}", config.store_capacity);
    println!("  Time zone: {}", config.timezone);
    println!("  Export path: {:?}", config.export_path);
    println!();

    let counters_path = config.data_path.join("session_log.json");
    if counters_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&counters_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(live) = stats.get("live_detections") {
                    println!("  Live detections: {live}");
                }
                if let Some(classified) = stats.get("uploads_classified") {
                    println!("  Uploads classified: {classified}");
                }
                if let Some(rejected) = stats.get("uploads_rejected") {
                    println!("  Uploads rejected: {rejected}");
                }
                if let Some(exports) = stats.get("exports") {
                    println!("  Exports: {exports}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_notice() {
    println!("{SIMULATION_NOTICE}");
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
