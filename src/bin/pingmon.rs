use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use pingmon::config::{Config, OutputFormat};
use pingmon::export;
use pingmon::logging::init_logging;
use pingmon::probe::{self, EchoProbe, ProbeError, StubProbe};
use pingmon::session::{PingSession, TargetDescriptor};
use pingmon::stats::{StatsStore, StatisticsSnapshot};
use pingmon::view::ConsoleView;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

fn main() {
    let config = Config::parse();

    init_logging(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Monitor failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let store = Arc::new(StatsStore::new());

    // One probe and one session per target; each session drives its own
    // worker thread against the shared store.
    let mut sessions = Vec::with_capacity(config.hosts.len());
    for host in &config.hosts {
        let probe = build_probe(host)?;
        let target = TargetDescriptor::new(host.clone(), config.interval);
        sessions.push(PingSession::new(target, probe, Arc::clone(&store)));
    }

    for session in &mut sessions {
        session.start();
    }
    info!(
        hosts = config.hosts.len(),
        interval_s = config.interval,
        "Monitoring started"
    );

    let format = config.effective_format();
    let export_path = config.output_path();
    let mut exporter = (format != OutputFormat::None).then(|| {
        ExportLoop::start(
            Arc::clone(&store),
            format,
            export_path.clone(),
            Duration::from_secs(config.export_period),
        )
    });

    let mut view = ConsoleView::new(
        Arc::clone(&store),
        Duration::from_millis(config.render_period_ms),
    );
    if config.quiet {
        info!("Running in quiet mode (terminal UI disabled)");
    } else {
        view.start();
    }

    println!("Monitoring {} host(s). Press Enter to stop...", sessions.len());
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;

    view.stop();
    if let Some(exporter) = exporter.take() {
        exporter.stop();
        // Final export pass so the file reflects the last samples.
        if let Err(e) = export_once(format, &export_path, &store.snapshot_all()) {
            error!(error = %e, path = %export_path.display(), "Final export failed");
        }
    }
    for session in &mut sessions {
        session.stop();
    }
    info!("Monitoring stopped");

    Ok(())
}

/// Builds and initializes the platform probe for one host, substituting the
/// stub probe when ICMP privilege is missing so monitoring can continue
/// (the host will show 100% loss).
fn build_probe(host: &str) -> Result<Box<dyn EchoProbe>> {
    let mut probe = probe::platform_probe();
    match probe.initialize() {
        Ok(()) => Ok(probe),
        Err(ProbeError::Permission(reason)) => {
            warn!(host, reason = %reason, "No ICMP privilege, falling back to stub probe");
            Ok(Box::new(StubProbe))
        }
        Err(e) => {
            Err(anyhow::Error::new(e).context(format!("failed to initialize probe for {}", host)))
        }
    }
}

fn export_once(
    format: OutputFormat,
    path: &Path,
    snapshots: &[StatisticsSnapshot],
) -> export::Result<()> {
    match format {
        OutputFormat::None => Ok(()),
        OutputFormat::Csv => export::csv::append_snapshots(path, snapshots, Local::now()),
        OutputFormat::Json => export::json::write_snapshots(path, snapshots, Local::now()),
    }
}

/// Periodic export task, independent of the schedulers and the view.
struct ExportLoop {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ExportLoop {
    fn start(
        store: Arc<StatsStore>,
        format: OutputFormat,
        path: std::path::PathBuf,
        period: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                if let Err(e) = export_once(format, &path, &store.snapshot_all()) {
                    error!(error = %e, path = %path.display(), "Export failed");
                }
                thread::sleep(period);
            }
        });
        Self {
            running,
            worker: Some(worker),
        }
    }

    fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
