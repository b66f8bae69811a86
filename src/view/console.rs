//! Periodic console rendering of store snapshots.

use crate::stats::{StatisticsSnapshot, StatsStore};
use chrono::Local;
use colored::*;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const SPARKLINE_WIDTH: usize = 40;
// Ten levels, low to high.
const SPARK_CHARS: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
const HOST_WIDTH: usize = 20;
const NUMBER_WIDTH: usize = 8;

/// Background renderer: redraws a per-host summary table and recent-rtt
/// sparklines every period. Reads the store only through snapshots.
pub struct ConsoleView {
    store: Arc<StatsStore>,
    period: Duration,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ConsoleView {
    pub fn new(store: Arc<StatsStore>, period: Duration) -> Self {
        Self {
            store,
            period,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Starts the render thread. No-op while already running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let store = Arc::clone(&self.store);
        let running = Arc::clone(&self.running);
        let period = self.period;
        self.worker = Some(thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let mut snapshots = store.snapshot_all();
                // The store guarantees no ordering; sort for a stable display.
                snapshots.sort_by(|a, b| a.host.cmp(&b.host));
                render(&snapshots);
                thread::sleep(period);
            }
        }));
    }

    /// Stops rendering and joins the render thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ConsoleView {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render(snapshots: &[StatisticsSnapshot]) {
    let mut out = String::new();
    out.push_str(CLEAR_SCREEN);
    out.push_str(&format!(
        "{}  {}\n\n",
        "pingmon".bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "{:<hw$} {:>nw$} {:>nw$} {:>nw$} {:>nw$} {:>nw$} {:>nw$}\n",
        "HOST",
        "COUNT",
        "LOSS%",
        "MIN",
        "MAX",
        "MEAN",
        "MEDIAN",
        hw = HOST_WIDTH,
        nw = NUMBER_WIDTH
    ));

    for snap in snapshots {
        let loss_pct = format!("{:.1}", snap.loss_ratio * 100.0);
        let loss_col = if snap.loss_ratio > 0.0 {
            loss_pct.red().to_string()
        } else {
            loss_pct.green().to_string()
        };
        out.push_str(&format!(
            "{:<hw$} {:>nw$} {:>nw$} {:>nw$} {:>nw$} {:>nw$} {:>nw$}\n",
            snap.host,
            snap.count,
            loss_col,
            format_ms(snap.min_ms),
            format_ms(snap.max_ms),
            format_ms(snap.mean_ms),
            format_ms(snap.median_ms),
            hw = HOST_WIDTH,
            nw = NUMBER_WIDTH
        ));
    }

    out.push('\n');
    for snap in snapshots {
        out.push_str(&format!(
            "{:<hw$} {}\n",
            snap.host,
            sparkline(&snap.recent_rtts),
            hw = HOST_WIDTH
        ));
    }

    print!("{}", out);
    let _ = std::io::stdout().flush();
}

fn format_ms(value: f64) -> String {
    format!("{:.1}", value)
}

/// Maps the tail of the recent-rtt window onto the character ramp, scaled
/// to the window maximum.
fn sparkline(rtts: &[f64]) -> String {
    let window = &rtts[rtts.len().saturating_sub(SPARKLINE_WIDTH)..];
    if window.is_empty() {
        return String::new();
    }
    let max = window.iter().fold(0.0f64, |acc, &v| acc.max(v));
    window
        .iter()
        .map(|&v| {
            if max <= 0.0 {
                SPARK_CHARS[0]
            } else {
                let level = ((v / max) * (SPARK_CHARS.len() - 1) as f64).round() as usize;
                SPARK_CHARS[level.min(SPARK_CHARS.len() - 1)]
            }
        })
        .collect()
}
