//! Progress observers and throughput estimation.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use polar_migrate_protocol::FileRead;

/// Observer invoked with the cumulative number of bytes accepted by storage.
///
/// Runs inline on the transfer task and cannot influence the upload.
pub type ProgressCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Observer invoked once with the finalized file record.
pub type UploadedCallback = Box<dyn Fn(&FileRead) + Send + Sync>;

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Turns cumulative progress reports into rate and ETA estimates.
///
/// Rate is averaged over a sliding window. The newest report older than the
/// window is kept as an anchor, so reports spaced wider than the window
/// still yield a rate.
pub struct ProgressMeter {
    total: u64,
    window: Duration,
    reports: Mutex<VecDeque<(Instant, u64)>>,
}

/// One progress report with the derived estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub uploaded: u64,
    pub total: u64,
    pub bytes_per_second: f64,
    pub eta: Option<Duration>,
}

impl ProgressMeter {
    /// Creates a meter for a transfer of `total` bytes, starting now.
    pub fn new(total: u64) -> Self {
        Self::with_window(total, DEFAULT_WINDOW)
    }

    pub fn with_window(total: u64, window: Duration) -> Self {
        Self::starting_at(total, window, Instant::now())
    }

    fn starting_at(total: u64, window: Duration, start: Instant) -> Self {
        Self {
            total,
            window,
            reports: Mutex::new(VecDeque::from([(start, 0)])),
        }
    }

    /// Records that `uploaded` bytes are done in total.
    pub fn record(&self, uploaded: u64) -> ProgressSnapshot {
        self.record_at(uploaded, Instant::now())
    }

    fn record_at(&self, uploaded: u64, now: Instant) -> ProgressSnapshot {
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.push_back((now, uploaded));

        if let Some(cutoff) = now.checked_sub(self.window) {
            while reports.len() > 2 && reports[1].0 <= cutoff {
                reports.pop_front();
            }
        }

        let bytes_per_second = match (reports.front(), reports.back()) {
            (Some(&(t0, b0)), Some(&(t1, b1))) if t1 > t0 => {
                b1.saturating_sub(b0) as f64 / t1.duration_since(t0).as_secs_f64()
            }
            _ => 0.0,
        };

        let remaining = self.total.saturating_sub(uploaded);
        let eta = if remaining == 0 {
            Some(Duration::ZERO)
        } else if bytes_per_second > 0.0 {
            Some(Duration::from_secs_f64(remaining as f64 / bytes_per_second))
        } else {
            None
        };

        ProgressSnapshot {
            uploaded,
            total: self.total,
            bytes_per_second,
            eta,
        }
    }
}

impl ProgressSnapshot {
    /// Completed share in `[0, 1]`. An empty transfer counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.uploaded as f64 / self.total as f64).min(1.0)
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({:.0}%), {}/s",
            format_bytes(self.uploaded),
            format_bytes(self.total),
            self.fraction() * 100.0,
            format_bytes(self.bytes_per_second as u64)
        )?;
        if let Some(eta) = self.eta {
            write!(f, ", eta {}s", eta.as_secs())?;
        }
        Ok(())
    }
}

/// Formats a byte count for progress lines (`512 B`, `1.5 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
