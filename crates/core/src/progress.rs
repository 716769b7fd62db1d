//! Transfer progress and ETA estimation
//!
//! [`ProgressEstimator`] turns `(bytes_transmitted, bytes_total)` samples into
//! a percentage, a 20 segment bar position, interval and average throughput,
//! and an ETA smoothed over the last five interval estimates. Drawing is left
//! to a [`TransferMonitor`] supplied by the caller.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

/// Number of segments in the progress bar
pub const BAR_WIDTH: u64 = 20;

/// Number of interval ETAs averaged for the displayed ETA
pub const ETA_WINDOW: usize = 5;

/// Receives byte counts while an object or part is transferred
pub trait ProgressSink: Send + Sync {
    fn update(&self, bytes_transmitted: u64, bytes_total: u64);

    /// Reset timing state before measuring a new file or part
    fn rearm(&self) {}

    /// The transfer this sink was tracking has completed
    fn finish(&self) {}
}

/// Which way bytes are moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Download => write!(f, "Downloading"),
            Direction::Upload => write!(f, "Uploading"),
        }
    }
}

/// Announces each file a transfer moves and hands out its progress sink
pub trait TransferMonitor: Send + Sync {
    fn begin(&self, direction: Direction, source: &str, destination: &str)
    -> Box<dyn ProgressSink>;
}

/// Bounded moving average over interval ETAs
#[derive(Debug, Clone, Default)]
pub struct EtaWindow {
    samples: VecDeque<u64>,
}

impl EtaWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(ETA_WINDOW + 1),
        }
    }

    /// Push a sample, evicting the oldest beyond [`ETA_WINDOW`], and return the mean
    pub fn push(&mut self, eta_secs: u64) -> u64 {
        self.samples.push_back(eta_secs);
        while self.samples.len() > ETA_WINDOW {
            self.samples.pop_front();
        }
        self.mean()
    }

    pub fn mean(&self) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }
        self.samples.iter().sum::<u64>() / self.samples.len() as u64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Result of one estimator update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: u64,
    pub step: u64,
    pub bytes_total: u64,
    /// Bytes per second since the previous update
    pub interval_bps: f64,
    /// Bytes per second since the estimator was armed
    pub average_bps: f64,
    /// Smoothed ETA in seconds
    pub eta_secs: u64,
}

/// Stateful throughput and ETA estimator
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    start: Instant,
    prev_time: Instant,
    prev_bytes: u64,
    etas: EtaWindow,
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            prev_time: now,
            prev_bytes: 0,
            etas: EtaWindow::new(),
        }
    }

    /// Reset the timing baseline and ETA history
    pub fn rearm(&mut self) {
        self.rearm_at(Instant::now());
    }

    pub fn rearm_at(&mut self, now: Instant) {
        *self = Self::starting_at(now);
    }

    pub fn update(&mut self, bytes_transmitted: u64, bytes_total: u64) -> ProgressSnapshot {
        self.update_at(bytes_transmitted, bytes_total, Instant::now())
    }

    pub fn update_at(
        &mut self,
        bytes_transmitted: u64,
        bytes_total: u64,
        now: Instant,
    ) -> ProgressSnapshot {
        let ratio = if bytes_total == 0 {
            1.0
        } else {
            bytes_transmitted as f64 / bytes_total as f64
        };
        let percent = (ratio * 100.0).round() as u64;
        let step = ((ratio * BAR_WIDTH as f64).round() as u64).min(BAR_WIDTH);

        let interval = now.saturating_duration_since(self.prev_time).as_secs_f64();
        let interval_bps = if interval > 0.0 {
            bytes_transmitted.saturating_sub(self.prev_bytes) as f64 / interval
        } else {
            0.0
        };

        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let average_bps = if elapsed > 0.0 {
            bytes_transmitted as f64 / elapsed
        } else {
            0.0
        };

        // Sub-byte rates are noise; treat them as stalled
        let interval_eta = if interval_bps < 1.0 {
            0
        } else {
            (bytes_total.saturating_sub(bytes_transmitted) as f64 / interval_bps) as u64
        };
        let eta_secs = self.etas.push(interval_eta);

        self.prev_bytes = bytes_transmitted;
        self.prev_time = now;

        ProgressSnapshot {
            percent,
            step,
            bytes_total,
            interval_bps,
            average_bps,
            eta_secs,
        }
    }
}

/// Format seconds as `HH:MM:SS`
pub fn format_eta(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
