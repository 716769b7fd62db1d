//! Transfer progress bars
//!
//! Each file gets an `indicatif` bar on stderr. Percentage and fill come from
//! the bar's position; the message carries the size, the rate over the last
//! interval and the ETA smoothed by [`ProgressEstimator`].

use std::sync::Mutex;

use humansize::{FormatSizeOptions, WINDOWS, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use s3u_core::progress::{BAR_WIDTH, ProgressSnapshot, format_eta};
use s3u_core::{Direction, ProgressEstimator, ProgressSink, TransferMonitor};

/// Binary base with short units and no space, e.g. `1.5kB`
fn size_options() -> FormatSizeOptions {
    FormatSizeOptions::from(WINDOWS)
        .decimal_places(1)
        .space_after_value(false)
}

pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, size_options())
}

/// `1.5GB   12.3MB/s  eta: 00:01:05`
pub fn progress_message(snapshot: &ProgressSnapshot) -> String {
    format!(
        "{}   {}/s  eta: {}",
        format_bytes(snapshot.bytes_total),
        format_bytes(snapshot.interval_bps as u64),
        format_eta(snapshot.eta_secs)
    )
}

fn bar_style() -> ProgressStyle {
    let template = format!("  {{percent:>3}}% [{{bar:{BAR_WIDTH}}}] {{msg}}");
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Draws one bar per transferred file, or nothing when hidden
#[derive(Debug, Clone, Copy)]
pub struct TransferProgress {
    hidden: bool,
}

impl TransferProgress {
    pub fn new(hidden: bool) -> Self {
        Self { hidden }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

impl TransferMonitor for TransferProgress {
    fn begin(
        &self,
        direction: Direction,
        source: &str,
        destination: &str,
    ) -> Box<dyn ProgressSink> {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(bar_style());
        bar.println(format!("{direction}: '{source}'"));
        bar.println(format!("Destination: '{destination}'"));
        Box::new(BarSink::new(bar))
    }
}

/// [`ProgressSink`] feeding estimator snapshots into a progress bar
pub struct BarSink {
    bar: ProgressBar,
    estimator: Mutex<ProgressEstimator>,
}

impl BarSink {
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            estimator: Mutex::new(ProgressEstimator::new()),
        }
    }
}

impl ProgressSink for BarSink {
    fn update(&self, bytes_transmitted: u64, bytes_total: u64) {
        let snapshot = self
            .estimator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .update(bytes_transmitted, bytes_total);
        tracing::trace!(
            percent = snapshot.percent,
            eta_secs = snapshot.eta_secs,
            "Transfer progress"
        );
        self.bar.set_length(bytes_total);
        self.bar.set_position(bytes_transmitted);
        self.bar.set_message(progress_message(&snapshot));
    }

    fn rearm(&self) {
        self.estimator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .rearm();
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_binary_units() {
        let size = format_bytes(1536);
        assert!(size.starts_with("1.5"), "got {size}");
        assert!(size.to_uppercase().ends_with("KB"), "got {size}");
        assert!(!size.contains(' '), "got {size}");
        assert!(format_bytes(5 * 1024 * 1024).ends_with("MB"));
    }

    #[test]
    fn test_progress_message() {
        let snapshot = ProgressSnapshot {
            percent: 25,
            step: 5,
            bytes_total: 2048,
            interval_bps: 1536.0,
            average_bps: 1024.0,
            eta_secs: 65,
        };
        let message = progress_message(&snapshot);
        assert!(message.starts_with("2"), "got {message}");
        assert!(message.to_uppercase().contains("KB/S"), "got {message}");
        assert!(message.ends_with("eta: 00:01:05"), "got {message}");
    }

    #[test]
    fn test_bar_sink_tracks_position_and_length() {
        let sink = BarSink::new(ProgressBar::hidden());
        sink.update(50, 200);
        assert_eq!(sink.bar.position(), 50);
        assert_eq!(sink.bar.length(), Some(200));
        assert!(sink.bar.message().contains("eta: "));

        sink.rearm();
        sink.update(200, 200);
        sink.finish();
        assert!(sink.bar.is_finished());
        assert_eq!(sink.bar.position(), 200);
    }

    #[test]
    fn test_hidden_progress_still_hands_out_sinks() {
        let progress = TransferProgress::new(true);
        assert!(progress.is_hidden());
        let sink = progress.begin(Direction::Upload, "a.txt", "bucket/a.txt");
        sink.update(1, 2);
        sink.finish();
    }
}
