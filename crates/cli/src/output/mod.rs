//! Output formatting
//!
//! Results go to stdout, as JSON with `--json`. Status lines and progress
//! bars go to stderr so JSON output stays machine readable.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::TransferProgress;

/// Global output flags
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub no_color: bool,
    pub quiet: bool,
}

impl OutputConfig {
    /// Progress bars for transfers, hidden for `--quiet` and `--json`
    pub fn progress(&self) -> TransferProgress {
        TransferProgress::new(self.quiet || self.json)
    }
}
