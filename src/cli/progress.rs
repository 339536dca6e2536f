//! Terminal progress display for downloads
//!
//! Renders an indicatif percent bar while a download runs. The bar is
//! suppressed in quiet mode and when stderr is not a terminal, so piped and
//! scripted invocations get plain completion lines only.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for one product download
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
    product_id: String,
}

impl DownloadProgress {
    /// Create a display; `quiet` disables the bar entirely
    pub fn new(product_id: &str, quiet: bool) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let bar = if quiet || !is_terminal {
            None
        } else {
            let bar = ProgressBar::new(100);
            bar.set_style(progress_style());
            bar.set_message(product_id.to_string());
            Some(bar)
        };

        Self {
            bar,
            product_id: product_id.to_string(),
        }
    }

    /// Update the displayed percent
    pub fn set_percent(&self, percent: f32) {
        if let Some(bar) = &self.bar {
            bar.set_position(percent.clamp(0.0, 100.0) as u64);
        }
    }

    /// Finish with a completed message
    pub fn finish_completed(&self) {
        match &self.bar {
            Some(bar) => bar.finish_with_message(format!("{} downloaded", self.product_id)),
            None => println!("{} downloaded", self.product_id),
        }
    }

    /// Finish after a cooperative cancel
    pub fn finish_cancelled(&self) {
        match &self.bar {
            Some(bar) => bar.abandon_with_message(format!("{} cancelled", self.product_id)),
            None => println!("{} cancelled", self.product_id),
        }
    }

    /// Finish after a transfer failure
    pub fn finish_failed(&self, error: &str) {
        match &self.bar {
            Some(bar) => {
                bar.abandon_with_message(format!("{} failed: {}", self.product_id, error))
            }
            None => eprintln!("{} failed: {}", self.product_id, error),
        }
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_style_template_is_valid() {
        // with_template returns Err on a malformed template; the fallback
        // should never be needed
        assert!(ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos:>3}%").is_ok());
    }

    #[test]
    fn test_quiet_mode_has_no_bar() {
        let progress = DownloadProgress::new("S1A_X", true);
        assert!(progress.bar.is_none());

        // Updating without a bar is a no-op, not a panic
        progress.set_percent(50.0);
    }
}
