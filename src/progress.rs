use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Receives `(message, fraction)` checkpoints from a crawl.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, message: &str, fraction: f64);
}

impl<F> ProgressReporter for F
where
    F: Fn(&str, f64) + Send + Sync,
{
    fn report(&self, message: &str, fraction: f64) {
        self(message, fraction)
    }
}

/// Discards everything.
pub struct Silent;

impl ProgressReporter for Silent {
    fn report(&self, _message: &str, _fraction: f64) {}
}

const BAR_LEN: u64 = 1000;

pub fn bar() -> ProgressBar {
    let pb = ProgressBar::new(BAR_LEN);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

impl ProgressReporter for ProgressBar {
    fn report(&self, message: &str, fraction: f64) {
        self.set_message(message.to_string());
        self.set_position((fraction * BAR_LEN as f64).round() as u64);
    }
}

/// Clamps to [0, 1] and never lets the reported fraction go backwards.
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressReporter,
    last: Mutex<f64>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressReporter) -> Self {
        Self {
            sink,
            last: Mutex::new(0.0),
        }
    }

    pub fn report(&self, message: &str, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let value = {
            let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
            *last = last.max(fraction);
            *last
        };
        self.sink.report(message, value);
    }
}

/// Where a crawl checkpoint sits on the bar: each page owns `1/max_pages`,
/// the first half for fetching and scanning, the second half for enrichment.
pub struct PageBudget {
    pub page: u32,
    pub max_pages: u32,
}

impl PageBudget {
    fn share(&self) -> f64 {
        1.0 / self.max_pages.max(1) as f64
    }

    fn offset(&self) -> f64 {
        self.page.saturating_sub(1) as f64 * self.share()
    }

    pub fn fetch_start(&self) -> f64 {
        self.offset()
    }

    pub fn scanned(&self) -> f64 {
        self.offset() + self.share() / 2.0
    }

    /// After enriching block `idx` (0-based) of `total`.
    pub fn enriched(&self, idx: usize, total: usize) -> f64 {
        let done = (idx + 1) as f64 / total.max(1) as f64;
        self.scanned() + self.share() / 2.0 * done
    }

    pub fn page_done(&self) -> f64 {
        self.offset() + self.share()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<f64>>);

    impl ProgressReporter for Recorder {
        fn report(&self, _message: &str, fraction: f64) {
            self.0.lock().unwrap().push(fraction);
        }
    }

    #[test]
    fn tracker_clamps_and_is_monotonic() {
        let rec = Recorder::default();
        let tracker = ProgressTracker::new(&rec);
        for v in [0.2, 0.1, -3.0, 0.5, f64::NAN, 7.0, 0.9] {
            tracker.report("x", v);
        }
        let seen = rec.0.lock().unwrap().clone();
        assert_eq!(seen, vec![0.2, 0.2, 0.2, 0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn budget_is_ordered_across_pages() {
        let max_pages = 3;
        let mut points = Vec::new();
        for page in 1..=max_pages {
            let b = PageBudget { page, max_pages };
            points.push(b.fetch_start());
            points.push(b.scanned());
            for i in 0..4 {
                points.push(b.enriched(i, 4));
            }
            points.push(b.page_done());
        }
        assert!(points.windows(2).all(|w| w[0] <= w[1] + 1e-12));
        assert!((points.last().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(points[0], 0.0);
    }

    #[test]
    fn closures_are_reporters() {
        let seen = Mutex::new(Vec::new());
        let cb = |msg: &str, f: f64| seen.lock().unwrap().push((msg.to_string(), f));
        cb.report("page 1", 0.25);
        assert_eq!(seen.lock().unwrap()[0], ("page 1".to_string(), 0.25));
    }
}
