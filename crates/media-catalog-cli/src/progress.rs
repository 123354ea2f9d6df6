use indicatif::{ProgressBar, ProgressStyle};
use media_catalog_core::ProgressReporter;
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Collection phase: spinner (total unknown upfront)
/// - Metadata and hash phases: progress bars (total known)
/// - Reconciliation: checkpoint messages only, the merge is paced by the
///   database rather than by local work
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn counted_bar(&self, total: usize, label: &'static str) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(label);
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn advance(&self, done: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(done as u64);
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_collect_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message("Collecting media files...");
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_collect_complete(&self, files_found: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Collection complete: {} media files in {:.2}s",
            files_found, duration_secs
        );
    }

    fn on_metadata_start(&self, total: usize) {
        self.counted_bar(total, "Extracting metadata");
    }

    fn on_metadata_progress(&self, done: usize, _total: usize) {
        self.advance(done);
    }

    fn on_metadata_complete(&self, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Metadata extraction complete in {:.2}s",
            duration_secs
        );
    }

    fn on_hash_start(&self, total: usize) {
        self.counted_bar(total, "Fingerprinting");
    }

    fn on_hash_progress(&self, done: usize, _total: usize) {
        self.advance(done);
    }

    fn on_hash_complete(&self, hashed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Fingerprinting complete: {} files in {:.2}s",
            hashed, duration_secs
        );
    }

    fn on_reconcile_checkpoint(&self, inserted: usize, updated: usize) {
        eprintln!(
            "  \x1b[36m•\x1b[0m Checkpoint committed: {} inserted, {} updated so far",
            inserted, updated
        );
    }
}
