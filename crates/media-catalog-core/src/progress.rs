/// Progress reporting seam between the pipeline and its front end.
///
/// The CLI implements this with tracing/indicatif; tests run silent.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_collect_start(&self) {}
    fn on_collect_complete(&self, _files_found: usize, _duration_secs: f64) {}
    fn on_metadata_start(&self, _total: usize) {}
    fn on_metadata_progress(&self, _done: usize, _total: usize) {}
    fn on_metadata_complete(&self, _duration_secs: f64) {}
    fn on_hash_start(&self, _total: usize) {}
    fn on_hash_progress(&self, _done: usize, _total: usize) {}
    fn on_hash_complete(&self, _hashed: usize, _duration_secs: f64) {}
    fn on_reconcile_checkpoint(&self, _inserted: usize, _updated: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// How many items pass between progress reports. Small runs report often,
/// large runs stay quiet enough to keep logs readable.
pub fn report_step(total: usize) -> usize {
    let step = if total < 1_000 {
        total / 25
    } else if total < 10_000 {
        total / 125
    } else {
        total / 500
    };
    step.max(1)
}
