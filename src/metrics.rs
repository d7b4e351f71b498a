use tracing::trace;

// Trace-based stage timing and row counters.

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "seosheet.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}

pub fn rows_processed(count: usize) {
    trace!(
        target = "seosheet.metrics",
        count = count,
        "rows_processed_total"
    );
}
