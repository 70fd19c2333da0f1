use std::time::Instant;

/// Runs a blocking store call on the UI thread, tracing how long it held the loop.
pub fn run_blocking<F, T>(label: &'static str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let result = f();
    tracing::debug!(
        operation = label,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "blocking call finished"
    );
    result
}
