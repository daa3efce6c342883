//! Bounded rayon pools for the fan-out stages.

use rayon::ThreadPoolBuilder;

/// Default worker multiplier applied to the CPU count.
pub const WORKERS_PER_CPU: usize = 2;

/// Pick a worker count: the configured value if any, otherwise
/// `CPUs × WORKERS_PER_CPU`, never more than `items` and never zero.
#[must_use]
pub fn worker_count(configured: Option<usize>, items: usize) -> usize {
    let ceiling = configured.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            * WORKERS_PER_CPU
    });
    ceiling.min(items).max(1)
}

/// Run `op` inside a dedicated pool of `threads` workers.
///
/// Parallel iterators started inside `op` are bounded by that pool, which
/// caps the number of files open at once. If the pool cannot be built the
/// work runs on the global pool instead.
pub(crate) fn run_bounded<OP, R>(threads: usize, op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match ThreadPoolBuilder::new().num_threads(threads.max(1)).build() {
        Ok(pool) => pool.install(op),
        Err(e) => {
            log::warn!(
                "Failed to create worker pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            op()
        }
    }
}
