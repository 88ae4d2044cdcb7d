//! Parallel map over independent replication tasks.
//!
//! Each task owns its state (its random source included), so the batch needs
//! no synchronization: seeds are derived sequentially before dispatch and
//! results are collected afterwards, order-preserving. Built on a dedicated
//! rayon pool when the `rayon` feature is enabled, a plain sequential map
//! otherwise.

/// Run `f` over every task with up to `workers` threads and return the
/// results in task order.
///
/// `workers <= 1` always runs sequentially. The result *sequence* is
/// independent of the degree of parallelism.
#[cfg(feature = "rayon")]
pub fn run_parallel<T, R, F>(workers: usize, tasks: Vec<T>, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    use rayon::prelude::*;

    if workers <= 1 || tasks.len() <= 1 {
        return tasks.into_iter().map(f).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.min(tasks.len()))
        .build()
        .expect("failed to build replication thread pool");
    pool.install(|| tasks.into_par_iter().map(f).collect())
}

/// Sequential fallback when the `rayon` feature is disabled.
#[cfg(not(feature = "rayon"))]
pub fn run_parallel<T, R, F>(workers: usize, tasks: Vec<T>, f: F) -> Vec<R>
where
    F: Fn(T) -> R,
{
    let _ = workers;
    tasks.into_iter().map(f).collect()
}
