//! Execution spaces for element-wise loops over array data.

use std::sync::OnceLock;

use axom_memory::env::env_value;
use axom_memory::{AllocatorId, Space};
use rayon::prelude::*;

/// Where a loop over array elements runs.
///
/// Loops over host memory run sequentially on the calling thread. Loops over
/// memory which is not host-accessible run as a data-parallel kernel, which
/// here is emulated by the [thread pool](thread_pool).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionSpace {
    /// Run on the calling thread.
    Sequential,

    /// Run across the execution thread pool.
    Parallel,
}

/// Minimum number of iterations given to a single task in parallel loops.
const MIN_TASK_LEN: usize = 1024;

impl ExecutionSpace {
    /// Choose the execution space for data owned by allocator `id`.
    pub fn for_allocator<S: Space>(id: AllocatorId) -> ExecutionSpace {
        if S::host_accessible(id) {
            ExecutionSpace::Sequential
        } else {
            ExecutionSpace::Parallel
        }
    }

    /// Call `f(i)` for each `i` in `0..n`.
    ///
    /// In the parallel space, calls happen concurrently and in no particular
    /// order.
    pub fn for_all<F: Fn(usize) + Send + Sync>(self, n: usize, f: F) {
        match self {
            ExecutionSpace::Sequential => (0..n).for_each(f),
            ExecutionSpace::Parallel => thread_pool().run(|| {
                (0..n)
                    .into_par_iter()
                    .with_min_len(MIN_TASK_LEN)
                    .for_each(f)
            }),
        }
    }
}

/// A wrapper around the Rayon thread pool used for parallel loops.
pub struct ThreadPool {
    /// The wrapped thread pool, or None if we failed to construct one.
    pool: Option<rayon::ThreadPool>,
}

impl ThreadPool {
    /// Run a function in the thread pool.
    ///
    /// If the pool could not be created, `op` runs on the calling thread.
    pub fn run<R: Send, Op: FnOnce() -> R + Send>(&self, op: Op) -> R {
        if let Some(pool) = self.pool.as_ref() {
            pool.install(op)
        } else {
            op()
        }
    }

    /// Create a thread pool with a given number of threads.
    pub fn with_num_threads(num_threads: usize) -> ThreadPool {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("axom-{}", index))
            .build();

        if let Err(err) = &pool {
            tracing::warn!("failed to create thread pool: {}", err);
        }

        ThreadPool { pool: pool.ok() }
    }

    /// Return the number of threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |pool| pool.current_num_threads())
    }
}

/// Return the number of threads to use when none is requested.
fn default_thread_count() -> usize {
    num_cpus::get_physical().max(1)
}

/// Return the thread pool used for parallel loops.
///
/// The thread count defaults to the number of physical cores. It can be set
/// with the `AXOM_NUM_THREADS` environment variable, whose value is clamped
/// to between 1 and the logical core count.
pub fn thread_pool() -> &'static ThreadPool {
    static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();
    THREAD_POOL.get_or_init(|| {
        let num_threads = match env_value::<usize>("AXOM_NUM_THREADS") {
            Some(n_threads) => n_threads.clamp(1, num_cpus::get()),
            None => default_thread_count(),
        };
        ThreadPool::with_num_threads(num_threads)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axom_memory::space::{Dynamic, Host};
    use axom_memory::{allocator_id, MemorySpace};

    use super::{default_thread_count, thread_pool, ExecutionSpace, ThreadPool};

    #[test]
    fn test_default_thread_count() {
        let count = default_thread_count();
        assert!(count >= 1 && count <= num_cpus::get_physical().max(1));
        assert!(thread_pool().num_threads() >= 1);
    }

    #[test]
    fn test_for_all() {
        for space in [ExecutionSpace::Sequential, ExecutionSpace::Parallel] {
            let sum = AtomicUsize::new(0);
            space.for_all(5000, |i| {
                sum.fetch_add(i, Ordering::Relaxed);
            });
            assert_eq!(sum.into_inner(), (0..5000).sum::<usize>());
        }
    }

    #[test]
    fn test_custom_pool() {
        let pool = ThreadPool::with_num_threads(2);
        assert_eq!(pool.num_threads(), 2);
        assert_eq!(pool.run(|| 42), 42);
    }

    #[test]
    fn test_for_allocator() {
        let host = allocator_id(MemorySpace::Host);
        assert_eq!(
            ExecutionSpace::for_allocator::<Host>(host),
            ExecutionSpace::Sequential
        );
        assert_eq!(
            ExecutionSpace::for_allocator::<Dynamic>(host),
            ExecutionSpace::Sequential
        );

        #[cfg(feature = "device")]
        {
            let device = allocator_id(MemorySpace::Device);
            assert_eq!(
                ExecutionSpace::for_allocator::<Dynamic>(device),
                ExecutionSpace::Parallel
            );
        }
    }
}
