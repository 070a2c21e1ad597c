//! Runtime context threaded through every counting call.
//!
//! A [`RuntimeContext`] owns the worker pool, the result cache and the
//! feature flags of one analysis run. There is no global state: two contexts
//! never share a pool or a cache.
//!
//! Work is distributed with [`RuntimeContext::map_reduce`]. Tasks are mapped
//! in parallel on the pool (or on the calling thread when the context has no
//! pool) and the partial results are reduced in task order, so the parallel
//! and sequential modes produce identical results. On a pool, tasks run in
//! batches of a few per worker and each batch is reduced before the next
//! starts, so at most one batch of partials is alive at a time.

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::debug;

use crate::cache::CountCache;
use crate::config::RuntimeConfig;
use crate::error::CountingResult;

/// Tasks mapped per worker thread before their partials are reduced.
const TASKS_PER_WORKER: usize = 4;

/// Feature flags of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeFlags {
    /// Reuse results of identical sub-computations.
    pub memoize: bool,
    /// Number of count entries per convolution task.
    pub chunk_size: usize,
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        let config = RuntimeConfig::default();
        Self {
            memoize: config.memoize,
            chunk_size: config.chunk_size,
        }
    }
}

/// Worker pool, cache and flags for one analysis run.
#[derive(Debug)]
pub struct RuntimeContext {
    pool: Option<ThreadPool>,
    cache: CountCache,
    flags: RuntimeFlags,
}

impl RuntimeContext {
    /// Build a context from configuration. `workers = 0` gives a context
    /// without a pool.
    pub fn new(config: &RuntimeConfig) -> CountingResult<Self> {
        let pool = if config.workers == 0 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.workers)
                    .thread_name(|i| format!("qfault-worker-{i}"))
                    .build()?,
            )
        };
        debug!(workers = config.workers, chunk_size = config.chunk_size, "Runtime context created");
        Ok(Self {
            pool,
            cache: CountCache::new(),
            flags: RuntimeFlags {
                memoize: config.memoize,
                chunk_size: config.chunk_size.max(1),
            },
        })
    }

    /// A context that runs every task on the calling thread.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            cache: CountCache::new(),
            flags: RuntimeFlags::default(),
        }
    }

    /// A context with a pool of `workers` threads and default flags.
    pub fn with_workers(workers: usize) -> CountingResult<Self> {
        Self::new(&RuntimeConfig {
            workers,
            ..RuntimeConfig::default()
        })
    }

    /// Replace the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = RuntimeFlags {
            chunk_size: flags.chunk_size.max(1),
            ..flags
        };
        self
    }

    /// True if tasks run on a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Number of worker threads (0 without a pool).
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(0, ThreadPool::current_num_threads)
    }

    /// The result cache.
    pub fn cache(&self) -> &CountCache {
        &self.cache
    }

    /// The feature flags.
    pub fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    /// Map every task and fold the partial results into `init` in task order.
    ///
    /// The first failing task (in task order) aborts the whole computation.
    pub fn map_reduce<T, P, M, R>(&self, tasks: &[T], init: P, map: M, reduce: R) -> CountingResult<P>
    where
        T: Sync,
        P: Send,
        M: Fn(&T) -> CountingResult<P> + Sync + Send,
        R: Fn(P, P) -> P,
    {
        match &self.pool {
            Some(pool) => {
                let batch = pool.current_num_threads().max(1) * TASKS_PER_WORKER;
                let mut partials: Vec<CountingResult<P>> = Vec::with_capacity(batch);
                let mut acc = init;
                for chunk in tasks.chunks(batch) {
                    pool.install(|| chunk.par_iter().map(&map).collect_into_vec(&mut partials));
                    for partial in partials.drain(..) {
                        acc = reduce(acc, partial?);
                    }
                }
                Ok(acc)
            }
            None => tasks
                .iter()
                .try_fold(init, |acc, task| Ok(reduce(acc, map(task)?))),
        }
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::sequential()
    }
}
