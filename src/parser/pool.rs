use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use rayon::prelude::*;

use super::facts::{ParseWorkerInput, ParseWorkerResult};
use super::run_parse_worker;

/// Progress callback for parsing: `(files processed, total files, label)`.
/// The label is the last file path of the batch, `"Parsing..."` at the start,
/// or `"done"` at the end. Progress is counted in files, never bytes.
pub type ParseProgress = dyn Fn(usize, usize, &str) + Send + Sync;

/// Files a worker processes between progress reports.
const DEFAULT_SUB_BATCH: usize = 10;

/// Abstract worker pool: splits the input set into per-worker chunks, runs
/// the worker body on each chunk, reports cumulative progress, and resolves
/// with one result per chunk.
///
/// Implementations may use OS threads, a thread pool, or separate processes,
/// provided parser state is not shared across workers and results are plain
/// data. A failed dispatch must leave the graph untouched — the coordinator
/// degrades to its sequential path.
pub trait WorkerPool: Send + Sync {
    fn dispatch(
        &self,
        items: Vec<ParseWorkerInput>,
        progress: Option<&ParseProgress>,
    ) -> Result<Vec<ParseWorkerResult>>;
}

/// Rayon-backed worker pool.
///
/// Each rayon worker owns its parsers through the thread-local map in
/// `parser::mod`, so no grammar state crosses threads. Within a worker,
/// files are processed in sub-batches and the shared progress counter is
/// bumped once per sub-batch.
pub struct RayonWorkerPool {
    workers: usize,
    sub_batch: usize,
}

impl RayonWorkerPool {
    pub fn new() -> Self {
        Self::with_workers(rayon::current_num_threads())
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            sub_batch: DEFAULT_SUB_BATCH,
        }
    }
}

impl Default for RayonWorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool for RayonWorkerPool {
    fn dispatch(
        &self,
        items: Vec<ParseWorkerInput>,
        progress: Option<&ParseProgress>,
    ) -> Result<Vec<ParseWorkerResult>> {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let chunk_size = total.div_ceil(self.workers);
        let processed = AtomicUsize::new(0);

        let results: Vec<ParseWorkerResult> = items
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut merged = ParseWorkerResult::default();
                for batch in chunk.chunks(self.sub_batch) {
                    for input in batch {
                        merged.merge(run_parse_worker(input));
                    }
                    let done = processed.fetch_add(batch.len(), Ordering::Relaxed) + batch.len();
                    if let Some(cb) = progress {
                        let label = batch.last().map(|i| i.path.as_str()).unwrap_or("Parsing...");
                        cb(done, total, label);
                    }
                }
                merged
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn inputs(n: usize) -> Vec<ParseWorkerInput> {
        (0..n)
            .map(|i| ParseWorkerInput::new(format!("f{i}.ts"), format!("export function fn{i}() {{}}")))
            .collect()
    }

    #[test]
    fn test_dispatch_returns_one_result_per_chunk() {
        let pool = RayonWorkerPool::with_workers(2);
        let results = pool.dispatch(inputs(6), None).unwrap();
        assert_eq!(results.len(), 2, "six files over two workers is two chunks");
        let symbols: usize = results.iter().map(|r| r.symbols.len()).sum();
        assert_eq!(symbols, 6);
    }

    #[test]
    fn test_dispatch_empty_input() {
        let pool = RayonWorkerPool::new();
        let results = pool.dispatch(Vec::new(), None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_progress_is_cumulative_and_complete() {
        let pool = RayonWorkerPool::with_workers(3);
        let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let progress = move |done: usize, total: usize, _label: &str| {
            seen_clone.lock().unwrap().push((done, total));
        };
        pool.dispatch(inputs(25), Some(&progress)).unwrap();

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|(_, total)| *total == 25));
        let max_done = seen.iter().map(|(done, _)| *done).max().unwrap();
        assert_eq!(max_done, 25, "final cumulative count must reach the total");
    }

    #[test]
    fn test_more_workers_than_files() {
        let pool = RayonWorkerPool::with_workers(16);
        let results = pool.dispatch(inputs(3), None).unwrap();
        let symbols: usize = results.iter().map(|r| r.symbols.len()).sum();
        assert_eq!(symbols, 3);
    }
}
