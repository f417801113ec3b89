// src/processing/parallel.rs
use std::thread;

use parking_lot::Mutex;

use super::analysis::{run_analysis, Analysis, AnalysisRequest};
use crate::config::EstimatorConfig;
use crate::error::{Error, Result};

/// Finished outcomes by request index, plus how many have finished
struct Progress {
    slots: Vec<Option<Result<Analysis>>>,
    finished: usize,
}

/// Runs independent lake assessments on a fixed pool of worker threads
pub struct ParallelProcessor {
    workers: usize,
}

impl ParallelProcessor {
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers.unwrap_or_else(num_cpus::get).max(1);
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn process(
        &self,
        requests: &[AnalysisRequest],
        config: &EstimatorConfig,
    ) -> Vec<Result<Analysis>> {
        self.process_with(requests, config, |_, _, _| {})
    }

    /// Results come back in request order. `on_done(index, finished, outcome)`
    /// is called as each assessment finishes, one call at a time, with
    /// `finished` counting completions so far (1-based).
    pub fn process_with<F>(
        &self,
        requests: &[AnalysisRequest],
        config: &EstimatorConfig,
        on_done: F,
    ) -> Vec<Result<Analysis>>
    where
        F: Fn(usize, usize, &Result<Analysis>) + Sync,
    {
        let progress = Mutex::new(Progress {
            slots: (0..requests.len()).map(|_| None).collect(),
            finished: 0,
        });

        let (job_tx, job_rx) = flume::unbounded::<(usize, &AnalysisRequest)>();
        for job in requests.iter().enumerate() {
            // The receiver is alive until the scope below ends
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let threads = self.workers.min(requests.len().max(1));
        log::debug!("running {} assessment(s) on {} worker(s)", requests.len(), threads);

        thread::scope(|scope| {
            for _ in 0..threads {
                let job_rx = job_rx.clone();
                let progress = &progress;
                let on_done = &on_done;
                scope.spawn(move || {
                    for (idx, request) in job_rx {
                        let outcome = run_analysis(request, config);
                        let mut progress = progress.lock();
                        progress.finished += 1;
                        on_done(idx, progress.finished, &outcome);
                        progress.slots[idx] = Some(outcome);
                    }
                });
            }
        });

        progress
            .into_inner()
            .slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    Err(Error::InvalidInput(format!(
                        "request {} was never processed",
                        idx + 1
                    )))
                })
            })
            .collect()
    }
}
