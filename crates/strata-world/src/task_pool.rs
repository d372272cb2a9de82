//! A fixed pool of named worker threads with at-most-one-outstanding-job
//! per key.
//!
//! The pool is driven entirely from the owning (main) context: jobs are
//! queued with [`TaskPool::push`], handed to idle workers by
//! [`TaskPool::assign`], and their outputs are collected by
//! [`TaskPool::poll`]. Workers never touch shared world state; whatever a job
//! needs is moved into it, typically by the dispatch hook passed to `assign`.
//!
//! A handler that panics does not take its worker down. The panic is caught,
//! the job's slot and key are freed at the next `poll`, and the key is
//! reported by [`TaskPool::take_failed`].

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;

/// A unit of work for a [`TaskPool`].
pub trait Job: Send + 'static {
    /// Identity used to suppress duplicate submissions.
    type Key: Copy + Eq + Hash + fmt::Debug + Send + 'static;
    /// What the worker hands back.
    type Output: Send + 'static;

    /// Jobs sharing a key never run or wait concurrently. `None` opts out.
    fn idempotency_key(&self) -> Option<Self::Key>;
}

/// The function every worker of a pool runs on its jobs.
pub type Handler<J> = Arc<dyn Fn(J) -> <J as Job>::Output + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyState {
    Queued,
    InFlight { worker: usize },
}

/// Worker index recorded for jobs run inline by a zero-thread pool.
const INLINE_WORKER: usize = usize::MAX;

struct Completion<J: Job> {
    worker: usize,
    key: Option<J::Key>,
    /// `None` if the handler panicked.
    output: Option<J::Output>,
}

fn run_caught<J: Job>(handler: &Handler<J>, job: J) -> Option<J::Output> {
    catch_unwind(AssertUnwindSafe(|| handler(job))).ok()
}

struct WorkerSlot<J: Job> {
    sender: Option<Sender<J>>,
    handle: Option<JoinHandle<()>>,
    busy: bool,
}

/// Worker pool for one kind of job.
pub struct TaskPool<J: Job> {
    kind: String,
    handler: Handler<J>,
    queue: VecDeque<J>,
    keys: FxHashMap<J::Key, KeyState>,
    workers: Vec<WorkerSlot<J>>,
    completions: Receiver<Completion<J>>,
    /// Outputs of jobs run inline by a zero-thread pool.
    inline_outputs: Vec<Completion<J>>,
    /// Keys of jobs whose handler panicked, not yet taken.
    failed: Vec<J::Key>,
}

impl<J: Job> TaskPool<J> {
    /// Spawns `threads` workers named `strata-<kind>-<n>`.
    ///
    /// With zero threads, jobs run inline inside [`assign`](Self::assign).
    pub fn new(kind: &str, threads: usize, handler: Handler<J>) -> io::Result<Self> {
        let (completion_sender, completions) = crossbeam_channel::unbounded();
        let mut workers = Vec::with_capacity(threads);

        for index in 0..threads {
            let (sender, receiver) = crossbeam_channel::unbounded::<J>();
            let done = completion_sender.clone();
            let run = Arc::clone(&handler);
            let handle = std::thread::Builder::new()
                .name(format!("strata-{kind}-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let key = job.idempotency_key();
                        let output = run_caught(&run, job);
                        if done
                            .send(Completion {
                                worker: index,
                                key,
                                output,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                })?;
            workers.push(WorkerSlot {
                sender: Some(sender),
                handle: Some(handle),
                busy: false,
            });
        }

        tracing::debug!(kind, threads, "task pool started");
        Ok(Self {
            kind: kind.to_string(),
            handler,
            queue: VecDeque::new(),
            keys: FxHashMap::default(),
            workers,
            completions,
            inline_outputs: Vec::new(),
            failed: Vec::new(),
        })
    }

    /// Name used for the worker threads.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of worker threads; zero for an inline pool.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job. Returns false, dropping the job, if a job with the same
    /// key is already queued or in flight.
    pub fn push(&mut self, job: J) -> bool {
        if let Some(key) = job.idempotency_key() {
            if self.keys.contains_key(&key) {
                return false;
            }
            self.keys.insert(key, KeyState::Queued);
        }
        self.queue.push_back(job);
        true
    }

    /// Drops every queued job and frees its key. In-flight jobs are untouched.
    pub fn clear_queue(&mut self) {
        for job in self.queue.drain(..) {
            if let Some(key) = job.idempotency_key() {
                self.keys.remove(&key);
            }
        }
    }

    /// Hands queued jobs to idle workers in FIFO order.
    ///
    /// `on_dispatch` runs on each job in the calling context right before it
    /// leaves the queue. A zero-thread pool runs every queued job inline here.
    pub fn assign(&mut self, mut on_dispatch: impl FnMut(&mut J)) {
        if self.workers.is_empty() {
            while let Some(mut job) = self.queue.pop_front() {
                on_dispatch(&mut job);
                let key = job.idempotency_key();
                if let Some(key) = key {
                    self.keys.insert(key, KeyState::InFlight { worker: INLINE_WORKER });
                }
                let output = run_caught(&self.handler, job);
                self.inline_outputs.push(Completion {
                    worker: INLINE_WORKER,
                    key,
                    output,
                });
            }
            return;
        }

        for index in 0..self.workers.len() {
            let slot = &self.workers[index];
            let Some(sender) = slot.sender.as_ref().filter(|_| !slot.busy) else {
                continue;
            };
            let Some(mut job) = self.queue.pop_front() else {
                break;
            };
            on_dispatch(&mut job);
            let key = job.idempotency_key();
            if sender.send(job).is_err() {
                tracing::error!(kind = %self.kind, worker = index, "worker thread is gone, job dropped");
                if let Some(key) = key {
                    self.keys.remove(&key);
                }
                continue;
            }
            if let Some(key) = key {
                self.keys.insert(key, KeyState::InFlight { worker: index });
            }
            self.workers[index].busy = true;
        }
    }

    /// Collects finished outputs, freeing their workers and keys.
    ///
    /// Jobs whose handler panicked produce no output; their keys are freed
    /// here and queued for [`take_failed`](Self::take_failed).
    pub fn poll(&mut self) -> Vec<J::Output> {
        let mut done: Vec<Completion<J>> = self.inline_outputs.drain(..).collect();
        done.extend(self.completions.try_iter());

        let mut outputs = Vec::with_capacity(done.len());
        for completion in done {
            if let Some(slot) = self.workers.get_mut(completion.worker) {
                slot.busy = false;
            }
            if let Some(key) = completion.key
                && self.keys.get(&key) == Some(&KeyState::InFlight { worker: completion.worker })
            {
                self.keys.remove(&key);
            }
            match completion.output {
                Some(output) => outputs.push(output),
                None => {
                    tracing::error!(
                        kind = %self.kind,
                        key = ?completion.key,
                        "job handler panicked, job dropped"
                    );
                    self.failed.extend(completion.key);
                }
            }
        }
        outputs
    }

    /// Keys of jobs whose handler panicked since the last call.
    pub fn take_failed(&mut self) -> Vec<J::Key> {
        std::mem::take(&mut self.failed)
    }

    /// Number of jobs waiting for a worker.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of jobs running, plus inline outputs not yet polled.
    pub fn in_flight_count(&self) -> usize {
        self.workers.iter().filter(|slot| slot.busy).count() + self.inline_outputs.len()
    }

    /// Whether nothing is queued, running, or waiting to be polled.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight_count() == 0
    }

    /// Whether `key` is queued or in flight.
    pub fn is_pending(&self, key: &J::Key) -> bool {
        self.keys.contains_key(key)
    }

    /// Whether a job for `key` has left the queue and not been polled yet.
    pub fn is_in_flight(&self, key: &J::Key) -> bool {
        matches!(self.keys.get(key), Some(KeyState::InFlight { .. }))
    }

    /// Stops the workers and joins their threads. Queued jobs are dropped;
    /// jobs already running finish first.
    pub fn shutdown(&mut self) {
        self.clear_queue();
        for slot in &mut self.workers {
            slot.sender.take();
        }
        for slot in &mut self.workers {
            if let Some(handle) = slot.handle.take()
                && handle.join().is_err()
            {
                tracing::error!(kind = %self.kind, "worker thread panicked");
            }
        }
    }
}

impl<J: Job> Drop for TaskPool<J> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<J: Job> fmt::Debug for TaskPool<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPool")
            .field("kind", &self.kind)
            .field("threads", &self.workers.len())
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Debug)]
    struct Square {
        key: Option<u32>,
        value: u64,
        gate: Option<Arc<Mutex<()>>>,
    }

    impl Job for Square {
        type Key = u32;
        type Output = (Option<u32>, u64);

        fn idempotency_key(&self) -> Option<u32> {
            self.key
        }
    }

    fn handler() -> Handler<Square> {
        Arc::new(|job: Square| {
            if let Some(gate) = &job.gate {
                let _held = gate.lock().unwrap();
            }
            (job.key, job.value * job.value)
        })
    }

    fn job(key: u32, value: u64) -> Square {
        Square {
            key: Some(key),
            value,
            gate: None,
        }
    }

    fn poll_until(pool: &mut TaskPool<Square>, count: usize) -> Vec<(Option<u32>, u64)> {
        let mut outputs = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while outputs.len() < count && Instant::now() < deadline {
            outputs.extend(pool.poll());
            pool.assign(|_| {});
            std::thread::sleep(Duration::from_millis(2));
        }
        outputs
    }

    #[test]
    fn test_runs_jobs_on_workers() {
        let mut pool = TaskPool::new("test", 2, handler()).unwrap();
        for i in 0..10 {
            assert!(pool.push(job(i, i as u64)));
        }
        pool.assign(|_| {});
        let mut outputs = poll_until(&mut pool, 10);
        outputs.sort();
        assert_eq!(outputs.len(), 10);
        assert_eq!(outputs[3], (Some(3), 9));
        assert!(pool.is_idle());
    }

    #[test]
    fn test_duplicate_key_rejected_until_complete() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();

        let mut pool = TaskPool::new("test", 1, handler()).unwrap();
        let gated = Square {
            key: Some(7),
            value: 2,
            gate: Some(Arc::clone(&gate)),
        };
        assert!(pool.push(gated));
        assert!(!pool.push(job(7, 2)));

        pool.assign(|_| {});
        assert_eq!(pool.in_flight_count(), 1);
        // Still rejected while in flight.
        assert!(!pool.push(job(7, 2)));
        assert!(pool.is_pending(&7));

        drop(held);
        let outputs = poll_until(&mut pool, 1);
        assert_eq!(outputs, vec![(Some(7), 4)]);
        assert!(!pool.is_pending(&7));
        // Accepted again after completion.
        assert!(pool.push(job(7, 3)));
    }

    #[test]
    fn test_unkeyed_jobs_never_deduplicated() {
        let mut pool = TaskPool::new("test", 0, handler()).unwrap();
        for _ in 0..3 {
            assert!(pool.push(Square {
                key: None,
                value: 5,
                gate: None,
            }));
        }
        assert_eq!(pool.queued_len(), 3);
    }

    #[test]
    fn test_clear_queue_frees_keys() {
        let mut pool = TaskPool::new("test", 1, handler()).unwrap();
        assert!(pool.push(job(1, 1)));
        assert!(pool.push(job(2, 2)));
        pool.clear_queue();
        assert_eq!(pool.queued_len(), 0);
        assert!(pool.push(job(1, 1)));
        assert!(pool.push(job(2, 2)));
    }

    #[test]
    fn test_clear_queue_leaves_in_flight() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();

        let mut pool = TaskPool::new("test", 1, handler()).unwrap();
        pool.push(Square {
            key: Some(1),
            value: 3,
            gate: Some(Arc::clone(&gate)),
        });
        pool.push(job(2, 4));
        pool.assign(|_| {});
        pool.clear_queue();
        assert!(pool.is_pending(&1));
        assert!(!pool.is_pending(&2));

        drop(held);
        let outputs = poll_until(&mut pool, 1);
        assert_eq!(outputs, vec![(Some(1), 9)]);
    }

    #[test]
    fn test_inline_pool_delivers_on_next_poll() {
        let mut pool = TaskPool::new("inline", 0, handler()).unwrap();
        assert_eq!(pool.thread_count(), 0);
        pool.push(job(1, 6));
        pool.push(job(2, 7));
        assert!(pool.poll().is_empty());

        pool.assign(|_| {});
        assert_eq!(pool.queued_len(), 0);
        assert!(!pool.push(job(1, 6)));

        let outputs = pool.poll();
        assert_eq!(outputs, vec![(Some(1), 36), (Some(2), 49)]);
        assert!(pool.is_idle());
        assert!(pool.push(job(1, 6)));
    }

    #[test]
    fn test_dispatch_hook_sees_each_job_in_order() {
        let mut pool = TaskPool::new("inline", 0, handler()).unwrap();
        for i in 0..4 {
            pool.push(job(i, 1));
        }
        let mut seen = Vec::new();
        pool.assign(|job| {
            seen.push(job.key);
            job.value = 10;
        });
        assert_eq!(seen, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert!(pool.poll().iter().all(|(_, v)| *v == 100));
    }

    #[test]
    fn test_assign_respects_idle_workers() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();

        let mut pool = TaskPool::new("test", 2, handler()).unwrap();
        for i in 0..5 {
            pool.push(Square {
                key: Some(i),
                value: 1,
                gate: Some(Arc::clone(&gate)),
            });
        }
        pool.assign(|_| {});
        assert_eq!(pool.in_flight_count(), 2);
        assert_eq!(pool.queued_len(), 3);

        drop(held);
        let outputs = poll_until(&mut pool, 5);
        assert_eq!(outputs.len(), 5);
    }

    fn panics_on_zero() -> Handler<Square> {
        Arc::new(|job: Square| {
            assert_ne!(job.value, 0, "zero is not allowed");
            (job.key, job.value * job.value)
        })
    }

    #[test]
    fn test_panicking_job_frees_key() {
        let mut pool = TaskPool::new("test", 1, panics_on_zero()).unwrap();
        assert!(pool.push(job(7, 0)));
        pool.assign(|_| {});

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outputs = Vec::new();
        let mut failed = Vec::new();
        while failed.is_empty() && Instant::now() < deadline {
            outputs.extend(pool.poll());
            failed.extend(pool.take_failed());
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(outputs.is_empty());
        assert_eq!(failed, vec![7]);
        assert!(!pool.is_pending(&7));
        assert!(pool.is_idle());
        assert!(pool.take_failed().is_empty());

        // The worker survived and the key is usable again.
        assert!(pool.push(job(7, 3)));
        pool.assign(|_| {});
        assert_eq!(poll_until(&mut pool, 1), vec![(Some(7), 9)]);
    }

    #[test]
    fn test_inline_panicking_job_frees_key() {
        let mut pool = TaskPool::new("inline", 0, panics_on_zero()).unwrap();
        pool.push(job(1, 0));
        pool.push(job(2, 4));
        pool.assign(|_| {});
        assert!(pool.is_in_flight(&1));

        assert_eq!(pool.poll(), vec![(Some(2), 16)]);
        assert_eq!(pool.take_failed(), vec![1]);
        assert!(pool.is_idle());
        assert!(pool.push(job(1, 2)));
    }

    #[test]
    fn test_is_in_flight_only_after_dispatch() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();

        let mut pool = TaskPool::new("test", 1, handler()).unwrap();
        pool.push(Square {
            key: Some(1),
            value: 1,
            gate: Some(Arc::clone(&gate)),
        });
        pool.push(job(2, 1));
        assert!(!pool.is_in_flight(&1));
        pool.assign(|_| {});
        assert!(pool.is_in_flight(&1));
        assert!(pool.is_pending(&2) && !pool.is_in_flight(&2));

        drop(held);
        poll_until(&mut pool, 2);
        assert!(!pool.is_in_flight(&1));
    }

    #[test]
    fn test_worker_threads_are_named() {
        let name_of: Handler<Square> = Arc::new(|job: Square| {
            let named = std::thread::current().name() == Some("strata-named-0");
            (job.key, named as u64)
        });
        let mut pool = TaskPool::new("named", 1, name_of).unwrap();
        pool.push(job(1, 0));
        pool.assign(|_| {});
        let outputs = poll_until(&mut pool, 1);
        assert_eq!(outputs, vec![(Some(1), 1)]);
    }

    #[test]
    fn test_shutdown_joins_workers() {
        let mut pool = TaskPool::new("test", 3, handler()).unwrap();
        pool.push(job(1, 1));
        pool.shutdown();
        assert_eq!(pool.queued_len(), 0);
        // Shutting down twice is harmless.
        pool.shutdown();
    }
}
