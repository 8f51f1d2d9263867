//! Background chunk I/O.
//!
//! Chunk storage can be slow, so it runs on a dedicated thread. The caller
//! talks to it through two queues:
//!
//! ```text
//!   caller ── Load(pos) / Save(chunk) / Shutdown ──▶ worker ── ChunkStore
//!   caller ◀──────────── ChunkLoad ──────────────── worker
//! ```
//!
//! Submitting and polling never block. [`ChunkIo::stop`] blocks until every
//! request sent before it has been handled and the store has been flushed.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, trace, warn};

use crate::{Chunk, ChunkLoad, ChunkPos, ChunkStore, LevelError, LevelResult};

/// Handle to a worker that loads and saves chunks off the caller's thread.
pub trait ChunkIo {
    /// Begin processing requests. Call once, before relying on results.
    fn start(&mut self) -> LevelResult<()>;

    /// Queue a load; the result later appears in [`Self::poll_completed_load`].
    fn request_load(&self, pos: ChunkPos);

    /// Queue a save of `chunk`.
    fn request_save(&self, chunk: Chunk);

    /// Take one finished load, if any. Results may arrive out of request
    /// order; match them by [`ChunkLoad::pos`].
    fn poll_completed_load(&self) -> Option<ChunkLoad>;

    /// Whether a finished load is waiting to be taken.
    fn has_pending(&self) -> bool;

    /// Finish outstanding work and stop. Blocks; safe to call repeatedly.
    fn stop(&mut self);
}

enum Request {
    Load(ChunkPos),
    Save(Chunk),
    Shutdown,
}

/// Everything the worker thread owns.
struct WorkerLoop<S> {
    store: S,
    requests: Receiver<Request>,
    completed: Sender<ChunkLoad>,
    failed_saves: Arc<AtomicU64>,
}

enum State<S> {
    Idle(WorkerLoop<S>),
    Running(JoinHandle<()>),
    Stopped,
}

/// [`ChunkIo`] backed by one OS thread and two crossbeam channels.
pub struct ChunkWorker<S: ChunkStore> {
    requests: Sender<Request>,
    completed: Receiver<ChunkLoad>,
    failed_saves: Arc<AtomicU64>,
    state: State<S>,
}

impl<S: ChunkStore> ChunkWorker<S> {
    /// Create a worker around `store`. Requests queue until [`ChunkIo::start`].
    #[must_use]
    pub fn new(store: S) -> Self {
        let (requests_tx, requests_rx) = crossbeam_channel::unbounded();
        let (completed_tx, completed_rx) = crossbeam_channel::unbounded();
        let failed_saves = Arc::new(AtomicU64::new(0));

        Self {
            requests: requests_tx,
            completed: completed_rx,
            failed_saves: Arc::clone(&failed_saves),
            state: State::Idle(WorkerLoop {
                store,
                requests: requests_rx,
                completed: completed_tx,
                failed_saves,
            }),
        }
    }

    /// Create and start a worker.
    pub fn spawn(store: S) -> LevelResult<Self> {
        let mut worker = Self::new(store);
        worker.start()?;
        Ok(worker)
    }

    /// Saves the store rejected so far.
    #[must_use]
    pub fn failed_saves(&self) -> u64 {
        self.failed_saves.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            warn!("Chunk worker has stopped, dropping request");
        }
    }
}

impl<S: ChunkStore> ChunkIo for ChunkWorker<S> {
    fn start(&mut self) -> LevelResult<()> {
        let worker = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Idle(worker) => worker,
            running @ State::Running(_) => {
                self.state = running;
                return Err(LevelError::WorkerState("already started"));
            }
            State::Stopped => return Err(LevelError::WorkerState("already stopped")),
        };

        let handle = thread::Builder::new()
            .name("chunk-io".to_string())
            .spawn(move || worker.run())?;

        debug!("Chunk worker started");
        self.state = State::Running(handle);
        Ok(())
    }

    fn request_load(&self, pos: ChunkPos) {
        self.send(Request::Load(pos));
    }

    fn request_save(&self, chunk: Chunk) {
        self.send(Request::Save(chunk));
    }

    fn poll_completed_load(&self) -> Option<ChunkLoad> {
        self.completed.try_recv().ok()
    }

    fn has_pending(&self) -> bool {
        !self.completed.is_empty()
    }

    fn stop(&mut self) {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running(handle) => {
                self.send(Request::Shutdown);
                if handle.join().is_err() {
                    error!("Chunk worker panicked");
                }
                debug!("Chunk worker stopped");
            }
            State::Idle(worker) => {
                // never started: drain what was queued on this thread
                self.send(Request::Shutdown);
                worker.run();
            }
            State::Stopped => {}
        }
    }
}

impl<S: ChunkStore> Drop for ChunkWorker<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<S: ChunkStore> WorkerLoop<S> {
    fn run(mut self) {
        'outer: while let Ok(first) = self.requests.recv() {
            let batch = std::iter::once(first).chain(self.requests.try_iter());

            for request in coalesce(batch) {
                match request {
                    Request::Load(pos) => self.load(pos),
                    Request::Save(chunk) => self.save(&chunk),
                    Request::Shutdown => break 'outer,
                }
            }
        }

        if let Err(e) = self.store.flush() {
            error!("Failed to flush chunk store: {}", e);
        }

        let dropped = self.requests.try_iter().count();
        if dropped > 0 {
            warn!("Chunk worker discarded {} request(s) sent after shutdown", dropped);
        }
    }

    fn load(&mut self, pos: ChunkPos) {
        let result = match self.store.load(pos) {
            Ok(Some(chunk)) => ChunkLoad::Loaded(chunk),
            Ok(None) => ChunkLoad::Absent(pos),
            Err(error) => {
                warn!("Failed to load chunk {}: {}", pos, error);
                ChunkLoad::Failed { pos, error }
            }
        };

        if self.completed.send(result).is_err() {
            trace!("Chunk handle dropped, discarding load of {}", pos);
        }
    }

    fn save(&mut self, chunk: &Chunk) {
        if let Err(e) = self.store.save(chunk) {
            error!("Failed to save chunk {}: {}", chunk.pos, e);
            self.failed_saves.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Drop a load when the same coordinate is already queued for loading in
/// this batch with no save to it in between.
fn coalesce(batch: impl Iterator<Item = Request>) -> Vec<Request> {
    let mut queued_loads = HashSet::new();
    let mut out = Vec::new();

    for request in batch {
        match &request {
            Request::Load(pos) => {
                if !queued_loads.insert(*pos) {
                    trace!("Coalesced duplicate load of {}", pos);
                    continue;
                }
            }
            Request::Save(chunk) => {
                queued_loads.remove(&chunk.pos);
            }
            Request::Shutdown => {}
        }
        out.push(request);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    /// In-memory store that can hold loads until released and inject failures.
    #[derive(Clone, Default)]
    struct MemoryStore {
        chunks: Arc<Mutex<HashMap<ChunkPos, Chunk>>>,
        loads: Arc<AtomicUsize>,
        flushes: Arc<AtomicUsize>,
        gate: Option<Receiver<()>>,
        fail: bool,
        save_delay: Duration,
    }

    impl ChunkStore for MemoryStore {
        fn load(&mut self, pos: ChunkPos) -> LevelResult<Option<Chunk>> {
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LevelError::InvalidFormat("corrupt chunk".to_string()));
            }
            Ok(self.chunks.lock().get(&pos).cloned())
        }

        fn save(&mut self, chunk: &Chunk) -> LevelResult<()> {
            if self.fail {
                return Err(std::io::Error::other("disk full").into());
            }
            thread::sleep(self.save_delay);
            self.chunks.lock().insert(chunk.pos, chunk.clone());
            Ok(())
        }

        fn flush(&mut self) -> LevelResult<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn drain(worker: &ChunkWorker<MemoryStore>) -> Vec<ChunkLoad> {
        std::iter::from_fn(|| worker.poll_completed_load()).collect()
    }

    #[test]
    fn test_load_result_delivered_once() {
        let (release, gate) = crossbeam_channel::unbounded();
        let store = MemoryStore {
            gate: Some(gate),
            ..MemoryStore::default()
        };
        store
            .chunks
            .lock()
            .insert(ChunkPos::new(2, 3), Chunk::new(ChunkPos::new(2, 3), vec![7u8]));

        let mut worker = ChunkWorker::spawn(store).unwrap();
        worker.request_load(ChunkPos::new(2, 3));

        // held at the gate
        assert!(worker.poll_completed_load().is_none());
        assert!(!worker.has_pending());

        release.send(()).unwrap();
        worker.stop();

        assert!(worker.has_pending());
        let result = worker.poll_completed_load().unwrap();
        assert_eq!(result.pos(), ChunkPos::new(2, 3));
        assert_eq!(result.into_chunk().unwrap().payload.to_vec(), vec![7u8]);
        assert!(worker.poll_completed_load().is_none());
        assert!(!worker.has_pending());
    }

    #[test]
    fn test_absent_chunk() {
        let mut worker = ChunkWorker::spawn(MemoryStore::default()).unwrap();
        worker.request_load(ChunkPos::new(0, -1));
        worker.stop();

        let results = drain(&worker);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], ChunkLoad::Absent(pos) if pos == ChunkPos::new(0, -1)));
    }

    #[test]
    fn test_stop_waits_for_queued_saves() {
        let store = MemoryStore {
            save_delay: Duration::from_millis(20),
            ..MemoryStore::default()
        };
        let chunks = Arc::clone(&store.chunks);
        let flushes = Arc::clone(&store.flushes);

        let mut worker = ChunkWorker::spawn(store).unwrap();
        for x in 0..5 {
            worker.request_save(Chunk::new(ChunkPos::new(x, 0), vec![x as u8]));
        }
        worker.stop();

        assert_eq!(chunks.lock().len(), 5);
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
        assert!(!worker.is_running());
    }

    #[test]
    fn test_load_after_save_sees_new_data() {
        let mut worker = ChunkWorker::spawn(MemoryStore::default()).unwrap();
        let pos = ChunkPos::new(5, 5);
        worker.request_save(Chunk::new(pos, vec![1u8, 2]));
        worker.request_load(pos);
        worker.stop();

        let chunk = worker.poll_completed_load().and_then(ChunkLoad::into_chunk);
        assert_eq!(chunk, Some(Chunk::new(pos, vec![1u8, 2])));
    }

    #[test]
    fn test_duplicate_loads_coalesced() {
        let store = MemoryStore::default();
        let loads = Arc::clone(&store.loads);

        // queued before start, so the worker sees them as one batch
        let mut worker = ChunkWorker::new(store);
        let pos = ChunkPos::new(1, 1);
        worker.request_load(pos);
        worker.request_load(pos);
        worker.request_load(ChunkPos::new(1, 2));
        worker.request_load(pos);
        worker.start().unwrap();
        worker.stop();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(drain(&worker).len(), 2);
    }

    #[test]
    fn test_save_between_loads_keeps_both() {
        let store = MemoryStore::default();
        let loads = Arc::clone(&store.loads);

        let mut worker = ChunkWorker::new(store);
        let pos = ChunkPos::new(0, 0);
        worker.request_load(pos);
        worker.request_save(Chunk::new(pos, vec![9u8]));
        worker.request_load(pos);
        worker.start().unwrap();
        worker.stop();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        let results = drain(&worker);
        assert!(matches!(results[0], ChunkLoad::Absent(_)));
        assert!(matches!(results[1], ChunkLoad::Loaded(_)));
    }

    #[test]
    fn test_failures_are_reported() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let mut worker = ChunkWorker::spawn(store).unwrap();
        worker.request_load(ChunkPos::new(3, 3));
        worker.request_save(Chunk::new(ChunkPos::new(3, 3), vec![0u8]));
        worker.stop();

        assert!(matches!(
            worker.poll_completed_load(),
            Some(ChunkLoad::Failed { pos, .. }) if pos == ChunkPos::new(3, 3)
        ));
        assert_eq!(worker.failed_saves(), 1);
    }

    #[test]
    fn test_start_twice_and_after_stop() {
        let mut worker = ChunkWorker::new(MemoryStore::default());
        worker.start().unwrap();
        assert!(matches!(
            worker.start(),
            Err(LevelError::WorkerState("already started"))
        ));
        worker.stop();
        worker.stop();
        assert!(matches!(
            worker.start(),
            Err(LevelError::WorkerState("already stopped"))
        ));
    }

    #[test]
    fn test_stop_without_start_drains_inline() {
        let store = MemoryStore::default();
        let chunks = Arc::clone(&store.chunks);

        let mut worker = ChunkWorker::new(store);
        worker.request_save(Chunk::new(ChunkPos::new(4, 4), vec![4u8]));
        worker.stop();

        assert!(chunks.lock().contains_key(&ChunkPos::new(4, 4)));
    }

    #[test]
    fn test_requests_after_stop_are_ignored() {
        let mut worker = ChunkWorker::spawn(MemoryStore::default()).unwrap();
        worker.stop();
        worker.request_load(ChunkPos::new(0, 0));
        worker.request_save(Chunk::new(ChunkPos::new(0, 0), vec![1u8]));
        assert!(worker.poll_completed_load().is_none());
    }
}
