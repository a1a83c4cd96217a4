//! Worker coordination primitives (spec §4.8 `WorkerSynchronization`).
//!
//! The source lets this be backed by a futex on platforms that have one,
//! falling back to a portable mutex+condvar otherwise. We only ship the
//! portable backend — there is no portable futex in `std`, and pulling in
//! a raw-syscall crate just to shave a wakeup off a two-phase barrier that
//! runs once per batch is not a trade worth making here (see DESIGN.md).

use std::sync::{Condvar, Mutex};

/// A reusable countdown barrier: `worker_count` workers each call
/// `arrive_and_wait()` once per phase; the last arrival wakes everyone.
/// Used twice per batch — once after the jobs phase, once after the
/// commands phase (spec §4.8: "workers synchronize between the jobs phase
/// and the commands phase").
pub struct WorkerSynchronization {
    worker_count: usize,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

struct BarrierState {
    arrived: usize,
    /// Flips each time the barrier releases, so a worker that calls
    /// `arrive_and_wait` again for the next phase can tell its own arrival
    /// from the previous phase's trailing wakeups apart.
    generation: u64,
}

impl WorkerSynchronization {
    pub fn new(worker_count: usize) -> Self {
        WorkerSynchronization {
            worker_count: worker_count.max(1),
            state: Mutex::new(BarrierState { arrived: 0, generation: 0 }),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until every worker has called this for the current
    /// generation, then advances to the next generation and returns.
    pub fn arrive_and_wait(&self) {
        let mut guard = self.state.lock().unwrap();
        let my_generation = guard.generation;
        guard.arrived += 1;
        if guard.arrived == self.worker_count {
            guard.arrived = 0;
            guard.generation += 1;
            self.condvar.notify_all();
            return;
        }
        while guard.generation == my_generation {
            guard = self.condvar.wait(guard).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn all_workers_release_together() {
        let sync = Arc::new(WorkerSynchronization::new(4));
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..4 {
            let sync = sync.clone();
            let order = order.clone();
            handles.push(thread::spawn(move || {
                sync.arrive_and_wait();
                order.lock().unwrap().push(i);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(order.lock().unwrap().len(), 4);
    }
}
