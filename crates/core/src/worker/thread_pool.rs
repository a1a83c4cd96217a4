//! Reference-counted thread pool (spec §4.9).
//!
//! A real JIT-backed engine shares one process-wide pool across every
//! context unless `ISOLATED_THREAD_POOL` asks for a private one (spec
//! §6.3); threads themselves are only ever spawned on demand inside
//! [`super::manager::WorkerManager::run`], so this type tracks available
//! *capacity*, not live `JoinHandle`s.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{RasterError, RasterResult};

/// Whether a partial grant is acceptable (spec §4.9: "acquire either
/// grants the full request or, under `AllOrNothing`, fails outright").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    Partial,
    AllOrNothing,
}

pub struct ThreadPool {
    capacity: usize,
    in_use: AtomicUsize,
}

impl ThreadPool {
    pub fn new(capacity: usize) -> Self {
        ThreadPool {
            capacity: capacity.max(1),
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grants up to `requested` threads. Under [`AcquireMode::AllOrNothing`]
    /// this either grants exactly `requested` or fails with
    /// `ThreadPoolExhausted`, leaving the pool untouched; under
    /// [`AcquireMode::Partial`] it grants whatever is available, down to
    /// (but not including) zero, failing only if nothing at all is free.
    pub fn acquire(&self, requested: usize, mode: AcquireMode) -> RasterResult<usize> {
        loop {
            let current = self.in_use.load(Ordering::Acquire);
            let available = self.capacity.saturating_sub(current);
            let grant = match mode {
                AcquireMode::AllOrNothing if available < requested => {
                    return Err(RasterError::ThreadPoolExhausted);
                }
                AcquireMode::AllOrNothing => requested,
                AcquireMode::Partial => {
                    if available == 0 {
                        return Err(RasterError::ThreadPoolExhausted);
                    }
                    requested.min(available)
                }
            };
            if self
                .in_use
                .compare_exchange(current, current + grant, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(grant);
            }
        }
    }

    pub fn release(&self, count: usize) {
        self.in_use.fetch_sub(count, Ordering::AcqRel);
    }

    /// Releases every thread this pool believes is in use; called when a
    /// context tears down with workers still (erroneously) marked active,
    /// so a leaked acquire can't wedge the pool for later contexts.
    pub fn cleanup(&self) {
        self.in_use.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_or_nothing_fails_without_granting_partial() {
        let pool = ThreadPool::new(4);
        assert_eq!(pool.acquire(2, AcquireMode::AllOrNothing), Ok(2));
        assert_eq!(
            pool.acquire(4, AcquireMode::AllOrNothing),
            Err(RasterError::ThreadPoolExhausted)
        );
        // the failed all-or-nothing request must not have taken anything
        assert_eq!(pool.acquire(2, AcquireMode::AllOrNothing), Ok(2));
    }

    #[test]
    fn partial_mode_grants_whatever_remains() {
        let pool = ThreadPool::new(4);
        pool.acquire(3, AcquireMode::AllOrNothing).unwrap();
        assert_eq!(pool.acquire(4, AcquireMode::Partial), Ok(1));
    }

    #[test]
    fn release_frees_capacity_for_reuse() {
        let pool = ThreadPool::new(2);
        pool.acquire(2, AcquireMode::AllOrNothing).unwrap();
        pool.release(2);
        assert_eq!(pool.acquire(2, AcquireMode::AllOrNothing), Ok(2));
    }
}
