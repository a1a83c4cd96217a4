//! Asynchronous work unit: job/command queues plus the counters workers
//! coordinate through (spec §3 `RenderBatch`, §4.8).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::command::RenderCommand;
use crate::error::AccumulatedErrorFlags;
use crate::fetch::fetchdata::RenderFetchData;
use crate::target::Image;

/// Fixed-capacity (256 items) block in a [`BlockQueue`]'s linked chain
/// (spec §4.8: "linked lists of fixed-capacity (256) queues").
const BLOCK_CAPACITY: usize = 256;

/// A FIFO built from fixed-size blocks rather than one growable `Vec`, so
/// appending never invalidates indices a worker already holds into an
/// earlier block — the worker manager keeps a cursor into the tail block
/// while the submitter may still be appending to it (spec §4.8: "The
/// worker manager exposes appenders that keep pointers into the tail
/// block and allocate a new block when full").
pub struct BlockQueue<T> {
    blocks: Vec<Vec<T>>,
}

impl<T> Default for BlockQueue<T> {
    fn default() -> Self {
        BlockQueue { blocks: Vec::new() }
    }
}

impl<T> BlockQueue<T> {
    pub fn push(&mut self, item: T) {
        match self.blocks.last_mut() {
            Some(block) if block.len() < BLOCK_CAPACITY => block.push(item),
            _ => {
                let mut block = Vec::with_capacity(BLOCK_CAPACITY);
                block.push(item);
                self.blocks.push(block);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        let mut remaining = index;
        for block in &self.blocks {
            if remaining < block.len() {
                return Some(&block[remaining]);
            }
            remaining -= block.len();
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.blocks.iter().flat_map(|b| b.iter())
    }
}

/// One unit of deferred work created while building a command (e.g.
/// finalizing an edge chain for a complex fill) — processed by workers in
/// the "jobs" phase before the "commands" phase begins (spec §4.8).
pub enum RenderJob {
    /// Finalizes a pending style's fetch data (spec §4.6 "lazy
    /// materialisation": "the fetch data is finalised on first draw").
    MaterializeFetchData(Arc<RenderFetchData>),
}

/// The async work unit a context's batched draw calls accumulate into,
/// closed by `finalize_batch` and then drained by worker threads (spec §3
/// `RenderBatch`).
pub struct RenderBatch {
    pub jobs: BlockQueue<RenderJob>,
    pub fetch_data: BlockQueue<Arc<RenderFetchData>>,
    pub commands: BlockQueue<RenderCommand>,

    /// Atomic cursor into `jobs`, fetched-and-incremented by whichever
    /// worker asks for the next job (spec §4.8: "workers atomically fetch
    /// the next job index from the batch").
    pub job_index: AtomicUsize,

    pub accumulated_error_flags: std::sync::Mutex<AccumulatedErrorFlags>,
    pub worker_count: usize,
    /// Number of distinct band ids referenced across `commands`, used to
    /// size per-band progress tracking in `WorkerSynchronization`.
    pub band_count: usize,
    finalized: bool,
}

// SAFETY: `RenderJob`/`RenderCommand` can carry an `Rc`-refcounted
// `RenderFetchData` (deliberately non-atomic, spec §4.6), which makes
// those types `!Send`/`!Sync` on their own. A `RenderBatch` is built
// entirely by its single submitting thread, which then blocks for the
// duration of `WorkerManager::execute` — so no thread, including the
// submitter, clones or drops one of those `Rc`s while workers hold a
// shared `&RenderBatch`; workers only ever read already-resolved fields
// through it. That upholds the single-writer/quiesced-during-read
// contract `Send`/`Sync` are meant to encode, even though the compiler
// can't see it through the `Rc`.
unsafe impl Send for RenderBatch {}
unsafe impl Sync for RenderBatch {}

impl RenderBatch {
    pub fn new(worker_count: usize) -> Self {
        RenderBatch {
            jobs: BlockQueue::default(),
            fetch_data: BlockQueue::default(),
            commands: BlockQueue::default(),
            job_index: AtomicUsize::new(0),
            accumulated_error_flags: std::sync::Mutex::new(AccumulatedErrorFlags::empty()),
            worker_count: worker_count.max(1),
            band_count: 0,
            finalized: false,
        }
    }

    pub fn push_command(&mut self, command: RenderCommand, band_height_shift: u32) {
        let band = command.band_id(band_height_shift);
        self.band_count = self.band_count.max(band + 1);
        self.commands.push(command);
    }

    pub fn push_job(&mut self, job: RenderJob) {
        self.jobs.push(job);
    }

    pub fn record_error(&self, flags: AccumulatedErrorFlags) {
        self.accumulated_error_flags.lock().unwrap().insert(flags);
    }

    /// Closes the tail queue blocks and records final sizes; no further
    /// `push_command`/`push_job` calls are valid after this (spec §4.8
    /// `finalizeBatch`).
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn has_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// Atomically claims the next job index, or `None` once all jobs are
    /// claimed (spec §4.8).
    pub fn take_next_job_index(&self) -> Option<usize> {
        let idx = self.job_index.fetch_add(1, Ordering::AcqRel);
        if idx < self.jobs.len() {
            Some(idx)
        } else {
            None
        }
    }
}

/// A drawable target shared read-write across worker threads during the
/// commands phase. Workers are partitioned by band (spec §4.8: "worker
/// `i` of `W` processes bands whose band-id mod W equals its worker-id,
/// ensuring no two workers write to the same cell row"); this type exists
/// only to make that sharing contract explicit at the type level rather
/// than passing a raw pointer around.
pub struct SharedImage(*mut Image);

// SAFETY: callers only ever construct a `SharedImage` from
// `WorkerManager::run_commands`, which partitions `commands` by band id so
// that distinct workers touch disjoint pixel rows (spec §4.8); no two
// threads holding a `SharedImage` write the same byte concurrently.
unsafe impl Send for SharedImage {}
unsafe impl Sync for SharedImage {}

impl SharedImage {
    pub fn new(image: &mut Image) -> Self {
        SharedImage(image as *mut Image)
    }

    /// # Safety
    /// The caller must uphold the disjoint-rows contract documented on
    /// [`SharedImage`] itself.
    pub unsafe fn get(&self) -> &mut Image {
        &mut *self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_queue_spans_multiple_blocks() {
        let mut q: BlockQueue<u32> = BlockQueue::default();
        for i in 0..600 {
            q.push(i);
        }
        assert_eq!(q.len(), 600);
        assert_eq!(*q.get(0).unwrap(), 0);
        assert_eq!(*q.get(599).unwrap(), 599);
        assert_eq!(q.blocks.len(), 3);
    }

    #[test]
    fn take_next_job_index_stops_after_last_job() {
        let mut batch = RenderBatch::new(2);
        batch.push_job(RenderJob::MaterializeFetchData(Arc::new(RenderFetchData::new(
            crate::fetch::fetchdata::FetchKind::Gradient,
            crate::geometry::transform::Matrix2D::IDENTITY,
            crate::geometry::transform::Matrix2D::IDENTITY,
            crate::fetch::fetchdata::TransformMode::User,
        ))));
        assert_eq!(batch.take_next_job_index(), Some(0));
        assert_eq!(batch.take_next_job_index(), None);
    }
}
