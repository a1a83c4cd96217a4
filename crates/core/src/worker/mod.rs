//! Asynchronous batch execution: render batches, worker synchronization,
//! the thread pool, and the manager that runs a batch across workers
//! (spec §4.8, §4.9).

pub mod batch;
pub mod manager;
pub mod sync;
pub mod thread_pool;

pub use batch::{BlockQueue, RenderBatch, RenderJob, SharedImage};
pub use manager::WorkerManager;
pub use sync::WorkerSynchronization;
pub use thread_pool::{AcquireMode, ThreadPool};
