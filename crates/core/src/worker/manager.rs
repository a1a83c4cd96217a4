//! Ties a [`RenderBatch`], [`WorkerSynchronization`], [`ThreadPool`], and a
//! [`Pipeline`] together into the two-phase worker run spec §4.8 describes:
//! a jobs phase (finalizing deferred style data), a synchronization point,
//! then a commands phase partitioned by band.

use crate::error::AccumulatedErrorFlags;
use crate::pipeline::{command_to_fill, ContextData, Pipeline};
use crate::target::Image;

use super::batch::{RenderBatch, RenderJob, SharedImage};
use super::sync::WorkerSynchronization;
use super::thread_pool::{AcquireMode, ThreadPool};

pub struct WorkerManager;

impl WorkerManager {
    /// Drains `batch`'s jobs and commands across `worker_count` threads and
    /// blends the results into `image`. Returns whatever error flags were
    /// recorded during the run, folded with a `ThreadPoolExhausted` flag if
    /// the pool could not grant the requested thread count.
    pub fn execute(
        batch: &mut RenderBatch,
        image: &mut Image,
        pipeline: &(dyn Pipeline),
        pool: &ThreadPool,
        band_height_shift: u32,
    ) -> AccumulatedErrorFlags {
        if !batch.is_finalized() {
            batch.finalize();
        }
        let worker_count = batch.worker_count;

        let granted = match pool.acquire(worker_count, AcquireMode::AllOrNothing) {
            Ok(n) => n,
            Err(err) => return AccumulatedErrorFlags::from(err),
        };
        debug_assert_eq!(granted, worker_count);

        let sync = WorkerSynchronization::new(worker_count);
        let shared_image = SharedImage::new(image);

        std::thread::scope(|scope| {
            for worker_id in 0..worker_count {
                let batch = &*batch;
                let sync = &sync;
                let shared_image = &shared_image;
                scope.spawn(move || {
                    // Jobs phase: atomically fetch-and-claim job indices
                    // until the queue is drained (spec §4.8).
                    while let Some(idx) = batch.take_next_job_index() {
                        if let Some(job) = batch.jobs.get(idx) {
                            match job {
                                RenderJob::MaterializeFetchData(fd) => fd.materialize(),
                            }
                        }
                    }
                    sync.arrive_and_wait();

                    // Commands phase: this worker only ever touches bands
                    // `band_id % worker_count == worker_id`, so distinct
                    // workers write disjoint rows of `shared_image` (spec
                    // §4.8).
                    for command in batch.commands.iter() {
                        if command.band_id(band_height_shift) % worker_count != worker_id {
                            continue;
                        }
                        let signature = command.header().signature;
                        let Some(fill_func) = pipeline.fill_func(signature) else {
                            continue;
                        };
                        let (fill_data, fetch_data) = command_to_fill(command);
                        // SAFETY: see `SharedImage`'s doc comment — this
                        // worker only processes commands in its own bands.
                        let image = unsafe { shared_image.get() };
                        let mut ctx = ContextData { image };
                        fill_func(&mut ctx, &fill_data, &fetch_data);
                    }
                });
            }
        });

        pool.release(worker_count);
        *batch.accumulated_error_flags.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandHeader, RenderCommand};
    use crate::fetch::color::Rgba32;
    use crate::fetch::StyleData;
    use crate::geometry::point::BoxI;
    use crate::target::format::PixelFormat;

    fn solid_box_command(y0: i32, y1: i32) -> RenderCommand {
        use crate::command::signature::{FetchType, FillType, Signature};
        RenderCommand::FillBoxA {
            header: CommandHeader {
                signature: Signature::new(
                    crate::command::compop::CompOp::SrcOver,
                    FetchType::Solid,
                    FillType::BoxA,
                    PixelFormat::Prgb32,
                ),
                style: StyleData::Solid(Rgba32::OPAQUE_BLACK),
                alpha: 255,
            },
            box_i: BoxI::new(0, y0, 4, y1),
        }
    }

    #[test]
    fn bands_are_partitioned_across_workers_without_losing_commands() {
        use crate::pipeline::ReferencePipeline;

        let mut image = Image::new(4, 8, PixelFormat::Prgb32).unwrap();
        let mut batch = RenderBatch::new(2);
        batch.push_command(solid_box_command(0, 1), 2);
        batch.push_command(solid_box_command(4, 5), 2);
        batch.finalize();

        let pool = ThreadPool::new(4);
        let pipeline = ReferencePipeline;
        let flags = WorkerManager::execute(&mut batch, &mut image, &pipeline, &pool, 2);
        assert!(flags.is_empty());

        assert_eq!(image.row(0)[3], 255, "row handled by worker owning band 0");
        assert_eq!(image.row(4)[3], 255, "row handled by worker owning band 2");
    }
}
