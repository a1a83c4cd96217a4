//! Zero allocator for rasterizer scratch buffers (spec §4.2).
//!
//! Unlike [`super::arena::ArenaAllocator`], callers of this allocator must
//! return memory already zeroed, and get zeroed memory back out. Blocks
//! are split into 1024-byte granules; a bit vector (one bit per granule,
//! MSB-first within each word) tracks which granules are currently handed
//! out, and each block caches the size of its largest known-unused run so
//! that `alloc` can skip blocks that can't possibly satisfy a request.

use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;
use std::sync::Mutex;

const GRANULE_SIZE: usize = 1024;
const MIN_BLOCK_SIZE: usize = 1 << 20; // 1 MiB
const MAX_BLOCK_SIZE: usize = 16 << 20; // 16 MiB
const BLOCK_ALIGNMENT: usize = 64;
const BITS_PER_WORD: usize = 64;

fn granule_count(size: usize) -> usize {
    (size + GRANULE_SIZE - 1) / GRANULE_SIZE
}

fn word_count(granules: usize) -> usize {
    (granules + BITS_PER_WORD - 1) / BITS_PER_WORD
}

struct Block {
    data: NonNull<u8>,
    size: usize,
    granules: usize,
    /// One bit per granule; set means "in use". MSB-first within each word,
    /// mirroring the original bit-vector scan order.
    used: Vec<u64>,
    /// Cached upper bound (in granules) on the largest contiguous unused
    /// run in this block. Conservative: may overstate after a release that
    /// merges runs the cache hasn't caught up to yet, but never understate,
    /// so `alloc` never wrongly skips a block that could satisfy a request.
    largest_unused_area: usize,
}

impl Block {
    fn new(size: usize) -> Block {
        let layout = Layout::from_size_align(size, BLOCK_ALIGNMENT).expect("zeroalloc block layout");
        // SAFETY: layout has non-zero size and supported alignment.
        let data = unsafe { alloc_zeroed(layout) };
        let data = NonNull::new(data).expect("zeroalloc block allocation failed");
        let granules = granule_count(size);
        Block {
            data,
            size,
            granules,
            used: vec![0u64; word_count(granules)],
            largest_unused_area: granules,
        }
    }

    fn is_set(&self, granule: usize) -> bool {
        let word = granule / BITS_PER_WORD;
        let bit = BITS_PER_WORD - 1 - (granule % BITS_PER_WORD);
        (self.used[word] >> bit) & 1 != 0
    }

    fn set_range(&mut self, start: usize, count: usize, value: bool) {
        for g in start..start + count {
            let word = g / BITS_PER_WORD;
            let bit = BITS_PER_WORD - 1 - (g % BITS_PER_WORD);
            if value {
                self.used[word] |= 1 << bit;
            } else {
                self.used[word] &= !(1u64 << bit);
            }
        }
    }

    /// Finds the first run of `count` contiguous free granules, returning
    /// its starting granule index.
    fn find_free_run(&self, count: usize) -> Option<usize> {
        let mut run_start = None;
        let mut run_len = 0usize;
        for g in 0..self.granules {
            if self.is_set(g) {
                run_start = None;
                run_len = 0;
                continue;
            }
            if run_start.is_none() {
                run_start = Some(g);
            }
            run_len += 1;
            if run_len == count {
                return run_start;
            }
        }
        None
    }

    fn recompute_largest_unused_area(&mut self) {
        let mut best = 0usize;
        let mut run = 0usize;
        for g in 0..self.granules {
            if self.is_set(g) {
                run = 0;
            } else {
                run += 1;
                best = best.max(run);
            }
        }
        self.largest_unused_area = best;
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let layout = Layout::from_size_align(self.size, BLOCK_ALIGNMENT).expect("zeroalloc block layout");
        // SAFETY: `self.data` was allocated with the same layout in `Block::new`.
        unsafe { dealloc(self.data.as_ptr(), layout) };
    }
}

struct State {
    blocks: Vec<Block>,
    next_block_size: usize,
}

/// Pool of zero-filled scratch memory, shared across worker threads.
///
/// Rasterizer cell storage is requested at the start of a scanline band and
/// released (already cleared back to zero by the rasterizer) at the end, so
/// the pool can hand the same bytes to the next band without a fresh
/// `memset`.
pub struct ZeroAllocator {
    state: Mutex<State>,
}

impl ZeroAllocator {
    pub fn new() -> ZeroAllocator {
        ZeroAllocator {
            state: Mutex::new(State {
                blocks: Vec::new(),
                next_block_size: MIN_BLOCK_SIZE,
            }),
        }
    }

    /// Allocates at least `size` zeroed bytes. Returns the pointer and the
    /// actual granule-rounded size handed out (callers may use the extra
    /// room, e.g. for cell-storage growth without a re-request).
    pub fn alloc(&self, size: usize) -> Option<(NonNull<u8>, usize)> {
        let mut state = self.state.lock().unwrap();
        let needed = granule_count(size);

        for block in state.blocks.iter_mut() {
            if block.largest_unused_area < needed {
                continue;
            }
            if let Some(start) = block.find_free_run(needed) {
                block.set_range(start, needed, true);
                if block.largest_unused_area == needed {
                    block.recompute_largest_unused_area();
                } else {
                    block.largest_unused_area -= needed;
                }
                // SAFETY: `start * GRANULE_SIZE + needed * GRANULE_SIZE <= block.size`.
                let ptr = unsafe { block.data.as_ptr().add(start * GRANULE_SIZE) };
                return NonNull::new(ptr).map(|p| (p, needed * GRANULE_SIZE));
            }
        }

        let block_size = state.next_block_size.max(size.next_power_of_two().max(GRANULE_SIZE));
        state.next_block_size = (state.next_block_size * 2).min(MAX_BLOCK_SIZE);
        let mut block = Block::new(block_size);
        block.set_range(0, needed, true);
        block.largest_unused_area = block.granules - needed;
        let ptr = block.data.as_ptr();
        state.blocks.push(block);
        NonNull::new(ptr).map(|p| (p, needed * GRANULE_SIZE))
    }

    /// Returns a previously allocated range to the pool. `ptr` must point to
    /// `size` bytes of memory that the caller has zeroed before calling.
    ///
    /// # Safety
    /// `ptr`/`size` must exactly match a prior `alloc` return (or a prefix
    /// rounded the same way), and the bytes must already be zero.
    pub unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        let mut state = self.state.lock().unwrap();
        let granules = granule_count(size);
        for block in state.blocks.iter_mut() {
            let base = block.data.as_ptr() as usize;
            let addr = ptr.as_ptr() as usize;
            if addr < base || addr >= base + block.size {
                continue;
            }
            let start = (addr - base) / GRANULE_SIZE;
            debug_assert!(
                (start..start + granules).all(|g| block.is_set(g)),
                "releasing granules not marked in-use"
            );
            block.set_range(start, granules, false);
            block.largest_unused_area = block.largest_unused_area.max(granules);
            return;
        }
        debug_assert!(false, "release() called with pointer not owned by this allocator");
    }

    /// Drops blocks that are entirely unused, down to keeping at most one
    /// spare. Intended to be called periodically (e.g. between render
    /// batches) rather than on every release, since block churn is
    /// expensive and short idle gaps shouldn't cause thrashing.
    pub fn cleanup(&self) {
        let mut state = self.state.lock().unwrap();
        let mut kept_spare = false;
        state.blocks.retain(|b| {
            let empty = b.largest_unused_area == b.granules;
            if empty && kept_spare {
                false
            } else {
                if empty {
                    kept_spare = true;
                }
                true
            }
        });
    }
}

impl Default for ZeroAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: all mutable state lives behind the internal `Mutex`.
unsafe impl Send for ZeroAllocator {}
unsafe impl Sync for ZeroAllocator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_zeroed_memory() {
        let pool = ZeroAllocator::new();
        let (ptr, size) = pool.alloc(4096).unwrap();
        // SAFETY: just allocated `size` bytes at `ptr`.
        let slice = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), size) };
        assert!(slice.iter().all(|&b| b == 0));
    }

    #[test]
    fn release_then_alloc_reuses_granules() {
        let pool = ZeroAllocator::new();
        let (ptr, size) = pool.alloc(2048).unwrap();
        unsafe { pool.release(ptr, size) };
        let (ptr2, size2) = pool.alloc(2048).unwrap();
        assert_eq!(ptr, ptr2);
        assert_eq!(size, size2);
    }

    #[test]
    fn disjoint_allocations_do_not_overlap() {
        let pool = ZeroAllocator::new();
        let (a, a_size) = pool.alloc(GRANULE_SIZE).unwrap();
        let (b, _) = pool.alloc(GRANULE_SIZE).unwrap();
        assert_ne!(a, b);
        let a_end = a.as_ptr() as usize + a_size;
        assert!(b.as_ptr() as usize >= a_end || (b.as_ptr() as usize + GRANULE_SIZE) <= a.as_ptr() as usize);
    }

    #[test]
    fn cleanup_keeps_one_spare_empty_block() {
        let pool = ZeroAllocator::new();
        let (p1, s1) = pool.alloc(MIN_BLOCK_SIZE).unwrap();
        let (p2, s2) = pool.alloc(MIN_BLOCK_SIZE * 2).unwrap();
        unsafe {
            pool.release(p1, s1);
            pool.release(p2, s2);
        }
        pool.cleanup();
        let state = pool.state.lock().unwrap();
        assert!(state.blocks.len() <= 2);
    }
}
