//! Device kernels shared by the back-ends.
//!
//! Each kernel is a task executed on a stream. The work is split in blocks processed in
//! parallel, while the per-launch state lives in the caller-provided temporary storage, laid
//! out according to a policy owned by the back-end.

mod radix_sort;
mod reduce;
mod scan_by_key;

pub use radix_sort::*;
pub use reduce::*;
pub use scan_by_key::*;

/// Shape of the blocks a tiled kernel is launched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePolicy {
    /// Threads per block.
    pub block_threads: usize,
    /// Items processed by each thread.
    pub items_per_thread: usize,
}

impl TilePolicy {
    /// Items processed by one block.
    pub const fn tile_items(&self) -> usize {
        self.block_threads * self.items_per_thread
    }

    /// Number of blocks needed for `num_items` items.
    pub fn num_tiles(&self, num_items: usize) -> usize {
        num_items.div_ceil(self.tile_items())
    }
}

/// Header words written at the start of the temporary storage of every launch.
pub(crate) fn write_header(header: &mut [u64], tag: u64, words: &[u64]) {
    header[0] = tag;
    header[1..1 + words.len()].copy_from_slice(words);
}
