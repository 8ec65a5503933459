use cubecl_prim_runtime::kernel::{RadixSortPolicy, TilePolicy};

/// Alignment of every temporary partition.
pub const TEMP_ALIGNMENT: usize = 256;

/// Tuning of the segmented radix sort. Every segment goes through all the digit passes.
pub const RADIX_SORT_POLICY: RadixSortPolicy = RadixSortPolicy {
    radix_bits: 6,
    small_key_radix_bits: 4,
    small_segment_items: 0,
    sort_lanes: 32,
    temp_alignment: TEMP_ALIGNMENT,
};

/// Tiles of the scan by key and of the reduction.
pub const TILE_POLICY: TilePolicy = TilePolicy {
    block_threads: 128,
    items_per_thread: 12,
};

/// Largest number of items a scan accepts.
pub const MAX_SCAN_ITEMS: u64 = i32::MAX as u64;
