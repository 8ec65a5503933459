use cubecl_prim_runtime::kernel::{RadixSortPolicy, TilePolicy};

/// Alignment of every temporary partition.
pub const TEMP_ALIGNMENT: usize = 256;

/// Tuning of the segmented radix sort.
///
/// Segments of up to 256 keys are sorted by a single block, and up to 64 segments are in
/// flight at once.
pub const RADIX_SORT_POLICY: RadixSortPolicy = RadixSortPolicy {
    radix_bits: 8,
    small_key_radix_bits: 8,
    small_segment_items: 256,
    sort_lanes: 64,
    temp_alignment: TEMP_ALIGNMENT,
};

/// Tiles of the scan by key.
pub const SCAN_POLICY: TilePolicy = TilePolicy {
    block_threads: 256,
    items_per_thread: 8,
};

/// Tiles of the reduction.
pub const REDUCE_POLICY: TilePolicy = TilePolicy {
    block_threads: 256,
    items_per_thread: 8,
};
