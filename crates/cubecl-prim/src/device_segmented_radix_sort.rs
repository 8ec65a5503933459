//! Device-wide segmented radix sort.
//!
//! Every segment `[begin_offsets[i], end_offsets[i])` of the keys is sorted independently and
//! stably on the bits `bits` of the keys, which default to all of them. Values are gathered
//! along with their keys. Segments with `end <= begin` are empty, and keys outside of every
//! segment are left unspecified in the output.
//!
//! Every entry point follows the two-phase protocol: called without temporary storage it only
//! writes the required size to `temp_storage_bytes`; called with storage of at least that size
//! it enqueues the sort on `stream` and returns.
//!
//! The `*_double_buffer` variants ping-pong between both sides of a [DoubleBuffer] and set its
//! selector to the side holding the result before returning.

use crate::{
    PrimError,
    dispatch::{ActiveBackend, debug_synchronous},
};
use core::ops::Range;
use cubecl_prim_common::RadixKey;
use cubecl_prim_runtime::{
    Backend, DeviceBuffer, DoubleBuffer, InputIter, SegmentedSortProblem, SortBuffers, SortOrder,
    Stream, TempArg, TempStorage,
};

/// Sort the keys of every segment in ascending order.
#[allow(clippy::too_many_arguments)]
pub fn sort_keys<K, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys_in: &DeviceBuffer<K>,
    keys_out: &DeviceBuffer<K>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch::<K, (), BO, EO>(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Pair {
            input: keys_in,
            output: keys_out,
        },
        None,
        SortArgs::new(num_items, num_segments, bits, SortOrder::Ascending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in descending order.
#[allow(clippy::too_many_arguments)]
pub fn sort_keys_descending<K, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys_in: &DeviceBuffer<K>,
    keys_out: &DeviceBuffer<K>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch::<K, (), BO, EO>(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Pair {
            input: keys_in,
            output: keys_out,
        },
        None,
        SortArgs::new(num_items, num_segments, bits, SortOrder::Descending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in ascending order, gathering the values along.
#[allow(clippy::too_many_arguments)]
pub fn sort_pairs<K, V, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys_in: &DeviceBuffer<K>,
    keys_out: &DeviceBuffer<K>,
    values_in: &DeviceBuffer<V>,
    values_out: &DeviceBuffer<V>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    V: Copy + Send + Sync + 'static,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Pair {
            input: keys_in,
            output: keys_out,
        },
        Some(SortBuffers::Pair {
            input: values_in,
            output: values_out,
        }),
        SortArgs::new(num_items, num_segments, bits, SortOrder::Ascending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in descending order, gathering the values along.
#[allow(clippy::too_many_arguments)]
pub fn sort_pairs_descending<K, V, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys_in: &DeviceBuffer<K>,
    keys_out: &DeviceBuffer<K>,
    values_in: &DeviceBuffer<V>,
    values_out: &DeviceBuffer<V>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    V: Copy + Send + Sync + 'static,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Pair {
            input: keys_in,
            output: keys_out,
        },
        Some(SortBuffers::Pair {
            input: values_in,
            output: values_out,
        }),
        SortArgs::new(num_items, num_segments, bits, SortOrder::Descending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in ascending order, using both sides of `keys`.
#[allow(clippy::too_many_arguments)]
pub fn sort_keys_double_buffer<K, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: &mut DoubleBuffer<K>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch::<K, (), BO, EO>(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Double(keys),
        None,
        SortArgs::new(num_items, num_segments, bits, SortOrder::Ascending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in descending order, using both sides of `keys`.
#[allow(clippy::too_many_arguments)]
pub fn sort_keys_descending_double_buffer<K, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: &mut DoubleBuffer<K>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch::<K, (), BO, EO>(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Double(keys),
        None,
        SortArgs::new(num_items, num_segments, bits, SortOrder::Descending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in ascending order, gathering the values along, using both
/// sides of `keys` and `values`.
#[allow(clippy::too_many_arguments)]
pub fn sort_pairs_double_buffer<K, V, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: &mut DoubleBuffer<K>,
    values: &mut DoubleBuffer<V>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    V: Copy + Send + Sync + 'static,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Double(keys),
        Some(SortBuffers::Double(values)),
        SortArgs::new(num_items, num_segments, bits, SortOrder::Ascending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

/// Sort the keys of every segment in descending order, gathering the values along, using both
/// sides of `keys` and `values`.
#[allow(clippy::too_many_arguments)]
pub fn sort_pairs_descending_double_buffer<K, V, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: &mut DoubleBuffer<K>,
    values: &mut DoubleBuffer<V>,
    num_items: i32,
    num_segments: i32,
    begin_offsets: BO,
    end_offsets: EO,
    bits: Option<Range<u32>>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    V: Copy + Send + Sync + 'static,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        SortBuffers::Double(keys),
        Some(SortBuffers::Double(values)),
        SortArgs::new(num_items, num_segments, bits, SortOrder::Descending),
        begin_offsets,
        end_offsets,
        stream,
    )
}

debug_synchronous! {
    /// See [sort_keys].
    sort_keys_debug_synchronous => sort_keys<K, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys_in: &DeviceBuffer<K>,
        keys_out: &DeviceBuffer<K>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_keys_descending].
    sort_keys_descending_debug_synchronous => sort_keys_descending<K, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys_in: &DeviceBuffer<K>,
        keys_out: &DeviceBuffer<K>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_pairs].
    sort_pairs_debug_synchronous => sort_pairs<K, V, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys_in: &DeviceBuffer<K>,
        keys_out: &DeviceBuffer<K>,
        values_in: &DeviceBuffer<V>,
        values_out: &DeviceBuffer<V>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        V: Copy + Send + Sync + 'static,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_pairs_descending].
    sort_pairs_descending_debug_synchronous => sort_pairs_descending<K, V, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys_in: &DeviceBuffer<K>,
        keys_out: &DeviceBuffer<K>,
        values_in: &DeviceBuffer<V>,
        values_out: &DeviceBuffer<V>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        V: Copy + Send + Sync + 'static,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_keys_double_buffer].
    sort_keys_double_buffer_debug_synchronous => sort_keys_double_buffer<K, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: &mut DoubleBuffer<K>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_keys_descending_double_buffer].
    sort_keys_descending_double_buffer_debug_synchronous => sort_keys_descending_double_buffer<K, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: &mut DoubleBuffer<K>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_pairs_double_buffer].
    sort_pairs_double_buffer_debug_synchronous => sort_pairs_double_buffer<K, V, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: &mut DoubleBuffer<K>,
        values: &mut DoubleBuffer<V>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        V: Copy + Send + Sync + 'static,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

debug_synchronous! {
    /// See [sort_pairs_descending_double_buffer].
    sort_pairs_descending_double_buffer_debug_synchronous => sort_pairs_descending_double_buffer<K, V, BO, EO>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: &mut DoubleBuffer<K>,
        values: &mut DoubleBuffer<V>,
        num_items: i32,
        num_segments: i32,
        begin_offsets: BO,
        end_offsets: EO,
        bits: Option<Range<u32>>,
        stream: &Stream,
    )
    where
        K: RadixKey,
        V: Copy + Send + Sync + 'static,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
}

/// Scalar arguments shared by every entry point.
struct SortArgs {
    num_items: i32,
    num_segments: i32,
    bits: Option<Range<u32>>,
    order: SortOrder,
}

impl SortArgs {
    fn new(num_items: i32, num_segments: i32, bits: Option<Range<u32>>, order: SortOrder) -> Self {
        Self {
            num_items,
            num_segments,
            bits,
            order,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn launch<K, V, BO, EO>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: SortBuffers<'_, K>,
    values: Option<SortBuffers<'_, V>>,
    args: SortArgs,
    begin_offsets: BO,
    end_offsets: EO,
    stream: &Stream,
) -> Result<(), PrimError>
where
    K: RadixKey,
    V: Copy + Send + Sync + 'static,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    let num_items = usize::try_from(args.num_items).map_err(|_| {
        PrimError::invalid(format!("num_items can't be negative, got {}", args.num_items))
    })?;
    let num_segments = usize::try_from(args.num_segments).map_err(|_| {
        PrimError::invalid(format!(
            "num_segments can't be negative, got {}",
            args.num_segments
        ))
    })?;

    let key_bits = K::key_bits();
    let bits = args.bits.unwrap_or(0..key_bits);
    if bits.start > bits.end || bits.end > key_bits {
        return Err(PrimError::invalid(format!(
            "The bit range {bits:?} isn't within the {key_bits} bits of the keys"
        )));
    }

    check_sides("keys", keys.lens(), num_items)?;
    if let Some(values) = &values {
        check_sides("values", values.lens(), num_items)?;
    }
    check_offsets("begin_offsets", begin_offsets.bound(), num_segments)?;
    check_offsets("end_offsets", end_offsets.bound(), num_segments)?;

    let problem = SegmentedSortProblem::new(
        keys,
        values,
        num_items,
        num_segments,
        begin_offsets,
        end_offsets,
        bits,
        args.order,
    );
    ActiveBackend::segmented_radix_sort(
        TempArg::new(temp_storage, temp_storage_bytes),
        problem,
        stream,
    )?;

    Ok(())
}

fn check_sides(
    name: &str,
    (input, output): (usize, usize),
    num_items: usize,
) -> Result<(), PrimError> {
    if input < num_items || output < num_items {
        return Err(PrimError::invalid(format!(
            "The {name} buffers hold {input} and {output} elements, {num_items} are sorted"
        )));
    }

    Ok(())
}

fn check_offsets(
    name: &str,
    bound: Option<usize>,
    num_segments: usize,
) -> Result<(), PrimError> {
    match bound {
        Some(bound) if bound < num_segments => Err(PrimError::invalid(format!(
            "{name} holds {bound} offsets for {num_segments} segments"
        ))),
        _ => Ok(()),
    }
}
