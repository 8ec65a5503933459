use super::write_header;
use crate::{
    backend::SortOrder,
    error::{LaunchError, ServerError},
    iter::InputIter,
    memory::DeviceBuffer,
    temp::{TempLayout, TempPartition, TempStorage},
};
use core::{cmp::Ordering, ops::Range};
use cubecl_prim_common::{RadixBits, RadixKey};
use rayon::prelude::*;

const SORT_TAG: u64 = 0x5345_4753_4f52_5400;

/// Tuning of the segmented radix sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadixSortPolicy {
    /// Digit width of one pass for keys wider than one byte.
    pub radix_bits: u32,
    /// Digit width of one pass for one-byte keys.
    pub small_key_radix_bits: u32,
    /// Segments up to this length are sorted with a single comparison sort instead of
    /// digit passes. The number of passes reported to double buffers is unaffected.
    pub small_segment_items: usize,
    /// Segments sorted concurrently. Every lane owns one row of digit counters in the
    /// temporary storage.
    pub sort_lanes: usize,
    /// Alignment of the temporary partitions.
    pub temp_alignment: usize,
}

impl RadixSortPolicy {
    /// Digit width used for keys of type `K`.
    pub fn radix_bits<K: RadixKey>(&self) -> u32 {
        if K::key_bits() > 8 {
            self.radix_bits
        } else {
            self.small_key_radix_bits
        }
    }

    /// Number of digit passes needed to sort `bits`.
    pub fn passes<K: RadixKey>(&self, bits: &Range<u32>) -> u32 {
        (bits.end - bits.start).div_ceil(self.radix_bits::<K>())
    }
}

/// Temporary storage layout of the segmented radix sort.
///
/// After the header come the segment table (begin/end pairs), two rank arrays the digit passes
/// ping-pong between, the keys mapped to their order-preserving bits and one row of digit
/// counters per lane.
#[derive(Debug, Clone)]
pub struct RadixSortLayout {
    layout: TempLayout,
    segments: TempPartition,
    ranks: TempPartition,
    alt_ranks: TempPartition,
    keys: TempPartition,
    counters: TempPartition,
    lanes: usize,
}

impl RadixSortLayout {
    /// Layout for `num_items` keys of type `K` split in `num_segments` segments.
    pub fn new<K: RadixKey>(
        policy: &RadixSortPolicy,
        num_items: usize,
        num_segments: usize,
    ) -> Result<Self, LaunchError> {
        let lanes = policy.sort_lanes.min(num_segments).min(num_items).max(1);
        let buckets = 1usize << policy.radix_bits::<K>();

        let mut layout = TempLayout::new(policy.temp_alignment);
        let segments = layout.reserve::<[i32; 2]>(num_segments)?;
        let ranks = layout.reserve::<u32>(num_items)?;
        let alt_ranks = layout.reserve::<u32>(num_items)?;
        let keys = layout.reserve::<K::Bits>(num_items)?;
        let counters = layout.reserve::<u32>(lanes * buckets)?;

        Ok(Self {
            layout,
            segments,
            ranks,
            alt_ranks,
            keys,
            counters,
            lanes,
        })
    }

    /// Required temporary storage in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Number of segments sorted concurrently.
    pub fn lanes(&self) -> usize {
        self.lanes
    }
}

/// A segmented radix sort ready to run on a stream.
pub struct SegmentedSortTask<K, V, BO, EO> {
    /// Tuning of the launch.
    pub policy: RadixSortPolicy,
    /// Partitions of the temporary storage.
    pub layout: RadixSortLayout,
    /// The caller-provided temporary storage.
    pub temp: TempStorage,
    /// Keys to sort.
    pub keys_in: DeviceBuffer<K>,
    /// Receives the sorted keys; may be `keys_in`.
    pub keys_out: DeviceBuffer<K>,
    /// Values to gather and their destination; the destination may be the source.
    pub values: Option<(DeviceBuffer<V>, DeviceBuffer<V>)>,
    /// Number of keys.
    pub num_items: usize,
    /// Number of segments.
    pub num_segments: usize,
    /// Offset of the first key of every segment.
    pub begin_offsets: BO,
    /// Offset past the last key of every segment.
    pub end_offsets: EO,
    /// The key bits participating in the ordering.
    pub bits: Range<u32>,
    /// Sort direction.
    pub order: SortOrder,
}

impl<K, V, BO, EO> SegmentedSortTask<K, V, BO, EO>
where
    K: RadixKey,
    V: Copy + Send + Sync + 'static,
    BO: InputIter<Item = i32>,
    EO: InputIter<Item = i32>,
{
    /// Run the sort.
    ///
    /// All inputs are read before any output is written, so the outputs may alias the inputs.
    pub fn execute(self) -> Result<(), ServerError> {
        let num_items = self.num_items;
        let begins = self.begin_offsets.load(0, self.num_segments);
        let ends = self.end_offsets.load(0, self.num_segments);
        let values = self
            .values
            .as_ref()
            .map(|(input, _)| input.read(0, num_items));

        self.temp.map(|mut view| {
            let header = view.take::<u64>(self.layout.layout.header())?;
            write_header(
                header,
                SORT_TAG,
                &[
                    num_items as u64,
                    self.num_segments as u64,
                    self.layout.lanes as u64,
                ],
            );

            let segments = view.take::<[i32; 2]>(self.layout.segments)?;
            let ranks = view.take::<u32>(self.layout.ranks)?;
            let alt_ranks = view.take::<u32>(self.layout.alt_ranks)?;
            let staged = view.take::<K::Bits>(self.layout.keys)?;
            let counters = view.take::<u32>(self.layout.counters)?;

            for (index, segment) in segments.iter_mut().enumerate() {
                *segment = [begins[index], ends[index]];
                check_segment(index, *segment, num_items)?;
            }
            let segments = order_segments(segments)?;

            self.keys_in.read_with(0, num_items, |keys| {
                staged
                    .par_iter_mut()
                    .zip(keys.par_iter())
                    .for_each(|(bits, key)| *bits = key.to_radix());
            });
            let staged: &[K::Bits] = staged;

            let sorter = SegmentSorter {
                staged,
                bits: self.bits.clone(),
                radix_bits: self.policy.radix_bits::<K>(),
                order: self.order,
                small_segment_items: self.policy.small_segment_items,
            };
            sorter.sort_segments(segments, 0, ranks, alt_ranks, counters);

            let ranks: &[u32] = ranks;
            self.keys_out.write_with(0, num_items, |keys| {
                gather(keys, segments, ranks, |rank| K::from_radix(staged[rank]));
            });
            if let (Some(values), Some((_, values_out))) = (&values, &self.values) {
                values_out.write_with(0, num_items, |output| {
                    gather(output, segments, ranks, |rank| values[rank]);
                });
            }

            Ok(())
        })
    }
}

fn check_segment(
    index: usize,
    [begin, end]: [i32; 2],
    num_items: usize,
) -> Result<(), ServerError> {
    if end > begin && (begin < 0 || end as usize > num_items) {
        return Err(ServerError::DeviceFault {
            reason: format!(
                "Segment {index} covers [{begin}, {end}), outside of the {num_items} keys"
            ),
        });
    }

    Ok(())
}

/// Sort the segment table by begin offset, returning its non-empty segments.
///
/// Non-empty segments must not overlap, every key being owned by at most one segment.
fn order_segments(segments: &mut [[i32; 2]]) -> Result<&[[i32; 2]], ServerError> {
    segments.par_sort_unstable_by_key(|&[begin, end]| (end <= begin, begin));
    let active = segments.partition_point(|&[begin, end]| end > begin);
    let segments = &segments[..active];

    if let Some(pair) = segments.windows(2).find(|pair| pair[0][1] > pair[1][0]) {
        return Err(ServerError::DeviceFault {
            reason: format!(
                "Segments [{}, {}) and [{}, {}) overlap",
                pair[0][0], pair[0][1], pair[1][0], pair[1][1]
            ),
        });
    }

    Ok(segments)
}

/// Write `item(rank)` at every position covered by `segments`, leaving the others untouched.
fn gather<T: Send>(
    output: &mut [T],
    segments: &[[i32; 2]],
    ranks: &[u32],
    item: impl Fn(usize) -> T + Sync,
) {
    for &[begin, end] in segments {
        let range = begin as usize..end as usize;
        output[range.clone()]
            .par_iter_mut()
            .zip(ranks[range].par_iter())
            .for_each(|(slot, &rank)| *slot = item(rank as usize));
    }
}

/// Sorts the staged keys of disjoint segments, keeping the ranks and the digit counters in the
/// temporary storage.
struct SegmentSorter<'a, B> {
    staged: &'a [B],
    bits: Range<u32>,
    radix_bits: u32,
    order: SortOrder,
    small_segment_items: usize,
}

impl<B: RadixBits> SegmentSorter<'_, B> {
    fn buckets(&self) -> usize {
        1 << self.radix_bits
    }

    /// Sort `segments`, ordered by begin and disjoint, whose positions start at `base` in
    /// `ranks` and `alt_ranks`.
    ///
    /// The segments are split in two halves sorted in parallel, each half getting half of the
    /// counter rows, until a single row remains.
    fn sort_segments(
        &self,
        segments: &[[i32; 2]],
        base: usize,
        ranks: &mut [u32],
        alt_ranks: &mut [u32],
        counters: &mut [u32],
    ) {
        let lanes = counters.len() / self.buckets();

        if lanes < 2 || segments.len() < 2 {
            let counters = &mut counters[..self.buckets()];
            for &[begin, end] in segments {
                let range = begin as usize - base..end as usize - base;
                self.sort_segment(
                    begin as usize,
                    &mut ranks[range.clone()],
                    &mut alt_ranks[range],
                    counters,
                );
            }
            return;
        }

        let mid = segments.len() / 2;
        let split = segments[mid][0] as usize - base;
        let (ranks_lhs, ranks_rhs) = ranks.split_at_mut(split);
        let (alt_lhs, alt_rhs) = alt_ranks.split_at_mut(split);
        let (counters_lhs, counters_rhs) = counters.split_at_mut(lanes / 2 * self.buckets());

        rayon::join(
            || self.sort_segments(&segments[..mid], base, ranks_lhs, alt_lhs, counters_lhs),
            || {
                self.sort_segments(
                    &segments[mid..],
                    base + split,
                    ranks_rhs,
                    alt_rhs,
                    counters_rhs,
                )
            },
        );
    }

    /// Stable sort of the segment starting at `begin`, leaving in `ranks` the source position
    /// of every output position.
    ///
    /// Least significant digit first: each pass is a stable counting sort on one digit from
    /// one rank array to the other, and the descending order counts inverted digits.
    fn sort_segment(
        &self,
        begin: usize,
        ranks: &mut [u32],
        alt_ranks: &mut [u32],
        counters: &mut [u32],
    ) {
        for (offset, rank) in ranks.iter_mut().enumerate() {
            *rank = (begin + offset) as u32;
        }

        let bits = &self.bits;
        if bits.start == bits.end || ranks.len() < 2 {
            return;
        }

        if ranks.len() <= self.small_segment_items {
            ranks.sort_unstable_by(|&lhs, &rhs| self.compare(lhs, rhs).then(lhs.cmp(&rhs)));
            return;
        }

        let (mut source, mut destination) = (&mut *ranks, &mut *alt_ranks);
        let mut in_alt = false;
        let mut shift = bits.start;

        while shift < bits.end {
            let width = self.radix_bits.min(bits.end - shift);
            let buckets = 1usize << width;
            let digit = |rank: u32| {
                let digit = self.staged[rank as usize].digit(shift, width);
                match self.order {
                    SortOrder::Ascending => digit,
                    SortOrder::Descending => buckets - 1 - digit,
                }
            };

            let offsets = &mut counters[..buckets];
            offsets.fill(0);
            for &rank in source.iter() {
                offsets[digit(rank)] += 1;
            }

            let mut running = 0;
            for offset in offsets.iter_mut() {
                let count = *offset;
                *offset = running;
                running += count;
            }

            for &rank in source.iter() {
                let slot = &mut offsets[digit(rank)];
                destination[*slot as usize] = rank;
                *slot += 1;
            }

            core::mem::swap(&mut source, &mut destination);
            in_alt = !in_alt;
            shift += width;
        }

        if in_alt {
            ranks.copy_from_slice(alt_ranks);
        }
    }

    fn compare(&self, lhs: u32, rhs: u32) -> Ordering {
        let lhs = self.staged[lhs as usize].masked(self.bits.start, self.bits.end);
        let rhs = self.staged[rhs as usize].masked(self.bits.start, self.bits.end);

        match self.order {
            SortOrder::Ascending => lhs.cmp(&rhs),
            SortOrder::Descending => rhs.cmp(&lhs),
        }
    }
}
