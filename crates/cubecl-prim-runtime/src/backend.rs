use crate::{
    iter::{InputIter, OutputIter},
    memory::{DeviceBuffer, DoubleBuffer},
    stream::Stream,
    temp::TempStorage,
};
use core::ops::Range;
use cubecl_prim_common::{BinaryOp, CastFrom, KeyEquality, RadixKey};
use derive_new::new;
use thiserror::Error;

/// The temporary storage arguments of the two-phase protocol.
///
/// Without `storage` the call is a size query: the required byte count is written to `bytes`
/// and nothing else happens. With `storage` the call executes, provided `bytes` is at least the
/// queried size and the storage is at least `bytes` long.
#[derive(new, Debug)]
pub struct TempArg<'a> {
    /// The caller-allocated storage, `None` for a size query.
    pub storage: Option<&'a TempStorage>,
    /// The declared size of the storage in bytes.
    pub bytes: &'a mut usize,
}

/// Why the temporary storage of an execution was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TempError {
    /// The declared size is below the size query.
    #[error("{provided} bytes of temporary storage declared, {required} bytes required")]
    TooSmall {
        /// Bytes returned by the size query.
        required: usize,
        /// Bytes declared by the caller.
        provided: usize,
    },

    /// The storage holds fewer bytes than declared.
    #[error("{declared} bytes of temporary storage declared, the buffer holds {len}")]
    ShorterThanDeclared {
        /// Bytes declared by the caller.
        declared: usize,
        /// Bytes held by the storage.
        len: usize,
    },
}

impl<'a> TempArg<'a> {
    /// Answer a size query with `required` bytes, or check the storage of an execution.
    ///
    /// Returns the storage to launch with, `None` once a size query is answered.
    pub fn resolve(self, required: usize) -> Result<Option<&'a TempStorage>, TempError> {
        let Some(storage) = self.storage else {
            log::trace!("Size query: {required} bytes of temporary storage");
            *self.bytes = required;
            return Ok(None);
        };

        if *self.bytes < required {
            return Err(TempError::TooSmall {
                required,
                provided: *self.bytes,
            });
        }
        if storage.len() < *self.bytes {
            return Err(TempError::ShorterThanDeclared {
                declared: *self.bytes,
                len: storage.len(),
            });
        }

        Ok(Some(storage))
    }
}

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest keys first.
    Ascending,
    /// Largest keys first.
    Descending,
}

/// Where a sort reads its input and writes its output.
#[derive(Debug)]
pub enum SortBuffers<'a, T> {
    /// Distinct input and output buffers.
    Pair {
        /// Read only.
        input: &'a DeviceBuffer<T>,
        /// Written with the sorted sequence.
        output: &'a DeviceBuffer<T>,
    },
    /// Both sides of a double buffer; the selector is updated on enqueue.
    Double(&'a mut DoubleBuffer<T>),
}

impl<T: Copy + Send + Sync + 'static> SortBuffers<'_, T> {
    /// The buffer read by a sort of `passes` passes, and the buffer the result lands in.
    pub fn endpoints(&self, passes: u32) -> (DeviceBuffer<T>, DeviceBuffer<T>) {
        match self {
            SortBuffers::Pair { input, output } => ((*input).clone(), (*output).clone()),
            SortBuffers::Double(double) => {
                let output = if passes % 2 == 1 {
                    double.alternate().clone()
                } else {
                    double.current().clone()
                };
                (double.current().clone(), output)
            }
        }
    }

    /// Point the double buffer selector at the side holding the result.
    pub fn finish(self, passes: u32) {
        if let SortBuffers::Double(double) = self {
            double.set_selector(double.selector() ^ (passes as usize & 1));
        }
    }

    /// Length of the input and output sides.
    pub fn lens(&self) -> (usize, usize) {
        match self {
            SortBuffers::Pair { input, output } => (input.len(), output.len()),
            SortBuffers::Double(double) => (double.current().len(), double.alternate().len()),
        }
    }
}

/// A segmented radix sort as handed to a back-end.
#[derive(new, Debug)]
pub struct SegmentedSortProblem<'a, K, V, BO, EO> {
    /// The keys.
    pub keys: SortBuffers<'a, K>,
    /// The values gathered along with the keys, if any.
    pub values: Option<SortBuffers<'a, V>>,
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

/// How a scan treats the first element of every segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanKind<A> {
    /// The first output of a segment is its first input.
    Inclusive,
    /// The first output of a segment is `init`, and every output excludes its own input.
    Exclusive {
        /// The initial value of every segment.
        init: A,
    },
}

/// A scan by key as handed to a back-end.
#[derive(new, Debug)]
pub struct ScanByKeyProblem<KI, VI, OI, A, Op, Eq> {
    /// Keys deciding the segments.
    pub keys: KI,
    /// Values to scan.
    pub values: VI,
    /// Output of the scan; may alias `values`.
    pub output: OI,
    /// Number of elements.
    pub num_items: u64,
    /// Inclusive or exclusive.
    pub kind: ScanKind<A>,
    /// Associative operator on the accumulator.
    pub op: Op,
    /// Predicate deciding whether neighbouring keys share a segment.
    pub equality: Eq,
}

/// A reduction as handed to a back-end.
#[derive(new, Debug)]
pub struct ReduceProblem<I, OI, A, Op> {
    /// Values to reduce.
    pub input: I,
    /// Receives the single result.
    pub output: OI,
    /// Number of elements.
    pub num_items: u64,
    /// Associative operator on the accumulator.
    pub op: Op,
    /// Initial value of the reduction, and its result for an empty input.
    pub init: A,
}

/// The vendor primitive contract every back-end implements.
///
/// Each operation follows the two-phase protocol of [TempArg]: it never allocates device
/// memory, and once the arguments are accepted the work is enqueued on `stream` and the call
/// returns. Failures while the work runs surface on the next synchronisation of the stream.
pub trait Backend: Send + Sync + 'static {
    /// The status codes of the back-end.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Name of the back-end.
    const NAME: &'static str;

    /// Stable sort of the keys of every segment, gathering values along.
    fn segmented_radix_sort<K, V, BO, EO>(
        temp: TempArg<'_>,
        problem: SegmentedSortProblem<'_, K, V, BO, EO>,
        stream: &Stream,
    ) -> Result<(), Self::Error>
    where
        K: RadixKey,
        V: Copy + Send + Sync + 'static,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>;

    /// Scan of the values, restarted wherever the key changes.
    fn scan_by_key<KI, VI, OI, O, A, Op, Eq>(
        temp: TempArg<'_>,
        problem: ScanByKeyProblem<KI, VI, OI, A, Op, Eq>,
        stream: &Stream,
    ) -> Result<(), Self::Error>
    where
        KI: InputIter,
        VI: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: bytemuck::Pod + Send + Sync + CastFrom<VI::Item>,
        Op: BinaryOp<A>,
        Eq: KeyEquality<KI::Item>;

    /// Reduction of all the values to one.
    fn reduce<I, OI, O, A, Op>(
        temp: TempArg<'_>,
        problem: ReduceProblem<I, OI, A, Op>,
        stream: &Stream,
    ) -> Result<(), Self::Error>
    where
        I: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: Copy + Send + Sync + 'static + CastFrom<I::Item>,
        Op: BinaryOp<A>;
}
