//! Device-wide scans by key.
//!
//! A segment is a maximal run of consecutive positions whose neighbouring keys are equal
//! according to the `equality` predicate. The scan restarts at the first position of every
//! segment, the head:
//!
//! - an inclusive scan writes `v[head] ⊕ … ⊕ v[i]` at position `i`;
//! - an exclusive scan writes `init` at the head and `init ⊕ v[head] ⊕ … ⊕ v[i - 1]` after it.
//!
//! Scans with an operator accumulate in the type of the operator, sums accumulate in
//! [Numeric::Accumulator], and results are converted to the element type of the output. The
//! output may be the values buffer itself.

use crate::{
    PrimError,
    dispatch::{ActiveBackend, debug_synchronous},
};
use bytemuck::Pod;
use cubecl_prim_common::{BinaryOp, CastFrom, KeyEquality, Numeric, Sum};
use cubecl_prim_runtime::{
    Backend, InputIter, OutputIter, ScanByKeyProblem, ScanKind, Stream, TempArg, TempStorage,
};

/// Inclusive sum of the values of every segment.
#[allow(clippy::too_many_arguments)]
pub fn inclusive_sum_by_key<KI, VI, OI, O, Eq>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: KI,
    values: VI,
    output: OI,
    num_items: u32,
    equality: Eq,
    stream: &Stream,
) -> Result<(), PrimError>
where
    KI: InputIter,
    VI: InputIter,
    VI::Item: Numeric,
    OI: OutputIter<O>,
    O: CastFrom<<VI::Item as Numeric>::Accumulator> + Send + 'static,
    Eq: KeyEquality<KI::Item>,
{
    launch::<_, _, _, O, <VI::Item as Numeric>::Accumulator, _, _>(
        temp_storage,
        temp_storage_bytes,
        ScanByKeyProblem::new(
            keys,
            values,
            output,
            num_items as u64,
            ScanKind::Inclusive,
            Sum,
            equality,
        ),
        stream,
    )
}

/// Exclusive sum of the values of every segment, starting from `init`.
#[allow(clippy::too_many_arguments)]
pub fn exclusive_sum_by_key<KI, VI, OI, O, Eq>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: KI,
    values: VI,
    output: OI,
    init: <VI::Item as Numeric>::Accumulator,
    num_items: u32,
    equality: Eq,
    stream: &Stream,
) -> Result<(), PrimError>
where
    KI: InputIter,
    VI: InputIter,
    VI::Item: Numeric,
    OI: OutputIter<O>,
    O: CastFrom<<VI::Item as Numeric>::Accumulator> + Send + 'static,
    Eq: KeyEquality<KI::Item>,
{
    launch::<_, _, _, O, _, _, _>(
        temp_storage,
        temp_storage_bytes,
        ScanByKeyProblem::new(
            keys,
            values,
            output,
            num_items as u64,
            ScanKind::Exclusive { init },
            Sum,
            equality,
        ),
        stream,
    )
}

/// Inclusive scan of the values of every segment with `scan_op`.
#[allow(clippy::too_many_arguments)]
pub fn inclusive_scan_by_key<KI, VI, OI, O, A, Op, Eq>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: KI,
    values: VI,
    output: OI,
    scan_op: Op,
    num_items: u32,
    equality: Eq,
    stream: &Stream,
) -> Result<(), PrimError>
where
    KI: InputIter,
    VI: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Pod + Send + Sync + CastFrom<VI::Item>,
    Op: BinaryOp<A>,
    Eq: KeyEquality<KI::Item>,
{
    launch::<_, _, _, O, A, _, _>(
        temp_storage,
        temp_storage_bytes,
        ScanByKeyProblem::new(
            keys,
            values,
            output,
            num_items as u64,
            ScanKind::Inclusive,
            scan_op,
            equality,
        ),
        stream,
    )
}

/// Exclusive scan of the values of every segment with `scan_op`, starting from `init`.
#[allow(clippy::too_many_arguments)]
pub fn exclusive_scan_by_key<KI, VI, OI, O, A, Op, Eq>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    keys: KI,
    values: VI,
    output: OI,
    scan_op: Op,
    init: A,
    num_items: u32,
    equality: Eq,
    stream: &Stream,
) -> Result<(), PrimError>
where
    KI: InputIter,
    VI: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Pod + Send + Sync + CastFrom<VI::Item>,
    Op: BinaryOp<A>,
    Eq: KeyEquality<KI::Item>,
{
    launch::<_, _, _, O, A, _, _>(
        temp_storage,
        temp_storage_bytes,
        ScanByKeyProblem::new(
            keys,
            values,
            output,
            num_items as u64,
            ScanKind::Exclusive { init },
            scan_op,
            equality,
        ),
        stream,
    )
}

debug_synchronous! {
    /// See [inclusive_sum_by_key].
    inclusive_sum_by_key_debug_synchronous => inclusive_sum_by_key<KI, VI, OI, O, Eq>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: KI,
        values: VI,
        output: OI,
        num_items: u32,
        equality: Eq,
        stream: &Stream,
    )
    where
        KI: InputIter,
        VI: InputIter,
        VI::Item: Numeric,
        OI: OutputIter<O>,
        O: CastFrom<<VI::Item as Numeric>::Accumulator> + Send + 'static,
        Eq: KeyEquality<KI::Item>,
}

debug_synchronous! {
    /// See [exclusive_sum_by_key].
    exclusive_sum_by_key_debug_synchronous => exclusive_sum_by_key<KI, VI, OI, O, Eq>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: KI,
        values: VI,
        output: OI,
        init: <VI::Item as Numeric>::Accumulator,
        num_items: u32,
        equality: Eq,
        stream: &Stream,
    )
    where
        KI: InputIter,
        VI: InputIter,
        VI::Item: Numeric,
        OI: OutputIter<O>,
        O: CastFrom<<VI::Item as Numeric>::Accumulator> + Send + 'static,
        Eq: KeyEquality<KI::Item>,
}

debug_synchronous! {
    /// See [inclusive_scan_by_key].
    inclusive_scan_by_key_debug_synchronous => inclusive_scan_by_key<KI, VI, OI, O, A, Op, Eq>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: KI,
        values: VI,
        output: OI,
        scan_op: Op,
        num_items: u32,
        equality: Eq,
        stream: &Stream,
    )
    where
        KI: InputIter,
        VI: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: Pod + Send + Sync + CastFrom<VI::Item>,
        Op: BinaryOp<A>,
        Eq: KeyEquality<KI::Item>,
}

debug_synchronous! {
    /// See [exclusive_scan_by_key].
    exclusive_scan_by_key_debug_synchronous => exclusive_scan_by_key<KI, VI, OI, O, A, Op, Eq>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        keys: KI,
        values: VI,
        output: OI,
        scan_op: Op,
        init: A,
        num_items: u32,
        equality: Eq,
        stream: &Stream,
    )
    where
        KI: InputIter,
        VI: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: Pod + Send + Sync + CastFrom<VI::Item>,
        Op: BinaryOp<A>,
        Eq: KeyEquality<KI::Item>,
}

fn launch<KI, VI, OI, O, A, Op, Eq>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    problem: ScanByKeyProblem<KI, VI, OI, A, Op, Eq>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    KI: InputIter,
    VI: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Pod + Send + Sync + CastFrom<VI::Item>,
    Op: BinaryOp<A>,
    Eq: KeyEquality<KI::Item>,
{
    let num_items = problem.num_items as usize;
    for (name, bound) in [
        ("keys", problem.keys.bound()),
        ("values", problem.values.bound()),
        ("output", problem.output.bound()),
    ] {
        match bound {
            Some(bound) if bound < num_items => {
                return Err(PrimError::invalid(format!(
                    "The {name} hold {bound} elements, {num_items} are scanned"
                )));
            }
            _ => {}
        }
    }

    ActiveBackend::scan_by_key(
        TempArg::new(temp_storage, temp_storage_bytes),
        problem,
        stream,
    )?;

    Ok(())
}
