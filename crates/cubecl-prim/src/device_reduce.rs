//! Device-wide reductions.
//!
//! Every reduction writes a single element to its output. An empty input writes the initial
//! value of the reduction.

use crate::{
    PrimError,
    dispatch::{ActiveBackend, debug_synchronous},
};
use cubecl_prim_common::{
    ArgMax, ArgMin, BinaryOp, CastFrom, KeyValuePair, Max, Min, Numeric, NumericLimits, Sum,
};
use cubecl_prim_runtime::{
    ArgIndexIter, Backend, InputIter, OutputIter, ReduceProblem, Stream, TempArg, TempStorage,
};

/// Reduce the input with `reduce_op`, starting from `init`.
#[allow(clippy::too_many_arguments)]
pub fn reduce<I, OI, O, A, Op>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    input: I,
    output: OI,
    num_items: u32,
    reduce_op: Op,
    init: A,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Copy + Send + Sync + 'static + CastFrom<I::Item>,
    Op: BinaryOp<A>,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        ReduceProblem::new(input, output, num_items as u64, reduce_op, init),
        stream,
    )
}

/// Sum of the input, accumulated in [Numeric::Accumulator].
pub fn sum<I, OI, O>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    input: I,
    output: OI,
    num_items: u32,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    I::Item: Numeric,
    OI: OutputIter<O>,
    O: CastFrom<<I::Item as Numeric>::Accumulator> + Send + 'static,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        ReduceProblem::new(
            input,
            output,
            num_items as u64,
            Sum,
            <<I::Item as Numeric>::Accumulator as Numeric>::zero(),
        ),
        stream,
    )
}

/// Smallest element of the input.
pub fn min<I, OI, O>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    input: I,
    output: OI,
    num_items: u32,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    I::Item: PartialOrd + NumericLimits,
    OI: OutputIter<O>,
    O: CastFrom<I::Item> + Send + 'static,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        ReduceProblem::new(
            input,
            output,
            num_items as u64,
            Min,
            <I::Item as NumericLimits>::max_value(),
        ),
        stream,
    )
}

/// Largest element of the input.
pub fn max<I, OI, O>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    input: I,
    output: OI,
    num_items: u32,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    I::Item: PartialOrd + NumericLimits,
    OI: OutputIter<O>,
    O: CastFrom<I::Item> + Send + 'static,
{
    launch(
        temp_storage,
        temp_storage_bytes,
        ReduceProblem::new(
            input,
            output,
            num_items as u64,
            Max,
            <I::Item as NumericLimits>::lowest(),
        ),
        stream,
    )
}

/// Smallest element of the input along with its position, the first one on ties.
///
/// An empty input writes `{ key: 1, value: max }`.
pub fn arg_min<I, OI>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    input: I,
    output: OI,
    num_items: u32,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    I::Item: PartialOrd + NumericLimits,
    OI: OutputIter<KeyValuePair<u32, I::Item>>,
{
    let init = match num_items {
        0 => KeyValuePair::new(1, <I::Item as NumericLimits>::max_value()),
        _ => KeyValuePair::new(1, <I::Item as NumericLimits>::max_special()),
    };

    launch(
        temp_storage,
        temp_storage_bytes,
        ReduceProblem::new(ArgIndexIter::new(input), output, num_items as u64, ArgMin, init),
        stream,
    )
}

/// Largest element of the input along with its position, the first one on ties.
///
/// An empty input writes `{ key: 1, value: lowest }`.
pub fn arg_max<I, OI>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    input: I,
    output: OI,
    num_items: u32,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    I::Item: PartialOrd + NumericLimits,
    OI: OutputIter<KeyValuePair<u32, I::Item>>,
{
    let init = match num_items {
        0 => KeyValuePair::new(1, <I::Item as NumericLimits>::lowest()),
        _ => KeyValuePair::new(1, <I::Item as NumericLimits>::lowest_special()),
    };

    launch(
        temp_storage,
        temp_storage_bytes,
        ReduceProblem::new(ArgIndexIter::new(input), output, num_items as u64, ArgMax, init),
        stream,
    )
}

debug_synchronous! {
    /// See [reduce].
    reduce_debug_synchronous => reduce<I, OI, O, A, Op>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        input: I,
        output: OI,
        num_items: u32,
        reduce_op: Op,
        init: A,
        stream: &Stream,
    )
    where
        I: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: Copy + Send + Sync + 'static + CastFrom<I::Item>,
        Op: BinaryOp<A>,
}

debug_synchronous! {
    /// See [sum].
    sum_debug_synchronous => sum<I, OI, O>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        input: I,
        output: OI,
        num_items: u32,
        stream: &Stream,
    )
    where
        I: InputIter,
        I::Item: Numeric,
        OI: OutputIter<O>,
        O: CastFrom<<I::Item as Numeric>::Accumulator> + Send + 'static,
}

debug_synchronous! {
    /// See [min].
    min_debug_synchronous => min<I, OI, O>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        input: I,
        output: OI,
        num_items: u32,
        stream: &Stream,
    )
    where
        I: InputIter,
        I::Item: PartialOrd + NumericLimits,
        OI: OutputIter<O>,
        O: CastFrom<I::Item> + Send + 'static,
}

debug_synchronous! {
    /// See [max].
    max_debug_synchronous => max<I, OI, O>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        input: I,
        output: OI,
        num_items: u32,
        stream: &Stream,
    )
    where
        I: InputIter,
        I::Item: PartialOrd + NumericLimits,
        OI: OutputIter<O>,
        O: CastFrom<I::Item> + Send + 'static,
}

debug_synchronous! {
    /// See [arg_min].
    arg_min_debug_synchronous => arg_min<I, OI>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        input: I,
        output: OI,
        num_items: u32,
        stream: &Stream,
    )
    where
        I: InputIter,
        I::Item: PartialOrd + NumericLimits,
        OI: OutputIter<KeyValuePair<u32, I::Item>>,
}

debug_synchronous! {
    /// See [arg_max].
    arg_max_debug_synchronous => arg_max<I, OI>(
        temp_storage: Option<&TempStorage>,
        temp_storage_bytes: &mut usize,
        input: I,
        output: OI,
        num_items: u32,
        stream: &Stream,
    )
    where
        I: InputIter,
        I::Item: PartialOrd + NumericLimits,
        OI: OutputIter<KeyValuePair<u32, I::Item>>,
}

fn launch<I, OI, O, A, Op>(
    temp_storage: Option<&TempStorage>,
    temp_storage_bytes: &mut usize,
    problem: ReduceProblem<I, OI, A, Op>,
    stream: &Stream,
) -> Result<(), PrimError>
where
    I: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Copy + Send + Sync + 'static + CastFrom<I::Item>,
    Op: BinaryOp<A>,
{
    let num_items = problem.num_items as usize;
    if let Some(bound) = problem.input.bound().filter(|bound| *bound < num_items) {
        return Err(PrimError::invalid(format!(
            "The input holds {bound} elements, {num_items} are reduced"
        )));
    }
    if problem.output.bound() == Some(0) {
        return Err(PrimError::invalid("The output can't hold the result"));
    }

    ActiveBackend::reduce(
        TempArg::new(temp_storage, temp_storage_bytes),
        problem,
        stream,
    )?;

    Ok(())
}
