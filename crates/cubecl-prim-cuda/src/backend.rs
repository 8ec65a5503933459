use crate::{CudaError, MAX_SCAN_ITEMS, RADIX_SORT_POLICY, TEMP_ALIGNMENT, TILE_POLICY};
use core::{any::type_name, marker::PhantomData};
use cubecl_prim_common::{BinaryOp, CastFrom, KeyEquality, RadixKey};
use cubecl_prim_runtime::{
    Backend, InputIter, OutputIter, ReduceProblem, ScanByKeyProblem, SegmentedSortProblem,
    Stream, TempArg,
    kernel::{
        RadixSortLayout, ReduceLayout, ReduceTask, ScanByKeyTask, ScanLayout, SegmentedSortTask,
    },
};

/// The NVIDIA-native back-end.
#[derive(Debug, Clone, Copy, Default)]
pub struct CudaBackend;

impl Backend for CudaBackend {
    type Error = CudaError;

    const NAME: &'static str = "cuda";

    fn segmented_radix_sort<K, V, BO, EO>(
        temp: TempArg<'_>,
        problem: SegmentedSortProblem<'_, K, V, BO, EO>,
        stream: &Stream,
    ) -> Result<(), CudaError>
    where
        K: RadixKey,
        V: Copy + Send + Sync + 'static,
        BO: InputIter<Item = i32>,
        EO: InputIter<Item = i32>,
    {
        let layout = RadixSortLayout::new::<K>(
            &RADIX_SORT_POLICY,
            problem.num_items,
            problem.num_segments,
        )?;
        let Some(storage) = temp.resolve(layout.size())? else {
            return Ok(());
        };
        if problem.num_items == 0 || problem.num_segments == 0 {
            log::debug!("Empty segmented radix sort, nothing to launch");
            return Ok(());
        }

        let passes = RADIX_SORT_POLICY.passes::<K>(&problem.bits);
        let (keys_in, keys_out) = problem.keys.endpoints(passes);
        let task = SegmentedSortTask {
            policy: RADIX_SORT_POLICY,
            layout,
            temp: storage.clone(),
            keys_in,
            keys_out,
            values: problem.values.as_ref().map(|values| values.endpoints(passes)),
            num_items: problem.num_items,
            num_segments: problem.num_segments,
            begin_offsets: problem.begin_offsets,
            end_offsets: problem.end_offsets,
            bits: problem.bits,
            order: problem.order,
        };
        let name = format!(
            "cuda::segmented_radix_sort<{}, {}>",
            type_name::<K>(),
            type_name::<V>()
        );
        stream.enqueue(name, move || task.execute())?;

        problem.keys.finish(passes);
        if let Some(values) = problem.values {
            values.finish(passes);
        }

        Ok(())
    }

    fn scan_by_key<KI, VI, OI, O, A, Op, Eq>(
        temp: TempArg<'_>,
        problem: ScanByKeyProblem<KI, VI, OI, A, Op, Eq>,
        stream: &Stream,
    ) -> Result<(), CudaError>
    where
        KI: InputIter,
        VI: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: bytemuck::Pod + Send + Sync + CastFrom<VI::Item>,
        Op: BinaryOp<A>,
        Eq: KeyEquality<KI::Item>,
    {
        if problem.num_items > MAX_SCAN_ITEMS {
            return Err(CudaError::NotSupported {
                reason: format!(
                    "Scans are limited to {MAX_SCAN_ITEMS} items, got {}",
                    problem.num_items
                ),
            });
        }

        let num_items = problem.num_items as usize;
        let layout = ScanLayout::new::<A>(&TILE_POLICY, TEMP_ALIGNMENT, num_items)?;
        let Some(storage) = temp.resolve(layout.size())? else {
            return Ok(());
        };
        if num_items == 0 {
            return Ok(());
        }

        let task = ScanByKeyTask {
            policy: TILE_POLICY,
            layout,
            temp: storage.clone(),
            keys: problem.keys,
            values: problem.values,
            output: problem.output,
            num_items,
            kind: problem.kind,
            op: problem.op,
            equality: problem.equality,
            _output: PhantomData,
        };
        stream.enqueue(
            format!("cuda::scan_by_key<{}>", type_name::<A>()),
            move || task.execute(),
        )?;

        Ok(())
    }

    fn reduce<I, OI, O, A, Op>(
        temp: TempArg<'_>,
        problem: ReduceProblem<I, OI, A, Op>,
        stream: &Stream,
    ) -> Result<(), CudaError>
    where
        I: InputIter,
        OI: OutputIter<O>,
        O: CastFrom<A> + Send + 'static,
        A: Copy + Send + Sync + 'static + CastFrom<I::Item>,
        Op: BinaryOp<A>,
    {
        let num_items = usize::try_from(problem.num_items).map_err(|_| CudaError::InvalidValue {
            reason: format!("{} items exceed the address space", problem.num_items),
        })?;
        let layout = ReduceLayout::new(TEMP_ALIGNMENT);
        let Some(storage) = temp.resolve(layout.size())? else {
            return Ok(());
        };

        let task = ReduceTask {
            policy: TILE_POLICY,
            layout,
            temp: storage.clone(),
            input: problem.input,
            output: problem.output,
            num_items,
            op: problem.op,
            init: problem.init,
            _output: PhantomData,
        };
        stream.enqueue(
            format!("cuda::reduce<{}>", type_name::<A>()),
            move || task.execute(),
        )?;

        Ok(())
    }
}
