use super::{TilePolicy, write_header};
use crate::{
    error::ServerError,
    iter::{InputIter, OutputIter},
    temp::{TempLayout, TempStorage},
};
use core::marker::PhantomData;
use cubecl_prim_common::{BinaryOp, CastFrom};
use rayon::prelude::*;

const REDUCE_TAG: u64 = 0x5245_4455_4345_0000;

/// Temporary storage layout of a reduction: only the header, the tile partials being combined
/// as the tiles complete.
#[derive(Debug, Clone)]
pub struct ReduceLayout {
    layout: TempLayout,
}

impl ReduceLayout {
    /// Layout holding only the header.
    pub fn new(temp_alignment: usize) -> Self {
        Self {
            layout: TempLayout::new(temp_alignment),
        }
    }

    /// Required temporary storage in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

/// A reduction ready to run on a stream.
pub struct ReduceTask<I, OI, O, A, Op> {
    pub policy: TilePolicy,
    pub layout: ReduceLayout,
    pub temp: TempStorage,
    pub input: I,
    pub output: OI,
    pub num_items: usize,
    pub op: Op,
    pub init: A,
    pub _output: PhantomData<fn() -> O>,
}

impl<I, OI, O, A, Op> ReduceTask<I, OI, O, A, Op>
where
    I: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Copy + Send + Sync + 'static + CastFrom<I::Item>,
    Op: BinaryOp<A>,
{
    /// Fold every tile in parallel and combine neighbouring partials in tile order, then apply
    /// the total to `init`.
    pub fn execute(self) -> Result<(), ServerError> {
        let tile_items = self.policy.tile_items();

        self.temp.map(|mut view| -> Result<(), ServerError> {
            let header = view.take::<u64>(self.layout.layout.header())?;
            write_header(
                header,
                REDUCE_TAG,
                &[
                    self.num_items as u64,
                    self.policy.num_tiles(self.num_items) as u64,
                ],
            );

            Ok(())
        })?;

        let items = self.input.load(0, self.num_items);
        let total = items
            .par_chunks(tile_items)
            .map(|tile| {
                let first = A::cast_from(tile[0]);
                tile[1..]
                    .iter()
                    .fold(first, |acc, item| self.op.apply(acc, A::cast_from(*item)))
            })
            .reduce_with(|lhs, rhs| self.op.apply(lhs, rhs));

        let result = match total {
            Some(total) => self.op.apply(self.init, total),
            None => self.init,
        };
        self.output.store(0, &[O::cast_from(result)]);

        Ok(())
    }
}
