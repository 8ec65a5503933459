use super::{TilePolicy, write_header};
use crate::{
    backend::ScanKind,
    error::{LaunchError, ServerError},
    iter::{InputIter, OutputIter},
    temp::{TempLayout, TempPartition, TempStorage},
};
use bytemuck::Pod;
use core::marker::PhantomData;
use cubecl_prim_common::{BinaryOp, CastFrom, KeyEquality};
use rayon::prelude::*;

const SCAN_TAG: u64 = 0x5343_414e_4b45_5900;

/// Tile status: the inclusive prefix of the tile is published.
const STATUS_PREFIX: u32 = 2;

/// Temporary storage layout of the scan by key.
///
/// After the header come one status word and one inclusive prefix per tile. Tiles publish
/// their prefix in order, each one reading the prefix of its predecessor.
#[derive(Debug, Clone)]
pub struct ScanLayout {
    layout: TempLayout,
    status: TempPartition,
    prefixes: TempPartition,
}

impl ScanLayout {
    /// Layout for scanning `num_items` items with an accumulator of type `A`.
    pub fn new<A: Pod>(
        policy: &TilePolicy,
        temp_alignment: usize,
        num_items: usize,
    ) -> Result<Self, LaunchError> {
        let tiles = policy.num_tiles(num_items);
        let mut layout = TempLayout::new(temp_alignment);
        let status = layout.reserve::<u32>(tiles)?;
        let prefixes = layout.reserve::<A>(tiles)?;

        Ok(Self {
            layout,
            status,
            prefixes,
        })
    }

    /// Required temporary storage in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

/// A scan by key ready to run on a stream.
pub struct ScanByKeyTask<KI, VI, OI, O, A, Op, Eq> {
    /// Shape of the tiles.
    pub policy: TilePolicy,
    /// Partitions of the temporary storage.
    pub layout: ScanLayout,
    /// The caller-provided temporary storage.
    pub temp: TempStorage,
    /// Keys deciding the segments.
    pub keys: KI,
    /// Values to scan.
    pub values: VI,
    /// Output; may alias `values`.
    pub output: OI,
    /// Number of items.
    pub num_items: usize,
    /// Inclusive or exclusive.
    pub kind: ScanKind<A>,
    /// Operator on the accumulator.
    pub op: Op,
    /// Key equality predicate.
    pub equality: Eq,
    /// Element type written to the output.
    pub _output: PhantomData<fn() -> O>,
}

struct TileSummary<A> {
    has_head: bool,
    aggregate: A,
}

impl<KI, VI, OI, O, A, Op, Eq> ScanByKeyTask<KI, VI, OI, O, A, Op, Eq>
where
    KI: InputIter,
    VI: InputIter,
    OI: OutputIter<O>,
    O: CastFrom<A> + Send + 'static,
    A: Pod + Send + Sync + CastFrom<VI::Item>,
    Op: BinaryOp<A>,
    Eq: KeyEquality<KI::Item>,
{
    /// Run the scan.
    ///
    /// Keys and values are fully read before the output is written.
    pub fn execute(self) -> Result<(), ServerError> {
        let num_items = self.num_items;
        let tile_items = self.policy.tile_items();
        let keys = self.keys.load(0, num_items);
        let mut scanned: Vec<A> = self
            .values
            .load(0, num_items)
            .into_iter()
            .map(A::cast_from)
            .collect();

        let heads: Vec<bool> = (0..num_items)
            .into_par_iter()
            .map(|i| i == 0 || !self.equality.equal(&keys[i - 1], &keys[i]))
            .collect();

        let init = match self.kind {
            ScanKind::Inclusive => None,
            ScanKind::Exclusive { init } => Some(init),
        };

        let summaries: Vec<TileSummary<A>> = scanned
            .par_chunks_mut(tile_items)
            .zip(heads.par_chunks(tile_items))
            .map(|(tile, heads)| scan_tile(tile, heads, init, &self.op))
            .collect();

        self.temp.map(|mut view| {
            let header = view.take::<u64>(self.layout.layout.header())?;
            write_header(header, SCAN_TAG, &[num_items as u64, summaries.len() as u64]);

            let status = view.take::<u32>(self.layout.status)?;
            let prefixes = view.take::<A>(self.layout.prefixes)?;
            status.fill(0);

            for (index, summary) in summaries.iter().enumerate() {
                prefixes[index] = if index == 0 || summary.has_head {
                    summary.aggregate
                } else {
                    self.op.apply(prefixes[index - 1], summary.aggregate)
                };
                status[index] = STATUS_PREFIX;
            }

            let status: &[u32] = status;
            let prefixes: &[A] = prefixes;
            scanned
                .par_chunks_mut(tile_items)
                .zip(heads.par_chunks(tile_items))
                .enumerate()
                .skip(1)
                .try_for_each(|(index, (tile, heads))| {
                    if status[index - 1] != STATUS_PREFIX {
                        return Err(ServerError::Execution {
                            reason: format!("The prefix of tile {} was never published", index - 1),
                        });
                    }

                    let prefix = prefixes[index - 1];
                    for (value, _) in tile.iter_mut().zip(heads).take_while(|(_, head)| !**head) {
                        *value = self.op.apply(prefix, *value);
                    }

                    Ok(())
                })
        })?;

        let output: Vec<O> = match init {
            None => scanned.into_iter().map(O::cast_from).collect(),
            Some(init) => (0..num_items)
                .map(|i| O::cast_from(if heads[i] { init } else { scanned[i - 1] }))
                .collect(),
        };
        self.output.store(0, &output);

        Ok(())
    }
}

/// Scan one tile in place, restarting at every head. Exclusive scans fold `init` into the
/// first element of every segment.
fn scan_tile<A: Copy, Op: BinaryOp<A>>(
    tile: &mut [A],
    heads: &[bool],
    init: Option<A>,
    op: &Op,
) -> TileSummary<A> {
    let mut has_head = false;
    let mut carry: Option<A> = None;

    for (value, &head) in tile.iter_mut().zip(heads) {
        let next = match (head, carry, init) {
            (true, _, Some(init)) => op.apply(init, *value),
            (true, _, None) => *value,
            (false, Some(carry), _) => op.apply(carry, *value),
            (false, None, _) => *value,
        };
        has_head |= head;
        *value = next;
        carry = Some(next);
    }

    TileSummary {
        has_head,
        aggregate: tile[tile.len() - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory::DeviceBuffer, stream::Stream};
    use cubecl_prim_common::{Equality, Sum};
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const TINY_TILES: TilePolicy = TilePolicy {
        block_threads: 2,
        items_per_thread: 2,
    };

    fn scan(keys: &[u32], values: &[i64], kind: ScanKind<i64>) -> Vec<i64> {
        let layout = ScanLayout::new::<i64>(&TINY_TILES, 256, keys.len()).unwrap();
        let output = DeviceBuffer::<i64>::empty(keys.len());
        let task = ScanByKeyTask {
            policy: TINY_TILES,
            temp: TempStorage::new(layout.size()),
            layout,
            keys: DeviceBuffer::from_slice(keys),
            values: DeviceBuffer::from_slice(values),
            output: output.clone(),
            num_items: keys.len(),
            kind,
            op: Sum,
            equality: Equality,
            _output: PhantomData,
        };

        let stream = Stream::new();
        stream.enqueue("scan", move || task.execute()).unwrap();
        stream.sync().unwrap();
        output.to_vec()
    }

    fn reference(keys: &[u32], values: &[i64], init: Option<i64>) -> Vec<i64> {
        let mut out = Vec::with_capacity(keys.len());
        let mut acc = 0;
        for i in 0..keys.len() {
            let head = i == 0 || keys[i - 1] != keys[i];
            match init {
                None => {
                    acc = if head { values[i] } else { acc + values[i] };
                    out.push(acc);
                }
                Some(init) => {
                    if head {
                        acc = init;
                    }
                    out.push(acc);
                    acc += values[i];
                }
            }
        }
        out
    }

    #[test]
    fn segments_spanning_many_tiles() {
        let mut rng = StdRng::seed_from_u64(123456789);
        let keys: Vec<u32> = (0..97).map(|i| i / 23).collect();
        let values: Vec<i64> = (0..97).map(|_| rng.random_range(-50..50)).collect();

        assert_eq!(
            scan(&keys, &values, ScanKind::Inclusive),
            reference(&keys, &values, None)
        );
        assert_eq!(
            scan(&keys, &values, ScanKind::Exclusive { init: 7 }),
            reference(&keys, &values, Some(7))
        );
    }

    #[test]
    fn random_segments() {
        let mut rng = StdRng::seed_from_u64(987654321);
        let mut key = 0;
        let keys: Vec<u32> = (0..257)
            .map(|_| {
                if rng.random_bool(0.2) {
                    key += 1;
                }
                key
            })
            .collect();
        let values: Vec<i64> = (0..257).map(|_| rng.random_range(0..1000)).collect();

        assert_eq!(
            scan(&keys, &values, ScanKind::Inclusive),
            reference(&keys, &values, None)
        );
        assert_eq!(
            scan(&keys, &values, ScanKind::Exclusive { init: -3 }),
            reference(&keys, &values, Some(-3))
        );
    }
}
