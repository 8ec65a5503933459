use core::ops::Range;
use cubecl_prim::{
    DeviceBuffer, DoubleBuffer, PrimError, RadixBits, RadixKey, Stream, TempStorage, bf16,
    device_segmented_radix_sort as sort, f16,
};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Keys the random tests can generate.
trait TestKey: RadixKey + Default {
    fn random(rng: &mut StdRng) -> Self;
}

macro_rules! impl_test_key_int {
    ($($ty:ty),*) => {
        $(
            impl TestKey for $ty {
                fn random(rng: &mut StdRng) -> Self {
                    rng.random()
                }
            }
        )*
    };
}

impl_test_key_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl TestKey for f32 {
    fn random(rng: &mut StdRng) -> Self {
        match rng.random_range(0..10) {
            0 => -0.0,
            1 => 0.0,
            _ => rng.random_range(-1.0e6..1.0e6),
        }
    }
}

impl TestKey for f64 {
    fn random(rng: &mut StdRng) -> Self {
        match rng.random_range(0..10) {
            0 => -0.0,
            1 => f64::INFINITY,
            _ => rng.random_range(-1.0e12..1.0e12),
        }
    }
}

impl TestKey for f16 {
    fn random(rng: &mut StdRng) -> Self {
        f16::from_f32(rng.random_range(-6.0e4..6.0e4))
    }
}

impl TestKey for bf16 {
    fn random(rng: &mut StdRng) -> Self {
        bf16::from_f32(rng.random_range(-1.0e30..1.0e30))
    }
}

/// Run `call` once to query the temporary storage size, then once with that storage.
fn two_phase<F>(mut call: F)
where
    F: FnMut(Option<&TempStorage>, &mut usize) -> Result<(), PrimError>,
{
    let mut bytes = 0;
    call(None, &mut bytes).unwrap();
    let temp = TempStorage::new(bytes);
    call(Some(&temp), &mut bytes).unwrap();
}

/// Segments covering `[0, num_items)` with random cuts, plus an empty and an inverted one.
fn random_segments(rng: &mut StdRng, num_items: usize) -> (Vec<i32>, Vec<i32>) {
    let mut cuts: Vec<i32> = (0..rng.random_range(1..16))
        .map(|_| rng.random_range(0..=num_items as i32))
        .collect();
    cuts.push(0);
    cuts.push(num_items as i32);
    cuts.sort_unstable();

    let mut begin: Vec<i32> = cuts.windows(2).map(|pair| pair[0]).collect();
    let mut end: Vec<i32> = cuts.windows(2).map(|pair| pair[1]).collect();
    begin.push(num_items as i32 / 2);
    end.push(num_items as i32 / 2);
    begin.push(num_items as i32);
    end.push(0);

    (begin, end)
}

/// Stable sort of every segment on `bits`, applied to the mapped keys and their positions.
fn reference<K: RadixKey>(
    keys: &[K],
    begin: &[i32],
    end: &[i32],
    bits: &Range<u32>,
    descending: bool,
) -> Vec<(usize, Vec<(K::Bits, usize)>)> {
    begin
        .iter()
        .zip(end)
        .filter(|(begin, end)| end > begin)
        .map(|(&begin, &end)| {
            let (begin, end) = (begin as usize, end as usize);
            let mut segment: Vec<(K::Bits, usize)> = (begin..end)
                .map(|index| (keys[index].to_radix(), index))
                .collect();
            segment.sort_by(|(lhs, _), (rhs, _)| {
                let lhs = lhs.masked(bits.start, bits.end);
                let rhs = rhs.masked(bits.start, bits.end);
                if descending { rhs.cmp(&lhs) } else { lhs.cmp(&rhs) }
            });
            (begin, segment)
        })
        .collect()
}

fn check_segments<K: RadixKey>(
    expected: &[(usize, Vec<(K::Bits, usize)>)],
    keys: &[K],
    values: &[u32],
) {
    for (begin, segment) in expected {
        let actual: Vec<(K::Bits, usize)> = (0..segment.len())
            .map(|index| {
                let position = begin + index;
                (keys[position].to_radix(), values[position] as usize)
            })
            .collect();
        assert_eq!(&actual, segment);
    }
}

fn run_pairs<K: TestKey>(
    seed: u64,
    num_items: usize,
    bits: Option<Range<u32>>,
    descending: bool,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let keys: Vec<K> = (0..num_items).map(|_| K::random(&mut rng)).collect();
    let values: Vec<u32> = (0..num_items as u32).collect();
    let (begin, end) = random_segments(&mut rng, num_items);
    let num_segments = begin.len() as i32;

    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&keys);
    let keys_out = DeviceBuffer::<K>::empty(num_items);
    let values_in = DeviceBuffer::from_slice(&values);
    let values_out = DeviceBuffer::<u32>::empty(num_items);
    let begin_offsets = DeviceBuffer::from_slice(&begin);
    let end_offsets = DeviceBuffer::from_slice(&end);

    let entry = if descending {
        sort::sort_pairs_descending::<K, u32, DeviceBuffer<i32>, DeviceBuffer<i32>>
    } else {
        sort::sort_pairs::<K, u32, DeviceBuffer<i32>, DeviceBuffer<i32>>
    };

    let mut bytes = 0;
    entry(
        None,
        &mut bytes,
        &keys_in,
        &keys_out,
        &values_in,
        &values_out,
        num_items as i32,
        num_segments,
        begin_offsets.clone(),
        end_offsets.clone(),
        bits.clone(),
        &stream,
    )
    .unwrap();
    let temp = TempStorage::new(bytes);
    entry(
        Some(&temp),
        &mut bytes,
        &keys_in,
        &keys_out,
        &values_in,
        &values_out,
        num_items as i32,
        num_segments,
        begin_offsets,
        end_offsets,
        bits.clone(),
        &stream,
    )
    .unwrap();
    stream.sync().unwrap();

    let bits = bits.unwrap_or(0..K::key_bits());
    let expected = reference(&keys, &begin, &end, &bits, descending);
    check_segments(&expected, &keys_out.to_vec(), &values_out.to_vec());

    let unchanged: Vec<K::Bits> = keys_in.to_vec().iter().map(|key| key.to_radix()).collect();
    let original: Vec<K::Bits> = keys.iter().map(|key| key.to_radix()).collect();
    assert_eq!(unchanged, original);
    assert_eq!(values_in.to_vec(), values);
}

fn run_keys_double_buffer<K: TestKey>(seed: u64, num_items: usize, descending: bool) {
    let mut rng = StdRng::seed_from_u64(seed);
    let keys: Vec<K> = (0..num_items).map(|_| K::random(&mut rng)).collect();
    let (begin, end) = random_segments(&mut rng, num_items);
    let num_segments = begin.len() as i32;

    let stream = Stream::new();
    let mut buffer = DoubleBuffer::new(
        DeviceBuffer::from_slice(&keys),
        DeviceBuffer::<K>::empty(num_items),
    );
    let begin_offsets = DeviceBuffer::from_slice(&begin);
    let end_offsets = DeviceBuffer::from_slice(&end);

    let entry = if descending {
        sort::sort_keys_descending_double_buffer::<K, DeviceBuffer<i32>, DeviceBuffer<i32>>
    } else {
        sort::sort_keys_double_buffer::<K, DeviceBuffer<i32>, DeviceBuffer<i32>>
    };

    let mut bytes = 0;
    entry(
        None,
        &mut bytes,
        &mut buffer,
        num_items as i32,
        num_segments,
        begin_offsets.clone(),
        end_offsets.clone(),
        None,
        &stream,
    )
    .unwrap();
    assert_eq!(buffer.selector(), 0);

    let temp = TempStorage::new(bytes);
    entry(
        Some(&temp),
        &mut bytes,
        &mut buffer,
        num_items as i32,
        num_segments,
        begin_offsets,
        end_offsets,
        None,
        &stream,
    )
    .unwrap();
    stream.sync().unwrap();

    let sorted = buffer.current().to_vec();
    let expected = reference(&keys, &begin, &end, &(0..K::key_bits()), descending);
    for (begin, segment) in &expected {
        let actual: Vec<K::Bits> = sorted[*begin..begin + segment.len()]
            .iter()
            .map(|key| key.to_radix())
            .collect();
        let segment: Vec<K::Bits> = segment.iter().map(|(bits, _)| *bits).collect();
        assert_eq!(actual, segment);
    }
}

macro_rules! testgen_segmented_radix_sort {
    ($($ty:ident),*) => {
        $(
            paste::paste! {
                #[test_log::test]
                fn [<sort_pairs_ $ty _ascending>]() {
                    run_pairs::<$ty>(0x5EED_0001, 1000, None, false);
                }

                #[test_log::test]
                fn [<sort_pairs_ $ty _descending>]() {
                    run_pairs::<$ty>(0x5EED_0002, 1000, None, true);
                }

                #[test_log::test]
                fn [<sort_pairs_ $ty _low_half_of_the_bits>]() {
                    let bits = 0..<$ty as RadixKey>::key_bits() / 2;
                    run_pairs::<$ty>(0x5EED_0003, 777, Some(bits), false);
                }

                #[test_log::test]
                fn [<sort_keys_double_buffer_ $ty>]() {
                    run_keys_double_buffer::<$ty>(0x5EED_0004, 513, false);
                }

                #[test_log::test]
                fn [<sort_keys_descending_double_buffer_ $ty>]() {
                    run_keys_double_buffer::<$ty>(0x5EED_0005, 513, true);
                }
            }
        )*
    };
}

testgen_segmented_radix_sort!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, f16, bf16);

#[test_log::test]
fn single_segment_sort_keys() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&[3u32, 1, 4, 1, 5, 9, 2, 6]);
    let keys_out = DeviceBuffer::<u32>::empty(8);
    let offsets = DeviceBuffer::from_slice(&[0, 8]);

    let mut bytes = 0;
    sort::sort_keys(
        None,
        &mut bytes,
        &keys_in,
        &keys_out,
        8,
        1,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    let temp = TempStorage::new(bytes);
    sort::sort_keys(
        Some(&temp),
        &mut bytes,
        &keys_in,
        &keys_out,
        8,
        1,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    stream.sync().unwrap();

    assert_eq!(keys_out.to_vec(), vec![1, 1, 2, 3, 4, 5, 6, 9]);
}

#[test_log::test]
fn descending_pairs_keep_ties_in_input_order() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&[5i32, 2, 8, 1, 1, 1, 9, 4]);
    let keys_out = DeviceBuffer::<i32>::empty(8);
    let values_in = DeviceBuffer::from_slice(&['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h']);
    let values_out = DeviceBuffer::<char>::empty(8);
    let begin = DeviceBuffer::from_slice(&[0, 3, 6]);
    let end = DeviceBuffer::from_slice(&[3, 6, 8]);

    two_phase(|temp, bytes| {
        sort::sort_pairs_descending(
            temp,
            bytes,
            &keys_in,
            &keys_out,
            &values_in,
            &values_out,
            8,
            3,
            begin.clone(),
            end.clone(),
            None,
            &stream,
        )
    });
    stream.sync().unwrap();

    assert_eq!(keys_out.to_vec(), vec![8, 5, 2, 1, 1, 1, 9, 4]);
    assert_eq!(
        values_out.to_vec(),
        vec!['c', 'a', 'b', 'd', 'e', 'f', 'g', 'h']
    );
}

#[test_log::test]
fn pairs_double_buffer_values_follow_the_keys() {
    let stream = Stream::new();
    let mut keys = DoubleBuffer::new(
        DeviceBuffer::from_slice(&[30u16, 10, 20, 7, 7, 3]),
        DeviceBuffer::<u16>::empty(6),
    );
    let mut values = DoubleBuffer::new(
        DeviceBuffer::from_slice(&[0u64, 1, 2, 3, 4, 5]),
        DeviceBuffer::<u64>::empty(6),
    );
    let offsets = DeviceBuffer::from_slice(&[0, 3, 6]);

    two_phase(|temp, bytes| {
        sort::sort_pairs_double_buffer(
            temp,
            bytes,
            &mut keys,
            &mut values,
            6,
            2,
            offsets.clone(),
            offsets.offset(1),
            None,
            &stream,
        )
    });
    stream.sync().unwrap();

    assert_eq!(keys.selector(), values.selector());
    assert_eq!(keys.current().to_vec(), vec![10, 20, 30, 3, 7, 7]);
    assert_eq!(values.current().to_vec(), vec![1, 2, 0, 5, 3, 4]);
}

#[test_log::test]
fn pairs_descending_double_buffer() {
    let stream = Stream::new();
    let mut keys = DoubleBuffer::new(
        DeviceBuffer::from_slice(&[-1.5f32, 2.0, -0.0, 0.0, 8.0]),
        DeviceBuffer::<f32>::empty(5),
    );
    let mut values = DoubleBuffer::new(
        DeviceBuffer::from_slice(&[0u8, 1, 2, 3, 4]),
        DeviceBuffer::<u8>::empty(5),
    );
    let offsets = DeviceBuffer::from_slice(&[0, 5]);

    two_phase(|temp, bytes| {
        sort::sort_pairs_descending_double_buffer(
            temp,
            bytes,
            &mut keys,
            &mut values,
            5,
            1,
            offsets.clone(),
            offsets.offset(1),
            None,
            &stream,
        )
    });
    stream.sync().unwrap();

    assert_eq!(values.current().to_vec(), vec![4, 1, 3, 2, 0]);
}

#[test_log::test]
fn empty_bit_range_is_a_stable_copy() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&[9u32, 3, 7, 1]);
    let keys_out = DeviceBuffer::<u32>::empty(4);
    let values_in = DeviceBuffer::from_slice(&[0u32, 1, 2, 3]);
    let values_out = DeviceBuffer::<u32>::empty(4);
    let offsets = DeviceBuffer::from_slice(&[0, 4]);

    two_phase(|temp, bytes| {
        sort::sort_pairs(
            temp,
            bytes,
            &keys_in,
            &keys_out,
            &values_in,
            &values_out,
            4,
            1,
            offsets.clone(),
            offsets.offset(1),
            Some(5..5),
            &stream,
        )
    });
    stream.sync().unwrap();

    assert_eq!(keys_out.to_vec(), vec![9, 3, 7, 1]);
    assert_eq!(values_out.to_vec(), vec![0, 1, 2, 3]);
}

#[test_log::test]
fn double_buffer_matches_the_pair_variant() {
    let mut rng = StdRng::seed_from_u64(42);
    let keys: Vec<u64> = (0..2048).map(|_| rng.random()).collect();
    let (begin, end) = random_segments(&mut rng, keys.len());
    let num_segments = begin.len() as i32;
    let stream = Stream::new();
    let begin = DeviceBuffer::from_slice(&begin);
    let end = DeviceBuffer::from_slice(&end);

    let keys_in = DeviceBuffer::from_slice(&keys);
    let keys_out = DeviceBuffer::<u64>::empty(keys.len());
    two_phase(|temp, bytes| {
        sort::sort_keys(
            temp,
            bytes,
            &keys_in,
            &keys_out,
            2048,
            num_segments,
            begin.clone(),
            end.clone(),
            None,
            &stream,
        )
    });

    let mut double = DoubleBuffer::new(
        DeviceBuffer::from_slice(&keys),
        DeviceBuffer::<u64>::empty(keys.len()),
    );
    two_phase(|temp, bytes| {
        sort::sort_keys_double_buffer(
            temp,
            bytes,
            &mut double,
            2048,
            num_segments,
            begin.clone(),
            end.clone(),
            None,
            &stream,
        )
    });
    stream.sync().unwrap();

    let from_pair = keys_out.to_vec();
    let from_double = double.current().to_vec();
    for (begin, end) in begin.to_vec().into_iter().zip(end.to_vec()) {
        if end > begin {
            let range = begin as usize..end as usize;
            assert_eq!(from_double[range.clone()], from_pair[range]);
        }
    }
}

#[test_log::test]
fn empty_inputs_succeed_without_work() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::<u32>::empty(0);
    let keys_out = DeviceBuffer::<u32>::empty(0);
    let offsets = DeviceBuffer::from_slice(&[0, 0]);
    let mut double = DoubleBuffer::new(keys_in.clone(), keys_out.clone());

    for (num_items, num_segments) in [(0, 1), (0, 0)] {
        let mut bytes = 0;
        sort::sort_keys(
            None,
            &mut bytes,
            &keys_in,
            &keys_out,
            num_items,
            num_segments,
            offsets.clone(),
            offsets.offset(1),
            None,
            &stream,
        )
        .unwrap();
        let temp = TempStorage::new(bytes);
        sort::sort_keys_double_buffer(
            Some(&temp),
            &mut bytes,
            &mut double,
            num_items,
            num_segments,
            offsets.clone(),
            offsets.offset(1),
            None,
            &stream,
        )
        .unwrap();
    }
    stream.sync().unwrap();

    assert_eq!(double.selector(), 0);
}

#[test_log::test]
fn size_queries_are_idempotent() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::<i16>::empty(300);
    let keys_out = DeviceBuffer::<i16>::empty(300);
    let offsets = DeviceBuffer::from_slice(&[0, 100, 300]);

    let query = |bytes: &mut usize| {
        sort::sort_keys(
            None,
            bytes,
            &keys_in,
            &keys_out,
            300,
            2,
            offsets.clone(),
            offsets.offset(1),
            None,
            &stream,
        )
    };
    let mut first = 0;
    let mut second = 12345;
    query(&mut first).unwrap();
    query(&mut second).unwrap();

    assert!(first > 0);
    assert_eq!(first, second);
}

#[test_log::test]
fn storage_below_the_query_is_rejected() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&[2u32, 1]);
    let keys_out = DeviceBuffer::<u32>::empty(2);
    let offsets = DeviceBuffer::from_slice(&[0, 2]);

    let mut bytes = 0;
    sort::sort_keys(
        None,
        &mut bytes,
        &keys_in,
        &keys_out,
        2,
        1,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    let required = bytes;
    let temp = TempStorage::new(required);
    bytes = required - 1;

    let err = sort::sort_keys(
        Some(&temp),
        &mut bytes,
        &keys_in,
        &keys_out,
        2,
        1,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap_err();

    assert_eq!(
        err,
        PrimError::TemporaryBufferTooSmall {
            required,
            provided: required - 1
        }
    );
}

#[test_log::test]
#[allow(clippy::reversed_empty_ranges)]
fn invalid_bit_ranges_are_rejected() {
    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&[2u8, 1]);
    let keys_out = DeviceBuffer::<u8>::empty(2);
    let offsets = DeviceBuffer::from_slice(&[0, 2]);

    for bits in [4..2, 0..9] {
        let mut bytes = 0;
        let err = sort::sort_keys(
            None,
            &mut bytes,
            &keys_in,
            &keys_out,
            2,
            1,
            offsets.clone(),
            offsets.offset(1),
            Some(bits),
            &stream,
        )
        .unwrap_err();

        assert!(matches!(err, PrimError::InvalidArgument { .. }));
        assert_eq!(bytes, 0);
    }
}

#[test_log::test]
fn million_keys_sort_with_the_queried_storage() {
    let mut rng = StdRng::seed_from_u64(1 << 20);
    let num_items = 1usize << 20;
    let keys: Vec<u32> = (0..num_items).map(|_| rng.random()).collect();
    let stream = Stream::new();
    let keys_in = DeviceBuffer::from_slice(&keys);
    let keys_out = DeviceBuffer::<u32>::empty(num_items);
    let offsets = DeviceBuffer::from_slice(&[0, num_items as i32]);

    let mut bytes = 0;
    sort::sort_keys(
        None,
        &mut bytes,
        &keys_in,
        &keys_out,
        num_items as i32,
        1,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    assert!(bytes > 0);

    let temp = TempStorage::new(bytes);
    sort::sort_keys(
        Some(&temp),
        &mut bytes,
        &keys_in,
        &keys_out,
        num_items as i32,
        1,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    stream.sync().unwrap();

    let mut expected = keys;
    expected.sort_unstable();
    assert_eq!(keys_out.to_vec(), expected);
}

#[test_log::test]
fn full_bit_range_matches_the_default() {
    let mut rng = StdRng::seed_from_u64(99);
    let keys: Vec<i64> = (0..4096).map(|_| rng.random()).collect();
    let values: Vec<u32> = (0..4096).collect();
    let stream = Stream::new();
    let offsets = DeviceBuffer::from_slice(&[0, 1000, 1000, 4096]);
    let keys_in = DeviceBuffer::from_slice(&keys);
    let values_in = DeviceBuffer::from_slice(&values);

    let mut outputs = Vec::new();
    for bits in [None, Some(0..64)] {
        let keys_out = DeviceBuffer::<i64>::empty(4096);
        let values_out = DeviceBuffer::<u32>::empty(4096);
        two_phase(|temp, bytes| {
            sort::sort_pairs_descending(
                temp,
                bytes,
                &keys_in,
                &keys_out,
                &values_in,
                &values_out,
                4096,
                3,
                offsets.clone(),
                offsets.offset(1),
                bits.clone(),
                &stream,
            )
        });
        outputs.push((keys_out, values_out));
    }
    stream.sync().unwrap();

    assert_eq!(outputs[0].0.to_vec(), outputs[1].0.to_vec());
    assert_eq!(outputs[0].1.to_vec(), outputs[1].1.to_vec());
}
