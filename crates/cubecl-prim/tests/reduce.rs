use cubecl_prim::{
    CountingIter, DeviceBuffer, KeyValuePair, PrimError, Stream, TempStorage, device_reduce, f16,
};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng, rngs::StdRng};

fn two_phase<F>(mut call: F)
where
    F: FnMut(Option<&TempStorage>, &mut usize) -> Result<(), PrimError>,
{
    let mut bytes = 0;
    call(None, &mut bytes).unwrap();
    let temp = TempStorage::new(bytes);
    call(Some(&temp), &mut bytes).unwrap();
}

#[test_log::test]
fn sum_of_a_counting_sequence() {
    let stream = Stream::new();
    let output = DeviceBuffer::<u64>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::sum(
            temp,
            bytes,
            CountingIter::new(1u64),
            output.clone(),
            100_000,
            &stream,
        )
    });
    stream.sync().unwrap();

    assert_eq!(output.to_vec(), vec![5_000_050_000]);
}

#[test_log::test]
fn half_sum_is_computed_in_single_precision() {
    let stream = Stream::new();
    let mut input = vec![f16::ONE; 4096];
    input[0] = f16::from_f32(2048.0);
    let input = DeviceBuffer::from_vec(input);
    let output = DeviceBuffer::<f32>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::sum(temp, bytes, input.clone(), output.clone(), 4096, &stream)
    });
    stream.sync().unwrap();

    assert_eq!(output.to_vec(), vec![6143.0]);
}

#[test_log::test]
fn min_and_max_match_the_host() {
    let mut rng = StdRng::seed_from_u64(31337);
    let values: Vec<i16> = (0..50_000).map(|_| rng.random()).collect();
    let stream = Stream::new();
    let input = DeviceBuffer::from_slice(&values);
    let min = DeviceBuffer::<i16>::empty(1);
    let max = DeviceBuffer::<i16>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::min(temp, bytes, input.clone(), min.clone(), 50_000, &stream)
    });
    two_phase(|temp, bytes| {
        device_reduce::max(temp, bytes, input.clone(), max.clone(), 50_000, &stream)
    });
    stream.sync().unwrap();

    assert_eq!(min.to_vec()[0], *values.iter().min().unwrap());
    assert_eq!(max.to_vec()[0], *values.iter().max().unwrap());
}

#[test_log::test]
fn reduce_with_a_custom_operator() {
    let stream = Stream::new();
    let input = DeviceBuffer::from_slice(&[3u32, 5, 6, 12]);
    let output = DeviceBuffer::<u32>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::reduce(
            temp,
            bytes,
            input.clone(),
            output.clone(),
            4,
            |lhs: u32, rhs: u32| lhs | rhs,
            0u32,
            &stream,
        )
    });
    stream.sync().unwrap();

    assert_eq!(output.to_vec(), vec![15]);
}

#[test_log::test]
fn arg_min_and_arg_max_report_the_first_position() {
    let stream = Stream::new();
    let input = DeviceBuffer::from_slice(&[5.0f32, 3.0, 9.0, 3.0, 7.0, 9.0]);
    let arg_min = DeviceBuffer::<KeyValuePair<u32, f32>>::empty(1);
    let arg_max = DeviceBuffer::<KeyValuePair<u32, f32>>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::arg_min(temp, bytes, input.clone(), arg_min.clone(), 6, &stream)
    });
    two_phase(|temp, bytes| {
        device_reduce::arg_max(temp, bytes, input.clone(), arg_max.clone(), 6, &stream)
    });
    stream.sync().unwrap();

    assert_eq!(arg_min.to_vec(), vec![KeyValuePair::new(1, 3.0)]);
    assert_eq!(arg_max.to_vec(), vec![KeyValuePair::new(2, 9.0)]);
}

#[test_log::test]
fn arg_min_over_the_largest_value_finds_it() {
    let stream = Stream::new();
    let input = DeviceBuffer::from_slice(&[i32::MAX; 3]);
    let output = DeviceBuffer::<KeyValuePair<u32, i32>>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::arg_min(temp, bytes, input.clone(), output.clone(), 3, &stream)
    });
    stream.sync().unwrap();

    assert_eq!(output.to_vec(), vec![KeyValuePair::new(0, i32::MAX)]);
}

#[test_log::test]
fn empty_inputs_write_the_initial_value() {
    let stream = Stream::new();
    let input = DeviceBuffer::<f32>::empty(0);
    let sum = DeviceBuffer::from_slice(&[-1.0f32]);
    let arg_min = DeviceBuffer::<KeyValuePair<u32, f32>>::empty(1);
    let arg_max = DeviceBuffer::<KeyValuePair<u32, f32>>::empty(1);

    two_phase(|temp, bytes| {
        device_reduce::sum(temp, bytes, input.clone(), sum.clone(), 0, &stream)
    });
    two_phase(|temp, bytes| {
        device_reduce::arg_min(temp, bytes, input.clone(), arg_min.clone(), 0, &stream)
    });
    two_phase(|temp, bytes| {
        device_reduce::arg_max(temp, bytes, input.clone(), arg_max.clone(), 0, &stream)
    });
    stream.sync().unwrap();

    assert_eq!(sum.to_vec(), vec![0.0]);
    assert_eq!(arg_min.to_vec(), vec![KeyValuePair::new(1, f32::MAX)]);
    assert_eq!(arg_max.to_vec(), vec![KeyValuePair::new(1, f32::MIN)]);
}

#[test_log::test]
fn short_input_is_rejected() {
    let stream = Stream::new();
    let input = DeviceBuffer::from_slice(&[1u8, 2, 3]);
    let output = DeviceBuffer::<u8>::empty(1);
    let mut bytes = 3;

    let err = device_reduce::max(None, &mut bytes, input, output, 4, &stream).unwrap_err();

    assert!(matches!(err, PrimError::InvalidArgument { .. }));
    assert_eq!(bytes, 3);
}
