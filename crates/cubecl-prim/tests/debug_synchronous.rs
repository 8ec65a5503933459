#![allow(deprecated)]

use cubecl_prim::{
    DeviceBuffer, DoubleBuffer, Equality, KeyValuePair, Stream, TempStorage, device_reduce,
    device_scan, device_segmented_radix_sort as sort,
};
use pretty_assertions::assert_eq;

#[test_log::test]
fn sort_twins_behave_like_the_entry_points() {
    let stream = Stream::new();
    let keys = [7u32, 2, 9, 4, 4, 1];
    let values = [0u8, 1, 2, 3, 4, 5];
    let offsets = DeviceBuffer::from_slice(&[0, 4, 6]);

    let buffers = || {
        (
            DoubleBuffer::new(DeviceBuffer::from_slice(&keys), DeviceBuffer::empty(6)),
            DoubleBuffer::new(DeviceBuffer::from_slice(&values), DeviceBuffer::empty(6)),
        )
    };
    let mut modern = buffers();
    let mut twin = buffers();

    let mut bytes = 0;
    sort::sort_pairs_descending_double_buffer(
        None,
        &mut bytes,
        &mut modern.0,
        &mut modern.1,
        6,
        2,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    let mut twin_bytes = 0;
    sort::sort_pairs_descending_double_buffer_debug_synchronous(
        None,
        &mut twin_bytes,
        &mut twin.0,
        &mut twin.1,
        6,
        2,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
        true,
    )
    .unwrap();
    assert_eq!(bytes, twin_bytes);

    let temp = TempStorage::new(bytes);
    sort::sort_pairs_descending_double_buffer(
        Some(&temp),
        &mut bytes,
        &mut modern.0,
        &mut modern.1,
        6,
        2,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
    )
    .unwrap();
    let twin_temp = TempStorage::new(twin_bytes);
    sort::sort_pairs_descending_double_buffer_debug_synchronous(
        Some(&twin_temp),
        &mut twin_bytes,
        &mut twin.0,
        &mut twin.1,
        6,
        2,
        offsets.clone(),
        offsets.offset(1),
        None,
        &stream,
        false,
    )
    .unwrap();
    stream.sync().unwrap();

    assert_eq!(modern.0.selector(), twin.0.selector());
    assert_eq!(modern.0.current().to_vec(), vec![9, 7, 4, 2, 4, 1]);
    assert_eq!(twin.0.current().to_vec(), vec![9, 7, 4, 2, 4, 1]);
    assert_eq!(twin.1.current().to_vec(), vec![2, 0, 3, 1, 4, 5]);
}

#[test_log::test]
fn scan_twins_behave_like_the_entry_points() {
    let stream = Stream::new();
    let keys = DeviceBuffer::from_slice(&[1u8, 1, 2, 2, 2]);
    let values = DeviceBuffer::from_slice(&[1i32, 2, 3, 4, 5]);
    let output = DeviceBuffer::<i32>::empty(5);

    let mut bytes = 0;
    device_scan::exclusive_scan_by_key_debug_synchronous(
        None,
        &mut bytes,
        keys.clone(),
        values.clone(),
        output.clone(),
        |lhs: i32, rhs: i32| lhs + rhs,
        100,
        5,
        Equality,
        &stream,
        true,
    )
    .unwrap();
    let temp = TempStorage::new(bytes);
    device_scan::exclusive_scan_by_key_debug_synchronous(
        Some(&temp),
        &mut bytes,
        keys,
        values,
        output.clone(),
        |lhs: i32, rhs: i32| lhs + rhs,
        100,
        5,
        Equality,
        &stream,
        true,
    )
    .unwrap();
    stream.sync().unwrap();

    assert_eq!(output.to_vec(), vec![100, 101, 100, 103, 107]);
}

#[test_log::test]
fn reduce_twins_behave_like_the_entry_points() {
    let stream = Stream::new();
    let input = DeviceBuffer::from_slice(&[4u16, 8, 1, 8]);
    let output = DeviceBuffer::<KeyValuePair<u32, u16>>::empty(1);

    let mut bytes = 0;
    device_reduce::arg_max_debug_synchronous(
        None,
        &mut bytes,
        input.clone(),
        output.clone(),
        4,
        &stream,
        false,
    )
    .unwrap();
    let temp = TempStorage::new(bytes);
    device_reduce::arg_max_debug_synchronous(
        Some(&temp),
        &mut bytes,
        input,
        output.clone(),
        4,
        &stream,
        false,
    )
    .unwrap();
    stream.sync().unwrap();

    assert_eq!(output.to_vec(), vec![KeyValuePair::new(1, 8)]);
}
