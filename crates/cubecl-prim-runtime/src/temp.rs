use crate::error::{LaunchError, ServerError};
use bytemuck::Pod;
use std::sync::Arc;

/// Size of the header every temporary layout starts with.
pub const TEMP_HEADER_BYTES: usize = 256;

/// Caller-allocated scratch memory for device algorithms.
///
/// The required size is obtained from the size query of each algorithm. The algorithm writes
/// to the storage while it runs on its stream and makes no assumption about its content on
/// entry. Clones share the same allocation.
#[derive(Clone)]
pub struct TempStorage {
    words: Arc<spin::Mutex<Vec<u64>>>,
    bytes: usize,
}

impl core::fmt::Debug for TempStorage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TempStorage")
            .field("bytes", &self.bytes)
            .finish()
    }
}

impl TempStorage {
    /// Allocate `bytes` bytes of temporary storage.
    pub fn new(bytes: usize) -> Self {
        Self {
            words: Arc::new(spin::Mutex::new(vec![0; bytes.div_ceil(8)])),
            bytes,
        }
    }

    /// Size of the storage in bytes.
    pub fn len(&self) -> usize {
        self.bytes
    }

    /// Whether the storage has no byte at all.
    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Run `func` with exclusive access to the storage.
    pub fn map<R>(&self, func: impl FnOnce(TempView<'_>) -> R) -> R {
        let mut words = self.words.lock();
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(words.as_mut_slice());

        func(TempView {
            rest: &mut bytes[..self.bytes],
            consumed: 0,
        })
    }
}

/// A byte range inside a [TempLayout].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempPartition {
    /// Offset of the partition in bytes.
    pub offset: usize,
    /// Size of the partition in bytes.
    pub size: usize,
}

/// The partitions an algorithm carves out of its temporary storage.
///
/// A layout always starts with a [header](TEMP_HEADER_BYTES), so its size is never zero. Every
/// partition starts on a multiple of the alignment.
#[derive(Debug, Clone)]
pub struct TempLayout {
    alignment: usize,
    header: TempPartition,
    end: usize,
}

impl TempLayout {
    /// Start a layout whose partitions are aligned on `alignment` bytes.
    pub fn new(alignment: usize) -> Self {
        let alignment = alignment.max(8).next_power_of_two();

        Self {
            alignment,
            header: TempPartition {
                offset: 0,
                size: TEMP_HEADER_BYTES,
            },
            end: TEMP_HEADER_BYTES,
        }
    }

    /// Reserve a partition for `count` elements of `T`.
    pub fn reserve<T: Pod>(&mut self, count: usize) -> Result<TempPartition, LaunchError> {
        let overflow = || LaunchError::OutOfMemory {
            reason: format!(
                "Temporary storage for {count} elements of {} overflows the address space",
                core::any::type_name::<T>()
            ),
        };
        let offset = self
            .end
            .checked_next_multiple_of(self.alignment)
            .ok_or_else(overflow)?;
        let size = count
            .checked_mul(core::mem::size_of::<T>())
            .ok_or_else(overflow)?;

        self.end = offset.checked_add(size).ok_or_else(overflow)?;

        Ok(TempPartition { offset, size })
    }

    /// The header partition.
    pub fn header(&self) -> TempPartition {
        self.header
    }

    /// Total number of bytes required by the layout.
    pub fn size(&self) -> usize {
        self.end.next_multiple_of(self.alignment)
    }
}

/// Exclusive access to temporary storage, handing out partitions in increasing offset order.
pub struct TempView<'a> {
    rest: &'a mut [u8],
    consumed: usize,
}

impl<'a> TempView<'a> {
    /// Borrow `partition` as a slice of `T`.
    ///
    /// Partitions must be taken in increasing offset order, which keeps the borrowed slices
    /// disjoint.
    pub fn take<T: Pod>(&mut self, partition: TempPartition) -> Result<&'a mut [T], ServerError> {
        let fault = |reason: String| ServerError::DeviceFault { reason };

        if partition.offset < self.consumed {
            return Err(fault(format!(
                "Temporary partition at {} overlaps a partition already in use",
                partition.offset
            )));
        }

        let skip = partition.offset - self.consumed;
        let end = skip + partition.size;
        if end > self.rest.len() {
            return Err(fault(format!(
                "Temporary partition [{}, {}) is outside of the {} provided bytes",
                partition.offset,
                partition.offset + partition.size,
                self.consumed + self.rest.len(),
            )));
        }

        let rest = core::mem::take(&mut self.rest);
        let (_, rest) = rest.split_at_mut(skip);
        let (bytes, rest) = rest.split_at_mut(partition.size);
        self.rest = rest;
        self.consumed = partition.offset + partition.size;

        bytemuck::try_cast_slice_mut(bytes)
            .map_err(|err| fault(format!("Misaligned temporary partition: {err}")))
    }
}
