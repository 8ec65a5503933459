use std::sync::Arc;

/// A device allocation viewed from an element offset, with pointer semantics.
///
/// Cloning a buffer doesn't copy the memory: all clones and all [offsets](DeviceBuffer::offset)
/// share the same allocation, the same way device pointers do. Work enqueued on a stream keeps
/// the allocation alive until it completes.
///
/// Host-side reads and writes ([to_vec](DeviceBuffer::to_vec), [write](DeviceBuffer::write))
/// are only meaningful once the streams using the buffer are synchronised.
pub struct DeviceBuffer<T> {
    memory: Arc<spin::RwLock<Vec<T>>>,
    offset: usize,
    len: usize,
}

impl<T> Clone for DeviceBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            memory: self.memory.clone(),
            offset: self.offset,
            len: self.len,
        }
    }
}

impl<T> core::fmt::Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("elem", &core::any::type_name::<T>())
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Copy + Send + Sync + 'static> DeviceBuffer<T> {
    /// Allocate a buffer holding a copy of `data`.
    pub fn from_slice(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Allocate a buffer taking ownership of `data`.
    pub fn from_vec(data: Vec<T>) -> Self {
        let len = data.len();

        Self {
            memory: Arc::new(spin::RwLock::new(data)),
            offset: 0,
            len,
        }
    }

    /// Allocate a buffer of `len` default-initialized elements.
    pub fn empty(len: usize) -> Self
    where
        T: Default,
    {
        Self::from_vec(vec![T::default(); len])
    }

    /// The buffer starting `count` elements further, like `ptr + count`.
    ///
    /// The offset is clamped to the end of the buffer.
    pub fn offset(&self, count: usize) -> Self {
        let count = count.min(self.len);

        Self {
            memory: self.memory.clone(),
            offset: self.offset + count,
            len: self.len - count,
        }
    }

    /// Number of elements addressable from the current offset.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no element is addressable from the current offset.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether both buffers view the same allocation.
    pub fn same_memory(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.memory, &other.memory)
    }

    /// Copy the whole buffer to the host.
    pub fn to_vec(&self) -> Vec<T> {
        self.read(0, self.len)
    }

    /// Copy `len` elements starting at `offset` to the host.
    ///
    /// # Panics
    ///
    /// Panics if the range isn't inside the buffer.
    pub fn read(&self, offset: usize, len: usize) -> Vec<T> {
        self.check_range(offset, len);
        let start = self.offset + offset;
        let memory = self.memory.read();

        memory[start..start + len].to_vec()
    }

    /// Write `data` starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range isn't inside the buffer.
    pub fn write(&self, offset: usize, data: &[T]) {
        self.check_range(offset, data.len());
        let start = self.offset + offset;
        let mut memory = self.memory.write();

        memory[start..start + data.len()].copy_from_slice(data);
    }

    /// Run `func` on the `len` elements starting at `offset`, without copying them.
    ///
    /// # Panics
    ///
    /// Panics if the range isn't inside the buffer.
    pub fn read_with<R>(&self, offset: usize, len: usize, func: impl FnOnce(&[T]) -> R) -> R {
        self.check_range(offset, len);
        let start = self.offset + offset;
        let memory = self.memory.read();

        func(&memory[start..start + len])
    }

    /// Run `func` with write access to the `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range isn't inside the buffer.
    pub fn write_with<R>(
        &self,
        offset: usize,
        len: usize,
        func: impl FnOnce(&mut [T]) -> R,
    ) -> R {
        self.check_range(offset, len);
        let start = self.offset + offset;
        let mut memory = self.memory.write();

        func(&mut memory[start..start + len])
    }

    fn check_range(&self, offset: usize, len: usize) {
        if offset.checked_add(len).is_none_or(|end| end > self.len) {
            panic!(
                "Access out of bounds: [{offset}, {offset} + {len}) on a buffer of {} elements",
                self.len
            );
        }
    }
}

/// Two equally sized buffers and a selector pointing at the side holding the valid data.
///
/// Sorts taking a double buffer may write their passes to either side; the selector is updated
/// when the sort is enqueued and must be consulted afterwards.
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    buffers: [DeviceBuffer<T>; 2],
    selector: usize,
}

impl<T: Copy + Send + Sync + 'static> DoubleBuffer<T> {
    /// Create a double buffer whose current side is `current`.
    pub fn new(current: DeviceBuffer<T>, alternate: DeviceBuffer<T>) -> Self {
        Self {
            buffers: [current, alternate],
            selector: 0,
        }
    }

    /// The side holding the valid data.
    pub fn current(&self) -> &DeviceBuffer<T> {
        &self.buffers[self.selector]
    }

    /// The other side.
    pub fn alternate(&self) -> &DeviceBuffer<T> {
        &self.buffers[self.selector ^ 1]
    }

    /// Index of the current side, `0` or `1`.
    pub fn selector(&self) -> usize {
        self.selector
    }

    /// Point the selector at side `selector & 1`.
    pub fn set_selector(&mut self, selector: usize) {
        self.selector = selector & 1;
    }

    /// The buffer at `side & 1`, independently of the selector.
    pub fn side(&self, side: usize) -> &DeviceBuffer<T> {
        &self.buffers[side & 1]
    }
}
