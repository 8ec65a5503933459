//! Random-access iterators read and written by the device algorithms.
//!
//! An [InputIter] is addressable by element offset and yields values either from device
//! memory ([DeviceBuffer]) or computed on the fly ([CountingIter], [ConstantIter],
//! [TransformIter], [ArgIndexIter], [ZipIter]). Iterators are cheap to clone and carry their
//! state by value; the algorithms never write through an input iterator.
//!
//! An [OutputIter] is a write target: device memory, or the [DiscardIter] that swallows
//! everything.

use crate::memory::DeviceBuffer;
use cubecl_prim_common::{CastFrom, KeyValuePair, Numeric};
use core::marker::PhantomData;
use derive_new::new;
use variadics_please::all_tuples;

/// A random-access input sequence.
pub trait InputIter: Clone + Send + Sync + 'static {
    /// The element type.
    type Item: Copy + Send + Sync + 'static;

    /// Read the `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Bounded iterators panic when the range goes past their end.
    fn load(&self, offset: usize, len: usize) -> Vec<Self::Item>;

    /// Number of addressable elements, or `None` when unbounded.
    fn bound(&self) -> Option<usize> {
        None
    }
}

/// A random-access output sequence of `T`.
pub trait OutputIter<T>: Clone + Send + Sync + 'static {
    /// Write `values` starting at `offset`.
    ///
    /// # Panics
    ///
    /// Bounded iterators panic when the range goes past their end.
    fn store(&self, offset: usize, values: &[T]);

    /// Number of addressable elements, or `None` when unbounded.
    fn bound(&self) -> Option<usize> {
        None
    }
}

impl<T: Copy + Send + Sync + 'static> InputIter for DeviceBuffer<T> {
    type Item = T;

    fn load(&self, offset: usize, len: usize) -> Vec<T> {
        self.read(offset, len)
    }

    fn bound(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: Copy + Send + Sync + 'static> OutputIter<T> for DeviceBuffer<T> {
    fn store(&self, offset: usize, values: &[T]) {
        self.write(offset, values)
    }

    fn bound(&self) -> Option<usize> {
        Some(self.len())
    }
}

/// Yields `start + k` at position `k`.
#[derive(new, Debug, Clone, Copy)]
pub struct CountingIter<T> {
    start: T,
}

impl<T: Numeric + CastFrom<usize>> InputIter for CountingIter<T> {
    type Item = T;

    fn load(&self, offset: usize, len: usize) -> Vec<T> {
        (offset..offset + len)
            .map(|index| self.start.add(T::cast_from(index)))
            .collect()
    }
}

/// Yields the same value at every position.
#[derive(new, Debug, Clone, Copy)]
pub struct ConstantIter<T> {
    value: T,
}

impl<T: Copy + Send + Sync + 'static> InputIter for ConstantIter<T> {
    type Item = T;

    fn load(&self, _offset: usize, len: usize) -> Vec<T> {
        vec![self.value; len]
    }
}

/// Yields `func(inner[k])` at position `k`.
///
/// The function must be pure: it may be called any number of times, from any thread.
pub struct TransformIter<I, F, U> {
    inner: I,
    func: F,
    _output: PhantomData<fn() -> U>,
}

impl<I, F, U> TransformIter<I, F, U>
where
    I: InputIter,
    F: Fn(I::Item) -> U + Clone + Send + Sync + 'static,
    U: Copy + Send + Sync + 'static,
{
    /// Create a transform iterator over `inner`.
    pub fn new(inner: I, func: F) -> Self {
        Self {
            inner,
            func,
            _output: PhantomData,
        }
    }
}

impl<I: Clone, F: Clone, U> Clone for TransformIter<I, F, U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            func: self.func.clone(),
            _output: PhantomData,
        }
    }
}

impl<I, F, U> InputIter for TransformIter<I, F, U>
where
    I: InputIter,
    F: Fn(I::Item) -> U + Clone + Send + Sync + 'static,
    U: Copy + Send + Sync + 'static,
{
    type Item = U;

    fn load(&self, offset: usize, len: usize) -> Vec<U> {
        self.inner
            .load(offset, len)
            .into_iter()
            .map(&self.func)
            .collect()
    }

    fn bound(&self) -> Option<usize> {
        self.inner.bound()
    }
}

/// Yields `{ key: k, value: inner[k] }` at position `k`, for arg-min and arg-max.
#[derive(new, Debug, Clone)]
pub struct ArgIndexIter<I> {
    inner: I,
}

impl<I: InputIter> InputIter for ArgIndexIter<I> {
    type Item = KeyValuePair<u32, I::Item>;

    fn load(&self, offset: usize, len: usize) -> Vec<Self::Item> {
        self.inner
            .load(offset, len)
            .into_iter()
            .enumerate()
            .map(|(index, value)| KeyValuePair::new((offset + index) as u32, value))
            .collect()
    }

    fn bound(&self) -> Option<usize> {
        self.inner.bound()
    }
}

/// Yields the tuple `(a[k], b[k], ...)` of its members at position `k`.
#[derive(new, Debug, Clone)]
pub struct ZipIter<T> {
    members: T,
}

fn min_bound(bounds: &[Option<usize>]) -> Option<usize> {
    bounds.iter().flatten().copied().min()
}

macro_rules! impl_zip_iter {
    ($(($I:ident, $i:ident)),*) => {
        impl<$($I: InputIter),*> InputIter for ZipIter<($($I,)*)> {
            type Item = ($($I::Item,)*);

            fn load(&self, offset: usize, len: usize) -> Vec<Self::Item> {
                let ($($i,)*) = &self.members;
                $(let mut $i = $i.load(offset, len).into_iter();)*
                let mut items = Vec::with_capacity(len);

                while let ($(Some($i),)*) = ($($i.next(),)*) {
                    items.push(($($i,)*));
                }

                items
            }

            fn bound(&self) -> Option<usize> {
                let ($($i,)*) = &self.members;
                min_bound(&[$($i.bound()),*])
            }
        }
    };
}

all_tuples!(impl_zip_iter, 2, 8, I, i);

/// An output target that discards every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardIter;

impl<T> OutputIter<T> for DiscardIter {
    fn store(&self, _offset: usize, _values: &[T]) {}
}
