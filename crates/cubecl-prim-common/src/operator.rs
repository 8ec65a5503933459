use crate::{KeyValuePair, Numeric};

/// An associative binary operator used by scans and reductions.
///
/// Any `Fn(T, T) -> T` closure that can be shared between threads is an operator.
pub trait BinaryOp<T>: Clone + Send + Sync + 'static {
    /// Combine `lhs` and `rhs`, in that order.
    fn apply(&self, lhs: T, rhs: T) -> T;
}

impl<T, F> BinaryOp<T> for F
where
    F: Fn(T, T) -> T + Clone + Send + Sync + 'static,
{
    #[inline]
    fn apply(&self, lhs: T, rhs: T) -> T {
        self(lhs, rhs)
    }
}

/// Addition, wrapping for integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

/// The smaller of two values, keeping the left one on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

/// The larger of two values, keeping the left one on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

/// The pair holding the smallest value, breaking ties by smallest key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgMin;

/// The pair holding the largest value, breaking ties by smallest key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgMax;

impl<T: Numeric> BinaryOp<T> for Sum {
    #[inline]
    fn apply(&self, lhs: T, rhs: T) -> T {
        lhs.add(rhs)
    }
}

impl<T: PartialOrd + Copy + Send + Sync + 'static> BinaryOp<T> for Min {
    #[inline]
    fn apply(&self, lhs: T, rhs: T) -> T {
        if rhs < lhs { rhs } else { lhs }
    }
}

impl<T: PartialOrd + Copy + Send + Sync + 'static> BinaryOp<T> for Max {
    #[inline]
    fn apply(&self, lhs: T, rhs: T) -> T {
        if lhs < rhs { rhs } else { lhs }
    }
}

impl<K, V> BinaryOp<KeyValuePair<K, V>> for ArgMin
where
    K: Ord + Copy + Send + Sync + 'static,
    V: PartialOrd + Copy + Send + Sync + 'static,
{
    #[inline]
    fn apply(&self, lhs: KeyValuePair<K, V>, rhs: KeyValuePair<K, V>) -> KeyValuePair<K, V> {
        if rhs.value < lhs.value || (rhs.value == lhs.value && rhs.key < lhs.key) {
            rhs
        } else {
            lhs
        }
    }
}

impl<K, V> BinaryOp<KeyValuePair<K, V>> for ArgMax
where
    K: Ord + Copy + Send + Sync + 'static,
    V: PartialOrd + Copy + Send + Sync + 'static,
{
    #[inline]
    fn apply(&self, lhs: KeyValuePair<K, V>, rhs: KeyValuePair<K, V>) -> KeyValuePair<K, V> {
        if rhs.value > lhs.value || (rhs.value == lhs.value && rhs.key < lhs.key) {
            rhs
        } else {
            lhs
        }
    }
}

/// Decides whether two neighbouring keys belong to the same segment.
///
/// Any `Fn(&K, &K) -> bool` closure that can be shared between threads is a predicate.
pub trait KeyEquality<K>: Clone + Send + Sync + 'static {
    /// Whether `lhs` and `rhs` are equal.
    fn equal(&self, lhs: &K, rhs: &K) -> bool;
}

impl<K, F> KeyEquality<K> for F
where
    F: Fn(&K, &K) -> bool + Clone + Send + Sync + 'static,
{
    #[inline]
    fn equal(&self, lhs: &K, rhs: &K) -> bool {
        self(lhs, rhs)
    }
}

/// Equality of the key type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equality;

impl<K: PartialEq> KeyEquality<K> for Equality {
    #[inline]
    fn equal(&self, lhs: &K, rhs: &K) -> bool {
        lhs == rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_min_breaks_ties_by_smallest_key() {
        let a = KeyValuePair::new(4u32, 1.0f32);
        let b = KeyValuePair::new(2u32, 1.0f32);

        assert_eq!(ArgMin.apply(a, b), b);
        assert_eq!(ArgMin.apply(b, a), b);
        assert_eq!(ArgMin.apply(a, KeyValuePair::new(9, 0.5)).key, 9);
    }

    #[test]
    fn arg_max_breaks_ties_by_smallest_key() {
        let a = KeyValuePair::new(1u32, 7i32);
        let b = KeyValuePair::new(3u32, 7i32);

        assert_eq!(ArgMax.apply(b, a), a);
        assert_eq!(ArgMax.apply(a, KeyValuePair::new(5, 8)).key, 5);
    }

    #[test]
    fn closures_are_operators() {
        let mul = |a: i64, b: i64| a * b;
        assert_eq!(mul.apply(6, 7), 42);

        let same_parity = |a: &u32, b: &u32| a % 2 == b % 2;
        assert!(same_parity.equal(&2, &8));
        assert!(!Equality.equal(&2, &8));
    }

    #[test]
    fn min_max_and_sum() {
        assert_eq!(Min.apply(3, -2), -2);
        assert_eq!(Max.apply(3u8, 200), 200);
        assert_eq!(BinaryOp::<u8>::apply(&Sum, 255u8, 3), 2);
    }
}
