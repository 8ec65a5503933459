use derive_new::new;

/// An index and a value stored as one record.
///
/// Produced by arg-index iterators and consumed by the [ArgMin](crate::ArgMin) and
/// [ArgMax](crate::ArgMax) reducers, which compare on `value` and break ties on `key`.
#[derive(new, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyValuePair<K, V> {
    /// The position of the value.
    pub key: K,
    /// The value itself.
    pub value: V,
}
