use core::fmt;

/// Errors reported by the fallible operations of [`OrderedHashMap`],
/// [`OrderedHashSet`] and the underlying [`HashTable`].
///
/// Every variant describes a usage error: nothing here is transient, and a
/// failed operation leaves the container exactly as it was.
///
/// [`OrderedHashMap`]: crate::OrderedHashMap
/// [`OrderedHashSet`]: crate::OrderedHashSet
/// [`HashTable`]: crate::HashTable
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A key that had to be absent was already present.
    DuplicateKey,
    /// A key that had to be present was missing.
    KeyNotFound,
    /// A cursor or view was used after the container it was taken from had
    /// been modified.
    StaleVersion {
        /// The version captured when the cursor or view was created.
        expected: u64,
        /// The container's version at the time of the check.
        found: u64,
    },
    /// A dump carried a different number of keys and values.
    LengthMismatch {
        /// Number of keys in the dump.
        keys: usize,
        /// Number of values in the dump.
        values: usize,
    },
    /// The requested capacity exceeds [`MAX_CAPACITY`] or overflows `usize`.
    ///
    /// [`MAX_CAPACITY`]: crate::hash_table::MAX_CAPACITY
    CapacityOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::DuplicateKey => f.write_str("key already present in the container"),
            Error::KeyNotFound => f.write_str("key not present in the container"),
            Error::StaleVersion { expected, found } => write!(
                f,
                "container was modified (version {found}, expected {expected})"
            ),
            Error::LengthMismatch { keys, values } => {
                write!(f, "dump key count {keys} does not match value count {values}")
            }
            Error::CapacityOverflow => f.write_str("capacity overflow"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::DuplicateKey.to_string(),
            "key already present in the container"
        );
        assert_eq!(
            Error::StaleVersion {
                expected: 3,
                found: 5
            }
            .to_string(),
            "container was modified (version 5, expected 3)"
        );
        assert_eq!(
            Error::LengthMismatch { keys: 2, values: 1 }.to_string(),
            "dump key count 2 does not match value count 1"
        );
    }
}
