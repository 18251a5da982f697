//! Error type shared by the fallible map operations.

use snafu::Snafu;

/// Failures reported by `DenseHashMap`.
///
/// Lookups other than `at` report absence through `Option`/`bool`; only the
/// operations documented as fallible return this type.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// `at`/`at_mut` found no entry for the key.
    #[snafu(display("key not found"))]
    KeyNotFound,

    /// The bucket directory or the entry store cannot be sized (or
    /// allocated) for `requested` slots. The map is left unchanged.
    #[snafu(display("capacity exceeded: cannot hold {requested} slots"))]
    CapacityExceeded { requested: usize },

    /// Max load factor must be finite and strictly positive.
    #[snafu(display("invalid max load factor {value}: must be finite and positive"))]
    InvalidMaxLoadFactor { value: f32 },
}
