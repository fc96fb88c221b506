use thiserror::Error;

/// Errors surfaced by the index constructors and queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The input contains a byte the index reserves for itself.
    #[error("input contains reserved sentinel byte {byte:#04x} at position {position}")]
    SentinelInInput { byte: u8, position: usize },

    /// Range-minimum lookup over `[at, at)`.
    #[error("cannot find a minimum in the empty range [{at}, {at})")]
    EmptyRange { at: usize },

    /// Range-minimum lookup past the end of a block.
    #[error("range end {end} is past the end of a block of size {size}")]
    RangePastEnd { end: usize, size: usize },

    /// A block larger than the database was sized for.
    #[error("block of size {got} exceeds the database block size {max}")]
    BlockTooLarge { got: usize, max: usize },

    /// A second remainder block whose shape differs from the first.
    #[error("remainder block has a different shape than the first one seen")]
    RemainderMismatch,

    /// An equivalence class id outside the array.
    #[error("equivalence class {class} is out of bounds for {num_classes} classes")]
    ClassOutOfBounds { class: usize, num_classes: usize },

    /// Arm length constraint that no substring can satisfy.
    #[error("minimum arm length {min_arm} is invalid for a string of length {len}")]
    ArmLengthRange { min_arm: usize, len: usize },

    /// Inverted gap window.
    #[error("gap window is inverted: min_gap {min_gap} > max_gap {max_gap}")]
    GapRange { min_gap: usize, max_gap: usize },

    /// A self-check found a broken invariant. Only produced by the
    /// `verify_*` routines.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub(crate) fn invariant(msg: impl Into<String>) -> Error {
        Error::Invariant(msg.into())
    }
}
