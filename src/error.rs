//! Error types shared by the tip allocator and the liquid-level tracker.

use thiserror::Error;

/// Coarse classification of an [`Error`].
///
/// Protocol drivers usually only need to know whether they asked for something
/// impossible or whether the rack ran dry; both are fatal to the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller violated a contract (bad tip count, bad geometry, bad volume).
    InvalidRequest,
    /// No contiguous block of the requested size remains in the rack.
    OutOfTips,
}

/// Errors raised by this crate.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Asked for zero tips, or more tips than a column holds.
    #[error("cannot pick up {requested} tips: must be between 1 and {max}")]
    InvalidTipCount { requested: usize, max: usize },

    /// A rack with no columns, or a row count without single-letter labels.
    #[error("invalid rack geometry {columns}x{rows}: need at least 1 column and 1..=26 rows")]
    InvalidGeometry { columns: usize, rows: usize },

    /// A tip location that does not exist on this rack.
    #[error("tip location column {column}, row {row} is outside the rack")]
    LocationOutOfRange { column: usize, row: usize },

    /// A well name that is not letters followed by a column number.
    #[error("invalid well name: {0:?}")]
    InvalidWellName(String),

    /// Volumes must be finite and strictly positive.
    #[error("invalid {name}: {value}")]
    InvalidVolume { name: &'static str, value: f64 },

    /// Tube bounds that are not finite or not ordered, or a height outside them.
    #[error("invalid tube bounds [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    /// A negative or non-finite submersion offset.
    #[error("invalid submersion offset: {0}")]
    InvalidSubmersionOffset(f64),

    /// The rack has no contiguous run of `requested` free tips left.
    #[error("out of tips: no contiguous block of {requested} free tips remains")]
    OutOfTips { requested: usize },
}

impl Error {
    /// Returns the coarse [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfTips { .. } => ErrorKind::OutOfTips,
            _ => ErrorKind::InvalidRequest,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
