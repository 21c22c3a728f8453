//! Error types for the Galaxy3D octree
//!
//! Most octree misuse is absorbed as a silent no-op (duplicate add, unknown
//! remove). The variants below cover the caller contract violations that
//! would otherwise corrupt tree geometry with NaN arithmetic.

use std::fmt;

/// Result type for octree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Octree errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A query or entity carried a non-finite, negative or degenerate value
    InvalidArgument(String),

    /// The host could not provide a world position for an entity part
    PositionUnavailable(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::PositionUnavailable(msg) => write!(f, "Position unavailable: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error with file:line information and build an
/// [`Error::InvalidArgument`] from the same message.
///
/// # Example
///
/// ```ignore
/// return Err(octree_err!("galaxy3d::Search", "radius must be finite, got {}", radius));
/// ```
#[macro_export]
macro_rules! octree_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::octree_error!($source, "{}", message);
        $crate::galaxy3d::Error::InvalidArgument(message)
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
