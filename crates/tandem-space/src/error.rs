//! Error types for spatial structures.

use std::fmt;

use tandem_core::Fixed;

/// Errors arising from spatial index construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpaceError {
    /// Spatial hash cell size must be strictly positive.
    InvalidCellSize {
        /// The rejected cell size.
        cell_size: Fixed,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "spatial hash cell size must be > 0, got {cell_size}")
            }
        }
    }
}

impl std::error::Error for SpaceError {}
