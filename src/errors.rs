//! Error types that are reported by various array operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors that can occur when constructing an array or view from existing
/// data.
#[derive(Clone, Debug, PartialEq)]
pub enum FromDataError {
    /// The data has fewer elements than the product of the shape.
    StorageTooShort,

    /// The data length was expected to exactly match the product of the
    /// shape, and it did not.
    StorageLengthMismatch,
}

impl Display for FromDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FromDataError::StorageTooShort => write!(f, "data too short"),
            FromDataError::StorageLengthMismatch => write!(f, "data length mismatch"),
        }
    }
}

impl Error for FromDataError {}

/// Errors that can occur while growing an array with the contents of
/// another.
#[derive(Clone, Debug, PartialEq)]
pub enum ExpandError {
    /// The source and destination differ in a dimension other than the
    /// leading one.
    ShapeMismatch,
}

impl Display for ExpandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpandError::ShapeMismatch => {
                write!(f, "cannot insert an array of incompatible shape")
            }
        }
    }
}

impl Error for ExpandError {}
