//! Error types for symr

use thiserror::Error;

/// Result type alias using symr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when constructing graph nodes or value containers
///
/// All failure modes in symr are construction-time: a node that was built
/// successfully cannot fail during evaluation, sparsity propagation, or
/// code emission.
#[derive(Error, Debug)]
pub enum Error {
    /// Index mapping length disagrees with the source operand's nonzero count
    #[error("Mapping length mismatch: source has {source_nnz} nonzeros, mapping has {mapping_len} entries")]
    MappingLength {
        /// Number of nonzeros in the source operand
        source_nnz: usize,
        /// Number of entries in the index mapping
        mapping_len: usize,
    },

    /// Index out of bounds for a nonzero storage
    #[error("Index {index} out of bounds for storage with {size} nonzeros")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of nonzero slots
        size: usize,
    },

    /// Value count disagrees with a sparsity pattern's nonzero count
    #[error("Value count mismatch: pattern has {expected} nonzeros, got {got} values")]
    ValueCount {
        /// Nonzero count of the pattern
        expected: usize,
        /// Number of values provided
        got: usize,
    },

    /// Malformed slice descriptor
    #[error("Invalid slice {start}:{stop}:{step}: {reason}")]
    InvalidSlice {
        /// Slice start
        start: isize,
        /// Slice stop (exclusive)
        stop: isize,
        /// Slice step
        step: isize,
        /// Reason for invalidity
        reason: &'static str,
    },

    /// Sparsity pattern with more nonzeros than elements
    #[error("Pattern with {nnz} nonzeros exceeds the {numel} elements of shape {shape:?}")]
    InvalidPattern {
        /// Claimed nonzero count
        nnz: usize,
        /// Total element count of the shape
        numel: usize,
        /// The shape in question
        shape: [usize; 2],
    },

    /// Invalid operand index for a node
    #[error("Operand index {index} out of range for node with {count} operands")]
    OperandIndex {
        /// The invalid operand index
        index: usize,
        /// Number of operands the node has
        count: usize,
    },
}

impl Error {
    /// Create a mapping length mismatch error
    pub fn mapping_length(source_nnz: usize, mapping_len: usize) -> Self {
        Self::MappingLength {
            source_nnz,
            mapping_len,
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }

    /// Create an invalid slice error
    pub fn invalid_slice(start: isize, stop: isize, step: isize, reason: &'static str) -> Self {
        Self::InvalidSlice {
            start,
            stop,
            step,
            reason,
        }
    }
}
