//! Sparsity patterns and dependency masks
//!
//! A [`Sparsity`] records the structural pattern of a sparse value: its
//! matrix shape and how many nonzero slots are stored. The scatter and
//! gather nodes address storage linearly, so the slot count and shape are
//! the entire structural contract; the column/row layout of the slots is
//! owned by the surrounding engine.
//!
//! [`DepMask`] is the per-slot dependency bitset word used by the
//! sparsity-inference pass. One bit per seeded input; the bit layout is
//! defined by the engine, this crate only copies and ORs whole words.

use crate::error::{Error, Result};

/// Dependency bitset word attached to one nonzero slot during sparsity
/// propagation. Bit assignment is owned by the surrounding engine.
pub type DepMask = u64;

/// Structural sparsity pattern of a sparse value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sparsity {
    shape: [usize; 2],
    nnz: usize,
}

impl Sparsity {
    /// Create a pattern with `nnz` stored slots over the given shape
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `nnz` exceeds the number of
    /// elements of the shape.
    pub fn new(shape: [usize; 2], nnz: usize) -> Result<Self> {
        let numel = shape[0] * shape[1];
        if nnz > numel {
            return Err(Error::InvalidPattern { nnz, numel, shape });
        }
        Ok(Self { shape, nnz })
    }

    /// Fully dense pattern: every element is a stored slot
    pub fn dense(shape: [usize; 2]) -> Self {
        Self {
            shape,
            nnz: shape[0] * shape[1],
        }
    }

    /// Dense column vector pattern of length `n`
    pub fn vector(n: usize) -> Self {
        Self::dense([n, 1])
    }

    /// Returns the shape as [nrows, ncols]
    #[inline]
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// Returns the number of rows
    #[inline]
    pub fn nrows(&self) -> usize {
        self.shape[0]
    }

    /// Returns the number of columns
    #[inline]
    pub fn ncols(&self) -> usize {
        self.shape[1]
    }

    /// Returns the number of stored nonzero slots
    #[inline]
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Returns the total number of elements of the shape
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape[0] * self.shape[1]
    }

    /// Returns the density ratio (fraction of stored slots)
    #[inline]
    pub fn density(&self) -> f64 {
        let total = self.numel() as f64;
        if total == 0.0 {
            0.0
        } else {
            self.nnz as f64 / total
        }
    }

    /// Returns true if the pattern has no stored slots
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_creation() {
        let sp = Sparsity::new([3, 3], 5).unwrap();
        assert_eq!(sp.nnz(), 5);
        assert_eq!(sp.shape(), [3, 3]);
        assert_eq!(sp.numel(), 9);
        assert!(!sp.is_empty());
    }

    #[test]
    fn test_pattern_overfull() {
        assert!(Sparsity::new([2, 2], 5).is_err());
    }

    #[test]
    fn test_dense_and_vector() {
        let d = Sparsity::dense([2, 3]);
        assert_eq!(d.nnz(), 6);
        assert!((d.density() - 1.0).abs() < 1e-15);

        let v = Sparsity::vector(4);
        assert_eq!(v.shape(), [4, 1]);
        assert_eq!(v.nnz(), 4);
    }
}
