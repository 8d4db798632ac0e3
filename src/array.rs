//! Sparse value containers
//!
//! [`SparseArray`] pairs a [`Sparsity`] pattern with one value per stored
//! slot. Evaluation reads and writes these buffers; it never resizes them
//! and never touches the pattern.

use crate::error::{Error, Result};
use crate::sparsity::Sparsity;
use num_traits::Zero;

/// Scalar capability surface required by evaluation kernels
///
/// The kernels only copy values, sum values, and produce zeros, so any
/// clonable type with a zero-respecting addition qualifies. `f64` is the
/// numeric kind; [`crate::sym::Sym`] is the symbolic kind.
pub trait Scalar: Clone + Zero {}

impl<T: Clone + Zero> Scalar for T {}

/// Values stored over a sparsity pattern
#[derive(Debug, Clone, PartialEq)]
pub struct SparseArray<T> {
    values: Vec<T>,
    sp: Sparsity,
}

impl<T: Scalar> SparseArray<T> {
    /// Create an array from a pattern and one value per stored slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueCount`] if the value count disagrees with the
    /// pattern's nonzero count.
    pub fn from_values(sp: Sparsity, values: Vec<T>) -> Result<Self> {
        if values.len() != sp.nnz() {
            return Err(Error::ValueCount {
                expected: sp.nnz(),
                got: values.len(),
            });
        }
        Ok(Self { values, sp })
    }

    /// Create an array of zeros over the pattern
    pub fn zeros(sp: Sparsity) -> Self {
        let values = vec![T::zero(); sp.nnz()];
        Self { values, sp }
    }

    /// Returns the sparsity pattern
    pub fn sparsity(&self) -> &Sparsity {
        &self.sp
    }

    /// Returns the number of stored values
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// View the stored values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutably view the stored values
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Consume the array, returning the stored values
    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values() {
        let sp = Sparsity::vector(3);
        let a = SparseArray::from_values(sp, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_value_count_mismatch() {
        let sp = Sparsity::vector(3);
        assert!(SparseArray::from_values(sp, vec![1.0]).is_err());
    }

    #[test]
    fn test_zeros() {
        let a = SparseArray::<f64>::zeros(Sparsity::vector(4));
        assert_eq!(a.values(), &[0.0; 4]);
    }
}
