//! Slice descriptors and index-mapping classification
//!
//! An index mapping (one destination slot per source nonzero) can often be
//! compressed into an arithmetic progression, or into a rectangular
//! composition of two progressions. The checks here are pure and run once
//! at graph construction time to pick the cheapest scatter node variant;
//! the explicit mapping is always a legal fallback.

use crate::error::{Error, Result};
use std::fmt;

/// Arithmetic progression descriptor: `start, start+step, ...` up to but
/// not including `stop`
///
/// Fields are signed so that descending progressions (negative step) and
/// per-block offsets of a nested slice (which may start below zero) are
/// representable. Indices produced by [`Slice::indices`] are always
/// nonnegative for descriptors derived from a valid mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// First index of the progression
    pub start: isize,
    /// Exclusive upper (or lower, for negative step) bound
    pub stop: isize,
    /// Increment between consecutive indices, never zero
    pub step: isize,
}

impl Slice {
    /// Create a slice descriptor
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlice`] if `step` is zero.
    pub fn new(start: isize, stop: isize, step: isize) -> Result<Self> {
        if step == 0 {
            return Err(Error::invalid_slice(start, stop, step, "step must be nonzero"));
        }
        Ok(Self { start, stop, step })
    }

    /// Number of indices the progression enumerates
    pub fn len(&self) -> usize {
        if self.step > 0 && self.stop > self.start {
            ((self.stop - self.start - 1) / self.step + 1) as usize
        } else if self.step < 0 && self.stop < self.start {
            ((self.start - self.stop - 1) / (-self.step) + 1) as usize
        } else {
            0
        }
    }

    /// Returns true if the progression enumerates nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the enumerated values as signed offsets
    ///
    /// The inner descriptor of a nested pair holds per-block offsets that
    /// may be negative; absolute indices come from [`Slice::indices`].
    pub fn offsets(&self) -> impl Iterator<Item = isize> + '_ {
        let (start, step) = (self.start, self.step);
        (0..self.len()).map(move |i| start + (i as isize) * step)
    }

    /// Iterate over the enumerated indices
    ///
    /// Panics in debug builds if an index is negative; absolute descriptors
    /// built from a valid mapping never produce one.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets().map(|idx| {
            debug_assert!(idx >= 0, "slice enumerated a negative index");
            idx as usize
        })
    }

    /// Detect whether `mapping` is a single arithmetic progression
    ///
    /// Returns the equivalent descriptor, or `None` when the mapping is
    /// empty, contains a repeat, or breaks the progression. A length-one
    /// mapping is the unit slice `v:v+1:1`.
    pub fn from_mapping(mapping: &[usize]) -> Option<Slice> {
        let first = *mapping.first()? as isize;
        if mapping.len() == 1 {
            return Some(Slice {
                start: first,
                stop: first + 1,
                step: 1,
            });
        }
        let step = mapping[1] as isize - first;
        if step == 0 {
            return None;
        }
        for w in mapping.windows(2) {
            if w[1] as isize - w[0] as isize != step {
                return None;
            }
        }
        let last = *mapping.last().unwrap() as isize;
        Some(Slice {
            start: first,
            stop: last + step,
            step,
        })
    }

    /// Detect whether `mapping` is a rectangular nested progression
    ///
    /// On success returns `(outer, inner)` such that enumerating
    /// `outer_index + inner_index` with the outer progression varying
    /// slower reproduces the mapping. The inner descriptor holds per-block
    /// offsets starting at zero; the outer descriptor holds absolute block
    /// offsets. At least two blocks of at least two entries are required,
    /// so mappings already expressible as a single slice are not reported
    /// here.
    pub fn nested_from_mapping(mapping: &[usize]) -> Option<(Slice, Slice)> {
        if mapping.len() < 4 {
            return None;
        }
        let first = mapping[0] as isize;

        // Length of the leading arithmetic run = inner block size
        let inner_step = mapping[1] as isize - first;
        if inner_step == 0 {
            return None;
        }
        let mut block = 2;
        while block < mapping.len()
            && mapping[block] as isize - mapping[block - 1] as isize == inner_step
        {
            block += 1;
        }
        if block == mapping.len() || mapping.len() % block != 0 || block < 2 {
            return None;
        }
        let nblocks = mapping.len() / block;
        if nblocks < 2 {
            return None;
        }
        let outer_step = mapping[block] as isize - first;
        if outer_step == 0 {
            return None;
        }

        // Verify the full rectangular composition
        for j in 0..nblocks {
            for i in 0..block {
                let expect = first + (j as isize) * outer_step + (i as isize) * inner_step;
                if mapping[j * block + i] as isize != expect {
                    return None;
                }
            }
        }

        let outer = Slice {
            start: first,
            stop: first + (nblocks as isize) * outer_step,
            step: outer_step,
        };
        let inner = Slice {
            start: 0,
            stop: (block as isize) * inner_step,
            step: inner_step,
        };
        Some((outer, inner))
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.stop, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_len_and_indices() {
        let s = Slice::new(1, 4, 1).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.indices().collect::<Vec<_>>(), vec![1, 2, 3]);

        let s = Slice::new(2, 8, 2).unwrap();
        assert_eq!(s.indices().collect::<Vec<_>>(), vec![2, 4, 6]);

        let s = Slice::new(3, -1, -1).unwrap();
        assert_eq!(s.indices().collect::<Vec<_>>(), vec![3, 2, 1, 0]);

        let s = Slice::new(5, 5, 1).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(Slice::new(0, 4, 0).is_err());
    }

    #[test]
    fn test_detect_contiguous() {
        assert_eq!(
            Slice::from_mapping(&[1, 2, 3]),
            Some(Slice {
                start: 1,
                stop: 4,
                step: 1
            })
        );
        assert_eq!(
            Slice::from_mapping(&[2, 4, 6]),
            Some(Slice {
                start: 2,
                stop: 8,
                step: 2
            })
        );
        // Descending progressions are slices too
        assert_eq!(
            Slice::from_mapping(&[3, 2, 1]),
            Some(Slice {
                start: 3,
                stop: 0,
                step: -1
            })
        );
        // Singletons are the unit slice
        assert_eq!(
            Slice::from_mapping(&[7]),
            Some(Slice {
                start: 7,
                stop: 8,
                step: 1
            })
        );
    }

    #[test]
    fn test_detect_contiguous_fallback() {
        assert_eq!(Slice::from_mapping(&[]), None);
        assert_eq!(Slice::from_mapping(&[0, 0]), None);
        assert_eq!(Slice::from_mapping(&[3, 1, 2]), None);
        assert_eq!(Slice::from_mapping(&[0, 1, 3]), None);
    }

    #[test]
    fn test_detect_nested() {
        // Two entries per block, three blocks of stride 4
        let (outer, inner) = Slice::nested_from_mapping(&[0, 1, 4, 5, 8, 9]).unwrap();
        assert_eq!((outer.start, outer.stop, outer.step), (0, 12, 4));
        assert_eq!((inner.start, inner.stop, inner.step), (0, 2, 1));

        // Recomposing enumerates the original mapping
        let recomposed: Vec<usize> = outer
            .offsets()
            .flat_map(|o| inner.offsets().map(move |i| (o + i) as usize))
            .collect();
        assert_eq!(recomposed, vec![0, 1, 4, 5, 8, 9]);
    }

    #[test]
    fn test_detect_nested_fallback() {
        // A plain slice is not reported as nested
        assert_eq!(Slice::nested_from_mapping(&[0, 1, 2, 3]), None);
        // Ragged block structure
        assert_eq!(Slice::nested_from_mapping(&[0, 1, 4, 5, 8]), None);
        // Blocks with inconsistent inner step
        assert_eq!(Slice::nested_from_mapping(&[0, 1, 4, 6, 8, 9]), None);
        assert_eq!(Slice::nested_from_mapping(&[0, 2]), None);
    }
}
