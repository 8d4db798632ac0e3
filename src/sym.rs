//! Symbolic scalar expressions
//!
//! [`Sym`] is the scalar kind used by symbolic evaluation: where numeric
//! evaluation computes an `f64`, symbolic evaluation builds a `Sym` tree.
//! Arithmetic is limited to what the scatter and gather kernels perform
//! (copying and summing); subtrees are shared via `Arc` so cloning a
//! symbolic buffer stays cheap.

use num_traits::Zero;
use std::fmt;
use std::ops::Add;
use std::sync::Arc;

/// A scalar symbolic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Sym {
    /// Literal constant
    Const(f64),
    /// Named input slot: symbol name and nonzero index
    Var(Arc<str>, usize),
    /// Sum of two subexpressions
    Sum(Arc<Sym>, Arc<Sym>),
}

impl Sym {
    /// Create a variable referring to nonzero slot `index` of `name`
    pub fn var(name: &str, index: usize) -> Self {
        Sym::Var(Arc::from(name), index)
    }

    /// Number of scalar nodes in the expression tree
    pub fn depth(&self) -> usize {
        match self {
            Sym::Const(_) | Sym::Var(..) => 1,
            Sym::Sum(a, b) => 1 + a.depth() + b.depth(),
        }
    }
}

impl Add for Sym {
    type Output = Sym;

    fn add(self, rhs: Sym) -> Sym {
        // Zero-absorbing and constant-folding sum
        match (self, rhs) {
            (lhs, rhs) if lhs.is_zero() => rhs,
            (lhs, rhs) if rhs.is_zero() => lhs,
            (Sym::Const(a), Sym::Const(b)) => Sym::Const(a + b),
            (lhs, rhs) => Sym::Sum(Arc::new(lhs), Arc::new(rhs)),
        }
    }
}

impl Zero for Sym {
    fn zero() -> Self {
        Sym::Const(0.0)
    }

    fn is_zero(&self) -> bool {
        matches!(self, Sym::Const(c) if *c == 0.0)
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sym::Const(c) => write!(f, "{}", c),
            Sym::Var(name, i) => write!(f, "{}[{}]", name, i),
            Sym::Sum(a, b) => write!(f, "({}+{})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_absorption() {
        let x = Sym::var("x", 0);
        assert_eq!(Sym::zero() + x.clone(), x);
        assert_eq!(x.clone() + Sym::zero(), x);
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(Sym::Const(2.0) + Sym::Const(3.0), Sym::Const(5.0));
    }

    #[test]
    fn test_sum_rendering() {
        let e = Sym::var("x", 1) + Sym::var("y", 0);
        assert_eq!(e.to_string(), "(x[1]+y[0])");
    }
}
