//! Scatter-assign node family
//!
//! Writes (or accumulates) the nonzeros of a source expression into a
//! chosen subset of the nonzero slots of a destination-shaped output.
//! Three variants share one contract:
//!
//! - [`SetNonzeros`]: arbitrary index correspondence, one mapping entry
//!   per source nonzero. Every operation's semantics are defined here.
//! - [`SetNonzerosSlice`]: the mapping is a single arithmetic
//!   progression; code emission becomes one strided loop.
//! - [`SetNonzerosSlice2`]: the mapping is a rectangular outer/inner
//!   progression pair; code emission becomes two nested strided loops.
//!
//! The variant is chosen once, at construction, by
//! [`Expr::set_nonzeros`](crate::graph::Expr::set_nonzeros); all three
//! are substitutable wherever a graph node is expected.

mod base;
mod general;
mod slice;
mod slice2;

pub use base::{ScatterBase, ScatterMode};
pub use general::SetNonzeros;
pub use slice::SetNonzerosSlice;
pub use slice2::SetNonzerosSlice2;
