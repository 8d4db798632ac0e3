//! # symr
//!
//! **Sparse-aware symbolic expression graphs with automatic
//! differentiation and code generation.**
//!
//! symr provides the node family for scatter-assign operations inside a
//! symbolic computation graph: writing or accumulating the nonzeros of
//! one expression into a chosen subset of another expression's nonzero
//! slots.
//!
//! One node, four concerns:
//!
//! - **Numeric evaluation** over concrete buffers, with simultaneous
//!   forward (tangent) and reverse (adjoint) derivative propagation
//! - **Symbolic evaluation** building scalar expressions where values
//!   are indeterminate
//! - **Sparsity inference**: forward and reverse dataflow over per-slot
//!   dependency bitsets
//! - **Code emission** of C-like statements for a standalone compiled
//!   evaluator
//!
//! Three interchangeable variants cover the cost spectrum: an explicit
//! index mapping, a single arithmetic progression, and a rectangular
//! nested progression. The cheapest applicable variant is chosen once at
//! graph construction.
//!
//! ## Quick Start
//!
//! ```rust
//! use symr::prelude::*;
//!
//! // y with 5 stored nonzeros, x with 2
//! let y = Expr::symbol("y", Sparsity::vector(5));
//! let x = Expr::symbol("x", Sparsity::vector(2));
//!
//! // Overwrite y's slots 0 and 2 with x's nonzeros
//! let e = Expr::set_nonzeros(&y, &x, ScatterMode::Assign, vec![0, 2])?;
//! assert_eq!(e.describe(), "(y[0:4:2] = x)");
//! # Ok::<(), symr::error::Error>(())
//! ```
//!
//! All failure modes are construction-time: a node that was built
//! successfully cannot fail during evaluation, propagation, or emission.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod codegen;
pub mod error;
pub mod graph;
pub mod slice;
pub mod sparsity;
pub mod sym;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::array::{Scalar, SparseArray};
    pub use crate::codegen::CodeBuilder;
    pub use crate::error::{Error, Result};
    pub use crate::graph::scatter::{
        ScatterMode, SetNonzeros, SetNonzerosSlice, SetNonzerosSlice2,
    };
    pub use crate::graph::{
        AdjointDir, DeriveReq, Derivatives, EvalCtx, Expr, ForwardDir, GetNonzeros, Node, OpKind,
    };
    pub use crate::slice::Slice;
    pub use crate::sparsity::{DepMask, Sparsity};
    pub use crate::sym::Sym;
}
