//! Expression graph: handles, node contract, and node implementations
//!
//! Graph nodes are immutable and shared by reference counting; the graph
//! is a DAG by construction. The engine drives nodes through the
//! [`Node`] contract during numeric execution, symbolic expansion,
//! differentiation, sparsity inference, and code emission.

mod expr;
mod gather;
mod leaf;
mod node;

pub mod scatter;

pub use expr::Expr;
pub use gather::GetNonzeros;
pub use leaf::{Constant, Symbol};
pub use node::{AdjointDir, DeriveReq, Derivatives, EvalCtx, ForwardDir, Node, OpKind};
