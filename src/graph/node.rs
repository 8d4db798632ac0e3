//! Graph node operation contract
//!
//! Every expression-graph node implements [`Node`]: operation identity,
//! numeric and symbolic evaluation with simultaneous derivative
//! propagation, the graph-level differentiation rule, bitset sparsity
//! propagation, one-line rendering, and code emission. The engine invokes
//! these hooks during execution, differentiation, sparsity analysis, and
//! compiled-function emission; nodes never mutate their operands, only
//! the buffers the caller hands them.

use crate::codegen::CodeBuilder;
use crate::error::Result;
use crate::graph::Expr;
use crate::sparsity::{DepMask, Sparsity};
use crate::sym::Sym;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;

/// Operation identity, used for graph printing and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Named graph input
    Symbol,
    /// Embedded numeric values
    Constant,
    /// Read mapped nonzero slots out of an operand
    GetNonzeros,
    /// Overwrite mapped nonzero slots of a destination
    SetNonzeros,
    /// Accumulate into mapped nonzero slots of a destination
    AddNonzeros,
}

impl OpKind {
    /// Returns the operation name as a string
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Symbol => "symbol",
            OpKind::Constant => "constant",
            OpKind::GetNonzeros => "get_nonzeros",
            OpKind::SetNonzeros => "set_nonzeros",
            OpKind::AddNonzeros => "add_nonzeros",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Buffers for one forward (tangent) direction
pub struct ForwardDir<'a, T> {
    /// Seed buffer per operand, in operand order
    pub seeds: SmallVec<[&'a [T]; 2]>,
    /// Output tangent buffer
    pub sens: &'a mut [T],
}

/// Buffers for one reverse (adjoint) direction
///
/// Seeds are consumed: under assign semantics the written slots of `seed`
/// are zeroed as their contribution is gathered, so a later pass over the
/// same direction sees only what still flows to the destination operand.
pub struct AdjointDir<'a, T> {
    /// Adjoint seed on the node output
    pub seed: &'a mut [T],
    /// Adjoint accumulator per operand, in operand order
    pub sens: SmallVec<[&'a mut [T]; 2]>,
}

/// One evaluation call's buffer set
///
/// `inputs` hold each operand's nonzero buffer. When `inplace` is set the
/// output buffer aliases operand 0 and already holds its values, so the
/// pass-through copy is skipped; the engine asks
/// [`Node::inplace_operands`] before arranging this.
pub struct EvalCtx<'a, T> {
    /// Operand nonzero buffers, in operand order
    pub inputs: SmallVec<[&'a [T]; 2]>,
    /// Output nonzero buffer
    pub output: &'a mut [T],
    /// Output already holds operand 0's values
    pub inplace: bool,
    /// Forward directions, one per tangent seed
    pub fwd: Vec<ForwardDir<'a, T>>,
    /// Reverse directions, one per adjoint seed
    pub adj: Vec<AdjointDir<'a, T>>,
}

impl<'a, T> EvalCtx<'a, T> {
    /// Context with value buffers only, no derivative directions
    pub fn new(inputs: SmallVec<[&'a [T]; 2]>, output: &'a mut [T]) -> Self {
        Self {
            inputs,
            output,
            inplace: false,
            fwd: Vec::new(),
            adj: Vec::new(),
        }
    }
}

/// Inputs to a graph-level differentiation request
pub struct DeriveReq<'a> {
    /// Seed expressions per forward direction, one entry per operand
    pub fwd_seeds: &'a [Vec<Expr>],
    /// Adjoint seed expression on the output, one per direction
    pub adj_seeds: &'a [Expr],
    /// Previously computed output, when the engine already holds one
    pub output: Option<Expr>,
}

/// Result of a graph-level differentiation request
///
/// Adjoint contributions are returned per direction and per operand; the
/// engine accumulates them into its sensitivity store. `None` marks an
/// operand that receives nothing in that direction.
pub struct Derivatives {
    /// The (re)built nondifferentiated output
    pub output: Expr,
    /// Tangent expression per forward direction
    pub fwd_sens: Vec<Expr>,
    /// Adjoint contribution per reverse direction, per operand
    pub adj_sens: Vec<Vec<Option<Expr>>>,
}

/// Shared contract implemented by every expression-graph node
///
/// Nodes are immutable after construction; the only rewrite is the
/// one-shot [`Node::simplify`], which may repoint the owning handle at a
/// cheaper equivalent node.
pub trait Node: fmt::Debug + Send + Sync {
    /// Operation identity
    fn op(&self) -> OpKind;

    /// Structural sparsity of the node output
    fn sparsity(&self) -> &Sparsity;

    /// Operand expressions, in argument order
    fn operands(&self) -> &[Expr];

    /// Numeric evaluation with simultaneous tangent/adjoint propagation
    ///
    /// Buffer sizes must match the operand and output sparsities; this is
    /// the caller's contract and is only checked in debug builds. A
    /// validly constructed node cannot fail here.
    fn eval_numeric(&self, ctx: EvalCtx<'_, f64>);

    /// Symbolic evaluation: identical contract, builds expressions
    fn eval_symbolic(&self, ctx: EvalCtx<'_, Sym>);

    /// Graph-level differentiation rule
    ///
    /// # Errors
    ///
    /// Fails only if a seed expression's sparsity disagrees with the
    /// operand it seeds, which indicates an engine bug upstream.
    fn derive(&self, req: DeriveReq<'_>) -> Result<Derivatives>;

    /// Dataflow pass over per-slot dependency masks
    ///
    /// Forward: compute the output masks from the input masks. Reverse:
    /// OR each output mask back into the input masks it depends on; the
    /// output buffer is left untouched.
    fn propagate_sparsity(
        &self,
        inputs: &mut [&mut [DepMask]],
        output: &mut [DepMask],
        forward: bool,
    );

    /// One-line description of the operation given operand names
    fn render(&self, args: &[String]) -> String;

    /// Append compiled statements for this operation to the backend
    ///
    /// `args` and `res` name the operand and result buffers in the
    /// generated code.
    fn emit(&self, args: &[String], res: &[String], gen: &mut CodeBuilder);

    /// Number of leading operands that may alias the output buffer
    fn inplace_operands(&self) -> usize {
        0
    }

    /// Rewrite hook: repoint `ex` at a cheaper equivalent, if one exists
    fn simplify(&self, _ex: &mut Expr) {}

    /// Downcast support for engine passes that inspect concrete nodes
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_kind_names() {
        assert_eq!(OpKind::SetNonzeros.to_string(), "set_nonzeros");
        assert_eq!(OpKind::AddNonzeros.to_string(), "add_nonzeros");
        assert_eq!(OpKind::GetNonzeros.to_string(), "get_nonzeros");
    }
}
