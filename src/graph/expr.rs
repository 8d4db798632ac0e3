//! Expression handles and graph construction
//!
//! [`Expr`] is a cheap-to-clone, reference-counted handle to a graph
//! node. Shared subexpressions are shared handles; the graph is acyclic
//! by construction since operands always exist before the nodes that
//! consume them.

use crate::array::SparseArray;
use crate::error::Result;
use crate::graph::gather::GetNonzeros;
use crate::graph::leaf::{Constant, Symbol};
use crate::graph::node::{Node, OpKind};
use crate::graph::scatter::{ScatterBase, ScatterMode, SetNonzeros, SetNonzerosSlice, SetNonzerosSlice2};
use crate::slice::Slice;
use crate::sparsity::Sparsity;
use std::fmt;
use std::sync::Arc;

/// Reference-counted handle to an expression-graph node
#[derive(Clone)]
pub struct Expr(Arc<dyn Node>);

impl Expr {
    /// Wrap a node in a shared handle
    pub fn from_node<N: Node + 'static>(node: N) -> Self {
        Expr(Arc::new(node))
    }

    /// Create a named graph input over the given pattern
    pub fn symbol(name: &str, sp: Sparsity) -> Self {
        Expr::from_node(Symbol::new(name, sp))
    }

    /// Create a constant from explicit values
    pub fn constant(values: SparseArray<f64>) -> Self {
        Expr::from_node(Constant::new(values))
    }

    /// Create an all-zero constant over the given pattern
    pub fn zeros(sp: Sparsity) -> Self {
        Expr::from_node(Constant::new(SparseArray::zeros(sp)))
    }

    /// Build a scatter-assign node, choosing the cheapest variant
    ///
    /// The mapping gives, per `source` nonzero, the destination slot that
    /// receives it. The variant choice (contiguous slice, nested slice,
    /// general) is made here, once, from the mapping's structure.
    ///
    /// # Errors
    ///
    /// Fails if the mapping length disagrees with `source`'s nonzero
    /// count or any entry exceeds `dest`'s nonzero count.
    pub fn set_nonzeros(
        dest: &Expr,
        source: &Expr,
        mode: ScatterMode,
        mapping: Vec<usize>,
    ) -> Result<Expr> {
        let base = ScatterBase::new(dest.clone(), source.clone(), mode, mapping)?;
        if let Some(s) = Slice::from_mapping(base.mapping()) {
            Ok(Expr::from_node(SetNonzerosSlice::from_base(base, s)))
        } else if let Some((outer, inner)) = Slice::nested_from_mapping(base.mapping()) {
            Ok(Expr::from_node(SetNonzerosSlice2::from_base(base, outer, inner)))
        } else {
            Ok(Expr::from_node(SetNonzeros::from_base(base)))
        }
    }

    /// Build a gather node reading `source`'s nonzeros at `mapping`
    ///
    /// # Errors
    ///
    /// Fails if any entry exceeds `source`'s nonzero count.
    pub fn get_nonzeros(source: &Expr, mapping: Vec<usize>) -> Result<Expr> {
        Ok(Expr::from_node(GetNonzeros::new(source.clone(), mapping)?))
    }

    /// The underlying node
    pub fn node(&self) -> &dyn Node {
        self.0.as_ref()
    }

    /// Operation identity of the node
    pub fn op(&self) -> OpKind {
        self.0.op()
    }

    /// Structural sparsity of the node output
    pub fn sparsity(&self) -> &Sparsity {
        self.0.sparsity()
    }

    /// Returns true if both handles point at the same node
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Recursively render the expression as a one-line description
    pub fn describe(&self) -> String {
        let args: Vec<String> = self.0.operands().iter().map(Expr::describe).collect();
        self.0.render(&args)
    }

    /// Apply the node's one-shot rewrite rule to this handle
    ///
    /// If the node is behaviorally a plain copy of one operand, the
    /// handle is repointed at that operand; otherwise nothing changes.
    /// Applying this twice is the same as applying it once.
    pub fn simplify(ex: &mut Expr) {
        let node = Arc::clone(&ex.0);
        node.simplify(ex);
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("op", &self.0.op())
            .field("nnz", &self.0.sparsity().nnz())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::scatter::ScatterMode;

    #[test]
    fn test_variant_choice() {
        let dest = Expr::symbol("y", Sparsity::vector(10));
        let src3 = Expr::symbol("x", Sparsity::vector(3));
        let src6 = Expr::symbol("x", Sparsity::vector(6));

        // Arithmetic progression picks the slice variant
        let e = Expr::set_nonzeros(&dest, &src3, ScatterMode::Assign, vec![1, 2, 3]).unwrap();
        assert!(e.describe().contains("1:4:1"));

        // Rectangular block pattern picks the nested variant
        let e =
            Expr::set_nonzeros(&dest, &src6, ScatterMode::Assign, vec![0, 1, 4, 5, 8, 9]).unwrap();
        assert!(e.describe().contains("0:12:4"));
        assert!(e.describe().contains("0:2:1"));

        // Irregular mapping falls back to the general variant
        let e = Expr::set_nonzeros(&dest, &src3, ScatterMode::Assign, vec![4, 0, 2]).unwrap();
        assert!(e.describe().contains("{4,0,2}"));
    }

    #[test]
    fn test_shared_handles() {
        let x = Expr::symbol("x", Sparsity::vector(2));
        let y = x.clone();
        assert!(x.ptr_eq(&y));
    }
}
