//! Leaf nodes: named inputs and embedded constants
//!
//! Leaves have no operands and no differentiation rule of their own;
//! seeds attach at the engine level. Numeric values for a [`Symbol`] are
//! bound by the engine, so its numeric evaluation leaves the output
//! buffer untouched; symbolic evaluation fills the buffer with one
//! variable per slot.

use crate::array::SparseArray;
use crate::codegen::CodeBuilder;
use crate::error::Result;
use crate::graph::node::{DeriveReq, Derivatives, EvalCtx, Node, OpKind};
use crate::graph::Expr;
use crate::sparsity::{DepMask, Sparsity};
use crate::sym::Sym;
use std::any::Any;
use std::sync::Arc;

/// Named graph input
#[derive(Debug, Clone)]
pub struct Symbol {
    name: Arc<str>,
    sp: Sparsity,
}

impl Symbol {
    /// Create a named input over the given pattern
    pub fn new(name: &str, sp: Sparsity) -> Self {
        Self {
            name: Arc::from(name),
            sp,
        }
    }

    /// The symbol's name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Node for Symbol {
    fn op(&self) -> OpKind {
        OpKind::Symbol
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sp
    }

    fn operands(&self) -> &[Expr] {
        &[]
    }

    fn eval_numeric(&self, _ctx: EvalCtx<'_, f64>) {
        // Values are bound by the engine, not computed here
    }

    fn eval_symbolic(&self, ctx: EvalCtx<'_, Sym>) {
        debug_assert_eq!(ctx.output.len(), self.sp.nnz());
        for (i, slot) in ctx.output.iter_mut().enumerate() {
            *slot = Sym::Var(Arc::clone(&self.name), i);
        }
    }

    fn derive(&self, req: DeriveReq<'_>) -> Result<Derivatives> {
        let output = req
            .output
            .unwrap_or_else(|| Expr::from_node(self.clone()));
        // With no seed expressions attached, directional derivatives are zero
        let fwd_sens = req
            .fwd_seeds
            .iter()
            .map(|_| Expr::zeros(self.sp.clone()))
            .collect();
        let adj_sens = req.adj_seeds.iter().map(|_| Vec::new()).collect();
        Ok(Derivatives {
            output,
            fwd_sens,
            adj_sens,
        })
    }

    fn propagate_sparsity(
        &self,
        _inputs: &mut [&mut [DepMask]],
        _output: &mut [DepMask],
        _forward: bool,
    ) {
    }

    fn render(&self, _args: &[String]) -> String {
        self.name.to_string()
    }

    fn emit(&self, _args: &[String], _res: &[String], _gen: &mut CodeBuilder) {
        // Inputs are function arguments in the generated code
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Embedded numeric values
#[derive(Debug, Clone)]
pub struct Constant {
    values: SparseArray<f64>,
}

impl Constant {
    /// Create a constant from explicit values
    pub fn new(values: SparseArray<f64>) -> Self {
        Self { values }
    }

    /// The embedded values
    pub fn values(&self) -> &SparseArray<f64> {
        &self.values
    }
}

impl Node for Constant {
    fn op(&self) -> OpKind {
        OpKind::Constant
    }

    fn sparsity(&self) -> &Sparsity {
        self.values.sparsity()
    }

    fn operands(&self) -> &[Expr] {
        &[]
    }

    fn eval_numeric(&self, ctx: EvalCtx<'_, f64>) {
        debug_assert_eq!(ctx.output.len(), self.values.nnz());
        ctx.output.copy_from_slice(self.values.values());
        for dir in ctx.fwd {
            dir.sens.fill(0.0);
        }
        // Constants absorb adjoints; nothing to accumulate
    }

    fn eval_symbolic(&self, ctx: EvalCtx<'_, Sym>) {
        debug_assert_eq!(ctx.output.len(), self.values.nnz());
        for (slot, v) in ctx.output.iter_mut().zip(self.values.values()) {
            *slot = Sym::Const(*v);
        }
    }

    fn derive(&self, req: DeriveReq<'_>) -> Result<Derivatives> {
        let sp = self.values.sparsity().clone();
        let output = req
            .output
            .unwrap_or_else(|| Expr::from_node(self.clone()));
        let fwd_sens = req
            .fwd_seeds
            .iter()
            .map(|_| Expr::zeros(sp.clone()))
            .collect();
        let adj_sens = req.adj_seeds.iter().map(|_| Vec::new()).collect();
        Ok(Derivatives {
            output,
            fwd_sens,
            adj_sens,
        })
    }

    fn propagate_sparsity(
        &self,
        _inputs: &mut [&mut [DepMask]],
        output: &mut [DepMask],
        forward: bool,
    ) {
        // A constant depends on nothing
        if forward {
            output.fill(0);
        }
    }

    fn render(&self, _args: &[String]) -> String {
        let vals = self.values.values();
        if vals.len() <= 8 {
            let entries: Vec<String> = vals.iter().map(|v| v.to_string()).collect();
            format!("[{}]", entries.join(", "))
        } else {
            format!("const<{}>", vals.len())
        }
    }

    fn emit(&self, _args: &[String], _res: &[String], _gen: &mut CodeBuilder) {
        // Constant folding happens before emission; nothing to generate
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_symbol_symbolic_eval() {
        let s = Symbol::new("x", Sparsity::vector(2));
        let mut out = vec![Sym::Const(0.0); 2];
        s.eval_symbolic(EvalCtx::new(smallvec![], &mut out));
        assert_eq!(out[0].to_string(), "x[0]");
        assert_eq!(out[1].to_string(), "x[1]");
    }

    #[test]
    fn test_constant_numeric_eval() {
        let c = Constant::new(
            SparseArray::from_values(Sparsity::vector(3), vec![1.0, 2.0, 3.0]).unwrap(),
        );
        let mut out = vec![0.0; 3];
        c.eval_numeric(EvalCtx::new(smallvec![], &mut out));
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_constant_render() {
        let c = Constant::new(
            SparseArray::from_values(Sparsity::vector(2), vec![0.0, 0.0]).unwrap(),
        );
        assert_eq!(c.render(&[]), "[0, 0]");
    }
}
