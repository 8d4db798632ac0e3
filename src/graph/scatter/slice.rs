//! Contiguous-slice variant
//!
//! Specializes the general variant when the mapping is a single
//! arithmetic progression. Only rendering and code emission differ: the
//! emitted loop is one strided pointer walk with no index table.
//! Evaluation, differentiation, and sparsity propagation delegate to the
//! shared base; the descriptor is guaranteed equivalent to the mapping at
//! construction and never re-checked.

use crate::codegen::CodeBuilder;
use crate::error::Result;
use crate::graph::node::{DeriveReq, Derivatives, EvalCtx, Node, OpKind};
use crate::graph::scatter::{ScatterBase, ScatterMode};
use crate::graph::Expr;
use crate::slice::Slice;
use crate::sparsity::{DepMask, Sparsity};
use crate::sym::Sym;
use std::any::Any;

/// Scatter-assign through an arithmetic progression of slots
#[derive(Debug)]
pub struct SetNonzerosSlice {
    base: ScatterBase,
    s: Slice,
}

impl SetNonzerosSlice {
    /// Build a slice scatter node from explicit slice parameters
    ///
    /// The mapping is expanded from the descriptor, so the equivalence
    /// precondition holds by construction.
    ///
    /// # Errors
    ///
    /// See [`ScatterBase::new`]; additionally fails on a zero-step
    /// descriptor.
    pub fn new(
        dest: &Expr,
        source: &Expr,
        mode: ScatterMode,
        s: Slice,
    ) -> Result<Self> {
        let s = Slice::new(s.start, s.stop, s.step)?;
        let mapping: Vec<usize> = s.indices().collect();
        Ok(Self {
            base: ScatterBase::new(dest.clone(), source.clone(), mode, mapping)?,
            s,
        })
    }

    pub(crate) fn from_base(base: ScatterBase, s: Slice) -> Self {
        Self { base, s }
    }

    /// The slice descriptor
    pub fn slice(&self) -> Slice {
        self.s
    }

    /// The expanded index mapping
    pub fn mapping(&self) -> &[usize] {
        self.base.mapping()
    }

    /// The mode flag
    pub fn mode(&self) -> ScatterMode {
        self.base.mode()
    }
}

impl Node for SetNonzerosSlice {
    fn op(&self) -> OpKind {
        self.base.op()
    }

    fn sparsity(&self) -> &Sparsity {
        self.base.sparsity()
    }

    fn operands(&self) -> &[Expr] {
        self.base.operands()
    }

    fn eval_numeric(&self, ctx: EvalCtx<'_, f64>) {
        self.base.eval_generic(ctx);
    }

    fn eval_symbolic(&self, ctx: EvalCtx<'_, Sym>) {
        self.base.eval_generic(ctx);
    }

    fn derive(&self, req: DeriveReq<'_>) -> Result<Derivatives> {
        self.base.derive(req)
    }

    fn propagate_sparsity(
        &self,
        inputs: &mut [&mut [DepMask]],
        output: &mut [DepMask],
        forward: bool,
    ) {
        self.base.propagate(inputs, output, forward);
    }

    fn render(&self, args: &[String]) -> String {
        format!("({}[{}] {} {})", args[0], self.s, self.base.mode(), args[1])
    }

    fn emit(&self, args: &[String], res: &[String], gen: &mut CodeBuilder) {
        self.base.emit_copy(args, res, gen);
        if self.s.is_empty() {
            return;
        }
        gen.local("rr", "double*");
        gen.local("ss", "const double*");
        gen.stmt(format!(
            "for (rr={res}+{start}, ss={arg}; rr!={res}+{stop}; rr+={step}) *rr {op} *ss++;",
            res = res[0],
            arg = args[1],
            start = self.s.start,
            stop = self.s.stop,
            step = self.s.step,
            op = self.base.mode().assign_op(),
        ));
    }

    fn inplace_operands(&self) -> usize {
        1
    }

    fn simplify(&self, ex: &mut Expr) {
        self.base.simplify(ex);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparsity::Sparsity;
    use smallvec::smallvec;

    fn node(mode: ScatterMode, s: Slice) -> SetNonzerosSlice {
        let dest = Expr::symbol("y", Sparsity::vector(5));
        let src = Expr::symbol("x", Sparsity::vector(s.len()));
        SetNonzerosSlice::new(&dest, &src, mode, s).unwrap()
    }

    #[test]
    fn test_slice_expands_to_mapping() {
        let n = node(ScatterMode::Assign, Slice { start: 1, stop: 4, step: 1 });
        assert_eq!(n.mapping(), &[1, 2, 3]);
    }

    #[test]
    fn test_eval_matches_slice_semantics() {
        let n = node(ScatterMode::Assign, Slice { start: 0, stop: 5, step: 2 });
        let dest = [10.0, 20.0, 30.0, 40.0, 50.0];
        let src = [1.0, 2.0, 3.0];
        let mut out = [0.0; 5];
        n.eval_numeric(EvalCtx::new(smallvec![&dest[..], &src[..]], &mut out));
        assert_eq!(out, [1.0, 20.0, 2.0, 40.0, 3.0]);
    }

    #[test]
    fn test_render() {
        let n = node(ScatterMode::Assign, Slice { start: 1, stop: 4, step: 1 });
        assert_eq!(n.render(&["y".into(), "x".into()]), "(y[1:4:1] = x)");
    }

    #[test]
    fn test_emit_strided_loop() {
        let n = node(ScatterMode::Accumulate, Slice { start: 1, stop: 4, step: 1 });
        let mut gen = CodeBuilder::new();
        n.emit(&["a0".into(), "a1".into()], &["r0".into()], &mut gen);
        let text = gen.assemble("f0");
        assert!(text.contains("for (rr=r0+1, ss=a1; rr!=r0+4; rr+=1) *rr += *ss++;"));
        // No index table for the slice form
        assert!(!text.contains("static const int"));
    }

    #[test]
    fn test_out_of_range_slice_rejected() {
        let dest = Expr::symbol("y", Sparsity::vector(3));
        let src = Expr::symbol("x", Sparsity::vector(3));
        let s = Slice { start: 2, stop: 5, step: 1 };
        assert!(SetNonzerosSlice::new(&dest, &src, ScatterMode::Assign, s).is_err());
    }
}
