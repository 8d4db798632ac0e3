//! Nested-slice variant
//!
//! Specializes the general variant when the mapping is a rectangular
//! composition of an inner progression repeated across an outer
//! progression, the usual shape of a sub-block assignment. As with the
//! contiguous variant, only rendering and code emission differ; the
//! emitted code is two nested strided loops.

use crate::codegen::CodeBuilder;
use crate::error::Result;
use crate::graph::node::{DeriveReq, Derivatives, EvalCtx, Node, OpKind};
use crate::graph::scatter::{ScatterBase, ScatterMode};
use crate::graph::Expr;
use crate::slice::Slice;
use crate::sparsity::{DepMask, Sparsity};
use crate::sym::Sym;
use std::any::Any;

/// Scatter-assign through a rectangular outer/inner slot pattern
#[derive(Debug)]
pub struct SetNonzerosSlice2 {
    base: ScatterBase,
    outer: Slice,
    inner: Slice,
}

impl SetNonzerosSlice2 {
    /// Build a nested-slice scatter node from explicit slice parameters
    ///
    /// The mapping enumerates the outer progression as block offsets and
    /// the inner progression as per-block offsets, outer varying slower;
    /// the equivalence precondition holds by construction.
    ///
    /// # Errors
    ///
    /// See [`ScatterBase::new`]; additionally fails on a zero-step
    /// descriptor.
    pub fn new(
        dest: &Expr,
        source: &Expr,
        mode: ScatterMode,
        outer: Slice,
        inner: Slice,
    ) -> Result<Self> {
        let outer = Slice::new(outer.start, outer.stop, outer.step)?;
        let inner = Slice::new(inner.start, inner.stop, inner.step)?;
        let mapping: Vec<usize> = outer
            .offsets()
            .flat_map(|o| inner.offsets().map(move |i| (o + i) as usize))
            .collect();
        Ok(Self {
            base: ScatterBase::new(dest.clone(), source.clone(), mode, mapping)?,
            outer,
            inner,
        })
    }

    pub(crate) fn from_base(base: ScatterBase, outer: Slice, inner: Slice) -> Self {
        Self { base, outer, inner }
    }

    /// The outer (block offset) descriptor
    pub fn outer(&self) -> Slice {
        self.outer
    }

    /// The inner (per-block offset) descriptor
    pub fn inner(&self) -> Slice {
        self.inner
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

impl Node for SetNonzerosSlice2 {
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
        format!(
            "({}[{};{}] {} {})",
            args[0],
            self.outer,
            self.inner,
            self.base.mode(),
            args[1]
        )
    }

    fn emit(&self, args: &[String], res: &[String], gen: &mut CodeBuilder) {
        self.base.emit_copy(args, res, gen);
        if self.outer.is_empty() || self.inner.is_empty() {
            return;
        }
        gen.local("rr", "double*");
        gen.local("ss", "const double*");
        gen.local("tt", "double*");
        gen.stmt(format!(
            "for (rr={res}+{ostart}, ss={arg}; rr!={res}+{ostop}; rr+={ostep}) \
             for (tt=rr+{istart}; tt!=rr+{istop}; tt+={istep}) *tt {op} *ss++;",
            res = res[0],
            arg = args[1],
            ostart = self.outer.start,
            ostop = self.outer.stop,
            ostep = self.outer.step,
            istart = self.inner.start,
            istop = self.inner.stop,
            istep = self.inner.step,
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
