//! General mapping variant
//!
//! Covers every possible index correspondence with one mapping entry per
//! source nonzero. The other variants specialize this one; all operation
//! semantics live in the shared base.

use crate::codegen::CodeBuilder;
use crate::error::{Error, Result};
use crate::graph::node::{DeriveReq, Derivatives, EvalCtx, Node, OpKind};
use crate::graph::scatter::{ScatterBase, ScatterMode};
use crate::graph::Expr;
use crate::sparsity::{DepMask, Sparsity};
use crate::sym::Sym;
use std::any::Any;

/// Scatter-assign through an explicit index mapping
#[derive(Debug)]
pub struct SetNonzeros {
    base: ScatterBase,
}

impl SetNonzeros {
    /// Validate and build a general scatter node
    ///
    /// # Errors
    ///
    /// See [`ScatterBase::new`].
    pub fn new(
        dest: &Expr,
        source: &Expr,
        mode: ScatterMode,
        mapping: Vec<usize>,
    ) -> Result<Self> {
        Ok(Self {
            base: ScatterBase::new(dest.clone(), source.clone(), mode, mapping)?,
        })
    }

    pub(crate) fn from_base(base: ScatterBase) -> Self {
        Self { base }
    }

    /// The index mapping
    pub fn mapping(&self) -> &[usize] {
        self.base.mapping()
    }

    /// The mode flag
    pub fn mode(&self) -> ScatterMode {
        self.base.mode()
    }

    /// Materialize the index table from one operand to the output
    ///
    /// Entry `j` is the linear nonzero index of `operand` contributing to
    /// output slot `j`, or `None` where that operand contributes nothing.
    /// For the source operand, repeated targets record the last write.
    /// Downstream passes use this to build explicit gather tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperandIndex`] if `operand` is not 0 or 1.
    pub fn index_matrix(&self, operand: usize) -> Result<Vec<Option<usize>>> {
        let nnz = self.base.sparsity().nnz();
        match operand {
            0 => {
                let mut matrix: Vec<Option<usize>> = (0..nnz).map(Some).collect();
                if self.base.mode() == ScatterMode::Assign {
                    for &k in self.base.mapping() {
                        matrix[k] = None;
                    }
                }
                Ok(matrix)
            }
            1 => {
                let mut matrix = vec![None; nnz];
                for (i, &k) in self.base.mapping().iter().enumerate() {
                    matrix[k] = Some(i);
                }
                Ok(matrix)
            }
            index => Err(Error::OperandIndex { index, count: 2 }),
        }
    }

    /// True when the node is behaviorally a plain copy of the source
    pub fn is_pure_assignment(&self) -> bool {
        self.base.is_pure_assignment()
    }
}

impl Node for SetNonzeros {
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
        let entries: Vec<String> = self.base.mapping().iter().map(|v| v.to_string()).collect();
        format!(
            "({}[{{{}}}] {} {})",
            args[0],
            entries.join(","),
            self.base.mode(),
            args[1]
        )
    }

    fn emit(&self, args: &[String], res: &[String], gen: &mut CodeBuilder) {
        self.base.emit_copy(args, res, gen);
        if self.base.mapping().is_empty() {
            return;
        }
        let tbl = gen.intern_constant(self.base.mapping());
        gen.local("i", "int");
        gen.stmt(format!(
            "for (i=0; i<{}; ++i) {}[{}[i]] {} {}[i];",
            self.base.mapping().len(),
            res[0],
            tbl,
            self.base.mode().assign_op(),
            args[1]
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

    fn node(mode: ScatterMode, mapping: Vec<usize>) -> SetNonzeros {
        let dest = Expr::symbol("y", Sparsity::vector(5));
        let src = Expr::symbol("x", Sparsity::vector(mapping.len()));
        SetNonzeros::new(&dest, &src, mode, mapping).unwrap()
    }

    #[test]
    fn test_assign_eval() {
        let n = node(ScatterMode::Assign, vec![0, 2]);
        let dest = [10.0, 20.0, 30.0, 40.0, 50.0];
        let src = [1.0, 2.0];
        let mut out = [0.0; 5];
        n.eval_numeric(EvalCtx::new(smallvec![&dest[..], &src[..]], &mut out));
        assert_eq!(out, [1.0, 20.0, 2.0, 40.0, 50.0]);
    }

    #[test]
    fn test_accumulate_eval() {
        let n = node(ScatterMode::Accumulate, vec![0, 2]);
        let dest = [10.0, 20.0, 30.0, 40.0, 50.0];
        let src = [1.0, 2.0];
        let mut out = [0.0; 5];
        n.eval_numeric(EvalCtx::new(smallvec![&dest[..], &src[..]], &mut out));
        assert_eq!(out, [11.0, 20.0, 32.0, 40.0, 50.0]);
    }

    #[test]
    fn test_accumulate_repeats() {
        let n = node(ScatterMode::Accumulate, vec![1, 1]);
        let dest = [10.0, 20.0, 30.0, 40.0, 50.0];
        let src = [1.0, 2.0];
        let mut out = [0.0; 5];
        n.eval_numeric(EvalCtx::new(smallvec![&dest[..], &src[..]], &mut out));
        assert_eq!(out, [10.0, 23.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_assign_repeats_last_write_wins() {
        let n = node(ScatterMode::Assign, vec![1, 1]);
        let dest = [10.0, 20.0, 30.0, 40.0, 50.0];
        let src = [1.0, 2.0];
        let mut out = [0.0; 5];
        n.eval_numeric(EvalCtx::new(smallvec![&dest[..], &src[..]], &mut out));
        assert_eq!(out, [10.0, 2.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_construction_errors() {
        let dest = Expr::symbol("y", Sparsity::vector(3));
        let src = Expr::symbol("x", Sparsity::vector(2));
        assert!(matches!(
            SetNonzeros::new(&dest, &src, ScatterMode::Assign, vec![0]),
            Err(Error::MappingLength { .. })
        ));
        assert!(matches!(
            SetNonzeros::new(&dest, &src, ScatterMode::Assign, vec![0, 3]),
            Err(Error::IndexOutOfBounds { index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_index_matrix() {
        let n = node(ScatterMode::Assign, vec![0, 2]);
        assert_eq!(
            n.index_matrix(1).unwrap(),
            vec![Some(0), None, Some(1), None, None]
        );
        assert_eq!(
            n.index_matrix(0).unwrap(),
            vec![None, Some(1), None, Some(3), Some(4)]
        );
        assert!(n.index_matrix(2).is_err());
    }

    #[test]
    fn test_index_matrix_accumulate_keeps_dest() {
        let n = node(ScatterMode::Accumulate, vec![0, 2]);
        assert_eq!(
            n.index_matrix(0).unwrap(),
            vec![Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn test_pure_assignment() {
        let dest = Expr::symbol("y", Sparsity::vector(3));
        let src = Expr::symbol("x", Sparsity::vector(3));
        let n = SetNonzeros::new(&dest, &src, ScatterMode::Assign, vec![0, 1, 2]).unwrap();
        assert!(n.is_pure_assignment());

        let n = SetNonzeros::new(&dest, &src, ScatterMode::Accumulate, vec![0, 1, 2]).unwrap();
        assert!(!n.is_pure_assignment());

        let n = SetNonzeros::new(&dest, &src, ScatterMode::Assign, vec![0, 2, 1]).unwrap();
        assert!(!n.is_pure_assignment());
    }

    #[test]
    fn test_render() {
        let n = node(ScatterMode::Accumulate, vec![4, 0, 2]);
        assert_eq!(
            n.render(&["y".into(), "x".into()]),
            "(y[{4,0,2}] += x)"
        );
    }

    #[test]
    fn test_emit() {
        let n = node(ScatterMode::Assign, vec![4, 0, 2]);
        let mut gen = CodeBuilder::new();
        n.emit(&["a0".into(), "a1".into()], &["r0".into()], &mut gen);
        let text = gen.assemble("f0");
        assert!(text.contains("r0[i] = a0[i];"));
        assert!(text.contains("r0[s0[i]] = a1[i];"));
    }
}
