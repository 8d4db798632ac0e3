//! Shared scatter-assign state and semantics
//!
//! All three scatter variants carry a [`ScatterBase`]: the mode flag, the
//! two operands, the validated index mapping, and the output sparsity.
//! Evaluation, sparsity propagation, the differentiation rule, and the
//! simplification predicate are defined here once; variants add only
//! their own rendering and code emission.

use crate::array::Scalar;
use crate::error::{Error, Result};
use crate::graph::node::{DeriveReq, Derivatives, EvalCtx, OpKind};
use crate::graph::Expr;
use crate::sparsity::{DepMask, Sparsity};
use std::fmt;

/// Whether written slots are overwritten or summed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScatterMode {
    /// Overwrite the destination slot; on repeated targets the last
    /// write wins
    Assign,
    /// Sum into the destination slot; repeated targets all contribute
    Accumulate,
}

impl ScatterMode {
    /// The C assignment operator for this mode
    pub fn assign_op(&self) -> &'static str {
        match self {
            ScatterMode::Assign => "=",
            ScatterMode::Accumulate => "+=",
        }
    }
}

impl fmt::Display for ScatterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.assign_op())
    }
}

/// State shared by every scatter-assign variant
#[derive(Debug)]
pub struct ScatterBase {
    mode: ScatterMode,
    operands: [Expr; 2],
    nz: Vec<usize>,
    sp: Sparsity,
}

impl ScatterBase {
    /// Validate and build the shared state
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingLength`] if the mapping length disagrees
    /// with `source`'s nonzero count, or [`Error::IndexOutOfBounds`] if
    /// an entry exceeds `dest`'s nonzero count.
    pub fn new(
        dest: Expr,
        source: Expr,
        mode: ScatterMode,
        nz: Vec<usize>,
    ) -> Result<Self> {
        let source_nnz = source.sparsity().nnz();
        if nz.len() != source_nnz {
            return Err(Error::mapping_length(source_nnz, nz.len()));
        }
        let dest_nnz = dest.sparsity().nnz();
        for &idx in &nz {
            if idx >= dest_nnz {
                return Err(Error::index_out_of_bounds(idx, dest_nnz));
            }
        }
        let sp = dest.sparsity().clone();
        Ok(Self {
            mode,
            operands: [dest, source],
            nz,
            sp,
        })
    }

    /// The mode flag
    pub fn mode(&self) -> ScatterMode {
        self.mode
    }

    /// The destination-template operand
    pub fn dest(&self) -> &Expr {
        &self.operands[0]
    }

    /// The source operand
    pub fn source(&self) -> &Expr {
        &self.operands[1]
    }

    /// The index mapping
    pub fn mapping(&self) -> &[usize] {
        &self.nz
    }

    /// Operation identity derived from the mode
    pub fn op(&self) -> OpKind {
        match self.mode {
            ScatterMode::Assign => OpKind::SetNonzeros,
            ScatterMode::Accumulate => OpKind::AddNonzeros,
        }
    }

    /// Output sparsity (the destination template's pattern)
    pub fn sparsity(&self) -> &Sparsity {
        &self.sp
    }

    /// Operand expressions
    pub fn operands(&self) -> &[Expr] {
        &self.operands
    }

    /// Shared evaluation kernel over any scalar kind
    ///
    /// Values pass through from the destination template (skipped when
    /// the output buffer already holds them), then source nonzeros are
    /// written or summed into the mapped slots in order. Each forward
    /// direction runs the identical kernel on its seeds. Each adjoint
    /// direction gathers the output seed into the source sensitivity,
    /// consumes the written slots under assign mode, and passes the
    /// remaining seed through to the destination sensitivity.
    pub fn eval_generic<T: Scalar>(&self, ctx: EvalCtx<'_, T>) {
        let EvalCtx {
            inputs,
            output,
            inplace,
            fwd,
            adj,
        } = ctx;
        let dest = inputs[0];
        let src = inputs[1];
        debug_assert_eq!(output.len(), self.sp.nnz());
        debug_assert_eq!(src.len(), self.nz.len());

        if !inplace {
            output.clone_from_slice(dest);
        }
        for (i, &k) in self.nz.iter().enumerate() {
            match self.mode {
                ScatterMode::Assign => output[k] = src[i].clone(),
                ScatterMode::Accumulate => output[k] = output[k].clone() + src[i].clone(),
            }
        }

        for dir in fwd {
            dir.sens.clone_from_slice(dir.seeds[0]);
            for (i, &k) in self.nz.iter().enumerate() {
                match self.mode {
                    ScatterMode::Assign => dir.sens[k] = dir.seeds[1][i].clone(),
                    ScatterMode::Accumulate => {
                        dir.sens[k] = dir.sens[k].clone() + dir.seeds[1][i].clone()
                    }
                }
            }
        }

        for mut dir in adj {
            for (i, &k) in self.nz.iter().enumerate() {
                match self.mode {
                    ScatterMode::Assign => {
                        let seed = std::mem::replace(&mut dir.seed[k], T::zero());
                        dir.sens[1][i] = dir.sens[1][i].clone() + seed;
                    }
                    ScatterMode::Accumulate => {
                        dir.sens[1][i] = dir.sens[1][i].clone() + dir.seed[k].clone();
                    }
                }
            }
            for (j, slot) in dir.seed.iter().enumerate() {
                dir.sens[0][j] = dir.sens[0][j].clone() + slot.clone();
            }
        }
    }

    /// Shared dependency-mask propagation
    pub fn propagate(
        &self,
        inputs: &mut [&mut [DepMask]],
        output: &mut [DepMask],
        forward: bool,
    ) {
        if forward {
            output.copy_from_slice(&inputs[0][..]);
            for (i, &k) in self.nz.iter().enumerate() {
                match self.mode {
                    ScatterMode::Assign => output[k] = inputs[1][i],
                    ScatterMode::Accumulate => output[k] |= inputs[1][i],
                }
            }
        } else {
            for (i, &k) in self.nz.iter().enumerate() {
                inputs[1][i] |= output[k];
            }
            for (j, &mask) in output.iter().enumerate() {
                inputs[0][j] |= mask;
            }
        }
    }

    /// Shared graph-level differentiation rule
    ///
    /// The tangent of a scatter-assign is the scatter-assign of the
    /// tangents under the same mapping and mode. The adjoint contribution
    /// to the source is a gather of the output adjoint at the mapped
    /// slots; the destination receives the output adjoint with written
    /// slots zeroed under assign mode, or unchanged under accumulate
    /// mode.
    pub fn derive(&self, req: DeriveReq<'_>) -> Result<Derivatives> {
        let output = match req.output {
            Some(output) => output,
            None => Expr::set_nonzeros(self.dest(), self.source(), self.mode, self.nz.clone())?,
        };

        let mut fwd_sens = Vec::with_capacity(req.fwd_seeds.len());
        for seeds in req.fwd_seeds {
            fwd_sens.push(Expr::set_nonzeros(
                &seeds[0],
                &seeds[1],
                self.mode,
                self.nz.clone(),
            )?);
        }

        let mut adj_sens = Vec::with_capacity(req.adj_seeds.len());
        for seed in req.adj_seeds {
            let source_contrib = Expr::get_nonzeros(seed, self.nz.clone())?;
            let dest_contrib = match self.mode {
                ScatterMode::Accumulate => seed.clone(),
                ScatterMode::Assign => Expr::set_nonzeros(
                    seed,
                    &Expr::zeros(self.source().sparsity().clone()),
                    ScatterMode::Assign,
                    self.nz.clone(),
                )?,
            };
            adj_sens.push(vec![Some(dest_contrib), Some(source_contrib)]);
        }

        Ok(Derivatives {
            output,
            fwd_sens,
            adj_sens,
        })
    }

    /// True when the node is behaviorally a plain copy of the source
    ///
    /// Holds when assigning the identity mapping over the full
    /// destination pattern: every slot is written exactly once from the
    /// same slot of the source.
    pub fn is_pure_assignment(&self) -> bool {
        self.mode == ScatterMode::Assign
            && self.nz.len() == self.sp.nnz()
            && self.nz.iter().enumerate().all(|(i, &k)| i == k)
    }

    /// Rewrite hook shared by all variants
    pub fn simplify(&self, ex: &mut Expr) {
        if self.is_pure_assignment() {
            *ex = self.source().clone();
        }
    }

    /// Emit the pass-through copy of the destination template
    ///
    /// Skipped when the argument and result name the same buffer.
    pub(crate) fn emit_copy(
        &self,
        args: &[String],
        res: &[String],
        gen: &mut crate::codegen::CodeBuilder,
    ) {
        if args[0] != res[0] && self.sp.nnz() > 0 {
            gen.local("i", "int");
            gen.stmt(format!(
                "for (i=0; i<{}; ++i) {}[i] = {}[i];",
                self.sp.nnz(),
                res[0],
                args[0]
            ));
        }
    }
}
