//! Gather node: read mapped nonzero slots out of an operand
//!
//! The inverse of the scatter family. It exists in its own right as a
//! graph operation and is what the scatter adjoint rule produces for the
//! source operand.

use crate::array::Scalar;
use crate::codegen::CodeBuilder;
use crate::error::{Error, Result};
use crate::graph::node::{DeriveReq, Derivatives, EvalCtx, Node, OpKind};
use crate::graph::scatter::ScatterMode;
use crate::graph::Expr;
use crate::sparsity::{DepMask, Sparsity};
use crate::sym::Sym;
use std::any::Any;

/// Reads operand nonzeros at an explicit index mapping
#[derive(Debug)]
pub struct GetNonzeros {
    operands: [Expr; 1],
    nz: Vec<usize>,
    sp: Sparsity,
}

impl GetNonzeros {
    /// Create a gather node reading `source`'s slots at `mapping`
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if an entry exceeds the
    /// source's nonzero count.
    pub fn new(source: Expr, mapping: Vec<usize>) -> Result<Self> {
        let size = source.sparsity().nnz();
        for &idx in &mapping {
            if idx >= size {
                return Err(Error::index_out_of_bounds(idx, size));
            }
        }
        let sp = Sparsity::vector(mapping.len());
        Ok(Self {
            operands: [source],
            nz: mapping,
            sp,
        })
    }

    /// The index mapping
    pub fn mapping(&self) -> &[usize] {
        &self.nz
    }

    fn eval_generic<T: Scalar>(&self, ctx: EvalCtx<'_, T>) {
        let EvalCtx {
            inputs,
            output,
            inplace: _,
            fwd,
            adj,
        } = ctx;
        let src = inputs[0];
        debug_assert_eq!(output.len(), self.nz.len());
        debug_assert_eq!(src.len(), self.operands[0].sparsity().nnz());

        for (slot, &k) in output.iter_mut().zip(&self.nz) {
            *slot = src[k].clone();
        }

        for dir in fwd {
            for (slot, &k) in dir.sens.iter_mut().zip(&self.nz) {
                *slot = dir.seeds[0][k].clone();
            }
        }

        for mut dir in adj {
            for (i, &k) in self.nz.iter().enumerate() {
                let seed = std::mem::replace(&mut dir.seed[i], T::zero());
                dir.sens[0][k] = dir.sens[0][k].clone() + seed;
            }
        }
    }
}

impl Node for GetNonzeros {
    fn op(&self) -> OpKind {
        OpKind::GetNonzeros
    }

    fn sparsity(&self) -> &Sparsity {
        &self.sp
    }

    fn operands(&self) -> &[Expr] {
        &self.operands
    }

    fn eval_numeric(&self, ctx: EvalCtx<'_, f64>) {
        self.eval_generic(ctx);
    }

    fn eval_symbolic(&self, ctx: EvalCtx<'_, Sym>) {
        self.eval_generic(ctx);
    }

    fn derive(&self, req: DeriveReq<'_>) -> Result<Derivatives> {
        let source = &self.operands[0];
        let output = match req.output {
            Some(output) => output,
            None => Expr::get_nonzeros(source, self.nz.clone())?,
        };

        // Tangent of a gather is the gather of the tangent
        let mut fwd_sens = Vec::with_capacity(req.fwd_seeds.len());
        for seeds in req.fwd_seeds {
            fwd_sens.push(Expr::get_nonzeros(&seeds[0], self.nz.clone())?);
        }

        // Adjoint scatters the seed back, accumulating on repeats
        let mut adj_sens = Vec::with_capacity(req.adj_seeds.len());
        for seed in req.adj_seeds {
            let contribution = Expr::set_nonzeros(
                &Expr::zeros(source.sparsity().clone()),
                seed,
                ScatterMode::Accumulate,
                self.nz.clone(),
            )?;
            adj_sens.push(vec![Some(contribution)]);
        }

        Ok(Derivatives {
            output,
            fwd_sens,
            adj_sens,
        })
    }

    fn propagate_sparsity(
        &self,
        inputs: &mut [&mut [DepMask]],
        output: &mut [DepMask],
        forward: bool,
    ) {
        if forward {
            for (slot, &k) in output.iter_mut().zip(&self.nz) {
                *slot = inputs[0][k];
            }
        } else {
            for (i, &k) in self.nz.iter().enumerate() {
                inputs[0][k] |= output[i];
            }
        }
    }

    fn render(&self, args: &[String]) -> String {
        let entries: Vec<String> = self.nz.iter().map(|v| v.to_string()).collect();
        format!("{}[{{{}}}]", args[0], entries.join(","))
    }

    fn emit(&self, args: &[String], res: &[String], gen: &mut CodeBuilder) {
        if self.nz.is_empty() {
            return;
        }
        let tbl = gen.intern_constant(&self.nz);
        gen.local("i", "int");
        gen.stmt(format!(
            "for (i=0; i<{}; ++i) {}[i] = {}[{}[i]];",
            self.nz.len(),
            res[0],
            args[0],
            tbl
        ));
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
    fn test_gather_eval() {
        let src = Expr::symbol("x", Sparsity::vector(4));
        let g = GetNonzeros::new(src, vec![3, 1]).unwrap();
        let vals = [10.0, 20.0, 30.0, 40.0];
        let mut out = [0.0; 2];
        g.eval_numeric(EvalCtx::new(smallvec![&vals[..]], &mut out));
        assert_eq!(out, [40.0, 20.0]);
    }

    #[test]
    fn test_gather_out_of_range() {
        let src = Expr::symbol("x", Sparsity::vector(2));
        assert!(GetNonzeros::new(src, vec![0, 2]).is_err());
    }

    #[test]
    fn test_gather_sparsity_propagation() {
        let src = Expr::symbol("x", Sparsity::vector(3));
        let g = GetNonzeros::new(src, vec![2, 0]).unwrap();

        let mut in_mask = [0b001u64, 0b010, 0b100];
        let mut out_mask = [0u64; 2];
        {
            let mut inputs: Vec<&mut [u64]> = vec![&mut in_mask];
            g.propagate_sparsity(&mut inputs, &mut out_mask, true);
        }
        assert_eq!(out_mask, [0b100, 0b001]);

        let mut in_mask = [0u64; 3];
        let mut out_mask = [0b01u64, 0b10];
        let mut inputs: Vec<&mut [u64]> = vec![&mut in_mask];
        g.propagate_sparsity(&mut inputs, &mut out_mask, false);
        assert_eq!(in_mask, [0b10, 0, 0b01]);
    }
}
