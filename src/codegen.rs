//! Code generation backend
//!
//! [`CodeBuilder`] collects the C-like statements that graph nodes emit
//! for the standalone compiled evaluator. Nodes only append statements,
//! register the scratch locals they use, and intern integer index tables;
//! assembling the collected pieces into a compilable function body is the
//! builder's job. File handling and compilation live outside this crate.

use std::fmt::Write as _;

/// Statement collector for one generated function body
#[derive(Debug, Default)]
pub struct CodeBuilder {
    body: Vec<String>,
    constants: Vec<Vec<usize>>,
    locals: Vec<(String, &'static str)>,
}

impl CodeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one statement line to the function body
    pub fn stmt(&mut self, stmt: impl Into<String>) {
        self.body.push(stmt.into());
    }

    /// Register a scratch local of the given C type, deduplicated by name
    pub fn local(&mut self, name: &str, ty: &'static str) {
        if !self.locals.iter().any(|(n, _)| n == name) {
            self.locals.push((name.to_string(), ty));
        }
    }

    /// Intern an integer index table, returning its stable name
    ///
    /// Identical tables are stored once; repeated interning returns the
    /// same name.
    pub fn intern_constant(&mut self, data: &[usize]) -> String {
        let pos = match self.constants.iter().position(|c| c == data) {
            Some(pos) => pos,
            None => {
                self.constants.push(data.to_vec());
                self.constants.len() - 1
            }
        };
        format!("s{}", pos)
    }

    /// Statements collected so far
    pub fn statements(&self) -> &[String] {
        &self.body
    }

    /// Assemble the collected pieces into a full C function definition
    pub fn assemble(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "void {}(const double** arg, double** res) {{", name);
        for (i, table) in self.constants.iter().enumerate() {
            let entries: Vec<String> = table.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(
                out,
                "  static const int s{}[{}] = {{{}}};",
                i,
                table.len(),
                entries.join(", ")
            );
        }
        for (name, ty) in &self.locals {
            let _ = writeln!(out, "  {} {};", ty, name);
        }
        for stmt in &self.body {
            let _ = writeln!(out, "  {}", stmt);
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_interning() {
        let mut gen = CodeBuilder::new();
        let a = gen.intern_constant(&[0, 2, 4]);
        let b = gen.intern_constant(&[1, 3]);
        let c = gen.intern_constant(&[0, 2, 4]);
        assert_eq!(a, "s0");
        assert_eq!(b, "s1");
        assert_eq!(a, c);
    }

    #[test]
    fn test_assemble() {
        let mut gen = CodeBuilder::new();
        gen.local("i", "int");
        let tbl = gen.intern_constant(&[0, 2]);
        gen.stmt(format!("for (i=0; i<2; ++i) res0[{}[i]] = arg1[i];", tbl));
        let text = gen.assemble("f0");
        assert!(text.contains("void f0("));
        assert!(text.contains("static const int s0[2] = {0, 2};"));
        assert!(text.contains("int i;"));
        assert!(text.contains("res0[s0[i]] = arg1[i];"));
    }

    #[test]
    fn test_local_dedup() {
        let mut gen = CodeBuilder::new();
        gen.local("i", "int");
        gen.local("i", "int");
        let text = gen.assemble("f0");
        assert_eq!(text.matches("int i;").count(), 1);
    }
}
