//! Source emitters. Every backend walks the same [`Program`] and writes one
//! self-contained file; none of them mutate the program.

use log::{error, info};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{BlockId, Call, Program};
use crate::errors::{EmitError, EmitResult};
use crate::variable::Variable;

pub mod canonical;
pub mod cpp;
pub mod java;
pub mod python;
pub mod rust;

pub use canonical::Canonical;
pub use cpp::Cpp;
pub use java::Java;
pub use python::Python;
pub use rust::Rust;

/// One output dialect.
pub trait Backend {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// File written inside the output directory
    fn file_name(&self) -> &'static str;

    fn emit(&self, program: &Program) -> String;
}

/// All five backends, in the order the CLI writes them.
pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(Python),
        Box::new(Canonical),
        Box::new(Java),
        Box::new(Rust),
        Box::new(Cpp),
    ]
}

/// Emit `program` with `backend` into `dir`.
pub fn write_artifact(
    backend: &dyn Backend,
    program: &Program,
    dir: &Path,
) -> EmitResult<PathBuf> {
    let path = dir.join(backend.file_name());
    fs::write(&path, backend.emit(program)).map_err(|source| EmitError::Write {
        backend: backend.name(),
        path: path.clone(),
        source,
    })?;
    info!("wrote {} output to {}", backend.name(), path.display());
    Ok(path)
}

/// Write every backend's artifact. A failure does not stop later backends;
/// all failures are reported together.
pub fn write_all(program: &Program, dir: &Path) -> EmitResult<Vec<PathBuf>> {
    let all = backends();
    let mut written = Vec::new();
    let mut failures = Vec::new();

    for backend in &all {
        match write_artifact(backend.as_ref(), program, dir) {
            Ok(path) => written.push(path),
            Err(e) => {
                error!("{}", e);
                failures.push(e);
            }
        }
    }

    if failures.is_empty() {
        Ok(written)
    } else {
        Err(EmitError::Partial {
            failures,
            total: all.len(),
        })
    }
}

/// Per-dialect layout settings
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub indent: &'static str,
    /// Single-line comment marker, e.g. `//`
    pub comment: &'static str,
    /// Whitespace between a statement and its trailing comment
    pub gap: &'static str,
    /// Names that must be renamed because the dialect claims them
    pub reserved: &'static [&'static str],
}

/// Output identifiers for one program in one dialect.
///
/// Distinct source names never share an output name, and a procedure never
/// shares one with a variable anywhere in the program.
struct Names {
    vars: HashMap<String, String>,
    procs: HashMap<String, String>,
}

impl Names {
    fn new(program: &Program, reserved: &[&str]) -> Self {
        let raw_vars: BTreeSet<&str> = program
            .blocks
            .iter()
            .flat_map(|b| b.locals.keys().map(String::as_str))
            .collect();

        // names that need no change are claimed first, renames work around them
        let mut taken: BTreeSet<String> = raw_vars
            .iter()
            .filter(|n| !reserved.contains(*n))
            .map(|n| n.to_string())
            .collect();
        let mut vars: HashMap<String, String> =
            taken.iter().map(|n| (n.clone(), n.clone())).collect();

        let raw_procs: Vec<&str> = program
            .functions
            .iter()
            .map(|id| program.block(*id).func_name().unwrap_or_default())
            .collect();
        let mut procs = HashMap::new();
        for raw in &raw_procs {
            if !reserved.contains(raw) && !taken.contains(*raw) {
                taken.insert(raw.to_string());
                procs.insert(raw.to_string(), raw.to_string());
            }
        }

        for raw in raw_vars.iter().filter(|n| reserved.contains(*n)) {
            let name = fresh(raw, reserved, &taken);
            taken.insert(name.clone());
            vars.insert(raw.to_string(), name);
        }
        for raw in &raw_procs {
            if !procs.contains_key(*raw) {
                let name = fresh(raw, reserved, &taken);
                taken.insert(name.clone());
                procs.insert(raw.to_string(), name);
            }
        }

        Names { vars, procs }
    }
}

/// `raw` with underscores appended until it is neither reserved nor taken.
fn fresh(raw: &str, reserved: &[&str], taken: &BTreeSet<String>) -> String {
    let mut name = format!("{}_", raw);
    while reserved.contains(&name.as_str()) || taken.contains(&name) {
        name.push('_');
    }
    name
}

/// Line-oriented text buffer shared by the backends.
///
/// Every source comment is attached at most once, to the first emitted line
/// that claims its source line.
pub struct CodeWriter<'p> {
    program: &'p Program,
    style: Style,
    names: Names,
    out: String,
    attached: BTreeSet<usize>,
}

impl<'p> CodeWriter<'p> {
    pub fn new(program: &'p Program, style: Style) -> Self {
        Self {
            program,
            style,
            names: Names::new(program, style.reserved),
            out: String::new(),
            attached: BTreeSet::new(),
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    fn take_comment(&mut self, source_line: usize) -> Option<&'p str> {
        let text = self.program.comment(source_line)?;
        self.attached.insert(source_line).then_some(text)
    }

    fn indent(&mut self, depth: usize) {
        self.out.push_str(&self.style.indent.repeat(depth));
    }

    /// A statement emitted for the command on `source_line`.
    pub fn line(&mut self, depth: usize, text: &str, source_line: usize) {
        self.indent(depth);
        self.out.push_str(text);
        if let Some(comment) = self.take_comment(source_line) {
            self.out.push_str(self.style.gap);
            self.out.push_str(self.style.comment);
            self.out.push_str(comment);
        }
        self.out.push('\n');
    }

    /// Synthetic text with no source counterpart
    pub fn plain(&mut self, depth: usize, text: &str) {
        if !text.is_empty() {
            self.indent(depth);
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Comment for `source_line` on a line of its own, for dialects with no
    /// closing token to hang it on.
    pub fn comment_only(&mut self, depth: usize, source_line: usize) {
        if let Some(comment) = self.take_comment(source_line) {
            self.indent(depth);
            self.out.push_str(self.style.comment);
            self.out.push_str(comment);
            self.out.push('\n');
        }
    }

    /// Output name of the variable called `raw` in the source.
    pub fn var_name(&self, raw: &str) -> String {
        self.names
            .vars
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn var(&self, var: &Variable) -> String {
        self.var_name(var.name())
    }

    /// Formal parameter names of procedure `id`, escaped.
    pub fn params(&self, id: BlockId) -> Vec<String> {
        self.program
            .block(id)
            .params()
            .iter()
            .map(|p| self.var_name(p))
            .collect()
    }

    /// Procedure name of `id`, escaped.
    pub fn func_name(&self, id: BlockId) -> String {
        let raw = self.program.block(id).func_name().unwrap_or_default();
        self.names
            .procs
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Locals declared once at the top of frame `id`, excluding parameters.
    pub fn frame_locals(&self, id: BlockId) -> Vec<String> {
        let params = self.program.block(id).params();
        self.program
            .frame_locals(id)
            .iter()
            .filter(|v| !params.iter().any(|p| p == v.name()))
            .map(|v| self.var(v))
            .collect()
    }

    /// Actual arguments of `call` joined for an argument list.
    pub fn call_args(&self, call: &Call) -> String {
        call.args
            .iter()
            .map(|a| self.var(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Destructuring targets for a call: by-reference arguments keep their
    /// name, the rest become `placeholder`. `None` when nothing is written
    /// back.
    pub fn write_back(&self, call: &Call, placeholder: &str) -> Option<Vec<String>> {
        if !call.by_ref.iter().any(|r| *r) {
            return None;
        }
        Some(
            call.args
                .iter()
                .zip(&call.by_ref)
                .map(|(arg, by_ref)| {
                    if *by_ref {
                        self.var(arg)
                    } else {
                        placeholder.to_string()
                    }
                })
                .collect(),
        )
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// `(a, b)` style tuple text, with the trailing comma a 1-tuple needs.
pub(crate) fn tuple(items: &[String]) -> String {
    match items {
        [single] => format!("({},)", single),
        _ => format!("({})", items.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    const STYLE: Style = Style {
        indent: "  ",
        comment: "//",
        gap: " ",
        reserved: &["main"],
    };

    #[test]
    fn test_comment_attached_once() {
        let program = parse("clear x; // note").unwrap();
        let mut w = CodeWriter::new(&program, STYLE);
        w.line(1, "x = 0;", 1);
        w.line(1, "again;", 1);
        w.comment_only(0, 1);
        assert_eq!(w.finish(), "  x = 0; // note\n  again;\n");
    }

    #[test]
    fn test_reserved_names_are_renamed() {
        let program = parse("clear main;\nclear x;").unwrap();
        let w = CodeWriter::new(&program, STYLE);
        assert_eq!(w.var(&program.global("main").unwrap()), "main_");
        assert_eq!(w.var(&program.global("x").unwrap()), "x");
    }

    #[test]
    fn test_renamed_variable_skips_existing_names() {
        let program = parse("clear main;\nclear main_;\nclear main__;").unwrap();
        let w = CodeWriter::new(&program, STYLE);
        assert_eq!(w.var_name("main"), "main___");
        assert_eq!(w.var_name("main_"), "main_");
        assert_eq!(w.var_name("main__"), "main__");
    }

    #[test]
    fn test_procedure_renamed_away_from_variables() {
        let source = "func f(a);\nend;\nfunc f_(b);\nend;\nfunc main();\nend;\nclear f;\nclear main_;";
        let program = parse(source).unwrap();
        let w = CodeWriter::new(&program, STYLE);
        let name = |n| w.func_name(program.function(n).unwrap());
        assert_eq!(name("f"), "f__");
        assert_eq!(name("f_"), "f_");
        assert_eq!(name("main"), "main__");
        assert_eq!(w.var_name("f"), "f");
        assert_eq!(w.var_name("main_"), "main_");
    }

    #[test]
    fn test_write_back_targets() {
        let program = parse("func f(a, b);\nend;\nf(&x, y);\nf(x, y);").unwrap();
        let w = CodeWriter::new(&program, STYLE);
        let calls: Vec<_> = program
            .root_block()
            .commands
            .iter()
            .filter_map(|c| match c {
                crate::ast::Command::Func(call) => Some(call),
                _ => None,
            })
            .collect();
        assert_eq!(
            w.write_back(calls[0], "_"),
            Some(vec!["x".to_string(), "_".to_string()])
        );
        assert_eq!(w.write_back(calls[1], "_"), None);
        assert_eq!(w.call_args(calls[0]), "x, y");
    }

    #[test]
    fn test_tuple_text() {
        assert_eq!(tuple(&["a".to_string()]), "(a,)");
        assert_eq!(tuple(&["a".to_string(), "b".to_string()]), "(a, b)");
    }

    #[test]
    fn test_write_all_into_directory() {
        let dir = std::env::temp_dir().join(format!("barebones-emit-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let program = parse("clear x;").unwrap();
        let written = write_all(&program, &dir).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_all_reports_every_failure() {
        let dir = std::env::temp_dir()
            .join(format!("barebones-missing-{}", std::process::id()))
            .join("nested");
        let program = parse("clear x;").unwrap();
        match write_all(&program, &dir) {
            Err(EmitError::Partial { failures, total }) => {
                assert_eq!(total, 5);
                assert_eq!(failures.len(), 5);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }
}
