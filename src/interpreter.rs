use log::{debug, info};

use crate::ast::{BlockId, BlockKind, Call, Command, Program};
use crate::debugger::Debugger;
use crate::errors::{RunError, RunResult};
use crate::variable::{Natural, Variable, MAX_VALUE};

/// Tree-walking executor for a parsed [`Program`].
///
/// Variable values live in the program's shared cells, so the same program
/// observed after [`Interpreter::run`] shows the final state.
pub struct Interpreter<'p> {
    program: &'p Program,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    /// Run to completion without any breakpoint handling.
    pub fn run(&self) -> RunResult<()> {
        info!("running program");
        self.exec_block(self.program.root, None)?;
        info!("program finished");
        Ok(())
    }

    /// Run with `debugger` consulted before every command.
    pub fn run_debug(&self, debugger: &mut Debugger<'_>) -> RunResult<()> {
        info!(
            "running program under debugger, breakpoints at {:?}",
            debugger.breakpoints()
        );
        self.exec_block(self.program.root, Some(debugger))?;
        info!("program finished");
        Ok(())
    }

    fn exec_block(&self, id: BlockId, mut dbg: Option<&mut Debugger<'_>>) -> RunResult<()> {
        for command in &self.program.block(id).commands {
            self.exec(command, id, dbg.as_deref_mut())?;
        }
        Ok(())
    }

    fn exec(
        &self,
        command: &Command,
        scope: BlockId,
        mut dbg: Option<&mut Debugger<'_>>,
    ) -> RunResult<()> {
        match command {
            Command::Incr { line, var } => {
                self.pause(dbg, *line, scope)?;
                let value = read(var, *line)?;
                if value >= MAX_VALUE {
                    return Err(RunError::Overflow {
                        name: var.name().to_string(),
                        line: *line,
                    });
                }
                var.set(value + 1);
                Ok(())
            }
            Command::Decr { line, var } => {
                self.pause(dbg, *line, scope)?;
                let value = read(var, *line)?;
                if value == 0 {
                    return Err(RunError::NegativeValue {
                        name: var.name().to_string(),
                        line: *line,
                    });
                }
                var.set(value - 1);
                Ok(())
            }
            Command::Clear { line, var } => {
                self.pause(dbg, *line, scope)?;
                var.clear();
                Ok(())
            }
            Command::Block { line, body } => {
                self.pause(dbg.as_deref_mut(), *line, scope)?;
                self.exec_block(*body, dbg)
            }
            Command::While { line, body } => {
                let BlockKind::While { guard, .. } = &self.program.block(*body).kind else {
                    return self.exec_block(*body, dbg);
                };
                // guard re-read and breakpoint re-checked once per iteration
                while read(guard, *line)? != 0 {
                    self.pause(dbg.as_deref_mut(), *line, *body)?;
                    self.exec_block(*body, dbg.as_deref_mut())?;
                }
                Ok(())
            }
            // definitions run only through a call
            Command::FuncBlock { .. } => Ok(()),
            Command::Func(call) => self.call(call, scope, dbg),
        }
    }

    fn call(
        &self,
        call: &Call,
        scope: BlockId,
        mut dbg: Option<&mut Debugger<'_>>,
    ) -> RunResult<()> {
        let body = self.program.block(call.target);
        debug!(
            "line {}: calling {}({:?})",
            call.line,
            body.func_name().unwrap_or("?"),
            call.args
        );

        for (i, arg) in call.args.iter().enumerate() {
            if let Some(param) = body.param(i) {
                param.assign(arg.value());
            }
        }

        self.pause(dbg.as_deref_mut(), call.line, scope)?;
        self.pause(dbg.as_deref_mut(), body.line, call.target)?;
        self.exec_block(call.target, dbg)?;

        for (i, (arg, by_ref)) in call.args.iter().zip(&call.by_ref).enumerate() {
            if !*by_ref {
                continue;
            }
            if let Some(param) = body.param(i) {
                arg.assign(param.value());
            }
        }
        Ok(())
    }

    fn pause(
        &self,
        dbg: Option<&mut Debugger<'_>>,
        line: usize,
        scope: BlockId,
    ) -> RunResult<()> {
        if let Some(debugger) = dbg {
            debugger.check(self.program, line, scope)?;
        }
        Ok(())
    }
}

fn read(var: &Variable, line: usize) -> RunResult<Natural> {
    var.value().ok_or_else(|| RunError::UninitializedVariable {
        name: var.name().to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (Program, RunResult<()>) {
        let program = parse(source).unwrap();
        let result = Interpreter::new(&program).run();
        (program, result)
    }

    fn value(program: &Program, name: &str) -> Option<Natural> {
        program.global(name).and_then(|v| v.value())
    }

    #[test]
    fn test_incr_decr_clear() {
        let (program, result) = run("clear x;\nincr x;\nincr x;\ndecr x;");
        result.unwrap();
        assert_eq!(value(&program, "x"), Some(1));
    }

    #[test]
    fn test_incr_uninitialised_fails() {
        let (_, result) = run("incr x;");
        assert!(matches!(
            result,
            Err(RunError::UninitializedVariable { ref name, line: 1 }) if name == "x"
        ));
    }

    #[test]
    fn test_decr_zero_fails() {
        let (program, result) = run("clear x;\ndecr x;");
        assert!(matches!(result, Err(RunError::NegativeValue { line: 2, .. })));
        assert_eq!(value(&program, "x"), Some(0));
    }

    #[test]
    fn test_failure_aborts_remaining_siblings() {
        let (program, result) = run("clear y;\ndecr y;\nclear x;");
        assert!(result.is_err());
        assert_eq!(value(&program, "x"), None);
    }

    #[test]
    fn test_while_uninitialised_guard_fails() {
        let (_, result) = run("while x not 0 do;\nend;");
        assert!(matches!(
            result,
            Err(RunError::UninitializedVariable { line: 1, .. })
        ));
    }

    #[test]
    fn test_multiply() {
        let source = "\
clear x;
incr x;
incr x;
incr x;
clear y;
incr y;
incr y;
incr y;
incr y;
clear z;
while x not 0 do;
    clear w;
    while y not 0 do;
        incr z;
        incr w;
        decr y;
    end;
    while w not 0 do;
        incr y;
        decr w;
    end;
    decr x;
end;";
        let (program, result) = run(source);
        result.unwrap();
        assert_eq!(value(&program, "z"), Some(12));
        assert_eq!(value(&program, "y"), Some(4));
    }

    #[test]
    fn test_procedure_locals_keep_state_between_calls() {
        let source = "\
func bump(a);
    incr counter;
    clear a;
end;
clear x;
clear counter;
bump(x);";
        let program = parse(source).unwrap();
        let f = program.function("bump").unwrap();
        // counter inside bump is its own local, never cleared by the body
        program.block(f).locals["counter"].set(10);
        Interpreter::new(&program).run().unwrap();
        Interpreter::new(&program).run().unwrap();
        assert_eq!(program.block(f).locals["counter"].value(), Some(12));
        assert_eq!(value(&program, "counter"), Some(0));
    }

    #[test]
    fn test_uninitialised_argument_is_copied_not_rejected() {
        let source = "func f(a);\n    clear a;\nend;\nf(&x);";
        let (program, result) = run(source);
        result.unwrap();
        assert_eq!(value(&program, "x"), Some(0));
    }
}
