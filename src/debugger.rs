use log::{debug, warn};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use crate::ast::{BlockId, Program};

/// One line typed at the debug console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    PrintAll,
    Print(String),
    Break(usize),
    Remove(usize),
    Continue,
    /// Behaves exactly like [`ConsoleCommand::Continue`].
    Step,
}

impl ConsoleCommand {
    /// `None` for anything the console does not understand.
    pub fn parse(input: &str) -> Option<Self> {
        let mut words = input.split_whitespace();
        let command = words.next()?;
        let arg = words.next();
        match (command, arg) {
            ("p", None) => Some(ConsoleCommand::PrintAll),
            ("p", Some(name)) => Some(ConsoleCommand::Print(name.to_string())),
            ("b", Some(line)) => line.parse().ok().map(ConsoleCommand::Break),
            ("r", Some(line)) => line.parse().ok().map(ConsoleCommand::Remove),
            ("c", None) => Some(ConsoleCommand::Continue),
            ("s", None) => Some(ConsoleCommand::Step),
            _ => None,
        }
    }
}

/// Breakpoint table plus the console it talks to while execution is
/// suspended.
pub struct Debugger<'io> {
    breakpoints: HashMap<usize, bool>,
    input: Box<dyn BufRead + 'io>,
    output: Box<dyn Write + 'io>,
}

impl Debugger<'static> {
    pub fn stdio() -> Self {
        Debugger::new(io::stdin().lock(), io::stdout())
    }
}

impl<'io> Debugger<'io> {
    pub fn new(input: impl BufRead + 'io, output: impl Write + 'io) -> Self {
        Self {
            breakpoints: HashMap::new(),
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn set_breakpoint(&mut self, line: usize) {
        self.breakpoints.insert(line, true);
    }

    pub fn remove_breakpoint(&mut self, line: usize) {
        self.breakpoints.insert(line, false);
    }

    pub fn is_active(&self, line: usize) -> bool {
        self.breakpoints.get(&line).copied().unwrap_or(false)
    }

    /// Active breakpoint lines in ascending order
    pub fn breakpoints(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self
            .breakpoints
            .iter()
            .filter(|(_, active)| **active)
            .map(|(line, _)| *line)
            .collect();
        lines.sort_unstable();
        lines
    }

    /// Suspend at `line` if a breakpoint is active there, inspecting
    /// variables visible from `scope` until the console resumes.
    pub(crate) fn check(
        &mut self,
        program: &Program,
        line: usize,
        scope: BlockId,
    ) -> io::Result<()> {
        if !self.is_active(line) {
            return Ok(());
        }
        self.suspend(program, line, scope)
    }

    fn suspend(&mut self, program: &Program, line: usize, scope: BlockId) -> io::Result<()> {
        writeln!(
            self.output,
            "Broke at line {}. Set a breakpoint (b <line>), remove one (r <line>), \
             print a variable (p <name>) or all variables (p), continue (c) or skip (s).",
            line
        )?;
        self.output.flush()?;

        loop {
            let mut input = String::new();
            if self.input.read_line(&mut input)? == 0 {
                debug!("debug console closed at line {}, resuming", line);
                return Ok(());
            }

            let Some(command) = ConsoleCommand::parse(&input) else {
                warn!("ignoring console input {:?}", input.trim_end());
                continue;
            };

            match command {
                ConsoleCommand::PrintAll => {
                    for var in program.visible_variables(scope) {
                        if let Some(value) = var.value() {
                            writeln!(self.output, "{} is equal to: {}", var.name(), value)?;
                        }
                    }
                }
                ConsoleCommand::Print(name) => {
                    // innermost scope wins when a name is visible twice
                    let visible = program.visible_variables(scope);
                    if let Some(var) = visible.iter().rev().find(|v| v.name() == name) {
                        match var.value() {
                            Some(value) => {
                                writeln!(self.output, "{} is equal to: {}", name, value)?
                            }
                            None => writeln!(self.output, "{} is currently uninitialised.", name)?,
                        }
                    }
                }
                ConsoleCommand::Break(at) => {
                    self.set_breakpoint(at);
                    writeln!(self.output, "Set breakpoint!")?;
                }
                ConsoleCommand::Remove(at) => {
                    self.remove_breakpoint(at);
                    writeln!(self.output, "Unset breakpoint!")?;
                }
                ConsoleCommand::Continue | ConsoleCommand::Step => return Ok(()),
            }
            self.output.flush()?;
        }
    }
}
