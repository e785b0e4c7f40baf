use crate::ast::{BlockId, BlockKind, Command, Program};
use crate::emit::{Backend, CodeWriter, Style};

const STYLE: Style = Style {
    indent: "    ",
    comment: "//",
    gap: " ",
    reserved: &[],
};

/// BareBones pretty-printer. Its output parses back to the same tree.
pub struct Canonical;

impl Backend for Canonical {
    fn name(&self) -> &'static str {
        "barebones"
    }

    fn file_name(&self) -> &'static str {
        "format.bb"
    }

    fn emit(&self, program: &Program) -> String {
        let mut w = CodeWriter::new(program, STYLE);
        body(&mut w, program.root);
        w.finish()
    }
}

fn body(w: &mut CodeWriter<'_>, id: BlockId) {
    let program = w.program();
    let block = program.block(id);
    for command in &block.commands {
        command_line(w, command, block.depth);
    }
}

/// Emit `command` with its opening line at `depth`; nested bodies indent
/// by their own block depth.
fn command_line(w: &mut CodeWriter<'_>, command: &Command, depth: usize) {
    let program = w.program();
    match command {
        Command::Incr { line, var } => w.line(depth, &format!("incr {};", var.name()), *line),
        Command::Decr { line, var } => w.line(depth, &format!("decr {};", var.name()), *line),
        Command::Clear { line, var } => w.line(depth, &format!("clear {};", var.name()), *line),
        Command::Block { body: id, .. } => body(w, *id),
        Command::While { line, body: id } => {
            let block = program.block(*id);
            let guard = match &block.kind {
                BlockKind::While { guard, .. } => guard.name(),
                _ => "",
            };
            w.line(depth, &format!("while {} not 0 do;", guard), *line);
            body(w, *id);
            w.line(depth, "end;", block.end_line);
        }
        Command::FuncBlock { line, body: id } => {
            let block = program.block(*id);
            w.line(
                depth,
                &format!(
                    "func {}({});",
                    block.func_name().unwrap_or_default(),
                    block.params().join(", ")
                ),
                *line,
            );
            body(w, *id);
            w.line(depth, "end;", block.end_line);
        }
        Command::Func(call) => {
            let args = call
                .args
                .iter()
                .zip(&call.by_ref)
                .map(|(arg, by_ref)| {
                    if *by_ref {
                        format!("&{}", arg.name())
                    } else {
                        arg.name().to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            let name = program.block(call.target).func_name().unwrap_or_default();
            w.line(depth, &format!("{}({});", name, args), call.line);
        }
    }
}
