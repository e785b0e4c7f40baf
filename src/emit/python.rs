use crate::ast::{BlockId, BlockKind, Command, Program};
use crate::emit::{Backend, CodeWriter, Style};

const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "or", "pass", "raise", "return", "try", "with",
    "yield", "_",
];

const STYLE: Style = Style {
    indent: "    ",
    comment: "#",
    gap: "  ",
    reserved: RESERVED,
};

/// Python 3 module. Procedures return every parameter as a tuple and call
/// sites unpack the by-reference positions.
pub struct Python;

impl Backend for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn file_name(&self) -> &'static str {
        "main.py"
    }

    fn emit(&self, program: &Program) -> String {
        let mut w = CodeWriter::new(program, STYLE);
        for id in &program.functions {
            function(&mut w, *id);
        }
        statements(&mut w, program.root);
        w.finish()
    }
}

/// `a, b` or `a,` so a single name still forms a tuple
fn unpacked(names: &[String]) -> String {
    match names {
        [single] => format!("{},", single),
        _ => names.join(", "),
    }
}

fn function(w: &mut CodeWriter<'_>, id: BlockId) {
    let block = w.program().block(id);
    let params = w.params(id);
    w.line(
        0,
        &format!("def {}({}):", w.func_name(id), params.join(", ")),
        block.line,
    );
    let wrote = statements(w, id);
    if params.is_empty() {
        if !wrote {
            w.plain(1, "pass");
        }
        w.comment_only(1, block.end_line);
    } else {
        w.line(1, &format!("return {}", unpacked(&params)), block.end_line);
    }
    w.plain(0, "");
}

/// Returns false when nothing was written, so callers can insert `pass`.
fn statements(w: &mut CodeWriter<'_>, id: BlockId) -> bool {
    let block = w.program().block(id);
    let mut wrote = false;
    for command in &block.commands {
        wrote |= statement(w, command, block.depth);
    }
    wrote
}

fn statement(w: &mut CodeWriter<'_>, command: &Command, depth: usize) -> bool {
    let program = w.program();
    match command {
        Command::Incr { line, var } => w.line(depth, &format!("{} += 1", w.var(var)), *line),
        Command::Decr { line, var } => w.line(depth, &format!("{} -= 1", w.var(var)), *line),
        Command::Clear { line, var } => w.line(depth, &format!("{} = 0", w.var(var)), *line),
        Command::Block { body, .. } => return statements(w, *body),
        Command::While { line, body } => {
            let block = program.block(*body);
            let BlockKind::While { guard, .. } = &block.kind else {
                return statements(w, *body);
            };
            w.line(depth, &format!("while {} != 0:", w.var(guard)), *line);
            if !statements(w, *body) {
                w.plain(block.depth, "pass");
            }
            w.comment_only(block.depth, block.end_line);
        }
        // hoisted to the top of the module
        Command::FuncBlock { .. } => return false,
        Command::Func(call) => {
            let invoke = format!("{}({})", w.func_name(call.target), w.call_args(call));
            let text = match w.write_back(call, "_") {
                Some(targets) => format!("{} = {}", unpacked(&targets), invoke),
                None => invoke,
            };
            w.line(depth, &text, call.line);
        }
    }
    true
}
