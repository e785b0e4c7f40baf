use crate::ast::{BlockId, BlockKind, Command, Program};
use crate::emit::{tuple, Backend, CodeWriter, Style};

const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "abstract", "become", "box", "final", "macro", "override",
    "priv", "typeof", "unsized", "virtual", "yield", "try", "gen", "_", "main", "Some", "None",
    "Ok", "Err",
];

const STYLE: Style = Style {
    indent: "    ",
    comment: "//",
    gap: " ",
    reserved: RESERVED,
};

/// Rust crate root. Procedures take every parameter by value and return
/// them all as a tuple; call sites destructure by-reference positions back
/// into the caller's variables and discard the rest with `_`.
pub struct Rust;

impl Backend for Rust {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_name(&self) -> &'static str {
        "main.rs"
    }

    fn emit(&self, program: &Program) -> String {
        let mut w = CodeWriter::new(program, STYLE);
        w.plain(
            0,
            "#![allow(dead_code, non_snake_case, unused_mut, unused_variables, unused_assignments)]",
        );
        w.plain(0, "");
        for id in &program.functions {
            function(&mut w, *id);
        }
        w.plain(0, "fn main() {");
        declarations(&mut w, program.root, 1);
        statements(&mut w, program.root, 1);
        w.plain(0, "}");
        w.finish()
    }
}

fn declarations(w: &mut CodeWriter<'_>, id: BlockId, depth: usize) {
    for name in w.frame_locals(id) {
        w.plain(depth, &format!("let mut {}: i32 = 0;", name));
    }
}

fn function(w: &mut CodeWriter<'_>, id: BlockId) {
    let block = w.program().block(id);
    let name = w.func_name(id);
    let params = w.params(id);
    let formals: Vec<String> = params.iter().map(|p| format!("mut {}: i32", p)).collect();
    let signature = if params.is_empty() {
        format!("fn {}() {{", name)
    } else {
        let types = vec!["i32".to_string(); params.len()];
        format!("fn {}({}) -> {} {{", name, formals.join(", "), tuple(&types))
    };

    w.line(0, &signature, block.line);
    declarations(w, id, 1);
    statements(w, id, 0);
    if !params.is_empty() {
        w.plain(1, &tuple(&params));
    }
    w.line(0, "}", block.end_line);
    w.plain(0, "");
}

fn statements(w: &mut CodeWriter<'_>, id: BlockId, base: usize) {
    let block = w.program().block(id);
    for command in &block.commands {
        statement(w, command, base + block.depth, base);
    }
}

fn statement(w: &mut CodeWriter<'_>, command: &Command, depth: usize, base: usize) {
    let program = w.program();
    match command {
        Command::Incr { line, var } => w.line(depth, &format!("{} += 1;", w.var(var)), *line),
        Command::Decr { line, var } => w.line(depth, &format!("{} -= 1;", w.var(var)), *line),
        Command::Clear { line, var } => w.line(depth, &format!("{} = 0;", w.var(var)), *line),
        Command::Block { body, .. } => statements(w, *body, base),
        Command::While { line, body } => {
            let block = program.block(*body);
            let BlockKind::While { guard, .. } = &block.kind else {
                return statements(w, *body, base);
            };
            w.line(depth, &format!("while {} != 0 {{", w.var(guard)), *line);
            statements(w, *body, base);
            w.line(depth, "}", block.end_line);
        }
        Command::FuncBlock { .. } => {}
        Command::Func(call) => {
            let invoke = format!("{}({})", w.func_name(call.target), w.call_args(call));
            let text = match w.write_back(call, "_") {
                Some(targets) => format!("{} = {};", tuple(&targets), invoke),
                None => format!("{};", invoke),
            };
            w.line(depth, &text, call.line);
        }
    }
}
