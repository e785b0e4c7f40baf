use crate::ast::{BlockId, BlockKind, Call, Command, Program};
use crate::emit::{Backend, CodeWriter, Style};

const RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "class", "compl", "const", "constexpr", "const_cast", "continue",
    "decltype", "default", "delete", "do", "double", "dynamic_cast", "else", "enum", "explicit",
    "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int", "long",
    "mutable", "namespace", "new", "noexcept", "not_eq", "nullptr", "operator", "or", "or_eq",
    "private", "protected", "public", "register", "reinterpret_cast", "return", "short",
    "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch", "template",
    "this", "thread_local", "throw", "true", "try", "typedef", "typeid", "typename", "union",
    "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "xor", "xor_eq", "main",
    "std",
];

const STYLE: Style = Style {
    indent: "    ",
    comment: "//",
    gap: " ",
    reserved: RESERVED,
};

/// C++11 translation unit. Procedures return a `std::tuple` of their
/// parameters and call sites unpack it with `std::tie`.
pub struct Cpp;

impl Backend for Cpp {
    fn name(&self) -> &'static str {
        "c++"
    }

    fn file_name(&self) -> &'static str {
        "main.cpp"
    }

    fn emit(&self, program: &Program) -> String {
        let mut w = CodeWriter::new(program, STYLE);
        w.plain(0, "#include <tuple>");
        w.plain(0, "");
        for id in &program.functions {
            function(&mut w, *id);
        }
        w.plain(0, "int main() {");
        declarations(&mut w, program.root, 1);
        statements(&mut w, program.root, 1);
        w.plain(1, "return 0;");
        w.plain(0, "}");
        w.finish()
    }
}

fn declarations(w: &mut CodeWriter<'_>, id: BlockId, depth: usize) {
    for name in w.frame_locals(id) {
        w.plain(depth, &format!("int {} = 0;", name));
    }
}

fn function(w: &mut CodeWriter<'_>, id: BlockId) {
    let block = w.program().block(id);
    let name = w.func_name(id);
    let params = w.params(id);
    let formals: Vec<String> = params.iter().map(|p| format!("int {}", p)).collect();
    let returns = if params.is_empty() {
        "void".to_string()
    } else {
        format!("std::tuple<{}>", vec!["int"; params.len()].join(", "))
    };

    w.line(
        0,
        &format!("{} {}({}) {{", returns, name, formals.join(", ")),
        block.line,
    );
    declarations(w, id, 1);
    statements(w, id, 0);
    if !params.is_empty() {
        w.plain(1, &format!("return std::make_tuple({});", params.join(", ")));
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
            w.line(depth, &format!("while ({} != 0) {{", w.var(guard)), *line);
            statements(w, *body, base);
            w.line(depth, "}", block.end_line);
        }
        Command::FuncBlock { .. } => {}
        Command::Func(call) => w.line(depth, &call_text(w, call), call.line),
    }
}

fn call_text(w: &CodeWriter<'_>, call: &Call) -> String {
    let invoke = format!("{}({})", w.func_name(call.target), w.call_args(call));
    match w.write_back(call, "std::ignore") {
        Some(targets) => format!("std::tie({}) = {};", targets.join(", "), invoke),
        None => format!("{};", invoke),
    }
}
