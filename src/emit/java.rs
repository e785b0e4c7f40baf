use crate::ast::{BlockId, BlockKind, Call, Command, Program};
use crate::emit::{Backend, CodeWriter, Style};

const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "null", "package", "private", "protected", "public", "return",
    "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while", "_", "args", "main",
];

const STYLE: Style = Style {
    indent: "  ",
    comment: "//",
    gap: " ",
    reserved: RESERVED,
};

/// Holds the returned parameter array at a call site. `$` keeps it out of
/// the BareBones namespace.
const RESULT: &str = "result$";

/// Java class `Main`. Procedures return their parameters as an `int[]`.
pub struct Java;

impl Backend for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn file_name(&self) -> &'static str {
        "Main.java"
    }

    fn emit(&self, program: &Program) -> String {
        let mut w = CodeWriter::new(program, STYLE);
        w.plain(0, "public class Main {");
        for id in &program.functions {
            function(&mut w, *id);
        }
        w.plain(1, "public static void main(String[] args) {");
        declarations(&mut w, program.root, 2);
        statements(&mut w, program.root, 2);
        w.plain(1, "}");
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
    let signature = if params.is_empty() {
        format!("static void {}() {{", name)
    } else {
        let formals: Vec<String> = params.iter().map(|p| format!("int {}", p)).collect();
        format!("static int[] {}({}) {{", name, formals.join(", "))
    };

    w.line(1, &signature, block.line);
    declarations(w, id, 2);
    statements(w, id, 1);
    if !params.is_empty() {
        w.plain(2, &format!("return new int[] {{{}}};", params.join(", ")));
    }
    w.line(1, "}", block.end_line);
    w.plain(0, "");
}

/// Commands of `id` indented by `base` plus the block's own depth.
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
    if !call.by_ref.iter().any(|r| *r) {
        return format!("{};", invoke);
    }
    let copies: Vec<String> = call
        .args
        .iter()
        .zip(&call.by_ref)
        .enumerate()
        .filter(|(_, (_, by_ref))| **by_ref)
        .map(|(i, (arg, _))| format!("{} = {}[{}];", w.var(arg), RESULT, i))
        .collect();
    format!("{{ int[] {} = {}; {} }}", RESULT, invoke, copies.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_layout() {
        let source = "\
func f(a, b); // proc
incr a;
end;
clear x; // init
while x not 0 do;
decr x;
end; // loop end
f(x, &x);";
        let program = parse(source).unwrap();
        assert_eq!(
            Java.emit(&program),
            "\
public class Main {
  static int[] f(int a, int b) { // proc
    a += 1;
    return new int[] {a, b};
  }

  public static void main(String[] args) {
    int x = 0;
    x = 0; // init
    while (x != 0) {
      x -= 1;
    } // loop end
    { int[] result$ = f(x, x); x = result$[1]; }
  }
}
"
        );
    }

    #[test]
    fn test_procedure_without_parameters_is_void() {
        let program = parse("func tick();\nclear t;\nend;\ntick();").unwrap();
        assert_eq!(
            Java.emit(&program),
            "\
public class Main {
  static void tick() {
    int t = 0;
    t = 0;
  }

  public static void main(String[] args) {
    tick();
  }
}
"
        );
    }
}
