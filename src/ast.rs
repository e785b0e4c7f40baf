use std::collections::BTreeMap;

use crate::variable::Variable;

/// Index of a block inside [`Program::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

/// Trailing comments keyed by the source line they were written on.
pub type Comments = BTreeMap<usize, String>;

#[derive(Debug, Clone)]
pub enum Command {
    Incr { line: usize, var: Variable },
    Decr { line: usize, var: Variable },
    Clear { line: usize, var: Variable },
    Block { line: usize, body: BlockId },
    While { line: usize, body: BlockId },
    /// Procedure definition. Executing it does nothing; [`Command::Func`] runs it.
    FuncBlock { line: usize, body: BlockId },
    Func(Call),
}

impl Command {
    pub fn line(&self) -> usize {
        match self {
            Command::Incr { line, .. }
            | Command::Decr { line, .. }
            | Command::Clear { line, .. }
            | Command::Block { line, .. }
            | Command::While { line, .. }
            | Command::FuncBlock { line, .. } => *line,
            Command::Func(call) => call.line,
        }
    }
}

/// A procedure call site.
#[derive(Debug, Clone)]
pub struct Call {
    pub line: usize,
    pub target: BlockId,
    pub args: Vec<Variable>,
    pub by_ref: Vec<bool>,
}

#[derive(Debug, Clone)]
pub enum BlockKind {
    Plain,
    While {
        guard: Variable,
        /// Enclosing scope. Not owned: the parent owns this block.
        parent: BlockId,
    },
    Func {
        name: String,
        params: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Block {
    pub line: usize,
    /// Line of the closing `end;`
    pub end_line: usize,
    /// Nesting level, used for indentation only.
    pub depth: usize,
    pub commands: Vec<Command>,
    pub locals: BTreeMap<String, Variable>,
    pub kind: BlockKind,
}

impl Block {
    fn new(line: usize, depth: usize, kind: BlockKind) -> Self {
        Block {
            line,
            end_line: line,
            depth,
            commands: Vec::new(),
            locals: BTreeMap::new(),
            kind,
        }
    }

    /// Formal parameter names; empty unless this is a procedure body.
    pub fn params(&self) -> &[String] {
        match &self.kind {
            BlockKind::Func { params, .. } => params,
            _ => &[],
        }
    }

    pub fn func_name(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Func { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Variable bound to formal parameter `index`.
    pub fn param(&self, index: usize) -> Option<&Variable> {
        self.params().get(index).and_then(|p| self.locals.get(p))
    }
}

/// A parsed program: the block arena, the root block and the comment map.
#[derive(Debug, Clone)]
pub struct Program {
    pub blocks: Vec<Block>,
    pub root: BlockId,
    /// Procedure bodies in definition order
    pub functions: Vec<BlockId>,
    pub comments: Comments,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Program {
            blocks: vec![Block::new(1, 0, BlockKind::Plain)],
            root: BlockId(0),
            functions: Vec::new(),
            comments: Comments::new(),
        }
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    pub fn root_block(&self) -> &Block {
        self.block(self.root)
    }

    /// Add a while loop nested in `parent`. The caller pushes the matching
    /// [`Command::While`] once the body is complete.
    pub fn add_while(&mut self, parent: BlockId, guard: Variable, line: usize) -> BlockId {
        let depth = self.block(parent).depth + 1;
        self.add_block(Block::new(line, depth, BlockKind::While { guard, parent }))
    }

    /// Add a procedure body with its parameters pre-declared. It becomes
    /// callable once passed to [`Program::register_function`].
    pub fn add_func(&mut self, name: &str, params: Vec<String>, line: usize) -> BlockId {
        let mut block = Block::new(
            line,
            1,
            BlockKind::Func {
                name: name.to_string(),
                params: params.clone(),
            },
        );
        for p in params {
            block.locals.insert(p.clone(), Variable::new(p));
        }
        self.add_block(block)
    }

    pub fn register_function(&mut self, id: BlockId) {
        self.functions.push(id);
    }

    fn add_block(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    pub fn push_command(&mut self, block: BlockId, command: Command) {
        self.block_mut(block).commands.push(command);
    }

    /// Declare `name` as a local of `block`, reusing an existing entry.
    pub fn declare(&mut self, block: BlockId, name: &str) -> Variable {
        self.block_mut(block)
            .locals
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name))
            .clone()
    }

    /// Enclosing scope of a while loop
    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        match self.block(id).kind {
            BlockKind::While { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// Resolve `name` from `scope` outward through while-loop parents. Stops
    /// at the enclosing root or procedure body.
    pub fn lookup(&self, scope: BlockId, name: &str) -> Option<Variable> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(var) = self.block(id).locals.get(name) {
                return Some(var.clone());
            }
            current = self.parent(id);
        }
        None
    }

    /// Every variable visible from `scope`, outermost scope first.
    /// The same name may appear more than once.
    pub fn visible_variables(&self, scope: BlockId) -> Vec<Variable> {
        let mut chain = vec![scope];
        while let Some(parent) = self.parent(*chain.last().unwrap_or(&scope)) {
            chain.push(parent);
        }
        chain
            .iter()
            .rev()
            .flat_map(|id| self.block(*id).locals.values().cloned())
            .collect()
    }

    /// Locals of `id` plus those of every while loop nested inside it, outer
    /// scopes first. Transpilers declare these once at frame entry.
    pub fn frame_locals(&self, id: BlockId) -> Vec<Variable> {
        let mut out: Vec<Variable> = Vec::new();
        self.collect_locals(id, &mut out);
        out
    }

    fn collect_locals(&self, id: BlockId, out: &mut Vec<Variable>) {
        let block = self.block(id);
        for var in block.locals.values() {
            if !out.iter().any(|v| v.name() == var.name()) {
                out.push(var.clone());
            }
        }
        for command in &block.commands {
            if let Command::While { body, .. } | Command::Block { body, .. } = command {
                self.collect_locals(*body, out);
            }
        }
    }

    pub fn function(&self, name: &str) -> Option<BlockId> {
        self.functions
            .iter()
            .copied()
            .find(|id| self.block(*id).func_name() == Some(name))
    }

    /// Trailing comment written on `line`, if any.
    pub fn comment(&self, line: usize) -> Option<&str> {
        self.comments.get(&line).map(String::as_str)
    }

    /// Variable declared in the root scope
    pub fn global(&self, name: &str) -> Option<Variable> {
        self.root_block().locals.get(name).cloned()
    }
}
