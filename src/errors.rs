use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Interpretation failures. Every one of them aborts the run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("line {line}: variable {name} is uninitialised")]
    UninitializedVariable { name: String, line: usize },
    #[error("line {line}: variable {name} has overflowed")]
    Overflow { name: String, line: usize },
    #[error("line {line}: variable {name} cannot be negative")]
    NegativeValue { name: String, line: usize },
    #[error("debug console IO error: {0}")]
    Io(#[from] io::Error),
}

/// Source text that does not describe a valid program
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected character '{found}'")]
    UnexpectedChar { found: char, line: usize },
    #[error("line {line}: expected {expected}, found {found}")]
    Unexpected {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, line: usize },
    #[error("line {line}: call to undefined procedure {name}")]
    UnknownProcedure { name: String, line: usize },
    #[error("line {line}: procedure {name} is already defined")]
    DuplicateProcedure { name: String, line: usize },
    #[error("line {line}: parameter {name} is listed twice")]
    DuplicateParameter { name: String, line: usize },
    #[error("line {line}: procedures can only be defined at the top level")]
    NestedProcedure { line: usize },
    #[error("line {line}: {name} takes {expected} arguments but {got} were given")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
        line: usize,
    },
    #[error("line {line}: block opened here is never closed with end;")]
    Unterminated { line: usize },
    #[error("line {line}: end; without an open block")]
    StrayEnd { line: usize },
}

/// Failure to write one output artifact
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("could not write {backend} output to {}", .path.display())]
    Write {
        backend: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} of {total} artifacts failed: {}", .failures.len(), summary(.failures))]
    Partial { failures: Vec<EmitError>, total: usize },
}

fn summary(failures: &[EmitError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// For interpreter operations where we want specific error handling
pub type RunResult<T> = std::result::Result<T, RunError>;

// For parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

// For writing artifacts
pub type EmitResult<T> = std::result::Result<T, EmitError>;

// For general operations where we want to propagate errors with anyhow
pub type Result<T> = anyhow::Result<T>;
