use log::debug;

use crate::ast::{BlockId, Call, Command, Program};
use crate::errors::{ParseError, ParseResult};
use crate::lexer::{self, Spanned, Token};
use crate::variable::Variable;

const KEYWORDS: &[&str] = &["clear", "incr", "decr", "while", "not", "do", "end", "func"];

/// Parse BareBones source into a [`Program`] together with its comment map.
pub fn parse(source: &str) -> ParseResult<Program> {
    let (tokens, comments) = lexer::tokenize(source)?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        program: Program::new(),
    };
    parser.program.comments = comments;

    let root = parser.program.root;
    let end_line = parser.parse_body(root, None)?;
    parser.program.block_mut(root).end_line = end_line;

    debug!(
        "parsed {} blocks, {} procedures",
        parser.program.blocks.len(),
        parser.program.functions.len()
    );
    Ok(parser.program)
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    program: Program,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn last_line(&self) -> usize {
        self.tokens
            .get(self.cursor.saturating_sub(1))
            .map_or(1, |t| t.line)
    }

    fn unexpected(&self, expected: &str, found: Option<Spanned>) -> ParseError {
        match found {
            Some(t) => ParseError::Unexpected {
                expected: expected.to_string(),
                found: t.token.describe(),
                line: t.line,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                line: self.last_line(),
            },
        }
    }

    fn expect(&mut self, want: Token, expected: &str) -> ParseResult<usize> {
        match self.next() {
            Some(t) if t.token == want => Ok(t.line),
            other => Err(self.unexpected(expected, other)),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        match self.next() {
            Some(Spanned {
                token: Token::Ident(word),
                ..
            }) if word == keyword => Ok(()),
            other => Err(self.unexpected(&format!("'{}'", keyword), other)),
        }
    }

    /// A non-keyword identifier
    fn expect_name(&mut self, what: &str) -> ParseResult<String> {
        match self.next() {
            Some(Spanned {
                token: Token::Ident(word),
                ..
            }) if !KEYWORDS.contains(&word.as_str()) => Ok(word),
            other => Err(self.unexpected(what, other)),
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Spanned { token: Token::Ident(word), .. }) if word == keyword)
    }

    /// Find `name` in scope or declare it in `block`.
    fn resolve(&mut self, block: BlockId, name: &str) -> Variable {
        match self.program.lookup(block, name) {
            Some(var) => var,
            None => self.program.declare(block, name),
        }
    }

    /// Parse statements into `block` until its `end;` (or end of input for
    /// the root). Returns the line the block ends on.
    fn parse_body(&mut self, block: BlockId, opened_at: Option<usize>) -> ParseResult<usize> {
        loop {
            if self.peek().is_none() {
                return match opened_at {
                    Some(line) => Err(ParseError::Unterminated { line }),
                    None => Ok(self.last_line()),
                };
            }
            if self.at_keyword("end") {
                let line = self.tokens[self.cursor].line;
                self.cursor += 1;
                if opened_at.is_none() {
                    return Err(ParseError::StrayEnd { line });
                }
                self.expect(Token::Semi, "';' after end")?;
                return Ok(line);
            }
            self.parse_statement(block)?;
        }
    }

    fn parse_statement(&mut self, block: BlockId) -> ParseResult<()> {
        let Some(first) = self.next() else {
            return Err(self.unexpected("statement", None));
        };
        let line = first.line;
        let word = match first.token {
            Token::Ident(word) => word,
            _ => return Err(self.unexpected("statement", Some(first))),
        };

        match word.as_str() {
            "clear" | "incr" | "decr" => {
                let name = self.expect_name("variable name")?;
                self.expect(Token::Semi, "';'")?;
                let var = self.resolve(block, &name);
                let command = match word.as_str() {
                    "clear" => Command::Clear { line, var },
                    "incr" => Command::Incr { line, var },
                    _ => Command::Decr { line, var },
                };
                self.program.push_command(block, command);
            }
            "while" => self.parse_while(block, line)?,
            "func" => self.parse_func(block, line)?,
            "not" | "do" => {
                return Err(self.unexpected(
                    "statement",
                    Some(Spanned {
                        token: Token::Ident(word),
                        line,
                    }),
                ))
            }
            _ => self.parse_call(block, word, line)?,
        }
        Ok(())
    }

    fn parse_while(&mut self, block: BlockId, line: usize) -> ParseResult<()> {
        let name = self.expect_name("loop variable")?;
        self.expect_keyword("not")?;
        match self.next() {
            Some(Spanned {
                token: Token::Number(0),
                ..
            }) => {}
            other => return Err(self.unexpected("'0'", other)),
        }
        self.expect_keyword("do")?;
        self.expect(Token::Semi, "';'")?;

        let guard = self.resolve(block, &name);
        let body = self.program.add_while(block, guard, line);
        let end_line = self.parse_body(body, Some(line))?;
        self.program.block_mut(body).end_line = end_line;
        self.program.push_command(block, Command::While { line, body });
        Ok(())
    }

    fn parse_func(&mut self, block: BlockId, line: usize) -> ParseResult<()> {
        if block != self.program.root {
            return Err(ParseError::NestedProcedure { line });
        }
        let name = self.expect_name("procedure name")?;
        if self.program.function(&name).is_some() {
            return Err(ParseError::DuplicateProcedure { name, line });
        }

        self.expect(Token::LParen, "'('")?;
        let mut params: Vec<String> = Vec::new();
        if matches!(self.peek(), Some(t) if t.token == Token::RParen) {
            self.next();
        } else {
            loop {
                let param = self.expect_name("parameter name")?;
                if params.contains(&param) {
                    return Err(ParseError::DuplicateParameter { name: param, line });
                }
                params.push(param);
                match self.next() {
                    Some(Spanned {
                        token: Token::Comma,
                        ..
                    }) => continue,
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => break,
                    other => return Err(self.unexpected("',' or ')'", other)),
                }
            }
        }
        self.expect(Token::Semi, "';'")?;

        let body = self.program.add_func(&name, params, line);
        let end_line = self.parse_body(body, Some(line))?;
        self.program.block_mut(body).end_line = end_line;
        self.program.register_function(body);
        self.program
            .push_command(block, Command::FuncBlock { line, body });
        debug!("defined procedure {} on line {}", name, line);
        Ok(())
    }

    fn parse_call(&mut self, block: BlockId, name: String, line: usize) -> ParseResult<()> {
        self.expect(Token::LParen, "'(' after procedure name")?;
        let mut args: Vec<(String, bool)> = Vec::new();
        if matches!(self.peek(), Some(t) if t.token == Token::RParen) {
            self.next();
        } else {
            loop {
                let by_ref = matches!(self.peek(), Some(t) if t.token == Token::Amp);
                if by_ref {
                    self.next();
                }
                args.push((self.expect_name("argument")?, by_ref));
                match self.next() {
                    Some(Spanned {
                        token: Token::Comma,
                        ..
                    }) => continue,
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => break,
                    other => return Err(self.unexpected("',' or ')'", other)),
                }
            }
        }
        self.expect(Token::Semi, "';'")?;

        let target = self
            .program
            .function(&name)
            .ok_or_else(|| ParseError::UnknownProcedure {
                name: name.clone(),
                line,
            })?;
        let expected = self.program.block(target).params().len();
        if expected != args.len() {
            return Err(ParseError::Arity {
                name,
                expected,
                got: args.len(),
                line,
            });
        }

        let (names, by_ref): (Vec<String>, Vec<bool>) = args.into_iter().unzip();
        let args = names.iter().map(|n| self.resolve(block, n)).collect();
        self.program.push_command(
            block,
            Command::Func(Call {
                line,
                target,
                args,
                by_ref,
            }),
        );
        Ok(())
    }
}
