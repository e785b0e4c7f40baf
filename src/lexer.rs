use crate::ast::Comments;
use crate::errors::{ParseError, ParseResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Number(u64),
    Semi,
    LParen,
    RParen,
    Comma,
    Amp,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{}'", name),
            Token::Number(n) => format!("'{}'", n),
            Token::Semi => "';'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Amp => "'&'".to_string(),
        }
    }
}

/// A token and the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// Split `source` into tokens and collect trailing `//` comments.
///
/// A comment is kept only when code precedes it on the same line; comment-only
/// lines carry nothing to attach to and are dropped.
pub fn tokenize(source: &str) -> ParseResult<(Vec<Spanned>, Comments)> {
    let mut tokens = Vec::new();
    let mut comments = Comments::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let (code, comment) = match raw.find("//") {
            Some(pos) => (&raw[..pos], Some(&raw[pos + 2..])),
            None => (raw, None),
        };

        let before = tokens.len();
        tokenize_line(code, line, &mut tokens)?;
        if let Some(text) = comment {
            if tokens.len() > before {
                comments.insert(line, text.to_string());
            }
        }
    }

    Ok((tokens, comments))
}

fn tokenize_line(code: &str, line: usize, out: &mut Vec<Spanned>) -> ParseResult<()> {
    let mut chars = code.chars().peekable();

    while let Some(&c) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            ';' => Token::Semi,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '&' => Token::Amp,
            c if c.is_ascii_digit() => {
                let mut n: u64 = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    n = n.saturating_mul(10).saturating_add(u64::from(d));
                    chars.next();
                }
                out.push(Spanned {
                    token: Token::Number(n),
                    line,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                out.push(Spanned {
                    token: Token::Ident(name),
                    line,
                });
                continue;
            }
            found => return Err(ParseError::UnexpectedChar { found, line }),
        };
        chars.next();
        out.push(Spanned { token, line });
    }
    Ok(())
}
