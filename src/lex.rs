use std::fmt::Display;

use miette::SourceSpan;

use crate::error::CalcError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    /// Byte offset of the token inside the lexed text.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident,
    LeftParen,
    RightParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equal,
    End,
}

impl TokenKind {
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash | TokenKind::Caret
        )
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::Number(n) => {
                if n == n.trunc() {
                    write!(f, "NUMBER {lit} {n}.0")
                } else {
                    write!(f, "NUMBER {lit} {n}")
                }
            }
            TokenKind::Ident => write!(f, "IDENTIFIER {lit} null"),
            TokenKind::LeftParen => write!(f, "LEFT_PAREN {lit} null"),
            TokenKind::RightParen => write!(f, "RIGHT_PAREN {lit} null"),
            TokenKind::Comma => write!(f, "COMMA {lit} null"),
            TokenKind::Plus => write!(f, "PLUS {lit} null"),
            TokenKind::Minus => write!(f, "MINUS {lit} null"),
            TokenKind::Star => write!(f, "STAR {lit} null"),
            TokenKind::Slash => write!(f, "SLASH {lit} null"),
            TokenKind::Caret => write!(f, "CARET {lit} null"),
            TokenKind::Equal => write!(f, "EQUAL {lit} null"),
            TokenKind::End => write!(f, "EOF  null"),
        }
    }
}

/// Cursor over a single line of input.
///
/// [`Lexer::next_token`] is stateless: it only looks at the position it is
/// handed, so asking twice for the same position yields the same token.
/// The [`Iterator`] impl threads the position through for convenience and
/// stops before [`TokenKind::End`].
pub struct Lexer<'de> {
    whole: &'de str,
    byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            whole: input,
            byte: 0,
        }
    }

    pub fn next_token(&self, position: usize) -> Result<(Token<'de>, usize), CalcError> {
        let rest = self.whole.get(position..).unwrap_or_default();
        let trimmed = rest.trim_start();
        let start = self.whole.len() - trimmed.len();

        let Some(c) = trimmed.chars().next() else {
            let end = Token {
                kind: TokenKind::End,
                literal: "",
                offset: start,
            };
            return Ok((end, start));
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '=' => TokenKind::Equal,
            '0'..='9' | '.' => return self.number(start),
            'a'..='z' | 'A'..='Z' | '_' => return Ok(self.ident(start)),
            c => {
                return Err(CalcError::InvalidSymbol {
                    symbol: c,
                    src: self.whole.to_string(),
                    span: SourceSpan::from(start..start + c.len_utf8()),
                });
            }
        };

        let token = Token {
            kind,
            literal: &self.whole[start..start + 1],
            offset: start,
        };
        Ok((token, start + 1))
    }

    fn ident(&self, start: usize) -> (Token<'de>, usize) {
        let cur = &self.whole[start..];
        let len = cur
            .find(|c| !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_'))
            .unwrap_or(cur.len());

        let token = Token {
            kind: TokenKind::Ident,
            literal: &cur[..len],
            offset: start,
        };
        (token, start + len)
    }

    fn number(&self, start: usize) -> Result<(Token<'de>, usize), CalcError> {
        let bytes = self.whole.as_bytes();
        let mut end = start;
        let mut dotted = false;
        let mut digits = false;
        while let Some(&b) = bytes.get(end) {
            match b {
                b'0'..=b'9' => {
                    digits = true;
                    end += 1;
                }
                b'.' if !dotted => {
                    dotted = true;
                    end += 1;
                }
                _ => break,
            }
        }

        // the exponent only counts when at least one digit follows `e[+-]`,
        // otherwise the `e` is left for the next token
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut probe = end + 1;
            if matches!(bytes.get(probe), Some(b'+' | b'-')) {
                probe += 1;
            }
            let exponent = probe;
            while matches!(bytes.get(probe), Some(b'0'..=b'9')) {
                probe += 1;
            }
            if probe > exponent {
                end = probe;
            }
        }

        let literal = &self.whole[start..end];
        // a mantissa without digits (`.`, `.e5`) reads as zero
        let n = if digits {
            literal.parse().map_err(|_| CalcError::InvalidNumber {
                literal: literal.to_string(),
                src: self.whole.to_string(),
                span: SourceSpan::from(start..end),
            })?
        } else {
            0.0
        };

        let token = Token {
            kind: TokenKind::Number(n),
            literal,
            offset: start,
        };
        Ok((token, end))
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, CalcError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token(self.byte) {
            Ok((token, _)) if token.kind == TokenKind::End => None,
            Ok((token, next)) => {
                self.byte = next;
                Some(Ok(token))
            }
            Err(e) => {
                self.byte = self.whole.len();
                Some(Err(e))
            }
        }
    }
}
