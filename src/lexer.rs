use crate::error::ParseError;
use miette::NamedSource;

/// Represents the different kinds of tokens that the lexer can produce.
/// Each token is a meaningful unit of GLPS syntax.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    /// Represents the end of the input.
    Eof,

    // == Literals ==
    /// An identifier: a letter or `_` followed by alphanumerics, `_`, or
    /// embedded `:` (GLPS element names such as `x:2` are legal).
    Identifier(String),
    /// A decimal floating-point literal. Never signed; unary minus is a
    /// separate token so that expressions like `10--2` parse.
    Number(f64),
    /// Quoted text. Any byte 1–255 is allowed between the quotes.
    Text(String),

    // == Punctuation & Operators ==
    /// Equals: `=`
    Assign,
    /// Colon: `:`
    Colon,
    /// Semicolon: `;` (statement terminator)
    Semicolon,
    /// Comma: `,`
    Comma,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Left Bracket: `[` (vector literal)
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Plus: `+`
    Plus,
    /// Minus: `-` (binary or unary)
    Minus,
    /// Star: `*`
    Star,
    /// Slash: `/`
    Slash,
}

/// A token with its type and byte position in the input.
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }
}

/// Byte-oriented GLPS lexer.
///
/// The input is raw bytes, not `&str`: quoted text may contain any byte
/// 1–255, and invalid input (e.g. `b"\xff\xfe"`) must be rejected with a
/// lexical error rather than refused up front as non-UTF-8. Comments
/// (`#` to end of line) and whitespace are discarded, never tokenized.
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
    source: NamedSource<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8], name: &str) -> Self {
        // Lossy copy for diagnostics only; token content is decoded from
        // the raw bytes.
        let text = String::from_utf8_lossy(input).into_owned();
        Self {
            input,
            position: 0,
            source: NamedSource::new(name, text),
        }
    }

    pub fn lex(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments();
        let start_pos = self.position;

        let ttype = if let Some(byte) = self.advance() {
            match byte {
                b'=' => TokenType::Assign,
                b':' => TokenType::Colon,
                b';' => TokenType::Semicolon,
                b',' => TokenType::Comma,
                b'(' => TokenType::LParen,
                b')' => TokenType::RParen,
                b'[' => TokenType::LBracket,
                b']' => TokenType::RBracket,
                b'+' => TokenType::Plus,
                b'-' => TokenType::Minus,
                b'*' => TokenType::Star,
                b'/' => TokenType::Slash,
                b'"' => self.read_text(start_pos)?,
                c if c.is_ascii_digit() => self.read_number(start_pos)?,
                b'.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    self.read_number(start_pos)?
                }
                c if c.is_ascii_alphabetic() || c == b'_' => self.read_identifier(start_pos),
                c => {
                    return Err(ParseError::InvalidCharacter {
                        byte: c,
                        src: self.source.clone(),
                        span: (start_pos, 1).into(),
                    })
                }
            }
        } else {
            TokenType::Eof
        };

        Ok(Token::new(ttype, start_pos, self.position))
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.input.get(self.position).copied();
        if byte.is_some() {
            self.position += 1;
        }
        byte
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.position += 1;
            } else if c == b'#' {
                while self.peek().is_some_and(|c| c != b'\n') {
                    self.position += 1;
                }
            } else {
                break;
            }
        }
    }

    fn read_text(&mut self, start_pos: usize) -> Result<TokenType, ParseError> {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(0) => {
                    return Err(ParseError::InvalidCharacter {
                        byte: 0,
                        src: self.source.clone(),
                        span: (self.position - 1, 1).into(),
                    })
                }
                Some(c) => bytes.push(c),
                None => {
                    return Err(ParseError::UnterminatedQuote {
                        src: self.source.clone(),
                        span: (start_pos, 1).into(),
                    })
                }
            }
        }
        // Valid UTF-8 round-trips byte-for-byte; anything else falls back
        // to a lossless Latin-1 decode (each byte becomes the code point
        // of the same value).
        let text = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
        };
        Ok(TokenType::Text(text))
    }

    fn read_number(&mut self, start_pos: usize) -> Result<TokenType, ParseError> {
        let mut has_dot = self.input[start_pos] == b'.';
        let mut has_exponent = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.position += 1;
            } else if c == b'.' && !has_dot && !has_exponent {
                has_dot = true;
                self.position += 1;
            } else if (c == b'e' || c == b'E') && !has_exponent {
                has_exponent = true;
                self.position += 1;
                if self.peek().is_some_and(|s| s == b'+' || s == b'-') {
                    self.position += 1;
                }
            } else {
                break;
            }
        }

        let raw: String = self.input[start_pos..self.position]
            .iter()
            .map(|&b| b as char)
            .collect();
        match raw.parse::<f64>() {
            Ok(n) => Ok(TokenType::Number(n)),
            Err(_) => Err(ParseError::Syntax {
                expected: "a numeric literal".to_string(),
                src: self.source.clone(),
                span: (start_pos, self.position - start_pos).into(),
            }),
        }
    }

    fn read_identifier(&mut self, start_pos: usize) -> TokenType {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b':')
        {
            self.position += 1;
        }
        // A trailing run of ':' is never part of the identifier: `x:2:`
        // is the identifier `x:2` followed by a colon token.
        while self.position > start_pos + 1 && self.input[self.position - 1] == b':' {
            self.position -= 1;
        }
        let ident: String = self.input[start_pos..self.position]
            .iter()
            .map(|&b| b as char)
            .collect();
        TokenType::Identifier(ident)
    }
}
