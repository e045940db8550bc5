use crate::config::{Config, Value};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenType};
use crate::scope::{Definition, Scope};
use miette::{NamedSource, SourceSpan};
use std::path::{Path, PathBuf};

/// A recursive descent parser for GLPS, built according to the EBNF grammar.
///
/// Expressions are evaluated eagerly while their enclosing statement is
/// parsed, so every definition entering the [`Scope`] is already a concrete
/// [`Value`]. Beamlines are the exception: they are recorded as member
/// reference lists and expanded against the final scope once the whole
/// input has been consumed.
#[derive(Debug)]
pub struct Parser {
    source: NamedSource<String>,
    tokens: Vec<Token>,
    position: usize,
    scope: Scope,
    /// Base directory for resolving `parse("path")` includes.
    base_dir: Option<PathBuf>,
    /// Canonicalized paths of the files currently being parsed, outermost
    /// first. Entering a path already on the stack is an include cycle.
    include_stack: Vec<PathBuf>,
    /// Names of beamline declarations in statement order; the last one
    /// whose definition is still a beamline becomes the root.
    beamlines: Vec<String>,
}

/// Binary arithmetic operators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a / b,
        }
    }
}

impl Parser {
    pub fn new(input: &[u8], name: &str) -> Result<Self, ParseError> {
        Self::with_includes(input, name, None, Vec::new())
    }

    /// Constructs a parser with an include base directory and the chain of
    /// files already being parsed (for cycle detection).
    pub(crate) fn with_includes(
        input: &[u8],
        name: &str,
        base_dir: Option<PathBuf>,
        include_stack: Vec<PathBuf>,
    ) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input, name);
        let tokens = lexer.lex()?;
        let text = String::from_utf8_lossy(input).into_owned();
        Ok(Self {
            source: NamedSource::new(name, text),
            tokens,
            position: 0,
            scope: Scope::new(),
            base_dir,
            include_stack,
            beamlines: Vec::new(),
        })
    }

    // === Main Parsing Methods ===

    /// Consumes the whole token stream and assembles the final
    /// configuration: all top-level assignments by their final values, a
    /// `name` entry for the root beamline, and an `elements` entry with
    /// the flat expanded instance list, alphabetically key-sorted.
    pub fn parse_config(&mut self) -> Result<Config, ParseError> {
        while self.peek() != &TokenType::Eof {
            self.parse_statement()?;
        }

        // The last beamline textually present becomes the root. A name
        // redefined as something else no longer qualifies.
        let root = self
            .beamlines
            .iter()
            .rev()
            .find(|n| matches!(self.scope.lookup(n), Some(Definition::Beamline(_))))
            .cloned()
            .ok_or_else(|| ParseError::NoBeamlines {
                src: self.source.clone(),
            })?;

        let mut instances = Vec::new();
        let mut active = Vec::new();
        self.expand_line(&root, &mut active, &mut instances)?;

        let mut config = Config::new();
        for (name, def) in self.scope.iter() {
            if let Definition::Assignment(value) = def {
                config.insert(name.clone(), value.clone());
            }
        }
        config.insert("name", Value::Text(root));
        config.insert("elements", Value::Config(instances));
        config.sort_keys();
        Ok(config)
    }

    /// Statement ::= ";" | Assignment | ElementDecl | BeamlineDecl
    fn parse_statement(&mut self) -> Result<(), ParseError> {
        if self.match_token(&TokenType::Semicolon) {
            return Ok(()); // empty statement
        }
        let (name, _) = self.take_identifier("a statement")?;
        match self.peek() {
            // Assignment ::= Identifier "=" Expr ";"
            TokenType::Assign => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(&TokenType::Semicolon, "';' to end the statement")?;
                self.scope.define(&name, Definition::Assignment(value));
                Ok(())
            }
            TokenType::Colon => {
                self.advance();
                self.parse_declaration(name)
            }
            _ => self.err_expected("'=' or ':' after a name"),
        }
    }

    /// ElementDecl  ::= Identifier ":" Identifier { "," Property } ";"
    /// BeamlineDecl ::= Identifier ":" "LINE" "=" "(" [ MemberList ] ")" ";"
    ///
    /// The two share a head; a declaration whose type token compares
    /// case-insensitively equal to `LINE` is a beamline.
    fn parse_declaration(&mut self, name: String) -> Result<(), ParseError> {
        let (etype, _) = self.take_identifier("a type name after ':'")?;

        if etype.eq_ignore_ascii_case("LINE") {
            self.expect(&TokenType::Assign, "'=' after 'LINE'")?;
            self.expect(&TokenType::LParen, "'(' to open the member list")?;
            let members = self.parse_member_list()?;
            self.expect(&TokenType::RParen, "')' to close the member list")?;
            self.expect(&TokenType::Semicolon, "';' to end the statement")?;
            self.scope.define(&name, Definition::Beamline(members));
            self.beamlines.push(name);
        } else {
            let mut properties = Config::new();
            while self.match_token(&TokenType::Comma) {
                // Property ::= Identifier "=" Expr
                let (key, _) = self.take_identifier("a property name")?;
                self.expect(&TokenType::Assign, "'=' after the property name")?;
                let value = self.parse_expr()?;
                properties.insert(key, value);
            }
            self.expect(&TokenType::Semicolon, "';' to end the statement")?;
            self.scope
                .define(&name, Definition::Element { etype, properties });
        }
        Ok(())
    }

    /// MemberList ::= Member { "," Member }
    fn parse_member_list(&mut self) -> Result<Vec<(String, usize)>, ParseError> {
        let mut members = Vec::new();
        if self.check(&TokenType::RParen) {
            return Ok(members); // empty beamline
        }
        loop {
            members.push(self.parse_member()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        Ok(members)
    }

    /// Member ::= [ Factor "*" ] Identifier
    ///
    /// The repeat count is any factor expression evaluating to a
    /// non-negative integral scalar (`2*x1`, `(3-1)*x1`, `0*x1`).
    /// References are checked against the scope as they are parsed.
    fn parse_member(&mut self) -> Result<(String, usize), ParseError> {
        let bare = matches!(self.peek(), TokenType::Identifier(_))
            && !matches!(self.peek_next(), Some(TokenType::Star));
        if bare {
            let (name, tok) = self.take_identifier("a member reference")?;
            self.check_member_ref(&name, &tok)?;
            return Ok((name, 1));
        }

        let count_start = self.cur().pos_start;
        let count = match self.parse_factor()? {
            Value::Scalar(x) if x >= 0.0 && x.fract() == 0.0 && x <= u32::MAX as f64 => x as usize,
            other => {
                let shown = match &other {
                    Value::Scalar(x) => x.to_string(),
                    v => v.type_name().to_string(),
                };
                return Err(ParseError::Syntax {
                    expected: format!("a non-negative integer repeat count, not {shown}"),
                    src: self.source.clone(),
                    span: self.span_from(count_start),
                });
            }
        };
        self.expect(&TokenType::Star, "'*' after the repeat count")?;
        let (name, tok) = self.take_identifier("a member reference after '*'")?;
        self.check_member_ref(&name, &tok)?;
        Ok((name, count))
    }

    fn check_member_ref(&self, name: &str, tok: &Token) -> Result<(), ParseError> {
        match self.scope.lookup(name) {
            Some(Definition::Element { .. }) | Some(Definition::Beamline(_)) => Ok(()),
            Some(Definition::Assignment(_)) => Err(ParseError::InvalidMember {
                name: name.to_string(),
                src: self.source.clone(),
                span: Some(Self::tok_span(tok)),
            }),
            None => Err(ParseError::UndefinedReference {
                name: name.to_string(),
                src: self.source.clone(),
                span: Self::tok_span(tok),
            }),
        }
    }

    // === Expression Evaluation ===
    //
    // Expressions are folded to a Value as they are parsed; there is no
    // expression AST.

    /// Expr ::= Term { ("+" | "-") Term }
    fn parse_expr(&mut self) -> Result<Value, ParseError> {
        let start = self.cur().pos_start;
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                TokenType::Plus => Op::Add,
                TokenType::Minus => Op::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = self.apply(op, left, right, start)?;
        }
        Ok(left)
    }

    /// Term ::= Factor { ("*" | "/") Factor }
    fn parse_term(&mut self) -> Result<Value, ParseError> {
        let start = self.cur().pos_start;
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                TokenType::Star => Op::Mul,
                TokenType::Slash => Op::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = self.apply(op, left, right, start)?;
        }
        Ok(left)
    }

    /// Factor ::= Number | Text | Vector | FuncCall | Identifier
    ///          | "-" Factor | "(" Expr ")"
    fn parse_factor(&mut self) -> Result<Value, ParseError> {
        let tok = self.cur().clone();
        match &tok.ttype {
            TokenType::Number(n) => {
                self.advance();
                Ok(Value::Scalar(*n))
            }
            TokenType::Text(s) => {
                self.advance();
                Ok(Value::Text(s.clone()))
            }
            TokenType::LBracket => self.parse_vector(),
            TokenType::Minus => {
                self.advance();
                match self.parse_factor()? {
                    Value::Scalar(x) => Ok(Value::Scalar(-x)),
                    Value::Vector(v) => Ok(Value::Vector(v.into_iter().map(|x| -x).collect())),
                    other => Err(ParseError::Syntax {
                        expected: format!(
                            "a numeric operand for unary '-', not {}",
                            other.type_name()
                        ),
                        src: self.source.clone(),
                        span: Self::tok_span(&tok),
                    }),
                }
            }
            TokenType::LParen => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(&TokenType::RParen, "')' to close the group")?;
                Ok(value)
            }
            TokenType::Identifier(name) => {
                if matches!(self.peek_next(), Some(TokenType::LParen)) {
                    return self.parse_funccall();
                }
                let name = name.clone();
                self.advance();
                match self.scope.lookup(&name) {
                    Some(Definition::Assignment(value)) => Ok(value.clone()),
                    Some(_) => Err(ParseError::Syntax {
                        expected: format!("a value ('{name}' is an element declaration)"),
                        src: self.source.clone(),
                        span: Self::tok_span(&tok),
                    }),
                    None => Err(ParseError::UndefinedReference {
                        name,
                        src: self.source.clone(),
                        span: Self::tok_span(&tok),
                    }),
                }
            }
            _ => self.err_expected("a value"),
        }
    }

    /// Vector ::= "[" Expr { "," Expr } "]"
    ///
    /// Each element must evaluate to a scalar.
    fn parse_vector(&mut self) -> Result<Value, ParseError> {
        self.expect(&TokenType::LBracket, "'['")?;
        let mut items = Vec::new();
        loop {
            let elem_start = self.cur().pos_start;
            match self.parse_expr()? {
                Value::Scalar(x) => items.push(x),
                other => {
                    return Err(ParseError::VectorElementType {
                        found: other.type_name(),
                        src: self.source.clone(),
                        span: self.span_from(elem_start),
                    })
                }
            }
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(&TokenType::RBracket, "']' to close the vector")?;
        Ok(Value::Vector(items))
    }

    /// FuncCall ::= Identifier "(" Expr ")"
    ///
    /// The only supported function is `parse("path")`, which triggers a
    /// fully isolated nested parse and yields its configuration.
    fn parse_funccall(&mut self) -> Result<Value, ParseError> {
        let (name, name_tok) = self.take_identifier("a function name")?;
        self.expect(&TokenType::LParen, "'(' after the function name")?;
        if name != "parse" {
            return Err(ParseError::UnknownFunction {
                name,
                src: self.source.clone(),
                span: Self::tok_span(&name_tok),
            });
        }
        let arg_start = self.cur().pos_start;
        let arg = self.parse_expr()?;
        let arg_span = self.span_from(arg_start);
        self.expect(&TokenType::RParen, "')' to close the call")?;
        let path = match arg {
            Value::Text(path) => path,
            other => {
                return Err(ParseError::IncludeArgument {
                    found: other.type_name(),
                    src: self.source.clone(),
                    span: arg_span,
                })
            }
        };
        self.resolve_include(&path, arg_span)
    }

    /// Runs the whole pipeline against an included file. The nested parse
    /// owns a fresh scope; only the include stack is threaded through so
    /// cycles are caught instead of recursing forever.
    fn resolve_include(&self, path: &str, span: SourceSpan) -> Result<Value, ParseError> {
        let resolved = match &self.base_dir {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        };
        let canonical = resolved
            .canonicalize()
            .map_err(|e| ParseError::IncludeIo {
                path: path.to_string(),
                reason: e.to_string(),
                src: self.source.clone(),
                span,
            })?;

        if self.include_stack.contains(&canonical) {
            let chain = self
                .include_stack
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ParseError::IncludeCycle {
                path: path.to_string(),
                chain: format!("{chain} -> {}", canonical.display()),
                src: self.source.clone(),
                span,
            });
        }

        let bytes = std::fs::read(&canonical).map_err(|e| ParseError::IncludeIo {
            path: path.to_string(),
            reason: e.to_string(),
            src: self.source.clone(),
            span,
        })?;

        let mut stack = self.include_stack.clone();
        stack.push(canonical.clone());
        let nested_name = canonical.display().to_string();
        let nested_base = canonical.parent().map(Path::to_path_buf);
        let mut nested = Parser::with_includes(&bytes, &nested_name, nested_base, stack)?;
        let config = nested.parse_config()?;
        Ok(Value::Config(vec![config]))
    }

    // === Beamline Expansion ===

    /// Expands a beamline into the flat ordered instance sequence. Every
    /// repetition is an independent copy of the referenced element's
    /// property map; nested beamlines splice their own expansion in place.
    fn expand_line(
        &self,
        name: &str,
        active: &mut Vec<String>,
        out: &mut Vec<Config>,
    ) -> Result<(), ParseError> {
        if active.iter().any(|n| n == name) {
            return Err(ParseError::RecursiveBeamline {
                name: name.to_string(),
                src: self.source.clone(),
            });
        }
        let members = match self.scope.lookup(name) {
            Some(Definition::Beamline(members)) => members.clone(),
            _ => {
                return Err(ParseError::InvalidMember {
                    name: name.to_string(),
                    src: self.source.clone(),
                    span: None,
                })
            }
        };
        active.push(name.to_string());
        for (ref_name, count) in &members {
            for _ in 0..*count {
                match self.scope.lookup(ref_name) {
                    Some(Definition::Element { etype, properties }) => {
                        let mut instance = properties.clone();
                        instance.insert("name", Value::Text(ref_name.clone()));
                        instance.insert("type", Value::Text(etype.clone()));
                        instance.sort_keys();
                        out.push(instance);
                    }
                    Some(Definition::Beamline(_)) => {
                        self.expand_line(ref_name, active, out)?;
                    }
                    _ => {
                        return Err(ParseError::InvalidMember {
                            name: ref_name.clone(),
                            src: self.source.clone(),
                            span: None,
                        })
                    }
                }
            }
        }
        active.pop();
        Ok(())
    }

    // === Evaluation Helpers ===

    fn apply(&self, op: Op, left: Value, right: Value, start: usize) -> Result<Value, ParseError> {
        match (left, right) {
            (Value::Scalar(a), Value::Scalar(b)) => {
                let result = op.apply(a, b);
                if op == Op::Div && !result.is_finite() {
                    return Err(ParseError::NonFiniteDivision {
                        src: self.source.clone(),
                        span: self.span_from(start),
                    });
                }
                Ok(Value::Scalar(result))
            }
            (Value::Vector(a), Value::Vector(b)) => {
                if a.len() != b.len() {
                    return Err(ParseError::VectorLength {
                        op: op.symbol(),
                        left: a.len(),
                        right: b.len(),
                        src: self.source.clone(),
                        span: self.span_from(start),
                    });
                }
                let result: Vec<f64> = a
                    .iter()
                    .zip(b.iter())
                    .map(|(&x, &y)| op.apply(x, y))
                    .collect();
                if op == Op::Div && result.iter().any(|x| !x.is_finite()) {
                    return Err(ParseError::NonFiniteDivision {
                        src: self.source.clone(),
                        span: self.span_from(start),
                    });
                }
                Ok(Value::Vector(result))
            }
            (left, right) => Err(ParseError::TypeMismatch {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
                src: self.source.clone(),
                span: self.span_from(start),
            }),
        }
    }

    // === Tokenizer Helper Methods ===

    fn cur(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenType {
        &self.cur().ttype
    }

    fn peek_next(&self) -> Option<&TokenType> {
        self.tokens.get(self.position + 1).map(|t| &t.ttype)
    }

    fn advance(&mut self) -> Token {
        let token = self.cur().clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, ttype: &TokenType) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(ttype)
    }

    fn match_token(&mut self, ttype: &TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ttype: &TokenType, expected: &str) -> Result<Token, ParseError> {
        if self.check(ttype) {
            Ok(self.advance())
        } else {
            self.err_expected(expected)
        }
    }

    fn take_identifier(&mut self, expected: &str) -> Result<(String, Token), ParseError> {
        if let TokenType::Identifier(name) = self.peek() {
            let name = name.clone();
            let token = self.advance();
            Ok((name, token))
        } else {
            self.err_expected(expected)
        }
    }

    fn err_expected<T>(&self, expected: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::Syntax {
            expected: expected.into(),
            src: self.source.clone(),
            span: Self::tok_span(self.cur()),
        })
    }

    fn tok_span(token: &Token) -> SourceSpan {
        (token.pos_start, token.pos_end - token.pos_start).into()
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: usize) -> SourceSpan {
        let end = self
            .tokens
            .get(self.position.saturating_sub(1))
            .map(|t| t.pos_end)
            .unwrap_or(start)
            .max(start);
        (start, end - start).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn parse_ok(source: &str) -> Config {
        let mut parser = Parser::new(source.as_bytes(), "test.lat").unwrap();
        match parser.parse_config() {
            Ok(config) => config,
            Err(err) => {
                let report = Report::new(err);
                panic!("{:#}", report);
            }
        }
    }

    fn parse_err(source: &str) -> ParseError {
        let mut parser = match Parser::new(source.as_bytes(), "test.lat") {
            Ok(p) => p,
            Err(e) => return e,
        };
        match parser.parse_config() {
            Ok(config) => panic!("expected parse error, got {:?}", config),
            Err(err) => err,
        }
    }

    fn elements(config: &Config) -> &[Config] {
        config
            .get("elements")
            .and_then(Value::as_configs)
            .expect("config has an elements list")
    }

    #[test]
    fn test_minimal_lattice() {
        let config = parse_ok("hello = 42;\nx1: drift, L=4;\nfoo: LINE = (x1, x1);\n");

        // Canonical order is alphabetical: elements, hello, name.
        assert_eq!(
            config.keys().collect::<Vec<_>>(),
            vec!["elements", "hello", "name"]
        );
        assert_eq!(config.get("hello"), Some(&Value::Scalar(42.0)));
        assert_eq!(config.get("name"), Some(&Value::Text("foo".into())));

        let elems = elements(&config);
        assert_eq!(elems.len(), 2);
        for inst in elems {
            assert_eq!(
                inst.keys().collect::<Vec<_>>(),
                vec!["L", "name", "type"]
            );
            assert_eq!(inst.get("L"), Some(&Value::Scalar(4.0)));
            assert_eq!(inst.get("name"), Some(&Value::Text("x1".into())));
            assert_eq!(inst.get("type"), Some(&Value::Text("drift".into())));
        }
    }

    #[test]
    fn test_identifiers_with_embedded_colons() {
        let config = parse_ok(
            "hello = 42;\nx1: drift, L=4;\nx:2: quad, L=1;\nf:oo: LINE = (2*x1, x:2);\n",
        );
        assert_eq!(config.get("name"), Some(&Value::Text("f:oo".into())));
        let elems = elements(&config);
        assert_eq!(elems.len(), 3);
        assert_eq!(elems[2].get("name"), Some(&Value::Text("x:2".into())));
        assert_eq!(elems[2].get("type"), Some(&Value::Text("quad".into())));
    }

    #[test]
    fn test_repeat_counts_and_arithmetic() {
        let config = parse_ok("hello = 4*10--2;\nx1: drift, L=4;\nfoo: LINE = (0*x1, (3-1)*x1);\n");
        assert_eq!(config.get("hello"), Some(&Value::Scalar(42.0)));
        assert_eq!(elements(&config).len(), 2);
    }

    #[test]
    fn test_line_references_expand_in_order() {
        let config = parse_ok(
            "S: source;\nx1: drift, L=4;\nx2: quad, L=1;\nfoo: LINE = (S, 2*x1, x2);\n",
        );
        let names: Vec<&Value> = elements(&config)
            .iter()
            .map(|e| e.get("name").unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                &Value::Text("S".into()),
                &Value::Text("x1".into()),
                &Value::Text("x1".into()),
                &Value::Text("x2".into()),
            ]
        );
    }

    #[test]
    fn test_nested_beamlines_splice_flat() {
        let config = parse_ok(
            "a: drift, L=1;\nb: quad, L=2;\ninner: LINE = (a, b);\nouter: LINE = (2*inner, a);\n",
        );
        let names: Vec<&str> = elements(&config)
            .iter()
            .map(|e| e.get("name").and_then(Value::as_text).unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "a", "b", "a"]);
        assert_eq!(config.get("name"), Some(&Value::Text("outer".into())));
    }

    #[test]
    fn test_vectors() {
        let config =
            parse_ok("hello = [1,2, 3, 4];\nx1: drift, L=4, extra = [1, 3, 5];\nfoo: LINE = (x1, x1);\n");
        assert_eq!(
            config.get("hello"),
            Some(&Value::Vector(vec![1.0, 2.0, 3.0, 4.0]))
        );
        let elems = elements(&config);
        assert_eq!(elems[0].get("extra"), Some(&Value::Vector(vec![1.0, 3.0, 5.0])));
        assert_eq!(elems.len(), 2);
        assert_eq!(elems[0], elems[1]);
    }

    #[test]
    fn test_vector_arithmetic_is_elementwise() {
        let config = parse_ok("a = [1, 2];\nb = a + [3, 4];\nx: drift;\nl: LINE = (x);\n");
        assert_eq!(config.get("b"), Some(&Value::Vector(vec![4.0, 6.0])));
    }

    #[test]
    fn test_assignments_keep_final_value() {
        let config = parse_ok("a = 1;\na = a + 1;\nx: drift;\nl: LINE = (x);\n");
        assert_eq!(config.get("a"), Some(&Value::Scalar(2.0)));
    }

    #[test]
    fn test_control_byte_in_text_is_preserved() {
        let config =
            parse_ok("hello = \"test\x1f\";\nx1: drift, L=4; # comments are ignored\nfoo: LINE = (x1, x1);\n");
        assert_eq!(config.get("hello"), Some(&Value::Text("test\x1f".into())));
    }

    #[test]
    fn test_last_beamline_wins() {
        let config = parse_ok("x: drift;\nfirst: LINE = (x);\nsecond: LINE = (x, x);\n");
        assert_eq!(config.get("name"), Some(&Value::Text("second".into())));
        assert_eq!(elements(&config).len(), 2);
    }

    #[test]
    fn test_instances_are_independent_copies() {
        let config = parse_ok("x1: drift, L=4;\nfoo: LINE = (x1, x1);\n");
        let mut elems = elements(&config).to_vec();
        elems[0].insert("L", Value::Scalar(99.0));
        assert_eq!(elems[1].get("L"), Some(&Value::Scalar(4.0)));
    }

    #[test]
    fn test_empty_input_has_no_beamlines() {
        assert!(matches!(parse_err(""), ParseError::NoBeamlines { .. }));
        assert!(matches!(parse_err("A = 3;"), ParseError::NoBeamlines { .. }));
    }

    #[test]
    fn test_self_reference_fails() {
        match parse_err("A = A;") {
            ParseError::UndefinedReference { name, .. } => assert_eq!(name, "A"),
            other => panic!("expected undefined reference, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_reference_fails() {
        match parse_err("A = B;") {
            ParseError::UndefinedReference { name, .. } => assert_eq!(name, "B"),
            other => panic!("expected undefined reference, got {:?}", other),
        }
    }

    #[test]
    fn test_division_by_zero_fails() {
        assert!(matches!(
            parse_err("foo = 4/0;"),
            ParseError::NonFiniteDivision { .. }
        ));
    }

    #[test]
    fn test_vector_element_must_be_scalar() {
        match parse_err("A = [ 1, \"bar\", ;") {
            ParseError::VectorElementType { found, .. } => assert_eq!(found, "text"),
            other => panic!("expected vector element error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_labels_are_syntax_errors() {
        assert!(matches!(parse_err("bar:: foo;"), ParseError::Syntax { .. }));
        assert!(matches!(parse_err("bar: : foo;"), ParseError::Syntax { .. }));
        assert!(matches!(parse_err(":bar : foo;"), ParseError::Syntax { .. }));
    }

    #[test]
    fn test_unresolved_member_reference() {
        match parse_err("A: line = ( invalid") {
            ParseError::UndefinedReference { name, .. } => assert_eq!(name, "invalid"),
            other => panic!("expected undefined reference, got {:?}", other),
        }
        match parse_err("bar: foo; A: line = ( bar, invalid") {
            ParseError::UndefinedReference { name, .. } => assert_eq!(name, "invalid"),
            other => panic!("expected undefined reference, got {:?}", other),
        }
    }

    #[test]
    fn test_recursive_beamline_via_redefinition() {
        let src = "x: drift;\na: LINE = (x);\nb: LINE = (a);\na: LINE = (b);\n";
        assert!(matches!(
            parse_err(src),
            ParseError::RecursiveBeamline { .. }
        ));
    }

    #[test]
    fn test_unknown_function() {
        match parse_err("a = frobnicate(1);\nx: drift;\nl: LINE = (x);\n") {
            ParseError::UnknownFunction { name, .. } => assert_eq!(name, "frobnicate"),
            other => panic!("expected unknown function, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_vector_mixing_is_a_type_error() {
        assert!(matches!(
            parse_err("a = [1, 2] + 1;"),
            ParseError::TypeMismatch { .. }
        ));
        assert!(matches!(
            parse_err("a = [1, 2] + [1, 2, 3];"),
            ParseError::VectorLength { .. }
        ));
    }
}
