//! Policy source parsing.
//!
//! [`SourceParser`] checks the statement structure only:
//!
//! ```text
//! annotation* ("permit" | "forbid") "(" scope ")" (("when" | "unless") "{" body "}")* ";"
//! annotation := "@" IDENT ( "(" STRING ")" )?
//! ```
//!
//! Scope constraints and condition bodies are carried through as text. Their
//! meaning belongs to the evaluator.

use arbiter_entity::unescape_str;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};
use crate::policy::{Effect, IdOrigin, PolicyParts, SourceLocation, SourceSpan};
use crate::{Policy, PolicyId};

/// Prefix of parser-generated ids: `policy0`, `policy1`, ...
pub const DEFAULT_ID_PREFIX: &str = "policy";

/// Annotation key whose value the parser takes as an author-specified id.
pub const ID_ANNOTATION: &str = "id";

/// Turns policy source text into [`Policy`] values.
pub trait PolicyParser: Send + Sync {
    /// Parses text holding exactly one policy. `id`, when given, becomes the
    /// policy's id.
    fn parse_policy(&self, text: &str, id: Option<&str>) -> PolicyResult<Policy>;

    /// Parses text holding any number of policies, in source order.
    fn parse_policies(&self, text: &str) -> PolicyResult<Vec<Policy>>;
}

/// Built-in structural parser.
///
/// Ids are assigned in this order: an id passed to
/// [`parse_policy`](PolicyParser::parse_policy), then a non-empty `@id("...")`
/// annotation, then `<prefix><index>`. An `@id` counts as chosen by the author,
/// so a set-level id annotation never renames it, even when that annotation
/// names a different key. Only `<prefix><index>` ids are open to renaming.
#[derive(Debug, Clone)]
pub struct SourceParser {
    id_prefix: String,
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::with_id_prefix(DEFAULT_ID_PREFIX)
    }
}

impl SourceParser {
    /// A parser generating `policy0`, `policy1`, ...
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser generating `<prefix>0`, `<prefix>1`, ...
    pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: prefix.into(),
        }
    }

    /// Prefix of generated ids.
    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    fn default_id(&self, statement: &Statement, index: usize) -> (PolicyId, IdOrigin) {
        match statement.annotations.get(ID_ANNOTATION) {
            Some(id) if !id.is_empty() => (PolicyId::new(id.clone()), IdOrigin::Source),
            _ => (
                PolicyId::new(format!("{}{index}", self.id_prefix)),
                IdOrigin::Generated,
            ),
        }
    }
}

impl PolicyParser for SourceParser {
    fn parse_policy(&self, text: &str, id: Option<&str>) -> PolicyResult<Policy> {
        let mut statements = statements(text)?;
        if statements.len() != 1 {
            return Err(match statements.get(1) {
                Some(extra) => PolicyError::syntax(
                    format!("expected a single policy, found {}", statements.len()),
                    Some(extra.span.start),
                ),
                None => PolicyError::syntax("expected a policy, found none", None),
            });
        }
        let Some(statement) = statements.pop() else {
            return Err(PolicyError::syntax("expected a policy, found none", None));
        };

        let (id, id_origin) = match id {
            Some(id) => (PolicyId::from(id), IdOrigin::Caller),
            None => self.default_id(&statement, 0),
        };
        Ok(Policy::from(PolicyParts {
            id,
            id_origin,
            text: text.to_string(),
            annotations: statement.annotations,
            effect: statement.effect,
            span: statement.span,
            is_template: statement.is_template,
        }))
    }

    fn parse_policies(&self, text: &str) -> PolicyResult<Vec<Policy>> {
        let statements = statements(text)?;
        debug!(policies = statements.len(), "parsed policy source");
        Ok(statements
            .into_iter()
            .enumerate()
            .map(|(index, statement)| {
                let (id, id_origin) = self.default_id(&statement, index);
                Policy::from(PolicyParts {
                    id,
                    id_origin,
                    text: text[statement.start..statement.end].to_string(),
                    annotations: statement.annotations,
                    effect: statement.effect,
                    span: statement.span,
                    is_template: statement.is_template,
                })
            })
            .collect())
    }
}

// ─── Lexer ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Number,
    Slot(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    /// Byte offsets into the source, end exclusive.
    start: usize,
    end: usize,
    /// Locations of the first and last character.
    first: SourceLocation,
    last: SourceLocation,
}

impl Token {
    fn is_ident(&self, name: &str) -> bool {
        matches!(&self.tok, Tok::Ident(s) if s == name)
    }

    fn is_punct(&self, c: char) -> bool {
        self.tok == Tok::Punct(c)
    }

    fn describe(&self) -> String {
        match &self.tok {
            Tok::Ident(s) => format!("`{s}`"),
            Tok::Str(_) => "string literal".to_string(),
            Tok::Number => "number".to_string(),
            Tok::Slot(s) => format!("`?{s}`"),
            Tok::Punct(c) => format!("`{c}`"),
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    column: usize,
    prev: SourceLocation,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
            prev: SourceLocation::new(1, 1),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.prev = self.location();
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn tokenize(mut self) -> PolicyResult<(Vec<Token>, SourceLocation)> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            if c == '/' && self.peek_at(1) == Some('/') {
                self.take_while(|c| c != '\n');
                continue;
            }

            let start = self.offset();
            let first = self.location();
            let tok = match c {
                '"' => Tok::Str(self.string(first)?),
                c if c.is_ascii_alphabetic() || c == '_' => Tok::Ident(self.take_while(is_ident_char)),
                c if c.is_ascii_digit() => {
                    self.take_while(|c| c.is_ascii_digit());
                    Tok::Number
                }
                '?' => {
                    self.bump();
                    let name = self.take_while(is_ident_char);
                    if name != "principal" && name != "resource" {
                        return Err(PolicyError::syntax(
                            format!("unknown slot `?{name}`"),
                            Some(first),
                        ));
                    }
                    Tok::Slot(name)
                }
                c => {
                    self.bump();
                    Tok::Punct(c)
                }
            };
            tokens.push(Token {
                tok,
                start,
                end: self.offset(),
                first,
                last: self.prev,
            });
        }
        Ok((tokens, self.location()))
    }

    fn string(&mut self, first: SourceLocation) -> PolicyResult<String> {
        self.bump();
        let mut body = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    body.push('\\');
                    if let Some(c) = self.bump() {
                        body.push(c);
                    }
                }
                Some(c) => body.push(c),
                None => {
                    return Err(PolicyError::syntax(
                        "unterminated string literal",
                        Some(first),
                    ));
                }
            }
        }
        unescape_str(&body).map_err(|reason| {
            PolicyError::syntax(format!("invalid string literal: {reason}"), Some(first))
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ─── Parser ─────────────────────────────────────────────────────────────

/// One parsed policy statement.
struct Statement {
    annotations: BTreeMap<String, String>,
    effect: Effect,
    start: usize,
    end: usize,
    span: SourceSpan,
    is_template: bool,
}

const SCOPE_PARTS: [&str; 3] = ["principal", "action", "resource"];

fn statements(source: &str) -> PolicyResult<Vec<Statement>> {
    let (tokens, eof) = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        eof,
    };
    let mut out = Vec::new();
    while parser.pos < parser.tokens.len() {
        out.push(parser.statement()?);
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: SourceLocation,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_is_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    fn unexpected(&self, token: Option<&Token>, expected: &str) -> PolicyError {
        match token {
            Some(t) => PolicyError::syntax(
                format!("expected {expected}, found {}", t.describe()),
                Some(t.first),
            ),
            None => PolicyError::syntax(
                format!("expected {expected}, found end of input"),
                Some(self.eof),
            ),
        }
    }

    fn expect_punct(&mut self, c: char) -> PolicyResult<Token> {
        match self.next() {
            Some(t) if t.is_punct(c) => Ok(t),
            other => Err(self.unexpected(other.as_ref(), &format!("`{c}`"))),
        }
    }

    fn statement(&mut self) -> PolicyResult<Statement> {
        let Some(head) = self.peek().cloned() else {
            return Err(self.unexpected(None, "a policy"));
        };

        let annotations = self.annotations()?;
        let effect = match self.next() {
            Some(t) if t.is_ident("permit") => Effect::Permit,
            Some(t) if t.is_ident("forbid") => Effect::Forbid,
            other => return Err(self.unexpected(other.as_ref(), "`permit` or `forbid`")),
        };

        let open = self.expect_punct('(')?;
        let scope = self.group(&open, ')')?;
        check_scope(&scope, &open)?;
        let is_template = scope.iter().any(|t| matches!(t.tok, Tok::Slot(_)));

        while let Some(keyword) = self
            .peek()
            .filter(|t| t.is_ident("when") || t.is_ident("unless"))
            .cloned()
        {
            self.pos += 1;
            let open = self.expect_punct('{')?;
            if self.group(&open, '}')?.is_empty() {
                return Err(PolicyError::syntax(
                    format!("empty {} condition", keyword.describe()),
                    Some(keyword.first),
                ));
            }
        }

        let semi = self.expect_punct(';')?;
        Ok(Statement {
            annotations,
            effect,
            start: head.start,
            end: semi.end,
            span: SourceSpan {
                start: head.first,
                end: semi.last,
            },
            is_template,
        })
    }

    fn annotations(&mut self) -> PolicyResult<BTreeMap<String, String>> {
        let mut annotations = BTreeMap::new();
        while self.peek_is_punct('@') {
            self.pos += 1;
            let (key, at) = match self.next() {
                Some(Token {
                    tok: Tok::Ident(name),
                    first,
                    ..
                }) => (name, first),
                other => return Err(self.unexpected(other.as_ref(), "an annotation name")),
            };
            if annotations.contains_key(&key) {
                return Err(PolicyError::syntax(
                    format!("duplicate annotation `@{key}`"),
                    Some(at),
                ));
            }

            let value = if self.peek_is_punct('(') {
                self.pos += 1;
                let value = match self.next() {
                    Some(Token {
                        tok: Tok::Str(value),
                        ..
                    }) => value,
                    other => {
                        return Err(self.unexpected(other.as_ref(), "a string literal"));
                    }
                };
                self.expect_punct(')')?;
                value
            } else {
                String::new()
            };
            annotations.insert(key, value);
        }
        Ok(annotations)
    }

    /// Collects the tokens between `open` and its matching `closer`.
    fn group(&mut self, open: &Token, closer: char) -> PolicyResult<Vec<Token>> {
        let mut stack = vec![(closer, open.first)];
        let mut inner = Vec::new();
        while let Some(token) = self.next() {
            if let Tok::Punct(c) = token.tok {
                match c {
                    '(' => stack.push((')', token.first)),
                    '[' => stack.push((']', token.first)),
                    '{' => stack.push(('}', token.first)),
                    ')' | ']' | '}' => {
                        let expected = stack.pop().map(|(e, _)| e);
                        if expected != Some(c) {
                            return Err(PolicyError::syntax(
                                format!(
                                    "mismatched `{c}`, expected `{}`",
                                    expected.unwrap_or(closer)
                                ),
                                Some(token.first),
                            ));
                        }
                        if stack.is_empty() {
                            return Ok(inner);
                        }
                    }
                    _ => {}
                }
            }
            inner.push(token);
        }
        let (expected, opened_at) = stack.last().copied().unwrap_or((closer, open.first));
        Err(PolicyError::syntax(
            format!("unclosed bracket opened at {opened_at}, expected `{expected}`"),
            Some(self.eof),
        ))
    }
}

/// The scope is exactly `principal ..., action ..., resource ...`.
fn check_scope(scope: &[Token], open: &Token) -> PolicyResult<()> {
    let mut parts: Vec<Vec<&Token>> = vec![Vec::new()];
    let mut depth = 0usize;
    for token in scope {
        match token.tok {
            Tok::Punct('(' | '[' | '{') => depth += 1,
            Tok::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
            Tok::Punct(',') if depth == 0 => {
                parts.push(Vec::new());
                continue;
            }
            _ => {}
        }
        if let Some(part) = parts.last_mut() {
            part.push(token);
        }
    }

    if parts.len() != SCOPE_PARTS.len() {
        return Err(PolicyError::syntax(
            format!(
                "policy scope must have three parts (principal, action, resource), found {}",
                parts.len()
            ),
            Some(open.first),
        ));
    }
    for (part, expected) in parts.iter().zip(SCOPE_PARTS) {
        match part.first() {
            Some(t) if t.is_ident(expected) => {}
            Some(t) => {
                return Err(PolicyError::syntax(
                    format!("expected `{expected}` in policy scope, found {}", t.describe()),
                    Some(t.first),
                ));
            }
            None => {
                return Err(PolicyError::syntax(
                    format!("missing `{expected}` in policy scope"),
                    Some(open.first),
                ));
            }
        }
    }
    Ok(())
}
