//! Rule template parsing and evaluation.
//!
//! Templates are plain text with `{{ ... }}` actions. An action is a
//! pipeline of commands separated by `|`; each command after the first
//! receives the previous result as its final argument.
//!
//! ```text
//! Host(`{{ .Name | trimPrefix "/" | splitList "/" | reverse | join "." }}.example.com`)
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::rule::funcs::{self, Func};

/// Error type for template parsing and evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("function {0:?} not defined")]
    UnknownFunction(String),

    #[error("can't evaluate field {0}")]
    UnknownField(String),

    #[error("error calling {name}: {message}")]
    Call { name: String, message: String },

    #[error("{0}")]
    Render(String),
}

/// Data visible to a template: `.Name` and `.Labels`.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub name: &'a str,
    pub labels: &'a BTreeMap<String, String>,
}

/// A value flowing through a pipeline.
#[derive(Debug, Clone)]
pub enum Value<'c> {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value<'c>>),
    Labels(&'c BTreeMap<String, String>),
    Context(RuleContext<'c>),
}

impl Value<'_> {
    /// Text form used when a value is written to the output.
    pub fn render(&self) -> Result<String, String> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::List(items) => {
                let parts = items.iter().map(Value::render).collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", parts.join(" ")))
            }
            Value::Labels(labels) => {
                let mut out = String::from("map[");
                for (i, (k, v)) in labels.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{}:{}", k, v);
                }
                out.push(']');
                Ok(out)
            }
            Value::Context(_) => Err("can't print the template context".to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Labels(_) => "map",
            Value::Context(_) => "context",
        }
    }
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Action(Pipeline),
}

#[derive(Debug, Clone)]
struct Pipeline {
    commands: Vec<Command>,
}

#[derive(Debug, Clone)]
enum Command {
    Call { name: String, func: Func, args: Vec<Operand> },
    Operand(Operand),
}

#[derive(Debug, Clone)]
enum Operand {
    /// `.`, `.Name`, `.Labels.key`; empty for the dot itself.
    Field(Vec<String>),
    Str(String),
    Int(i64),
    Bool(bool),
    Pipeline(Box<Pipeline>),
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Parser::new(source).parse_template()
    }

    pub fn execute(&self, ctx: RuleContext<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Action(pipeline) => {
                    let value = eval_pipeline(pipeline, ctx)?;
                    out.push_str(&value.render().map_err(TemplateError::Render)?);
                }
            }
        }
        Ok(out)
    }
}

fn eval_pipeline<'c>(pipeline: &Pipeline, ctx: RuleContext<'c>) -> Result<Value<'c>, TemplateError> {
    let mut piped: Option<Value<'c>> = None;
    for command in &pipeline.commands {
        let value = match command {
            Command::Operand(operand) => eval_operand(operand, ctx)?,
            Command::Call { name, func, args } => {
                let mut values = args
                    .iter()
                    .map(|arg| eval_operand(arg, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                values.extend(piped.take());
                func(ctx, values).map_err(|message| TemplateError::Call {
                    name: name.clone(),
                    message,
                })?
            }
        };
        piped = Some(value);
    }
    piped.ok_or_else(|| TemplateError::Render("empty pipeline".to_string()))
}

fn eval_operand<'c>(operand: &Operand, ctx: RuleContext<'c>) -> Result<Value<'c>, TemplateError> {
    match operand {
        Operand::Str(s) => Ok(Value::Str(s.clone())),
        Operand::Int(i) => Ok(Value::Int(*i)),
        Operand::Bool(b) => Ok(Value::Bool(*b)),
        Operand::Pipeline(p) => eval_pipeline(p, ctx),
        Operand::Field(path) => eval_field(path, ctx),
    }
}

fn eval_field<'c>(path: &[String], ctx: RuleContext<'c>) -> Result<Value<'c>, TemplateError> {
    let unknown = || TemplateError::UnknownField(format!(".{}", path.join(".")));
    match path {
        [] => Ok(Value::Context(ctx)),
        [name] if name == "Name" => Ok(Value::Str(ctx.name.to_string())),
        [labels] if labels == "Labels" => Ok(Value::Labels(ctx.labels)),
        [labels, key] if labels == "Labels" => {
            Ok(Value::Str(ctx.labels.get(key).cloned().unwrap_or_default()))
        }
        _ => Err(unknown()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Field(Vec<String>),
    Ident(String),
    Str(String),
    Int(i64),
    Bool(bool),
    Pipe,
    LParen,
    RParen,
    /// `}}`, or `-}}` when trimming the text that follows.
    Close { trim: bool },
    Eof,
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    peeked: Option<(usize, Token)>,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0, peeked: None }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax { offset, message: message.into() }
    }

    fn parse_template(mut self) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut trim_next = false;

        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            let open = rest.find("{{");
            let raw_text = &rest[..open.unwrap_or(rest.len())];
            self.pos += raw_text.len();

            let mut text = if trim_next { raw_text.trim_start() } else { raw_text };

            if open.is_none() {
                push_text(&mut segments, text);
                break;
            }

            let action_start = self.pos;
            self.pos += 2;
            if self.trim_marker() {
                text = text.trim_end();
                self.pos += 1;
            }
            push_text(&mut segments, text);

            self.skip_whitespace();
            if self.src[self.pos..].starts_with("/*") {
                let end = self.src[self.pos..]
                    .find("*/")
                    .ok_or_else(|| self.error(action_start, "unclosed comment"))?;
                self.pos += end + 2;
                trim_next = self.expect_close()?;
                continue;
            }

            let pipeline = self.parse_pipeline()?;
            trim_next = self.expect_close()?;
            segments.push(Segment::Action(pipeline));
        }

        Ok(Template { segments })
    }

    /// `-` followed by whitespace right after `{{`.
    fn trim_marker(&self) -> bool {
        let mut chars = self.src[self.pos..].chars();
        chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
    }

    fn expect_close(&mut self) -> Result<bool, TemplateError> {
        let (offset, token) = self.next_token()?;
        match token {
            Token::Close { trim } => Ok(trim),
            other => Err(self.error(offset, format!("unexpected {:?} in action", other))),
        }
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, TemplateError> {
        let mut commands = vec![self.parse_command()?];
        while matches!(self.peek_token()?, Token::Pipe) {
            self.next_token()?;
            let offset = self.pos;
            let command = self.parse_command()?;
            if matches!(command, Command::Operand(_)) {
                return Err(self.error(offset, "can't give argument to non-function"));
            }
            commands.push(command);
        }
        Ok(Pipeline { commands })
    }

    fn parse_command(&mut self) -> Result<Command, TemplateError> {
        let (offset, token) = self.next_token()?;
        if let Token::Ident(name) = token {
            let func = funcs::lookup(&name).ok_or(TemplateError::UnknownFunction(name.clone()))?;
            let mut args = Vec::new();
            while let Some(arg) = self.parse_operand()? {
                args.push(arg);
            }
            return Ok(Command::Call { name, func, args });
        }

        self.peeked = Some((offset, token));
        let operand = self
            .parse_operand()?
            .ok_or_else(|| self.error(offset, "missing value for command"))?;
        if self.parse_operand()?.is_some() {
            return Err(self.error(offset, "can't give argument to non-function"));
        }
        Ok(Command::Operand(operand))
    }

    /// The next operand, or `None` at a pipeline boundary.
    fn parse_operand(&mut self) -> Result<Option<Operand>, TemplateError> {
        match self.peek_token()? {
            Token::Pipe | Token::RParen | Token::Close { .. } | Token::Eof => return Ok(None),
            _ => {}
        }
        let (offset, token) = self.next_token()?;
        let operand = match token {
            Token::Field(path) => Operand::Field(path),
            Token::Str(s) => Operand::Str(s),
            Token::Int(i) => Operand::Int(i),
            Token::Bool(b) => Operand::Bool(b),
            Token::LParen => {
                let inner = self.parse_pipeline()?;
                match self.next_token()? {
                    (_, Token::RParen) => Operand::Pipeline(Box::new(inner)),
                    (at, _) => return Err(self.error(at, "unclosed left paren")),
                }
            }
            Token::Ident(name) => {
                return Err(self.error(offset, format!("function {:?} used as a value; wrap it in parentheses", name)))
            }
            other => return Err(self.error(offset, format!("unexpected {:?}", other))),
        };
        Ok(Some(operand))
    }

    fn peek_token(&mut self) -> Result<&Token, TemplateError> {
        if self.peeked.is_none() {
            let token = self.lex()?;
            self.peeked = Some(token);
        }
        match &self.peeked {
            Some((_, token)) => Ok(token),
            None => Err(self.error(self.pos, "lexer state lost")),
        }
    }

    fn next_token(&mut self) -> Result<(usize, Token), TemplateError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lex(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn lex(&mut self) -> Result<(usize, Token), TemplateError> {
        self.skip_whitespace();
        let had_space = self.src[..self.pos].ends_with(char::is_whitespace);
        let start = self.pos;
        let rest = &self.src[start..];

        let Some(c) = rest.chars().next() else {
            return Ok((start, Token::Eof));
        };

        if rest.starts_with("}}") {
            self.pos += 2;
            return Ok((start, Token::Close { trim: false }));
        }
        if rest.starts_with("-}}") && had_space {
            self.pos += 3;
            return Ok((start, Token::Close { trim: true }));
        }

        let token = match c {
            '|' => {
                self.pos += 1;
                Token::Pipe
            }
            '(' => {
                self.pos += 1;
                Token::LParen
            }
            ')' => {
                self.pos += 1;
                Token::RParen
            }
            '"' => Token::Str(self.lex_quoted(start)?),
            '`' => {
                let end = rest[1..]
                    .find('`')
                    .ok_or_else(|| self.error(start, "unterminated raw string"))?;
                self.pos += end + 2;
                Token::Str(rest[1..end + 1].to_string())
            }
            '.' => Token::Field(self.lex_field()),
            c if c.is_ascii_digit() || (c == '-' && rest[1..].starts_with(|d: char| d.is_ascii_digit())) => {
                let len = 1 + rest[1..].find(|d: char| !d.is_ascii_digit()).unwrap_or(rest.len() - 1);
                let literal = &rest[..len];
                self.pos += len;
                Token::Int(
                    literal
                        .parse()
                        .map_err(|_| self.error(start, format!("bad number {:?}", literal)))?,
                )
            }
            c if c.is_alphabetic() || c == '_' => {
                let len = rest.find(|d: char| !is_ident_char(d)).unwrap_or(rest.len());
                self.pos += len;
                match &rest[..len] {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    ident => Token::Ident(ident.to_string()),
                }
            }
            other => return Err(self.error(start, format!("unexpected character {:?}", other))),
        };
        Ok((start, token))
    }

    fn lex_quoted(&mut self, start: usize) -> Result<String, TemplateError> {
        let mut out = String::new();
        let mut chars = self.src[start + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos = start + 1 + i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, '"')) => out.push('"'),
                    Some((_, other)) => {
                        return Err(self.error(start, format!("unknown escape sequence \\{}", other)))
                    }
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(self.error(start, "unterminated quoted string"))
    }

    fn lex_field(&mut self) -> Vec<String> {
        let mut path = Vec::new();
        while self.src[self.pos..].starts_with('.') {
            let rest = &self.src[self.pos + 1..];
            let len = rest.find(|d: char| !is_ident_char(d)).unwrap_or(rest.len());
            if len == 0 {
                if path.is_empty() {
                    self.pos += 1;
                }
                break;
            }
            path.push(rest[..len].to_string());
            self.pos += 1 + len;
        }
        path
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text(text.to_string()));
    }
}
