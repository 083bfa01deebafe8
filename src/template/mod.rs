// src/template/mod.rs

//! Placeholder expansion.
//!
//! A [`Template`] is the command plus its arguments, parsed once into
//! literal text and [`Token`]s. Expanding it for a record is pure: no state,
//! no IO.
//!
//! - [`token`] owns the vocabulary and the ordered matcher table.
//! - [`resolve`] owns the string helpers each token resolves through.

pub mod resolve;
pub mod token;

use std::borrow::Cow;

use crate::config::RunConfig;
use crate::errors::{PipeError, Result};

pub use resolve::split_fields;
pub use token::{TOKEN_ORDER, Token, TokenKind, match_token};

/// Per-job values that placeholders can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobMeta {
    pub number: u64,
    pub slot: usize,
    /// Known only when the run buffered its input.
    pub total: Option<u64>,
}

/// Everything needed to expand one argument.
#[derive(Debug, Clone, Copy)]
pub struct ExpandContext<'a> {
    /// Record text, already trimmed if trimming is on.
    pub record: &'a str,
    pub meta: JobMeta,
    pub delimiter: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// One template argument, split into literal text and tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArg {
    segments: Vec<Segment>,
}

impl TemplateArg {
    /// Scan `arg` left to right, matching tokens by priority at each
    /// position. Expanded text is never rescanned.
    pub fn parse(arg: &str, replace: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while let Some(ch) = arg[pos..].chars().next() {
            if let Some((token, len)) = match_token(&arg[pos..], replace) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Token(token));
                pos += len;
            } else {
                literal.push(ch);
                pos += ch.len_utf8();
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    pub fn has_tokens(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Token(_)))
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Token(t) => Some(*t),
            Segment::Literal(_) => None,
        })
    }

    pub fn expand(&self, ctx: &ExpandContext<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) => out.push_str(&resolve_token(*token, ctx)),
            }
        }
        out
    }
}

fn resolve_token<'a>(token: Token, ctx: &ExpandContext<'a>) -> Cow<'a, str> {
    let rec = ctx.record;
    match token {
        Token::Total => ctx
            .meta
            .total
            .map(|t| Cow::Owned(t.to_string()))
            .unwrap_or(Cow::Borrowed("")),
        Token::JobNumber => Cow::Owned(ctx.meta.number.to_string()),
        Token::JobSlot => Cow::Owned(ctx.meta.slot.to_string()),
        Token::Length => Cow::Owned(resolve::char_len(rec).to_string()),
        Token::Extension => Cow::Borrowed(resolve::extension(rec)),
        Token::BasenameNoExt => Cow::Borrowed(resolve::basename_no_ext(rec)),
        Token::Dirname => Cow::Borrowed(resolve::dirname(rec)),
        Token::Basename => Cow::Borrowed(resolve::basename(rec)),
        Token::StripExt => Cow::Borrowed(resolve::strip_ext(rec)),
        Token::Field(i) => Cow::Borrowed(resolve::field(rec, ctx.delimiter, i)),
        Token::FieldFromEnd(i) => Cow::Borrowed(resolve::field_from_end(rec, ctx.delimiter, i)),
        Token::Record => Cow::Borrowed(rec),
    }
}

/// Expand a single template argument in one go.
pub fn expand_arg(arg: &str, replace: &str, ctx: &ExpandContext<'_>) -> String {
    TemplateArg::parse(arg, replace).expand(ctx)
}

/// The command template for a run.
#[derive(Debug, Clone)]
pub struct Template {
    args: Vec<TemplateArg>,
    delimiter: String,
    append_record: bool,
}

impl Template {
    /// Parse `argv` (command first) using the run's replace string and
    /// delimiter.
    pub fn new(argv: Vec<String>, cfg: &RunConfig) -> Result<Self> {
        if argv.is_empty() {
            return Err(PipeError::Usage("missing command".to_string()));
        }

        let args: Vec<TemplateArg> = argv
            .iter()
            .map(|a| TemplateArg::parse(a, &cfg.replace))
            .collect();
        let has_tokens = args.iter().any(TemplateArg::has_tokens);

        Ok(Self {
            args,
            delimiter: cfg.field_delimiter.clone(),
            append_record: !has_tokens && !cfg.feed_stdin,
        })
    }

    /// No placeholder anywhere and records are not fed on stdin: the record
    /// becomes the final argument.
    pub fn appends_record(&self) -> bool {
        self.append_record
    }

    /// Whether expansion needs the total record count up front.
    pub fn uses_total(&self) -> bool {
        self.args
            .iter()
            .flat_map(TemplateArg::tokens)
            .any(|t| t == Token::Total)
    }

    /// Produce the argument vector for one job.
    pub fn expand(&self, meta: JobMeta, record: &str) -> Vec<String> {
        let ctx = ExpandContext {
            record,
            meta,
            delimiter: &self.delimiter,
        };

        let mut argv: Vec<String> = self.args.iter().map(|a| a.expand(&ctx)).collect();
        if self.append_record {
            argv.push(record.to_string());
        }
        argv
    }
}
