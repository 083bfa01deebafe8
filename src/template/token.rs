// src/template/token.rs

//! Placeholder vocabulary and the ordered matcher table.
//!
//! Scanning a template argument tries [`TOKEN_ORDER`] front to back at every
//! position; the first rule that matches wins. The full-record token comes
//! last because its spelling is user-configurable and the most general.

use std::sync::LazyLock;

use regex::Regex;

/// A recognised placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `{##}`: number of records in the run.
    Total,
    /// `{#}`: 1-based job number.
    JobNumber,
    /// `{%}`: worker slot.
    JobSlot,
    /// `{len}`: characters in the record.
    Length,
    /// `{ext}`: extension of the basename.
    Extension,
    /// `{/.}`: basename without extension.
    BasenameNoExt,
    /// `{//}`: directory part.
    Dirname,
    /// `{/}`: basename.
    Basename,
    /// `{.}`: record without its extension.
    StripExt,
    /// `{N}`: 1-based field.
    Field(usize),
    /// `{-N}`: field counted from the end.
    FieldFromEnd(usize),
    /// `{}` or the `--replace` spelling: the whole record.
    Record,
}

/// Kinds of rule, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Total,
    JobNumber,
    JobSlot,
    Length,
    Extension,
    BasenameNoExt,
    Dirname,
    Basename,
    StripExt,
    Field,
    FieldFromEnd,
    Record,
}

/// The resolution order. Changing it changes what templates mean.
pub const TOKEN_ORDER: [TokenKind; 12] = [
    TokenKind::Total,
    TokenKind::JobNumber,
    TokenKind::JobSlot,
    TokenKind::Length,
    TokenKind::Extension,
    TokenKind::BasenameNoExt,
    TokenKind::Dirname,
    TokenKind::Basename,
    TokenKind::StripExt,
    TokenKind::Field,
    TokenKind::FieldFromEnd,
    TokenKind::Record,
];

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{(-?)([1-9][0-9]*)\}").expect("field token regex"));

impl TokenKind {
    /// Fixed spelling and token, if this kind has one.
    pub fn literal(self) -> Option<(&'static str, Token)> {
        match self {
            TokenKind::Total => Some(("{##}", Token::Total)),
            TokenKind::JobNumber => Some(("{#}", Token::JobNumber)),
            TokenKind::JobSlot => Some(("{%}", Token::JobSlot)),
            TokenKind::Length => Some(("{len}", Token::Length)),
            TokenKind::Extension => Some(("{ext}", Token::Extension)),
            TokenKind::BasenameNoExt => Some(("{/.}", Token::BasenameNoExt)),
            TokenKind::Dirname => Some(("{//}", Token::Dirname)),
            TokenKind::Basename => Some(("{/}", Token::Basename)),
            TokenKind::StripExt => Some(("{.}", Token::StripExt)),
            TokenKind::Field | TokenKind::FieldFromEnd | TokenKind::Record => None,
        }
    }

    /// Try to match this rule at the start of `rest`.
    ///
    /// Returns the token and the number of bytes it spans.
    fn match_prefix(self, rest: &str, replace: &str) -> Option<(Token, usize)> {
        if let Some((lit, token)) = self.literal() {
            return rest.starts_with(lit).then_some((token, lit.len()));
        }

        match self {
            TokenKind::Field | TokenKind::FieldFromEnd => {
                let caps = FIELD_RE.captures(rest)?;
                let negative = !caps[1].is_empty();
                if negative != (self == TokenKind::FieldFromEnd) {
                    return None;
                }
                // Absurdly large indices stay literal text.
                let index: usize = caps[2].parse().ok()?;
                let len = caps[0].len();
                let token = if negative {
                    Token::FieldFromEnd(index)
                } else {
                    Token::Field(index)
                };
                Some((token, len))
            }
            TokenKind::Record if !replace.is_empty() => rest
                .starts_with(replace)
                .then(|| (Token::Record, replace.len())),
            _ => None,
        }
    }
}

/// Match the highest-priority token at the start of `rest`.
pub fn match_token(rest: &str, replace: &str) -> Option<(Token, usize)> {
    TOKEN_ORDER
        .iter()
        .find_map(|kind| kind.match_prefix(rest, replace))
}
