// src/pipe/mod.rs - pipe trait, static registry, query parsing

pub mod collapse_nums;
pub mod delete;

use crate::error::SyntaxError;
use crate::field_set::FieldSet;
use crate::lexer::{Lexer, Token};
use crate::row::Row;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use collapse_nums::CollapseNumsPipe;
pub use delete::DeletePipe;

/// One stage of a query pipeline. Values are immutable once parsed and are
/// shared read-only across worker threads; `process_block` must therefore
/// not rely on any per-pipe mutable state.
pub trait Pipe: Send + Sync + fmt::Display {
    /// Stage keyword, as written in the query.
    fn name(&self) -> &'static str;

    /// Planner pushdown: given the field sets needed/unneeded downstream of
    /// this pipe, rewrite them into the sets needed/unneeded upstream.
    fn update_needed_fields(&self, needed: &mut FieldSet, unneeded: &mut FieldSet);

    /// Transform one block of rows in place.
    fn process_block(&self, rows: &mut Vec<Row>);
}

type ParsePipeFn = fn(&mut Lexer) -> Result<Arc<dyn Pipe>, SyntaxError>;

/// Stage keyword -> parse function. Extending the language is one entry
/// here plus a module implementing [`Pipe`].
static PIPE_PARSERS: Lazy<BTreeMap<&'static str, ParsePipeFn>> = Lazy::new(|| {
    let mut parsers: BTreeMap<&'static str, ParsePipeFn> = BTreeMap::new();
    parsers.insert(collapse_nums::NAME, collapse_nums::parse);
    parsers.insert(delete::NAME, delete::parse);
    parsers
});

/// Parse a full `|`-separated pipe chain. Every pipe must consume its
/// clauses completely; a leftover token that is not `|` rejects the query.
pub fn parse_query(query: &str) -> Result<Vec<Arc<dyn Pipe>>, SyntaxError> {
    let mut lex = Lexer::new(query)?;
    if lex.is_end() {
        return Err(SyntaxError::EmptyQuery);
    }

    let mut pipes = Vec::new();
    loop {
        let pipe = parse_pipe(&mut lex)?;
        pipes.push(pipe);
        if lex.is_end() {
            return Ok(pipes);
        }
        if !lex.eat_punct('|') {
            return Err(lex.unexpected("'|' or end of query"));
        }
    }
}

fn parse_pipe(lex: &mut Lexer) -> Result<Arc<dyn Pipe>, SyntaxError> {
    let name = match lex.next() {
        Some(Token::Word(word)) => word,
        Some(tok) => {
            return Err(SyntaxError::UnexpectedToken {
                token: tok.text(),
                expected: "a pipe name",
            })
        }
        None => {
            return Err(SyntaxError::UnexpectedEnd {
                expected: "a pipe name",
            })
        }
    };
    let parse = PIPE_PARSERS
        .get(name.to_ascii_lowercase().as_str())
        .ok_or(SyntaxError::UnknownPipe { name })?;
    parse(lex)
}

/// Propagate needed/unneeded field sets through a whole pipe chain, from
/// the final consumer back to storage.
pub fn update_needed_fields(
    pipes: &[Arc<dyn Pipe>],
    needed: &mut FieldSet,
    unneeded: &mut FieldSet,
) {
    for pipe in pipes.iter().rev() {
        pipe.update_needed_fields(needed, unneeded);
    }
}
