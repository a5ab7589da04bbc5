// src/pipe/collapse_nums.rs - the collapse_nums pipe stage

use crate::collapse::{collapse_nums, prettify_placeholders};
use crate::error::SyntaxError;
use crate::field_set::FieldSet;
use crate::filter::{parse_filter, Filter};
use crate::lexer::{quote_token, Lexer};
use crate::pipe::Pipe;
use crate::row::{Row, MSG_FIELD};
use std::fmt;
use std::sync::Arc;

pub const NAME: &str = "collapse_nums";

/// `collapse_nums [prettify] [if (<filter>)] [at <field>]`
///
/// Rewrites the target field of every matching row so that numeric runs
/// become placeholders and structurally-similar lines collapse to the same
/// shape. Immutable after parsing.
pub struct CollapseNumsPipe {
    field: String,
    filter: Option<Filter>,
    prettify: bool,
}

pub(crate) fn parse(lex: &mut Lexer) -> Result<Arc<dyn Pipe>, SyntaxError> {
    let prettify = lex.eat_keyword("prettify");

    let mut filter = None;
    if lex.eat_keyword("if") {
        if !lex.eat_punct('(') {
            return Err(SyntaxError::MissingFilterParen { pipe: NAME });
        }
        filter = Some(parse_filter(lex)?);
        lex.expect_punct(')', "')' closing the if-filter")?;
    }

    let mut field = MSG_FIELD.to_string();
    if lex.eat_keyword("at") {
        field = lex
            .field_name()
            .ok_or(SyntaxError::MissingFieldName { pipe: NAME })?;
    }

    Ok(Arc::new(CollapseNumsPipe {
        field,
        filter,
        prettify,
    }))
}

impl Pipe for CollapseNumsPipe {
    fn name(&self) -> &'static str {
        NAME
    }

    fn update_needed_fields(&self, needed: &mut FieldSet, unneeded: &mut FieldSet) {
        let filter_fields = self
            .filter
            .as_ref()
            .map(|f| f.referenced_fields())
            .unwrap_or_default();

        if needed.is_all() {
            // The target is written here, so upstream must still produce it
            // even if a later stage marked it unneeded; fields the filter
            // reads must stay scannable for the same reason.
            unneeded.remove(&self.field);
            for field in &filter_fields {
                unneeded.remove(field);
            }
        } else {
            for field in &filter_fields {
                needed.add(field);
            }
        }
    }

    fn process_block(&self, rows: &mut Vec<Row>) {
        for row in rows.iter_mut() {
            if let Some(filter) = &self.filter {
                if !filter.matches(row) {
                    continue;
                }
            }
            // An absent target becomes a present-but-empty field once the
            // transform touches the row.
            let collapsed = collapse_nums(row.get(&self.field));
            let value = if self.prettify {
                prettify_placeholders(&collapsed)
            } else {
                collapsed
            };
            row.set(&self.field, value);
        }
    }
}

impl fmt::Display for CollapseNumsPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(NAME)?;
        if self.prettify {
            f.write_str(" prettify")?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " if ({})", filter)?;
        }
        if self.field != MSG_FIELD {
            write!(f, " at {}", quote_token(&self.field))?;
        }
        Ok(())
    }
}
