// src/pipe/delete.rs - the delete pipe stage

use crate::error::SyntaxError;
use crate::field_set::FieldSet;
use crate::lexer::{quote_token, Lexer};
use crate::pipe::Pipe;
use crate::row::Row;
use std::fmt;
use std::sync::Arc;

pub const NAME: &str = "delete";

/// `delete <field> [, <field>...]`
///
/// Drops the named fields from every row.
pub struct DeletePipe {
    fields: Vec<String>,
}

pub(crate) fn parse(lex: &mut Lexer) -> Result<Arc<dyn Pipe>, SyntaxError> {
    let mut fields = Vec::new();
    let first = lex
        .field_name()
        .ok_or(SyntaxError::MissingFieldList { pipe: NAME })?;
    fields.push(first);
    while lex.eat_punct(',') {
        let field = lex
            .field_name()
            .ok_or(SyntaxError::MissingFieldList { pipe: NAME })?;
        fields.push(field);
    }
    Ok(Arc::new(DeletePipe { fields }))
}

impl Pipe for DeletePipe {
    fn name(&self) -> &'static str {
        NAME
    }

    fn update_needed_fields(&self, needed: &mut FieldSet, unneeded: &mut FieldSet) {
        // Deleted fields never reach downstream, so upstream need not
        // produce them.
        if needed.is_all() {
            for field in &self.fields {
                unneeded.add(field);
            }
        } else {
            for field in &self.fields {
                needed.remove(field);
            }
        }
    }

    fn process_block(&self, rows: &mut Vec<Row>) {
        for row in rows.iter_mut() {
            for field in &self.fields {
                row.remove(field);
            }
        }
    }
}

impl fmt::Display for DeletePipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(NAME)?;
        for (i, field) in self.fields.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            f.write_str(&quote_token(field))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::parse_query;
    use crate::row::Field;

    fn parse_one(query: &str) -> Arc<dyn Pipe> {
        let mut pipes = parse_query(query).unwrap();
        assert_eq!(pipes.len(), 1);
        pipes.pop().unwrap()
    }

    #[test]
    fn test_parse_round_trip() {
        for query in ["delete f1", "delete f1, f2", r#"delete "a b", c"#] {
            assert_eq!(parse_one(query).to_string(), query);
        }
    }

    #[test]
    fn test_parse_failure() {
        for query in ["delete", "delete f1,", "delete , f1", "delete f1 f2"] {
            assert!(parse_query(query).is_err(), "should fail: {:?}", query);
        }
    }

    #[test]
    fn test_process_removes_fields() {
        let pipe = parse_one("delete bar, baz");
        let mut rows = vec![
            Row::new(vec![
                Field::new("_msg", "hello"),
                Field::new("bar", "1"),
                Field::new("baz", "2"),
            ]),
            Row::new(vec![Field::new("bar", "only")]),
        ];
        pipe.process_block(&mut rows);
        assert_eq!(
            rows,
            vec![
                Row::new(vec![Field::new("_msg", "hello")]),
                Row::new(vec![]),
            ]
        );
    }

    #[test]
    fn test_needed_fields() {
        let pipe = parse_one("delete f1, f2");

        let mut needed = FieldSet::parse("*");
        let mut unneeded = FieldSet::parse("f1,x");
        pipe.update_needed_fields(&mut needed, &mut unneeded);
        assert_eq!(needed.to_string(), "*");
        assert_eq!(unneeded.to_string(), "f1,x,f2");

        let mut needed = FieldSet::parse("f1,f3");
        let mut unneeded = FieldSet::parse("");
        pipe.update_needed_fields(&mut needed, &mut unneeded);
        assert_eq!(needed.to_string(), "f3");
        assert_eq!(unneeded.to_string(), "");
    }
}
