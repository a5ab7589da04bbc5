// src/filter.rs - the boolean filter mini-language behind `if (...)` gates

use crate::error::SyntaxError;
use crate::lexer::{quote_token, Lexer, Token};
use crate::row::{Row, MSG_FIELD};
use indexmap::IndexSet;
use regex::Regex;
use std::fmt;

/// Compiled boolean predicate over a row. Built once at parse time and
/// shared read-only across workers; evaluation never fails.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Token-sequence match against one field (`field:phrase`, bare `phrase`
    /// for `_msg`). An empty phrase matches only an empty or absent field.
    Phrase { field: String, phrase: String },
    /// Regex match against the raw field value (`field:~"re"`).
    Regex { field: String, re: Regex },
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Phrase { field, phrase } => {
                let value = row.get(field);
                if phrase.is_empty() {
                    value.is_empty()
                } else {
                    contains_token_sequence(value, phrase)
                }
            }
            Filter::Regex { field, re } => re.is_match(row.get(field)),
            Filter::Not(inner) => !inner.matches(row),
            Filter::And(items) => items.iter().all(|f| f.matches(row)),
            Filter::Or(items) => items.iter().any(|f| f.matches(row)),
        }
    }

    /// Every field name this filter reads. The planner forces these into
    /// the needed-upstream set.
    pub fn referenced_fields(&self) -> IndexSet<String> {
        let mut fields = IndexSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut IndexSet<String>) {
        match self {
            Filter::Phrase { field, .. } | Filter::Regex { field, .. } => {
                out.insert(field.clone());
            }
            Filter::Not(inner) => inner.collect_fields(out),
            Filter::And(items) | Filter::Or(items) => {
                for item in items {
                    item.collect_fields(out);
                }
            }
        }
    }
}

/// True when the phrase's word tokens occur as consecutive tokens in the
/// value. Tokens are maximal runs of letters, digits and `_`, so `-abc`
/// rejects `abc deployed` but not `abcdef`.
fn contains_token_sequence(value: &str, phrase: &str) -> bool {
    let needle: Vec<&str> = tokens(phrase).collect();
    if needle.is_empty() {
        return true;
    }
    let haystack: Vec<&str> = tokens(value).collect();
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c != '_' && !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Parse a filter expression from the shared lexer. Stops at `)`, `|`, or
/// end of input; the caller owns the surrounding parentheses.
pub fn parse_filter(lex: &mut Lexer) -> Result<Filter, SyntaxError> {
    parse_or(lex)
}

fn parse_or(lex: &mut Lexer) -> Result<Filter, SyntaxError> {
    let mut items = vec![parse_and(lex)?];
    while lex.eat_keyword("or") {
        items.push(parse_and(lex)?);
    }
    Ok(if items.len() == 1 {
        items.pop().unwrap()
    } else {
        Filter::Or(items)
    })
}

fn parse_and(lex: &mut Lexer) -> Result<Filter, SyntaxError> {
    let mut items = vec![parse_unary(lex)?];
    loop {
        match lex.peek() {
            None | Some(Token::Punct(')')) | Some(Token::Punct('|')) => break,
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("or") => break,
            _ => {
                // Adjacency is implicit AND; an explicit keyword is allowed.
                lex.eat_keyword("and");
                items.push(parse_unary(lex)?);
            }
        }
    }
    Ok(if items.len() == 1 {
        items.pop().unwrap()
    } else {
        Filter::And(items)
    })
}

fn parse_unary(lex: &mut Lexer) -> Result<Filter, SyntaxError> {
    if lex.eat_punct('-') {
        let inner = parse_unary(lex)?;
        return Ok(Filter::Not(Box::new(inner)));
    }
    if lex.eat_punct('(') {
        let inner = parse_or(lex)?;
        lex.expect_punct(')', "')' closing the filter group")?;
        return Ok(inner);
    }
    parse_primary(lex)
}

fn parse_primary(lex: &mut Lexer) -> Result<Filter, SyntaxError> {
    match lex.next() {
        Some(Token::Word(word)) => {
            if word.eq_ignore_ascii_case("or") || word.eq_ignore_ascii_case("and") {
                // Keywords need quoting to be used as phrases.
                return Err(SyntaxError::UnexpectedToken {
                    token: word,
                    expected: "a filter term",
                });
            }
            if lex.eat_punct(':') {
                parse_match(lex, word)
            } else {
                Ok(Filter::Phrase {
                    field: MSG_FIELD.to_string(),
                    phrase: word,
                })
            }
        }
        Some(Token::Quoted(phrase)) => Ok(Filter::Phrase {
            field: MSG_FIELD.to_string(),
            phrase,
        }),
        Some(Token::Punct('~')) => parse_regex(lex, MSG_FIELD.to_string()),
        Some(tok) => Err(SyntaxError::UnexpectedToken {
            token: tok.text(),
            expected: "a filter term",
        }),
        None => Err(SyntaxError::UnexpectedEnd {
            expected: "a filter term",
        }),
    }
}

/// The right-hand side of `field:`.
fn parse_match(lex: &mut Lexer, field: String) -> Result<Filter, SyntaxError> {
    if lex.eat_punct('~') {
        return parse_regex(lex, field);
    }
    match lex.next() {
        Some(Token::Word(phrase)) => Ok(Filter::Phrase { field, phrase }),
        Some(Token::Quoted(phrase)) => Ok(Filter::Phrase { field, phrase }),
        Some(tok) => Err(SyntaxError::UnexpectedToken {
            token: tok.text(),
            expected: "a phrase or ~\"regex\" after ':'",
        }),
        None => Err(SyntaxError::UnexpectedEnd {
            expected: "a phrase or ~\"regex\" after ':'",
        }),
    }
}

fn parse_regex(lex: &mut Lexer, field: String) -> Result<Filter, SyntaxError> {
    let pattern = match lex.next() {
        Some(Token::Quoted(p)) => p,
        Some(Token::Word(p)) => p,
        Some(tok) => {
            return Err(SyntaxError::UnexpectedToken {
                token: tok.text(),
                expected: "a regex pattern after '~'",
            })
        }
        None => {
            return Err(SyntaxError::UnexpectedEnd {
                expected: "a regex pattern after '~'",
            })
        }
    };
    let re = Regex::new(&pattern).map_err(|source| SyntaxError::InvalidRegex {
        pattern: pattern.clone(),
        source,
    })?;
    Ok(Filter::Regex { field, re })
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Phrase { field, phrase } => {
                if field != MSG_FIELD {
                    write!(f, "{}:", quote_token(field))?;
                }
                f.write_str(&quote_token(phrase))
            }
            Filter::Regex { field, re } => {
                if field != MSG_FIELD {
                    write!(f, "{}:", quote_token(field))?;
                }
                write!(f, "~\"{}\"", re.as_str())
            }
            Filter::Not(inner) => match inner.as_ref() {
                Filter::And(_) | Filter::Or(_) => write!(f, "-({})", inner),
                _ => write!(f, "-{}", inner),
            },
            Filter::And(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    match item {
                        Filter::Or(_) => write!(f, "({})", item)?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                Ok(())
            }
            Filter::Or(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Field;

    fn parse(s: &str) -> Filter {
        let mut lex = Lexer::new(s).unwrap();
        let filter = parse_filter(&mut lex).unwrap();
        assert!(lex.is_end(), "trailing tokens in {:?}", s);
        filter
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::new(pairs.iter().map(|(n, v)| Field::new(*n, *v)).collect())
    }

    #[test]
    fn test_parse_round_trip() {
        for query in [
            "abc",
            "-abc",
            "x:y",
            "f2:q",
            "foo bar",
            "x:y or z:w",
            "-(a or b)",
            "level:~\"(?i)error\"",
            "~\"^GET \"",
        ] {
            assert_eq!(parse(query).to_string(), query, "round trip: {:?}", query);
        }
    }

    #[test]
    fn test_parse_errors() {
        for query in ["x:", ":", "(a", "~", "x:~", "or"] {
            let mut lex = Lexer::new(query).unwrap();
            assert!(parse_filter(&mut lex).is_err(), "should fail: {:?}", query);
        }
    }

    #[test]
    fn test_invalid_regex_is_syntax_error() {
        let mut lex = Lexer::new(r#"x:~"(""#).unwrap();
        assert!(matches!(
            parse_filter(&mut lex),
            Err(SyntaxError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_phrase_matches_tokens_not_substrings() {
        let filter = parse("abc");
        assert!(filter.matches(&row(&[("_msg", "abc deployed")])));
        assert!(filter.matches(&row(&[("_msg", "x abc:345")])));
        assert!(!filter.matches(&row(&[("_msg", "abcdef")])));
        assert!(!filter.matches(&row(&[("_msg", "")])));
        assert!(!filter.matches(&row(&[("bar", "abc")])));
    }

    #[test]
    fn test_negation_matches_absent_field() {
        let filter = parse("-abc");
        // Absence of `_msg` means the phrase is absent too.
        assert!(filter.matches(&row(&[("other", "abc")])));
        assert!(filter.matches(&row(&[("_msg", "1234")])));
        assert!(!filter.matches(&row(&[("_msg", "2004-10-12T43:23:12Z abc:345")])));
    }

    #[test]
    fn test_empty_phrase_is_absence_test() {
        let filter = parse(r#"bar:"""#);
        assert!(filter.matches(&row(&[("_msg", "x")])));
        assert!(filter.matches(&row(&[("bar", "")])));
        assert!(!filter.matches(&row(&[("bar", "y")])));
    }

    #[test]
    fn test_multi_token_phrase() {
        let filter = parse(r#""connection refused""#);
        assert!(filter.matches(&row(&[("_msg", "dial tcp: connection refused (try 2)")])));
        assert!(!filter.matches(&row(&[("_msg", "connection was refused")])));
    }

    #[test]
    fn test_and_or_not() {
        let filter = parse("x:a -y:b or z:c");
        // Parses as (x:a AND NOT y:b) OR z:c.
        assert!(filter.matches(&row(&[("x", "a")])));
        assert!(!filter.matches(&row(&[("x", "a"), ("y", "b")])));
        assert!(filter.matches(&row(&[("x", "q"), ("z", "c")])));
        assert!(!filter.matches(&row(&[])));
    }

    #[test]
    fn test_regex_match() {
        let filter = parse(r#"level:~"(?i)err""#);
        assert!(filter.matches(&row(&[("level", "ERROR")])));
        assert!(!filter.matches(&row(&[("level", "info")])));
        assert!(!filter.matches(&row(&[])));
    }

    #[test]
    fn test_referenced_fields() {
        let filter = parse("x:a -y:b or z:c abc");
        let fields = filter.referenced_fields();
        let names: Vec<&str> = fields.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["x", "y", "z", "_msg"]);
    }
}
