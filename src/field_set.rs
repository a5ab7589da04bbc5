// src/field_set.rs - field-name sets for needed-fields propagation

use indexmap::IndexSet;
use std::fmt;

/// A set of field names, or the "all fields" wildcard the planner uses for
/// `SELECT *`-shaped queries. Insertion order is kept so Display output and
/// planner diagnostics are deterministic without sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSet {
    All,
    Named(IndexSet<String>),
}

impl FieldSet {
    pub fn all() -> Self {
        FieldSet::All
    }

    pub fn empty() -> Self {
        FieldSet::Named(IndexSet::new())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSet::Named(names.into_iter().map(Into::into).collect())
    }

    /// Parse the planner-test notation: `*` for the wildcard, otherwise a
    /// comma-separated name list (empty string means the empty set).
    pub fn parse(s: &str) -> Self {
        if s.trim() == "*" {
            return FieldSet::All;
        }
        FieldSet::Named(
            s.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FieldSet::All)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldSet::All => false,
            FieldSet::Named(names) => names.is_empty(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            FieldSet::All => true,
            FieldSet::Named(names) => names.contains(name),
        }
    }

    /// Add a name. No-op on the wildcard, which already contains everything.
    pub fn add(&mut self, name: &str) {
        if let FieldSet::Named(names) = self {
            names.insert(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) {
        if let FieldSet::Named(names) = self {
            names.shift_remove(name);
        }
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSet::All => f.write_str("*"),
            FieldSet::Named(names) => {
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(name)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(FieldSet::parse("*"), FieldSet::All);
        assert_eq!(FieldSet::parse(""), FieldSet::empty());
        assert_eq!(FieldSet::parse("f1,f2"), FieldSet::from_names(["f1", "f2"]));
        assert_eq!(FieldSet::parse(" f1 , f2 ").to_string(), "f1,f2");
        assert_eq!(FieldSet::parse("*").to_string(), "*");
        assert_eq!(FieldSet::parse("").to_string(), "");
    }

    #[test]
    fn test_contains() {
        assert!(FieldSet::all().contains("anything"));
        let set = FieldSet::from_names(["a", "b"]);
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
    }

    #[test]
    fn test_add_remove() {
        let mut set = FieldSet::from_names(["a", "b"]);
        set.add("c");
        set.add("a"); // already present
        set.remove("b");
        assert_eq!(set.to_string(), "a,c");

        let mut all = FieldSet::all();
        all.add("x");
        all.remove("x");
        assert_eq!(all, FieldSet::All);
    }
}
