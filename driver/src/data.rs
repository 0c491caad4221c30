use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// The values for one pass over a block, keyed by variable or block name.
pub type Fields = BTreeMap<String, Entry>;

/// A value in the data tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Text(String),
    /// A variable value, or for a block whether to write it once.
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// One pass over a block per element.
    Repeat(Vec<Fields>),
    /// A single pass over a block.
    Once(Fields),
}

impl Entry {
    /// The text a variable gets from this entry. Tables have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Entry::Repeat(_) | Entry::Once(_) => None,
            scalar => Some(scalar.to_string()),
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Entry::Repeat(_) | Entry::Once(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Entry::Text(_) => "string",
            Entry::Bool(_) => "boolean",
            Entry::Integer(_) => "integer",
            Entry::Float(_) => "float",
            Entry::Repeat(_) => "array of tables",
            Entry::Once(_) => "table",
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Text(s) => write!(f, "{}", s),
            Entry::Bool(b) => write!(f, "{}", b),
            Entry::Integer(n) => write!(f, "{}", n),
            Entry::Float(n) => {
                if n.is_finite() && *n == n.floor() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Entry::Repeat(items) => write!(f, "[{} tables]", items.len()),
            Entry::Once(fields) => write!(f, "{{{} fields}}", fields.len()),
        }
    }
}

impl From<&str> for Entry {
    fn from(text: &str) -> Self {
        Entry::Text(text.to_string())
    }
}

impl From<String> for Entry {
    fn from(text: String) -> Self {
        Entry::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_text() {
        assert_eq!(Entry::from("x").as_text().as_deref(), Some("x"));
        assert_eq!(Entry::Bool(false).as_text().as_deref(), Some("false"));
        assert_eq!(Entry::Integer(-3).as_text().as_deref(), Some("-3"));
        assert_eq!(Entry::Float(2.0).as_text().as_deref(), Some("2"));
        assert_eq!(Entry::Float(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(Entry::Once(Fields::new()).as_text(), None);
        assert!(Entry::Repeat(Vec::new()).is_table());
    }
}
