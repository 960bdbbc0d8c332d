use itertools::Itertools;
use std::fmt;

/// Value of a single attribute attached to a graph, node or edge.
///
/// The variant is fixed when the attribute is created, so the XGMML
/// serializer never has to guess the structure from the string content.
/// Multi-valued identifier sets use the `List` variant, with the
/// canonical identifier first.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Real(f64),
    List(Vec<String>),
}

impl AttrValue {
    /// Returns the contained text for `Text` values, `None` otherwise.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(v) => write!(f, "{}", v),
            AttrValue::Real(v) => write!(f, "{}", v),
            // Bracketed list convention as used on the wire
            AttrValue::List(items) => write!(f, "[{}]", items.iter().join(",")),
        }
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> AttrValue {
        AttrValue::Text(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> AttrValue {
        AttrValue::Text(v.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> AttrValue {
        AttrValue::Real(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> AttrValue {
        AttrValue::List(v)
    }
}
