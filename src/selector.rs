use crate::node::{Value, describe_key};
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// Addresses one child of a container node.
///
/// Ranges exist only so that slice requests can be rejected with
/// [`crate::MetatreeError::InvalidIndex`]; no node supports them.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Key(Value),
    Index(usize),
    Range {
        start: Option<usize>,
        end: Option<usize>,
    },
}

impl Selector {
    pub(crate) fn as_key(&self) -> Option<Value> {
        match self {
            Selector::Key(k) => Some(k.clone()),
            Selector::Index(i) => Some(Value::Number(serde_yaml::Number::from(*i as u64))),
            Selector::Range { .. } => None,
        }
    }

    pub(crate) fn as_index(&self) -> Option<usize> {
        match self {
            Selector::Index(i) => Some(*i),
            Selector::Key(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Selector::Key(_) | Selector::Range { .. } => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Key(k) => f.write_str(&describe_key(k)),
            Selector::Index(i) => write!(f, "{}", i),
            Selector::Range { start, end } => {
                if let Some(s) = start {
                    write!(f, "{}", s)?;
                }
                f.write_str("..")?;
                if let Some(e) = end {
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Selector::Key(Value::String(key.to_string()))
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Selector::Key(Value::String(key))
    }
}

impl From<Value> for Selector {
    fn from(key: Value) -> Self {
        Selector::Key(key)
    }
}

impl From<&Value> for Selector {
    fn from(key: &Value) -> Self {
        Selector::Key(key.clone())
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

// Negative integers have no position; they only match integer mapping keys.
impl From<i64> for Selector {
    fn from(index: i64) -> Self {
        match usize::try_from(index) {
            Ok(i) => Selector::Index(i),
            Err(_) => Selector::Key(Value::from(index)),
        }
    }
}

impl From<i32> for Selector {
    fn from(index: i32) -> Self {
        Selector::from(i64::from(index))
    }
}

impl From<Range<usize>> for Selector {
    fn from(r: Range<usize>) -> Self {
        Selector::Range {
            start: Some(r.start),
            end: Some(r.end),
        }
    }
}

impl From<RangeFrom<usize>> for Selector {
    fn from(r: RangeFrom<usize>) -> Self {
        Selector::Range {
            start: Some(r.start),
            end: None,
        }
    }
}

impl From<RangeTo<usize>> for Selector {
    fn from(r: RangeTo<usize>) -> Self {
        Selector::Range {
            start: None,
            end: Some(r.end),
        }
    }
}

impl From<RangeFull> for Selector {
    fn from(_: RangeFull) -> Self {
        Selector::Range {
            start: None,
            end: None,
        }
    }
}
