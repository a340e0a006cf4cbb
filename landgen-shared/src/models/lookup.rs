use serde::{Deserialize, Serialize};

/// Value of a lookup field pulled through a linked record.
///
/// The store may hand these back either as a bare value or as a list with
/// one entry per linked record, so both shapes deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Lookup::Many(Vec::new())
    }
}

impl<T> Lookup<T> {
    pub fn absent() -> Self {
        Lookup::Many(Vec::new())
    }

    /// The scalar this lookup stands for: the value itself, or the first entry.
    pub fn first(&self) -> Option<&T> {
        match self {
            Lookup::One(value) => Some(value),
            Lookup::Many(values) => values.first(),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::One(v),
            None => Lookup::absent(),
        }
    }
}

impl Lookup<String> {
    /// First value, trimmed, or `None` when missing or blank.
    pub fn text(&self) -> Option<&str> {
        self.first().map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}
