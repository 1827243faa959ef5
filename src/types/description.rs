use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Ordered component names of a point, sample or distribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Description {
    names: Vec<String>,
}

impl Description {
    /// Create a description from explicit names.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Default description `X0, X1, ..., X{dimension-1}`.
    #[must_use]
    pub fn with_default_names(dimension: usize) -> Self {
        Self::with_prefix("X", dimension)
    }

    /// Description `{prefix}0, ..., {prefix}{dimension-1}`.
    #[must_use]
    pub fn with_prefix(prefix: &str, dimension: usize) -> Self {
        Self {
            names: (0..dimension).map(|i| format!("{prefix}{i}")).collect(),
        }
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there are no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name at the given position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Iterate over the names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Keep only the given positions, in the given order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            names: indices
                .iter()
                .filter_map(|&i| self.names.get(i).cloned())
                .collect(),
        }
    }

    /// Append a name.
    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }
}

impl Index<usize> for Description {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.names[index]
    }
}

impl From<Vec<&str>> for Description {
    fn from(names: Vec<&str>) -> Self {
        Self {
            names: names.into_iter().map(str::to_owned).collect(),
        }
    }
}

impl From<Vec<String>> for Description {
    fn from(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let desc = Description::with_default_names(3);
        assert_eq!(desc.len(), 3);
        assert_eq!(&desc[0], "X0");
        assert_eq!(&desc[2], "X2");
        assert_eq!(desc.to_string(), "[X0,X1,X2]");
    }

    #[test]
    fn test_select() {
        let desc = Description::from(vec!["a", "b", "c"]);
        let sub = desc.select(&[2, 0]);
        assert_eq!(sub, Description::from(vec!["c", "a"]));
    }
}
