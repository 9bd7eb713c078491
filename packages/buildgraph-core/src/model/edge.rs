//! Edge — a directed dependency between two targets.

use serde::{Deserialize, Serialize};

/// Dependency kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Compile,
    Runtime,
    Data,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Compile => "COMPILE",
            EdgeType::Runtime => "RUNTIME",
            EdgeType::Data => "DATA",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed dependency `from -> to`. Identity is the triple `(from, to, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type,
        }
    }

    /// Identity key: `"from|to|type"`.
    pub fn edge_key(&self) -> String {
        format!("{}|{}|{}", self.from, self.to, self.edge_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_format() {
        let e = Edge::new("//a:a", "//b:b", EdgeType::Compile);
        assert_eq!(e.edge_key(), "//a:a|//b:b|COMPILE");
    }
}
