//! Retrieved documents and the engines that produce them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a retrieval engine.
///
/// Variant order is the default fan-out order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Dense vector similarity search
    Vector,
    /// Entity-overlap graph traversal
    Graph,
    /// Lexical keyword match
    Keyword,
}

impl EngineKind {
    /// All engines in default fan-out order.
    pub const ALL: [Self; 3] = [Self::Vector, Self::Graph, Self::Keyword];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Graph => "graph",
            Self::Keyword => "keyword",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vector" => Some(Self::Vector),
            "graph" => Some(Self::Graph),
            "keyword" => Some(Self::Keyword),
            _ => None,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata value attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl MetadataValue {
    /// Convert a JSON scalar; nested values are rendered as JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::Bool(b) => Some(Self::Text(b.to_string())),
            other => Some(Self::Text(other.to_string())),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Raw result returned by a retrieval engine, before it is tagged with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Passage text
    pub content: String,

    /// Engine-supplied metadata (source, page, ...)
    #[serde(default)]
    pub metadata: Metadata,

    /// Engine-local relevance score; not comparable across engines
    pub score: f64,
}

impl SearchHit {
    pub fn new(content: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
            score,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A document tagged with the engine that produced it.
///
/// `content` is the deduplication key across the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,

    #[serde(default)]
    pub metadata: Metadata,

    pub score: f64,

    pub origin_engine: EngineKind,
}

impl Document {
    /// Stamp a hit with its originating engine.
    pub fn from_hit(hit: SearchHit, origin_engine: EngineKind) -> Self {
        Self {
            content: hit.content,
            metadata: hit.metadata,
            score: hit.score,
            origin_engine,
        }
    }

    /// The `source` metadata entry, if the engine provided one.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(MetadataValue::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_round_trip() {
        for kind in EngineKind::ALL {
            assert_eq!(EngineKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(EngineKind::from_str("BM25"), None);
        assert_eq!(EngineKind::from_str("Graph"), Some(EngineKind::Graph));
    }

    #[test]
    fn test_from_hit_stamps_origin() {
        let hit = SearchHit::new("helmets are mandatory", 0.8).with_metadata("source", "act.pdf");
        let doc = Document::from_hit(hit, EngineKind::Keyword);
        assert_eq!(doc.origin_engine, EngineKind::Keyword);
        assert_eq!(doc.source(), Some("act.pdf"));
        assert!((doc.score - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metadata_value_from_json() {
        assert_eq!(
            MetadataValue::from_json(&serde_json::json!("a")),
            Some(MetadataValue::Text("a".to_string()))
        );
        assert_eq!(
            MetadataValue::from_json(&serde_json::json!(3)),
            Some(MetadataValue::Number(3.0))
        );
        assert_eq!(MetadataValue::from_json(&serde_json::Value::Null), None);
    }

    #[test]
    fn test_document_serde_uses_snake_case_engine() {
        let doc = Document::from_hit(SearchHit::new("x", 1.0), EngineKind::Vector);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["origin_engine"], "vector");
    }
}
