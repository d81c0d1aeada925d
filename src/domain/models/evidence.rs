//! Deduplicated evidence accumulated across the rounds of a session.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::document::Document;

/// Ordered, duplicate-free collection of documents keyed by exact `content`.
///
/// Documents keep the position at which they were first seen: later rounds
/// only ever append, whatever their engine-local scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Document>", into = "Vec<Document>")]
pub struct EvidenceSet {
    documents: Vec<Document>,
    seen: HashSet<String>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator reducer for evidence: append every unseen document in
    /// received order and return how many were fresh.
    pub fn merge_round(&mut self, incoming: impl IntoIterator<Item = Document>) -> usize {
        let before = self.documents.len();
        for doc in incoming {
            if self.seen.insert(doc.content.clone()) {
                self.documents.push(doc);
            }
        }
        self.documents.len() - before
    }

    pub fn contains(&self, content: &str) -> bool {
        self.seen.contains(content)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.seen.clear();
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl From<Vec<Document>> for EvidenceSet {
    fn from(documents: Vec<Document>) -> Self {
        let mut set = Self::new();
        set.merge_round(documents);
        set
    }
}

impl From<EvidenceSet> for Vec<Document> {
    fn from(set: EvidenceSet) -> Self {
        set.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EngineKind, SearchHit};

    fn doc(content: &str, score: f64, engine: EngineKind) -> Document {
        Document::from_hit(SearchHit::new(content, score), engine)
    }

    #[test]
    fn test_merge_skips_duplicates_within_round() {
        let mut set = EvidenceSet::new();
        let fresh = set.merge_round(vec![
            doc("a", 0.9, EngineKind::Vector),
            doc("a", 3.0, EngineKind::Graph),
            doc("b", 1.0, EngineKind::Keyword),
        ]);
        assert_eq!(fresh, 2);
        assert_eq!(set.documents()[0].origin_engine, EngineKind::Vector);
        assert_eq!(set.documents()[1].content, "b");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let round = vec![doc("a", 0.5, EngineKind::Vector), doc("b", 0.4, EngineKind::Vector)];
        let mut once = EvidenceSet::new();
        once.merge_round(round.clone());
        let mut twice = once.clone();
        assert_eq!(twice.merge_round(round), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_earlier_rounds_keep_their_position() {
        let mut set = EvidenceSet::new();
        set.merge_round(vec![doc("low", 0.1, EngineKind::Vector)]);
        set.merge_round(vec![
            doc("high", 0.99, EngineKind::Vector),
            doc("low", 0.99, EngineKind::Vector),
        ]);
        let contents: Vec<_> = set.documents().iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["low", "high"]);
        assert!((set.documents()[0].score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_rebuilds_seen_set() {
        let mut set = EvidenceSet::new();
        set.merge_round(vec![doc("a", 1.0, EngineKind::Graph)]);
        let json = serde_json::to_string(&set).unwrap();
        let mut restored: EvidenceSet = serde_json::from_str(&json).unwrap();
        assert!(restored.contains("a"));
        assert_eq!(restored.merge_round(vec![doc("a", 2.0, EngineKind::Keyword)]), 0);
    }
}
