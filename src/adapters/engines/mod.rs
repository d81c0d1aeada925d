//! Retrieval engine adapters: vector similarity, graph traversal and keyword
//! match, each behind the same `RetrievalEngine` port.

pub mod graph;
pub mod keyword;
pub mod vector;

pub use graph::Neo4jGraphEngine;
pub use keyword::SqliteKeywordEngine;
pub use vector::QdrantVectorEngine;
