//! Search: candidate pools from the vector index, re-ranked per query kind.

pub mod backend;
pub mod dispatcher;
pub mod handlers;
pub mod indexer;
pub mod pg_index;
pub mod rerank;

#[cfg(test)]
pub mod testing;
