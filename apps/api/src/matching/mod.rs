// Deterministic scoring layer between raw vector search and ranked results.
// Pure functions only: no I/O, no shared mutable state.

pub mod education;
pub mod normalize;
pub mod section;
pub mod skills;
