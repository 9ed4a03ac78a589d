//! The contextualized-chat assembly engine.
//!
//! Fits an unbounded, growing conversation into fixed token budgets while
//! preserving semantic relevance and avoiding redundant re-indexing:
//!
//! 1. **Catch-up**: incrementally convert new raw messages into chunks and
//!    selectively index them (persistent before temporary, exactly once).
//! 2. **Direct aggregation**: include unsplit persistent messages
//!    oldest-first within a token budget, no ranking.
//! 3. **Relevance fill**: spend the remaining budget on chunks ranked by the
//!    semantic collection, first-fit-then-stop.
//! 4. **Reconstruction**: merge, sort by chunk position, and emit a fresh
//!    bounded chat in original chronological order.

pub mod engine;
pub mod splitter;
pub mod tracker;

pub use engine::{ContextualizedChat, LogTypeConfig, TokenBudgets};
pub use splitter::SizeSplitter;
pub use tracker::{Chunk, ChunkLedger};
