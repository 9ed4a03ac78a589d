//! The chunk ledger: an append-only positional index from chunks back to
//! their originating messages.
//!
//! One arena-style array per log type; a chunk's position in the array is
//! its identity. Positional order is load-bearing: the assembly step sorts
//! included chunks by position to restore chronological order, so the ledger
//! is never a keyed map.
//!
//! Invariants:
//! - `msg_idx` values are non-decreasing with position, and records sharing
//!   a `msg_idx` occupy a contiguous run (messages are processed in order,
//!   each exactly once).
//! - A chunk is "small" iff its run has length 1, meaning the originating
//!   message was not split.

use ctxchat_core::collection::ChunkIdx;
use ctxchat_core::message::LogType;

/// A positional record pointing a chunk back at its originating message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Index of the originating message in its log.
    pub msg_idx: usize,
}

/// Per-log append-only chunk sequences.
#[derive(Debug, Default)]
pub struct ChunkLedger {
    persistent: Vec<Chunk>,
    temporary: Vec<Chunk>,
}

impl ChunkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunk records in a log's sequence.
    pub fn len(&self, log_type: LogType) -> usize {
        self.chunks(log_type).len()
    }

    pub fn is_empty(&self, log_type: LogType) -> bool {
        self.chunks(log_type).is_empty()
    }

    /// Look up a chunk record by position.
    pub fn get(&self, log_type: LogType, chunk_idx: ChunkIdx) -> Option<Chunk> {
        self.chunks(log_type).get(chunk_idx).copied()
    }

    /// Append `count` records sharing one originating message, in order.
    pub fn append_run(&mut self, log_type: LogType, msg_idx: usize, count: usize) {
        let chunks = self.chunks_mut(log_type);
        chunks.extend(std::iter::repeat_n(Chunk { msg_idx }, count));
    }

    /// The `msg_idx` of the final record, the low-water mark for catch-up.
    /// `None` when nothing has been processed yet.
    pub fn last_processed_index(&self, log_type: LogType) -> Option<usize> {
        self.chunks(log_type).last().map(|c| c.msg_idx)
    }

    /// Positions of all small chunks (singleton runs), ascending.
    pub fn small_chunk_positions(&self, log_type: LogType) -> Vec<ChunkIdx> {
        let chunks = self.chunks(log_type);
        let mut positions = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let prev_shares = i > 0 && chunks[i - 1].msg_idx == chunk.msg_idx;
            let next_shares = i + 1 < chunks.len() && chunks[i + 1].msg_idx == chunk.msg_idx;
            if !prev_shares && !next_shares {
                positions.push(i);
            }
        }

        positions
    }

    fn chunks(&self, log_type: LogType) -> &Vec<Chunk> {
        match log_type {
            LogType::Persistent => &self.persistent,
            LogType::Temporary => &self.temporary,
        }
    }

    fn chunks_mut(&mut self, log_type: LogType) -> &mut Vec<Chunk> {
        match log_type {
            LogType::Persistent => &mut self.persistent,
            LogType::Temporary => &mut self.temporary,
        }
    }
}
