//! The contextualization engine.
//!
//! Owns the chunk ledger for one conversation and, per context request:
//! catches up on unprocessed messages (chunk + selectively index), fills the
//! persistent budget with unsplit messages oldest-first, spends the rest on
//! relevance-ranked chunks, and reconstructs a bounded chat in original
//! chronological order.
//!
//! # Inclusion policy
//!
//! Both aggregation paths are greedy first-fit-then-stop: the first item
//! whose cost would overflow the remaining budget ends the walk. A later,
//! smaller item that would have fit is never opportunistically included.
//! Budget exhaustion is normal termination, not an error.
//!
//! # Concurrency
//!
//! The ledger is mutated across awaited collaborator calls, so catch-up and
//! assembly for one conversation must never interleave. A per-instance
//! mutex serializes the whole request; retrieval against a *different*
//! conversation's engine is unaffected.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, trace};

use ctxchat_core::chat::Chat;
use ctxchat_core::chunker::MessageChunker;
use ctxchat_core::collection::{ChunkIdx, DocumentMetadata, SemanticCollection};
use ctxchat_core::error::{Error, Result};
use ctxchat_core::message::{LogType, Message};

use crate::tracker::ChunkLedger;

/// Per-log indexing and aggregation behavior.
///
/// Consumed uniformly by catch-up and assembly instead of branching on the
/// log type itself.
#[derive(Debug, Clone, Copy)]
pub struct LogTypeConfig {
    /// Whether unsplit (small) chunks are added to the semantic collection.
    pub index_small_chunks: bool,
    /// Whether small chunks are included directly, without relevance ranking.
    pub supports_direct_aggregation: bool,
}

impl LogTypeConfig {
    pub fn for_log(log_type: LogType) -> Self {
        match log_type {
            // Small persistent chunks are tracked but never indexed; they
            // reach the output through direct aggregation instead.
            LogType::Persistent => Self {
                index_small_chunks: false,
                supports_direct_aggregation: true,
            },
            LogType::Temporary => Self {
                index_small_chunks: true,
                supports_direct_aggregation: false,
            },
        }
    }
}

/// Token budgets for one contextualization request, per log type.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudgets {
    pub persistent: usize,
    pub temporary: usize,
}

impl TokenBudgets {
    pub fn for_log(&self, log_type: LogType) -> usize {
        match log_type {
            LogType::Persistent => self.persistent,
            LogType::Temporary => self.temporary,
        }
    }
}

/// A chunk accepted into the output, carrying its ledger position so the
/// merge step can restore chronological order.
struct Placed {
    msg: Message,
    chunk_idx: ChunkIdx,
}

/// The contextualized-chat assembly engine for one conversation.
pub struct ContextualizedChat {
    raw_chat: Arc<RwLock<Chat>>,
    chunker: Arc<dyn MessageChunker>,
    persistent_collection: Arc<dyn SemanticCollection>,
    temporary_collection: Arc<dyn SemanticCollection>,
    /// Single-flight guard: interleaved catch-up could append duplicate
    /// ledger records or double-index text.
    state: Mutex<ChunkLedger>,
}

impl ContextualizedChat {
    pub fn new(
        raw_chat: Arc<RwLock<Chat>>,
        chunker: Arc<dyn MessageChunker>,
        persistent_collection: Arc<dyn SemanticCollection>,
        temporary_collection: Arc<dyn SemanticCollection>,
    ) -> Self {
        Self {
            raw_chat,
            chunker,
            persistent_collection,
            temporary_collection,
            state: Mutex::new(ChunkLedger::new()),
        }
    }

    /// The raw chat this engine contextualizes. Never mutated by the engine.
    pub fn raw_chat(&self) -> &Arc<RwLock<Chat>> {
        &self.raw_chat
    }

    /// Assemble a bounded chat relevant to `context` within the budgets.
    ///
    /// Catches up on unprocessed messages first (persistent before
    /// temporary), then fills each log's budget and reconstructs the output
    /// in original chronological order. The returned chat is independent of
    /// the raw chat. All-or-nothing per request: on failure, already
    /// committed ledger records survive and the next call resumes catch-up
    /// from the low-water mark.
    pub async fn contextualize(&self, context: &str, budgets: TokenBudgets) -> Result<Chat> {
        let mut ledger = self.state.lock().await;
        let chat = self.raw_chat.read().await;

        for log_type in LogType::ALL {
            self.process_new_messages(&chat, &mut ledger, log_type)
                .await?;
        }

        let mut bounded = chat.clone_empty();
        for log_type in LogType::ALL {
            let placed = self
                .assemble_log(&chat, &ledger, context, log_type, budgets.for_log(log_type))
                .await?;
            bounded.add(log_type, placed.into_iter().map(|p| p.msg).collect())?;
        }

        Ok(bounded)
    }

    // ── Catch-up ───────────────────────────────────────────────────────────

    /// Bring one log's ledger up to date with its raw messages. Idempotent:
    /// a second call with no new messages is a no-op.
    async fn process_new_messages(
        &self,
        chat: &Chat,
        ledger: &mut ChunkLedger,
        log_type: LogType,
    ) -> Result<()> {
        let message_count = chat.messages(log_type).len();
        if message_count == 0 {
            return Ok(());
        }

        let start = match ledger.last_processed_index(log_type) {
            Some(last) if last + 1 >= message_count => return Ok(()),
            Some(last) => last + 1,
            None => 0,
        };

        for msg_idx in start..message_count {
            self.process_message(chat, ledger, log_type, msg_idx).await?;
        }

        debug!(
            log_type = %log_type,
            from = start,
            to = message_count,
            "catch-up complete"
        );
        Ok(())
    }

    /// Chunk one message and, when eligible, index its sub-texts as a single
    /// batch. Ledger records are committed only after the collection accepts
    /// the batch, so a failed add leaves the message wholly unprocessed and
    /// it is retried on the next catch-up.
    async fn process_message(
        &self,
        chat: &Chat,
        ledger: &mut ChunkLedger,
        log_type: LogType,
        msg_idx: usize,
    ) -> Result<()> {
        let message = chat.message(log_type, msg_idx).ok_or_else(|| {
            Error::Consistency(format!("{log_type} message {msg_idx} vanished during catch-up"))
        })?;

        let sub_texts: Vec<String> = if self.chunker.should_chunk(message) {
            self.chunker.chunk(message)?
        } else {
            vec![serde_json::to_string(message)?]
        };

        let config = LogTypeConfig::for_log(log_type);
        if sub_texts.len() == 1 && !config.index_small_chunks {
            ledger.append_run(log_type, msg_idx, 1);
            trace!(log_type = %log_type, msg_idx, "tracked small chunk, not indexed");
            return Ok(());
        }

        let start_chunk_idx = ledger.len(log_type);
        let tokenizer = chat.tokenizer();
        let metadatas: Vec<DocumentMetadata> = sub_texts
            .iter()
            .enumerate()
            .map(|(offset, text)| DocumentMetadata {
                index: start_chunk_idx + offset,
                tokens: tokenizer.count(text),
            })
            .collect();

        let count = sub_texts.len();
        self.collection(log_type).add(sub_texts, metadatas).await?;
        ledger.append_run(log_type, msg_idx, count);
        trace!(log_type = %log_type, msg_idx, chunks = count, "indexed message");
        Ok(())
    }

    // ── Assembly ───────────────────────────────────────────────────────────

    /// Fill one log's budget: direct aggregation first where the log
    /// supports it, relevance fill with the remainder, then sort by chunk
    /// position to restore chronological order.
    async fn assemble_log(
        &self,
        chat: &Chat,
        ledger: &ChunkLedger,
        context: &str,
        log_type: LogType,
        budget: usize,
    ) -> Result<Vec<Placed>> {
        let config = LogTypeConfig::for_log(log_type);

        let (mut placed, used) = if config.supports_direct_aggregation {
            self.aggregate_small_chunks(chat, ledger, log_type, budget)?
        } else {
            (Vec::new(), 0)
        };

        let retrieved = self
            .contextualize_chunks(chat, ledger, context, log_type, budget - used)
            .await?;
        placed.extend(retrieved);

        placed.sort_by_key(|p| p.chunk_idx);
        Ok(placed)
    }

    /// Include small (unsplit, un-indexed) chunks directly, oldest first.
    ///
    /// Oldest-first fill means that under tight budgets the most recent
    /// small messages are the ones dropped: conversational foundation is
    /// favored over recency on this path. Returns the included chunks and
    /// the tokens they consumed.
    fn aggregate_small_chunks(
        &self,
        chat: &Chat,
        ledger: &ChunkLedger,
        log_type: LogType,
        budget: usize,
    ) -> Result<(Vec<Placed>, usize)> {
        let mut placed = Vec::new();
        let mut used = 0usize;

        for chunk_idx in ledger.small_chunk_positions(log_type) {
            let chunk = ledger.get(log_type, chunk_idx).ok_or_else(|| {
                Error::Consistency(format!("{log_type} chunk {chunk_idx} missing from ledger"))
            })?;
            let msg = chat.message(log_type, chunk.msg_idx).ok_or_else(|| {
                Error::Consistency(format!(
                    "{log_type} chunk {chunk_idx} points at missing message {}",
                    chunk.msg_idx
                ))
            })?;
            let tokens = chat.message_tokens(log_type, chunk.msg_idx).ok_or_else(|| {
                Error::Consistency(format!(
                    "{log_type} message {} has no token count",
                    chunk.msg_idx
                ))
            })?;

            if used + tokens > budget {
                break;
            }
            used += tokens;
            placed.push(Placed {
                msg: msg.clone(),
                chunk_idx,
            });
        }

        trace!(log_type = %log_type, included = placed.len(), tokens = used, "direct aggregation");
        Ok((placed, used))
    }

    /// Spend a budget on chunks ranked by the collection's relevance metric.
    async fn contextualize_chunks(
        &self,
        chat: &Chat,
        ledger: &ChunkLedger,
        context: &str,
        log_type: LogType,
        budget: usize,
    ) -> Result<Vec<Placed>> {
        let hits = self.collection(log_type).search(context).await?;

        let mut placed = Vec::new();
        let mut used = 0usize;

        for hit in hits {
            let metadata = hit.metadata.ok_or_else(|| {
                Error::Consistency(format!("{log_type} search hit is missing its metadata"))
            })?;
            if used + metadata.tokens > budget {
                break;
            }
            let msg = self.recover_message(chat, ledger, log_type, metadata.index, &hit.text)?;
            used += metadata.tokens;
            placed.push(Placed {
                msg,
                chunk_idx: metadata.index,
            });
        }

        debug!(log_type = %log_type, included = placed.len(), tokens = used, "relevance fill");
        Ok(placed)
    }

    /// Turn an accepted hit back into a message. Whole unsplit messages were
    /// indexed as their JSON serialization; anything else is a split
    /// fragment, which takes its role from the originating message.
    fn recover_message(
        &self,
        chat: &Chat,
        ledger: &ChunkLedger,
        log_type: LogType,
        chunk_idx: ChunkIdx,
        text: &str,
    ) -> Result<Message> {
        if let Ok(msg) = serde_json::from_str::<Message>(text) {
            return Ok(msg);
        }

        let chunk = ledger.get(log_type, chunk_idx).ok_or_else(|| {
            Error::Consistency(format!("indexed {log_type} chunk {chunk_idx} absent from ledger"))
        })?;
        let origin = chat.message(log_type, chunk.msg_idx).ok_or_else(|| {
            Error::Consistency(format!(
                "{log_type} chunk {chunk_idx} points at missing message {}",
                chunk.msg_idx
            ))
        })?;

        let mut msg = origin.clone();
        msg.content = text.to_string();
        Ok(msg)
    }

    fn collection(&self, log_type: LogType) -> &Arc<dyn SemanticCollection> {
        match log_type {
            LogType::Persistent => &self.persistent_collection,
            LogType::Temporary => &self.temporary_collection,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
