//! Message chunker collaborator trait.

use crate::error::ChunkerError;
use crate::message::Message;

/// Decides whether a message must be split and, if so, produces the ordered
/// sub-texts. Each sub-text must stay within the implementation's size
/// limit, and concatenation order must match the original content order.
pub trait MessageChunker: Send + Sync {
    /// Whether this message is too large to index as a single chunk.
    fn should_chunk(&self, message: &Message) -> bool;

    /// Split the message into ordered sub-texts.
    ///
    /// Only called for messages where `should_chunk` returned true.
    fn chunk(&self, message: &Message) -> Result<Vec<String>, ChunkerError>;
}
