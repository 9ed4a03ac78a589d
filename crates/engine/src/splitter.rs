//! Size-bounded message splitter, the reference `MessageChunker`.
//!
//! A message must be split when its JSON serialization exceeds the size
//! limit. Splitting carves the content into in-order segments, each
//! re-serialized as a message with the original role, id, and timestamp, so
//! every sub-text stays within the limit and concatenating the segments
//! reproduces the original content.

use ctxchat_core::chunker::MessageChunker;
use ctxchat_core::error::ChunkerError;
use ctxchat_core::message::Message;

/// Default size limit for a single indexed chunk, in serialized characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4096;

/// Splits oversized messages into size-bounded JSON sub-messages.
#[derive(Debug, Clone, Copy)]
pub struct SizeSplitter {
    max_chunk_chars: usize,
}

impl SizeSplitter {
    pub fn new(max_chunk_chars: usize) -> Self {
        Self { max_chunk_chars }
    }
}

impl Default for SizeSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

impl MessageChunker for SizeSplitter {
    fn should_chunk(&self, message: &Message) -> bool {
        serde_json::to_string(message)
            .map(|s| s.len() > self.max_chunk_chars)
            .unwrap_or(false)
    }

    fn chunk(&self, message: &Message) -> Result<Vec<String>, ChunkerError> {
        // Everything except the content costs the same in every sub-message.
        let mut shell = message.clone();
        shell.content.clear();
        let envelope = serde_json::to_string(&shell)
            .map_err(|e| ChunkerError::SplitFailed(e.to_string()))?
            .len();

        if envelope >= self.max_chunk_chars {
            return Err(ChunkerError::LimitTooSmall {
                limit: self.max_chunk_chars,
                envelope,
            });
        }
        let content_budget = self.max_chunk_chars - envelope;

        let mut sub_texts = Vec::new();
        let mut piece = String::new();
        let mut piece_len = 0usize;

        for c in message.content.chars() {
            let cost = escaped_len(c);
            if piece_len + cost > content_budget && !piece.is_empty() {
                sub_texts.push(render(&shell, &piece)?);
                piece.clear();
                piece_len = 0;
            }
            piece.push(c);
            piece_len += cost;
        }
        if !piece.is_empty() || sub_texts.is_empty() {
            sub_texts.push(render(&shell, &piece)?);
        }

        Ok(sub_texts)
    }
}

fn render(shell: &Message, content: &str) -> Result<String, ChunkerError> {
    let mut sub = shell.clone();
    sub.content = content.to_string();
    serde_json::to_string(&sub).map_err(|e| ChunkerError::SplitFailed(e.to_string()))
}

/// Serialized length of one character inside a JSON string, per serde_json's
/// default escaping.
fn escaped_len(c: char) -> usize {
    match c {
        '"' | '\\' | '\u{08}' | '\u{0c}' | '\n' | '\r' | '\t' => 2,
        c if (c as u32) < 0x20 => 6,
        c => c.len_utf8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(limit: usize) -> SizeSplitter {
        SizeSplitter::new(limit)
    }

    #[test]
    fn short_message_is_not_chunked() {
        let msg = Message::user("short");
        assert!(!splitter(1024).should_chunk(&msg));
    }

    #[test]
    fn oversized_message_is_chunked() {
        let msg = Message::user("x".repeat(2000));
        assert!(splitter(1024).should_chunk(&msg));
    }

    #[test]
    fn segments_concatenate_to_original_content() {
        let content = "abcdefghij".repeat(50);
        let msg = Message::user(content.clone());
        let pieces = splitter(256).chunk(&msg).unwrap();
        assert!(pieces.len() > 1);

        let rebuilt: String = pieces
            .iter()
            .map(|p| serde_json::from_str::<Message>(p).unwrap().content)
            .collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn every_sub_text_respects_the_limit() {
        let limit = 300;
        let msg = Message::user("word ".repeat(400));
        let pieces = splitter(limit).chunk(&msg).unwrap();
        for piece in &pieces {
            assert!(piece.len() <= limit, "piece of {} chars", piece.len());
        }
    }

    #[test]
    fn limit_holds_for_content_needing_escapes() {
        let limit = 280;
        let msg = Message::user("say \"hi\"\nagain\t".repeat(120));
        let pieces = splitter(limit).chunk(&msg).unwrap();
        for piece in &pieces {
            assert!(piece.len() <= limit, "piece of {} chars", piece.len());
        }
    }

    #[test]
    fn segments_preserve_role_and_identity() {
        let msg = Message::assistant("z".repeat(1000));
        let pieces = splitter(300).chunk(&msg).unwrap();
        for piece in pieces {
            let sub: Message = serde_json::from_str(&piece).unwrap();
            assert_eq!(sub.role, msg.role);
            assert_eq!(sub.id, msg.id);
        }
    }

    #[test]
    fn limit_smaller_than_envelope_is_an_error() {
        let msg = Message::user("some content");
        let err = splitter(10).chunk(&msg).unwrap_err();
        assert!(matches!(err, ChunkerError::LimitTooSmall { .. }));
    }
}
