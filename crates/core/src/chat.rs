//! The two-log chat store.
//!
//! Holds the persistent and temporary message logs for one conversation.
//! Each message's token count is derived once at append time, over the JSON
//! serialization of the message (the same text an unsplit chunk is indexed
//! as, which keeps direct-aggregation and retrieval accounting consistent).
//! Messages are immutable once appended.

use std::sync::Arc;

use crate::error::Result;
use crate::message::{LogType, Message};
use crate::tokenizer::Tokenizer;

/// Two independent ordered message logs with frozen per-message token counts.
#[derive(Clone)]
pub struct Chat {
    tokenizer: Arc<dyn Tokenizer>,
    persistent: ChatLog,
    temporary: ChatLog,
}

impl std::fmt::Debug for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chat")
            .field("persistent", &self.persistent)
            .field("temporary", &self.temporary)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
struct ChatLog {
    messages: Vec<Message>,
    tokens: Vec<usize>,
}

impl Chat {
    /// Create an empty chat using the given tokenizer for token accounting.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            persistent: ChatLog::default(),
            temporary: ChatLog::default(),
        }
    }

    /// The tokenizer this chat derives token counts with.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Append messages to a log, freezing each message's token count.
    pub fn add(&mut self, log_type: LogType, messages: Vec<Message>) -> Result<()> {
        for message in messages {
            self.push(log_type, message)?;
        }
        Ok(())
    }

    /// Append a single message to a log.
    pub fn push(&mut self, log_type: LogType, message: Message) -> Result<()> {
        let serialized = serde_json::to_string(&message)?;
        let tokens = self.tokenizer.count(&serialized);
        let log = self.log_mut(log_type);
        log.messages.push(message);
        log.tokens.push(tokens);
        Ok(())
    }

    /// The ordered messages of a log.
    pub fn messages(&self, log_type: LogType) -> &[Message] {
        &self.log(log_type).messages
    }

    /// Look up a message by position.
    pub fn message(&self, log_type: LogType, idx: usize) -> Option<&Message> {
        self.log(log_type).messages.get(idx)
    }

    /// The frozen token count of a message, by position.
    pub fn message_tokens(&self, log_type: LogType, idx: usize) -> Option<usize> {
        self.log(log_type).tokens.get(idx).copied()
    }

    /// A new empty chat sharing this chat's tokenizer.
    pub fn clone_empty(&self) -> Self {
        Self::new(Arc::clone(&self.tokenizer))
    }

    fn log(&self, log_type: LogType) -> &ChatLog {
        match log_type {
            LogType::Persistent => &self.persistent,
            LogType::Temporary => &self.temporary,
        }
    }

    fn log_mut(&mut self, log_type: LogType) -> &mut ChatLog {
        match log_type {
            LogType::Persistent => &mut self.persistent,
            LogType::Temporary => &mut self.temporary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::HeuristicTokenizer;

    fn chat() -> Chat {
        Chat::new(Arc::new(HeuristicTokenizer))
    }

    #[test]
    fn logs_are_independent() {
        let mut chat = chat();
        chat.push(LogType::Persistent, Message::user("persistent one"))
            .unwrap();
        chat.push(LogType::Temporary, Message::user("temporary one"))
            .unwrap();
        chat.push(LogType::Temporary, Message::user("temporary two"))
            .unwrap();

        assert_eq!(chat.messages(LogType::Persistent).len(), 1);
        assert_eq!(chat.messages(LogType::Temporary).len(), 2);
    }

    #[test]
    fn token_count_frozen_at_append() {
        let mut chat = chat();
        let msg = Message::user("some content worth a few tokens");
        let expected = HeuristicTokenizer.count(&serde_json::to_string(&msg).unwrap());
        chat.push(LogType::Persistent, msg).unwrap();

        assert_eq!(chat.message_tokens(LogType::Persistent, 0), Some(expected));
    }

    #[test]
    fn missing_index_returns_none() {
        let chat = chat();
        assert!(chat.message(LogType::Persistent, 0).is_none());
        assert!(chat.message_tokens(LogType::Temporary, 3).is_none());
    }

    #[test]
    fn clone_empty_shares_tokenizer_but_no_messages() {
        let mut chat = chat();
        chat.push(LogType::Persistent, Message::user("hello")).unwrap();

        let empty = chat.clone_empty();
        assert!(empty.messages(LogType::Persistent).is_empty());
        assert!(empty.messages(LogType::Temporary).is_empty());
        // Same accounting on the clone
        assert_eq!(empty.tokenizer().count("test"), chat.tokenizer().count("test"));
    }
}
