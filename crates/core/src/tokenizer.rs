//! Tokenizer collaborator trait.
//!
//! Token counts drive all budget arithmetic, so encodings must be stable:
//! the same text must always produce the same count.

/// Encodes text into token ids. Token count = sequence length.
pub trait Tokenizer: Send + Sync {
    /// Encode text into a sequence of token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Count tokens in a text. Default goes through `encode`; implementations
    /// with a cheaper counting path should override.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Character-based heuristic tokenizer: 1 token ≈ 4 characters, rounded up.
///
/// Accurate within ~10% for BPE tokenizers (GPT-4, Claude) on English text.
/// Stable by construction, which is all the budget arithmetic requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenizer;

impl Tokenizer for HeuristicTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        (0..self.count(text) as u32).collect()
    }

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        text.len().div_ceil(4)
    }
}
