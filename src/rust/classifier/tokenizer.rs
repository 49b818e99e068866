use std::fmt::Debug;
use std::path::Path;

use log::{debug, info, warn};
use tokenizers::Tokenizer;

use super::error::ClassifierError;

/// Number of positions every encoded sequence is padded or truncated to.
pub const MAX_SEQUENCE_LENGTH: usize = 20;
/// Size of the id space the word hash is reduced into.
pub const VOCAB_SIZE: u32 = 30_000;
/// Id used for padding positions.
pub const PAD_ID: i64 = 0;

/// Order-sensitive word hash that is identical across processes and runtimes.
///
/// Sums `code_point(c) * (i + 1)` over the characters of `word` and keeps the
/// low 31 bits.
pub fn stable_hash(word: &str) -> u32 {
    let sum = word
        .chars()
        .enumerate()
        .fold(0u64, |acc, (i, c)| acc.wrapping_add(u64::from(c).wrapping_mul(i as u64 + 1)));
    (sum & 0x7fff_ffff) as u32
}

/// Word separators: Unicode whitespace plus the ASCII file, group, record and
/// unit separators (U+001C..=U+001F).
pub fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Fixed-length sequence of token ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSequence(Vec<i64>);

impl TokenSequence {
    /// Right-pads `ids` with [`PAD_ID`] up to `max_len` or keeps the first `max_len`.
    pub fn from_ids(mut ids: Vec<i64>, max_len: usize) -> Self {
        ids.truncate(max_len);
        ids.resize(max_len, PAD_ID);
        Self(ids)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 1 where the id is real content, 0 where it is padding.
///
/// Derived from the ids alone, so a word that hashes to exactly [`PAD_ID`] is
/// masked out as if it were padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttentionMask(Vec<i64>);

impl AttentionMask {
    pub fn from_tokens(tokens: &TokenSequence) -> Self {
        Self(tokens.as_slice().iter().map(|&id| i64::from(id != PAD_ID)).collect())
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Turns raw text into the fixed-length tensors fed to the model.
pub trait TextEncoder: Debug + Send + Sync {
    fn encode(&self, text: &str) -> Result<(TokenSequence, AttentionMask), ClassifierError>;

    /// Length of every sequence produced by [`TextEncoder::encode`].
    fn max_len(&self) -> usize;
}

/// Dependency-free tokenizer: whitespace words mapped through [`stable_hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashTokenizer {
    max_len: usize,
    vocab_size: u32,
}

impl Default for HashTokenizer {
    fn default() -> Self {
        Self {
            max_len: MAX_SEQUENCE_LENGTH,
            vocab_size: VOCAB_SIZE,
        }
    }
}

impl HashTokenizer {
    pub fn new(max_len: usize, vocab_size: u32) -> Result<Self, ClassifierError> {
        if max_len == 0 {
            return Err(ClassifierError::ConfigError("Sequence length must be greater than zero".into()));
        }
        if vocab_size == 0 {
            return Err(ClassifierError::ConfigError("Vocabulary size must be greater than zero".into()));
        }
        Ok(Self { max_len, vocab_size })
    }

    pub fn vocab_size(&self) -> u32 {
        self.vocab_size
    }

    pub fn token_id(&self, word: &str) -> i64 {
        i64::from(stable_hash(word) % self.vocab_size)
    }

    /// Infallible form of [`TextEncoder::encode`].
    pub fn encode_text(&self, text: &str) -> (TokenSequence, AttentionMask) {
        let lowered = text.to_lowercase();
        let ids: Vec<i64> = lowered
            .split(is_word_separator)
            .filter(|word| !word.is_empty())
            .take(self.max_len)
            .map(|word| self.token_id(word))
            .collect();
        let tokens = TokenSequence::from_ids(ids, self.max_len);
        let mask = AttentionMask::from_tokens(&tokens);
        (tokens, mask)
    }
}

impl TextEncoder for HashTokenizer {
    fn encode(&self, text: &str) -> Result<(TokenSequence, AttentionMask), ClassifierError> {
        Ok(self.encode_text(text))
    }

    fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Encoder backed by a `tokenizer.json` subword vocabulary.
///
/// Only meaningful for models trained against that exact tokenizer; the ids
/// have nothing in common with [`HashTokenizer`] output.
#[derive(Debug)]
pub struct SubwordEncoder {
    tokenizer: Tokenizer,
    max_len: usize,
}

impl SubwordEncoder {
    pub fn from_file<P: AsRef<Path>>(path: P, max_len: usize) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if max_len == 0 {
            return Err(ClassifierError::ConfigError("Sequence length must be greater than zero".into()));
        }
        if !path.exists() {
            return Err(ClassifierError::ConfigError(format!("Tokenizer file not found: {}", path.display())));
        }
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| ClassifierError::ConfigError(format!("Failed to load tokenizer: {}", e)))?;
        info!("Subword tokenizer loaded from {}", path.display());
        warn!("Subword ids only match models trained with this tokenizer; hash-trained models will misclassify");
        Ok(Self { tokenizer, max_len })
    }
}

impl TextEncoder for SubwordEncoder {
    fn encode(&self, text: &str) -> Result<(TokenSequence, AttentionMask), ClassifierError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        if ids.len() > self.max_len {
            debug!("Truncating {} subword tokens to {}", ids.len(), self.max_len);
        }
        let tokens = TokenSequence::from_ids(ids, self.max_len);
        let mask = AttentionMask::from_tokens(&tokens);
        Ok((tokens, mask))
    }

    fn max_len(&self) -> usize {
        self.max_len
    }
}
