//! Incremental detokenization
//!
//! Decoding token by token breaks multi-byte characters apart, so the
//! streamer re-decodes the pending tokens and only releases the newly
//! stable suffix. Text ending in the replacement character is held back
//! until the next token completes it.

use std::{fmt, sync::Arc};

use crate::{error::InferenceError, ports::Tokenizer};

const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Turns a stream of token ids into a stream of text fragments
pub struct TextStreamer {
    tokenizer: Arc<dyn Tokenizer>,
    pending: Vec<u32>,
    emitted_len: usize,
}

impl fmt::Debug for TextStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStreamer")
            .field("pending", &self.pending.len())
            .field("emitted_len", &self.emitted_len)
            .finish_non_exhaustive()
    }
}

impl TextStreamer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            pending: Vec::new(),
            emitted_len: 0,
        }
    }

    /// Feed one token; returns the text it made stable, if any
    pub fn put(&mut self, token: u32) -> Result<Option<String>, InferenceError> {
        self.pending.push(token);
        let text = self.tokenizer.decode(&self.pending, true)?;

        if text.ends_with('\n') {
            let fragment = self.take_suffix(&text);
            self.pending.clear();
            self.emitted_len = 0;
            return Ok(fragment);
        }

        if text.ends_with(REPLACEMENT_CHAR) {
            return Ok(None);
        }

        let fragment = self.take_suffix(&text);
        self.emitted_len = self.emitted_len.max(text.len());
        Ok(fragment)
    }

    /// Flush whatever is still held back
    pub fn end(&mut self) -> Result<Option<String>, InferenceError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let text = self.tokenizer.decode(&self.pending, true)?;
        let fragment = self.take_suffix(&text);
        self.pending.clear();
        self.emitted_len = 0;
        Ok(fragment)
    }

    fn take_suffix(&self, text: &str) -> Option<String> {
        text.get(self.emitted_len..)
            .filter(|suffix| !suffix.is_empty())
            .map(str::to_string)
    }
}
