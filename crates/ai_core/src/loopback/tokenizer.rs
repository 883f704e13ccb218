//! Byte-level tokenizer with a small chat template

use domain::{ChatMessage, MessageRole};

use crate::{error::InferenceError, ports::Encoding, ports::Tokenizer};

/// Reserved ids above the byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SpecialToken {
    Bos = 256,
    Eos = 257,
    User = 258,
    Assistant = 259,
    System = 260,
}

impl SpecialToken {
    const ALL: [Self; 5] = [
        Self::Bos,
        Self::Eos,
        Self::User,
        Self::Assistant,
        Self::System,
    ];

    /// Token id
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Special token for an id, if it is one
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    const fn for_role(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
            MessageRole::System => Self::System,
        }
    }

    const fn text(self) -> &'static str {
        match self {
            Self::Bos => "<s>",
            Self::Eos => "</s>",
            Self::User => "<|user|>",
            Self::Assistant => "<|assistant|>",
            Self::System => "<|system|>",
        }
    }
}

/// One token per UTF-8 byte
///
/// The chat template is `BOS (ROLE content "\n")* ASSISTANT?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackTokenizer;

impl LoopbackTokenizer {
    fn push_text(ids: &mut Vec<u32>, text: &str) {
        ids.extend(text.bytes().map(u32::from));
    }
}

impl Tokenizer for LoopbackTokenizer {
    fn apply_chat_template(
        &self,
        messages: &[ChatMessage],
        add_generation_prompt: bool,
    ) -> Result<Encoding, InferenceError> {
        let mut ids = vec![SpecialToken::Bos.id()];
        for message in messages {
            ids.push(SpecialToken::for_role(message.role).id());
            Self::push_text(&mut ids, &message.content);
            ids.push(u32::from(b'\n'));
        }
        if add_generation_prompt {
            ids.push(SpecialToken::Assistant.id());
        }
        Ok(Encoding::new(ids))
    }

    fn encode(&self, text: &str) -> Result<Encoding, InferenceError> {
        let mut ids = Vec::with_capacity(text.len());
        Self::push_text(&mut ids, text);
        Ok(Encoding::new(ids))
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, InferenceError> {
        let mut bytes = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Ok(byte) = u8::try_from(id) {
                bytes.push(byte);
                continue;
            }
            match SpecialToken::from_id(id) {
                Some(_) if skip_special_tokens => {}
                Some(special) => bytes.extend_from_slice(special.text().as_bytes()),
                None => {
                    return Err(InferenceError::generation(format!("unknown token id {id}")));
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
