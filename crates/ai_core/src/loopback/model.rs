//! Echoing causal model

use std::time::Duration;

use async_trait::async_trait;
use domain::SamplingParams;
use futures::{StreamExt, stream};
use tracing::debug;

use super::SpecialToken;
use crate::{
    error::InferenceError,
    ports::{CausalModel, Encoding, TokenStream},
};

/// Replies with a prefix followed by the last user message, one byte per token
#[derive(Debug, Clone)]
pub struct LoopbackModel {
    reply_prefix: String,
    token_delay: Duration,
}

impl LoopbackModel {
    pub fn new(reply_prefix: impl Into<String>, token_delay: Duration) -> Self {
        Self {
            reply_prefix: reply_prefix.into(),
            token_delay,
        }
    }

    /// Bytes of the last user turn, or of the whole input when it has none
    fn last_user_text(input_ids: &[u32]) -> Vec<u8> {
        let user = SpecialToken::User.id();
        let start = input_ids
            .iter()
            .rposition(|&id| id == user)
            .map_or(0, |pos| pos + 1);

        let mut text: Vec<u8> = input_ids[start..]
            .iter()
            .map_while(|&id| u8::try_from(id).ok())
            .collect();
        if text.last() == Some(&b'\n') {
            text.pop();
        }
        text
    }

    /// Tokens the model will produce for an input, EOS included
    pub fn reply_tokens(&self, input: &Encoding, params: &SamplingParams) -> Vec<u32> {
        let reply = self
            .reply_prefix
            .bytes()
            .chain(Self::last_user_text(&input.input_ids));
        let limit = usize::try_from(params.max_new_tokens).unwrap_or(usize::MAX);

        reply
            .map(u32::from)
            .chain(std::iter::once(SpecialToken::Eos.id()))
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl CausalModel for LoopbackModel {
    async fn generate(
        &self,
        input: &Encoding,
        params: &SamplingParams,
    ) -> Result<TokenStream, InferenceError> {
        if input.is_empty() {
            return Err(InferenceError::generation("empty input"));
        }

        let tokens = self.reply_tokens(input, params);
        debug!(
            input_tokens = input.len(),
            output_tokens = tokens.len(),
            "Loopback generation"
        );

        let delay = self.token_delay;
        let stream = stream::iter(tokens).then(move |token| async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            Ok(token)
        });
        Ok(Box::pin(stream))
    }
}
