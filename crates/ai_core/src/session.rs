//! One streamed generation run
//!
//! A session renders the conversation, streams tokens from the model,
//! turns them into incremental text updates with a throughput figure and
//! stops at the token limit or when the cancellation token is signaled.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use domain::{GenerationRequest, ModelVariant, StreamingUpdate};
use futures::StreamExt;
use tracing::{debug, info, instrument};

use crate::{
    cancellation::CancellationToken,
    config::InferenceConfig,
    error::InferenceError,
    pipeline::{Pipeline, PipelineCache},
    ports::ignore_progress,
    streamer::TextStreamer,
};

const MIN_ELAPSED: Duration = Duration::from_micros(1);

/// Tokens-per-second measurement anchored at the first generated token
#[derive(Debug, Default, Clone, Copy)]
pub struct ThroughputMeter {
    first_token_at: Option<Instant>,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated token and return the rate so far
    ///
    /// `None` on the first token, which only anchors the clock.
    pub fn record(&mut self, num_tokens: usize) -> Option<f64> {
        self.record_at(num_tokens, Instant::now())
    }

    fn record_at(&mut self, num_tokens: usize, now: Instant) -> Option<f64> {
        let Some(start) = self.first_token_at else {
            self.first_token_at = Some(now);
            return None;
        };
        let elapsed = now.saturating_duration_since(start).max(MIN_ELAPSED);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        Some(num_tokens as f64 / elapsed_ms * 1000.0)
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Natural end; carries the full decoded sequence
    Completed(String),
    /// Stopped at a token boundary after the cancellation token was signaled
    Cancelled,
}

/// Receiver of a session's streamed output
#[async_trait]
pub trait TokenSink: Send {
    /// Generation has begun; called once, before any update
    async fn start(&mut self);

    /// A newly stable text fragment
    async fn update(&mut self, update: StreamingUpdate);
}

/// A generation bound to a warmed-up pipeline
pub struct GenerationSession {
    pipeline: Arc<Pipeline>,
    cancellation: CancellationToken,
    max_new_tokens: u32,
}

impl fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSession")
            .field("variant", &self.pipeline.variant())
            .field("max_new_tokens", &self.max_new_tokens)
            .finish_non_exhaustive()
    }
}

impl GenerationSession {
    /// Create a session over an existing pipeline
    ///
    /// The token limit is the smaller of `max_new_tokens` and the variant's
    /// own cap.
    pub fn new(
        pipeline: Arc<Pipeline>,
        cancellation: CancellationToken,
        max_new_tokens: u32,
    ) -> Self {
        let max_new_tokens = max_new_tokens.min(pipeline.profile().sampling.max_new_tokens);
        Self {
            pipeline,
            cancellation,
            max_new_tokens,
        }
    }

    /// Obtain the variant's pipeline, warm it up and bind a session to it
    #[instrument(skip(cache, cancellation, config), fields(variant = %variant))]
    pub async fn open(
        cache: &PipelineCache,
        variant: ModelVariant,
        cancellation: CancellationToken,
        config: &InferenceConfig,
    ) -> Result<Self, InferenceError> {
        let pipeline = cache.get_pipeline(variant, ignore_progress()).await?;
        pipeline.warm_up(&config.warm_up_prompt).await?;
        Ok(Self::new(pipeline, cancellation, config.max_new_tokens))
    }

    /// Effective token limit
    pub const fn max_new_tokens(&self) -> u32 {
        self.max_new_tokens
    }

    /// Run the generation, streaming into `sink`
    #[instrument(skip_all, fields(variant = %self.pipeline.variant(), messages = request.len()))]
    pub async fn run(
        &self,
        request: &GenerationRequest,
        sink: &mut dyn TokenSink,
    ) -> Result<GenerationOutcome, InferenceError> {
        let tokenizer = Arc::clone(self.pipeline.tokenizer());
        let prompt = tokenizer.apply_chat_template(request.messages(), true)?;
        let params = self
            .pipeline
            .profile()
            .sampling
            .with_max_new_tokens(self.max_new_tokens);

        sink.start().await;

        let mut tokens = self.pipeline.model().generate(&prompt, &params).await?;
        let mut streamer = TextStreamer::new(Arc::clone(&tokenizer));
        let mut meter = ThroughputMeter::new();
        let mut generated: Vec<u32> = Vec::new();
        let limit = usize::try_from(self.max_new_tokens).unwrap_or(usize::MAX);

        while generated.len() < limit {
            if self.cancellation.is_signaled() {
                info!(num_tokens = generated.len(), "Generation cancelled");
                return Ok(GenerationOutcome::Cancelled);
            }
            let Some(token) = tokens.next().await else {
                break;
            };
            let token = token?;
            if self.cancellation.is_signaled() {
                info!(num_tokens = generated.len(), "Generation cancelled");
                return Ok(GenerationOutcome::Cancelled);
            }

            generated.push(token);
            let num_tokens = generated.len();
            let tps = meter.record(num_tokens);

            if let Some(output) = streamer.put(token)? {
                sink.update(StreamingUpdate {
                    output,
                    tps,
                    num_tokens,
                })
                .await;
            }
        }
        drop(tokens);

        if let Some(output) = streamer.end()? {
            let num_tokens = generated.len();
            sink.update(StreamingUpdate {
                output,
                tps: meter.record(num_tokens),
                num_tokens,
            })
            .await;
        }

        let mut sequence = prompt.input_ids;
        sequence.extend_from_slice(&generated);
        let output = tokenizer.decode(&sequence, true)?;

        debug!(num_tokens = generated.len(), "Generation complete");
        Ok(GenerationOutcome::Completed(output))
    }
}
