//! Keyed, lazily initialized pipeline cache
//!
//! One [`Pipeline`] per [`ModelVariant`] for the lifetime of the process.
//! Initialization is memoized per key: concurrent requests for a variant that
//! is still loading wait on the same in-flight initialization instead of
//! loading twice. Failed initializations are not cached.

use std::{fmt, sync::Arc, time::Instant};

use domain::{ModelVariant, SamplingParams, VariantProfile};
use futures::StreamExt;
use moka::future::Cache;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::{
    device::DeviceSelector,
    error::InferenceError,
    ports::{ArtifactLoader, CausalModel, ComputeAdapter, ProgressCallback, Tokenizer},
};

/// Tokenizer and model bound to one variant and one adapter
pub struct Pipeline {
    variant: ModelVariant,
    profile: VariantProfile,
    adapter: ComputeAdapter,
    tokenizer: Arc<dyn Tokenizer>,
    model: Arc<dyn CausalModel>,
    warmed_up: OnceCell<()>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("variant", &self.variant)
            .field("adapter", &self.adapter)
            .field("warmed_up", &self.is_warm())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline from loaded handles
    pub fn new(
        variant: ModelVariant,
        adapter: ComputeAdapter,
        tokenizer: Arc<dyn Tokenizer>,
        model: Arc<dyn CausalModel>,
    ) -> Self {
        Self {
            variant,
            profile: variant.profile(),
            adapter,
            tokenizer,
            model,
            warmed_up: OnceCell::new(),
        }
    }

    /// Variant this pipeline serves
    #[must_use]
    pub const fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Static profile of the variant
    #[must_use]
    pub const fn profile(&self) -> &VariantProfile {
        &self.profile
    }

    /// Adapter the model was bound to
    #[must_use]
    pub const fn adapter(&self) -> &ComputeAdapter {
        &self.adapter
    }

    /// Tokenizer handle
    #[must_use]
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Model handle
    #[must_use]
    pub fn model(&self) -> &Arc<dyn CausalModel> {
        &self.model
    }

    /// Whether the warm-up pass has completed
    #[must_use]
    pub fn is_warm(&self) -> bool {
        self.warmed_up.initialized()
    }

    /// Run the one-token warm-up pass, once per pipeline
    ///
    /// Forces deferred graph compilation before user-facing latency is
    /// measured. The generated token is discarded. Callers racing on a cold
    /// pipeline share one pass; a failed pass is retried by the next caller.
    #[instrument(skip(self, prompt), fields(variant = %self.variant))]
    pub async fn warm_up(&self, prompt: &str) -> Result<(), InferenceError> {
        self.warmed_up
            .get_or_try_init(|| async {
                let start = Instant::now();
                let input = self.tokenizer.encode(prompt)?;
                let params = SamplingParams::greedy().with_max_new_tokens(1);

                let mut tokens = self.model.generate(&input, &params).await?;
                if let Some(token) = tokens.next().await {
                    token?;
                }

                debug!(
                    elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Warm-up pass complete"
                );
                Ok::<(), InferenceError>(())
            })
            .await
            .map(|_| ())
    }
}

/// Process-wide cache of pipelines, one slot per variant
pub struct PipelineCache {
    selector: Arc<DeviceSelector>,
    loader: Arc<dyn ArtifactLoader>,
    slots: Cache<ModelVariant, Arc<Pipeline>>,
}

impl fmt::Debug for PipelineCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineCache")
            .field("selector", &self.selector)
            .field("loaded", &self.loaded_variants())
            .finish_non_exhaustive()
    }
}

impl PipelineCache {
    /// Create an empty cache
    pub fn new(selector: Arc<DeviceSelector>, loader: Arc<dyn ArtifactLoader>) -> Self {
        Self {
            selector,
            loader,
            slots: Cache::builder().name("pipelines").build(),
        }
    }

    /// Device selector used for cold loads
    #[must_use]
    pub fn selector(&self) -> &Arc<DeviceSelector> {
        &self.selector
    }

    /// Whether the variant's slot is populated
    #[must_use]
    pub fn contains(&self, variant: ModelVariant) -> bool {
        self.slots.contains_key(&variant)
    }

    /// Cached pipeline of a variant, without loading
    pub async fn get_if_present(&self, variant: ModelVariant) -> Option<Arc<Pipeline>> {
        self.slots.get(&variant).await
    }

    /// Variants whose slot is populated
    #[must_use]
    pub fn loaded_variants(&self) -> Vec<ModelVariant> {
        let mut variants: Vec<_> = self.slots.iter().map(|(variant, _)| *variant).collect();
        variants.sort_by_key(|v| v.config_key());
        variants
    }

    /// Get the pipeline of a variant, loading it on first use
    ///
    /// `on_progress` only sees events when this call performs the load.
    #[instrument(skip(self, on_progress), fields(variant = %variant))]
    pub async fn get_pipeline(
        &self,
        variant: ModelVariant,
        on_progress: ProgressCallback,
    ) -> Result<Arc<Pipeline>, InferenceError> {
        let entry = self
            .slots
            .entry(variant)
            .or_try_insert_with(self.initialize(variant, on_progress))
            .await?;

        if entry.is_fresh() {
            info!("Pipeline loaded");
        } else {
            debug!("Pipeline cache hit");
        }
        Ok(entry.into_value())
    }

    async fn initialize(
        &self,
        variant: ModelVariant,
        on_progress: ProgressCallback,
    ) -> Result<Arc<Pipeline>, InferenceError> {
        let start = Instant::now();
        let adapter = self.selector.select_adapter().await?;
        let profile = variant.profile();

        info!(
            model_id = profile.model_id,
            quantization = %profile.quantization,
            adapter = %adapter,
            "Loading pipeline"
        );

        let (tokenizer, model) = tokio::try_join!(
            self.loader
                .load_tokenizer(&profile, Arc::clone(&on_progress)),
            self.loader.load_model(&profile, &adapter, on_progress),
        )?;

        debug!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Artifacts obtained"
        );
        Ok(Arc::new(Pipeline::new(variant, adapter, tokenizer, model)))
    }
}
