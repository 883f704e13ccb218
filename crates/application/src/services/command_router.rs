//! Command router - Single dispatch loop for host commands
//!
//! Commands are handled one at a time in arrival order. Loading and
//! generation run as spawned tasks so the loop keeps receiving commands
//! (most importantly `interrupt`) while they are in flight.

use std::{fmt, sync::Arc};

use ai_core::{
    CancellationToken, GenerationOutcome, GenerationSession, InferenceConfig, PipelineCache,
    ports::ProgressCallback,
};
use domain::{ChatMessage, GenerationRequest, ModelVariant, ProgressEvent, WorkerCommand};
use serde::Serialize;
use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, info, instrument, warn};

use super::EventEmitter;
use crate::error::ApplicationError;

/// Phase text sent before the pipeline is obtained
pub const LOADING_MODEL: &str = "Loading model...";

/// Phase text sent before the warm-up pass
pub const WARMING_UP: &str = "Compiling shaders and warming up model...";

/// Router settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterConfig {
    /// Variant used when a command carries no `model_type`
    pub default_variant: ModelVariant,
    /// Device, warm-up and token limit settings
    pub inference: InferenceConfig,
}

/// What the worker is busy with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Idle,
    Loading,
    Generating,
}

/// Owns the process-wide pipeline cache, cancellation token and in-flight
/// tasks, and turns commands into events
pub struct CommandRouter {
    cache: Arc<PipelineCache>,
    cancellation: CancellationToken,
    emitter: EventEmitter,
    config: Arc<RouterConfig>,
    generation: Option<JoinHandle<()>>,
    loads: JoinSet<()>,
}

impl fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRouter")
            .field("default_variant", &self.config.default_variant)
            .field("cancelled", &self.cancellation.is_signaled())
            .field("loads_in_flight", &self.loads.len())
            .finish_non_exhaustive()
    }
}

impl CommandRouter {
    /// Create a router emitting into `events`
    pub fn new(
        cache: Arc<PipelineCache>,
        events: mpsc::Sender<domain::WorkerEvent>,
        config: RouterConfig,
    ) -> Self {
        Self {
            cache,
            cancellation: CancellationToken::new(),
            emitter: EventEmitter::new(events),
            config: Arc::new(config),
            generation: None,
            loads: JoinSet::new(),
        }
    }

    /// Shared cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Pipeline cache
    pub fn cache(&self) -> &Arc<PipelineCache> {
        &self.cache
    }

    /// Current state, derived from the tasks still running
    pub fn state(&mut self) -> WorkerState {
        self.reap();
        if self.generation.is_some() {
            WorkerState::Generating
        } else if !self.loads.is_empty() {
            WorkerState::Loading
        } else {
            WorkerState::Idle
        }
    }

    /// Process commands until the channel closes, then drain in-flight work
    pub async fn run(mut self, mut commands: mpsc::Receiver<WorkerCommand>) {
        info!(default_variant = %self.config.default_variant, "Command router started");
        while let Some(command) = commands.recv().await {
            self.dispatch(command).await;
        }
        self.shutdown().await;
        info!("Command router stopped");
    }

    /// Handle one command
    #[instrument(skip_all, fields(command = command.kind()))]
    pub async fn dispatch(&mut self, command: WorkerCommand) {
        let variant = command
            .model_type()
            .unwrap_or(self.config.default_variant);

        match command {
            WorkerCommand::Check => self.check().await,
            WorkerCommand::Load { .. } => self.load(variant),
            WorkerCommand::Generate { data, .. } => self.generate(data, variant).await,
            WorkerCommand::Interrupt => {
                debug!("Interrupt requested");
                self.cancellation.signal();
            },
            WorkerCommand::Reset => {
                debug!("Cancellation state reset");
                self.cancellation.reset();
            },
        }
    }

    /// Wait for every load and the active generation to finish
    pub async fn shutdown(&mut self) {
        while let Some(result) = self.loads.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Load task ended abnormally");
            }
        }
        if let Some(handle) = self.generation.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Generation task ended abnormally");
            }
        }
    }

    async fn check(&self) {
        match self.cache.selector().select_adapter().await {
            Ok(adapter) => debug!(adapter = %adapter, "Device check passed"),
            Err(e) => {
                self.emitter.emit_error(&e).await;
            },
        }
    }

    fn load(&mut self, variant: ModelVariant) {
        self.reap();
        let cache = Arc::clone(&self.cache);
        let emitter = self.emitter.clone();
        let config = Arc::clone(&self.config);
        self.loads
            .spawn(async move { load_pipeline(&cache, variant, &emitter, &config).await });
    }

    async fn generate(&mut self, messages: Vec<ChatMessage>, variant: ModelVariant) {
        self.reap();
        if let Some(handle) = self.generation.take() {
            if !self.cancellation.is_signaled() {
                warn!("Rejecting generate while busy");
                self.emitter
                    .emit_error(&ApplicationError::GenerationInProgress)
                    .await;
                self.generation = Some(handle);
                return;
            }
            debug!("Waiting for interrupted generation to stop");
            if let Err(e) = handle.await {
                warn!(error = %e, "Generation task ended abnormally");
            }
        }

        self.cancellation.reset();
        let cache = Arc::clone(&self.cache);
        let emitter = self.emitter.clone();
        let config = Arc::clone(&self.config);
        let token = self.cancellation.clone();
        let request = GenerationRequest::new(messages);

        self.generation = Some(tokio::spawn(async move {
            run_generation(&cache, variant, &request, token, emitter, &config.inference).await;
        }));
    }

    fn reap(&mut self) {
        while let Some(result) = self.loads.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "Load task ended abnormally");
            }
        }
        if self
            .generation
            .as_ref()
            .is_some_and(JoinHandle::is_finished)
        {
            self.generation = None;
        }
    }
}

#[instrument(skip(cache, emitter, config), fields(variant = %variant))]
async fn load_pipeline(
    cache: &PipelineCache,
    variant: ModelVariant,
    emitter: &EventEmitter,
    config: &RouterConfig,
) {
    if let Some(pipeline) = cache.get_if_present(variant).await {
        if pipeline.is_warm() {
            debug!("Pipeline already loaded and warm");
            emitter.emit(domain::WorkerEvent::ready()).await;
            return;
        }
    }

    emitter.emit(domain::WorkerEvent::loading(LOADING_MODEL)).await;

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let on_progress: ProgressCallback = Arc::new(move |event| {
        let _ = progress_tx.send(event);
    });

    let load = cache.get_pipeline(variant, on_progress);
    tokio::pin!(load);
    let result = loop {
        tokio::select! {
            biased;
            Some(event) = progress_rx.recv() => {
                emitter.emit(event).await;
            }
            result = &mut load => break result,
        }
    };
    while let Ok(event) = progress_rx.try_recv() {
        emitter.emit(event).await;
    }

    let pipeline = match result {
        Ok(pipeline) => pipeline,
        Err(e) => {
            warn!(error = %e, "Pipeline load failed");
            emitter.emit_error(&e).await;
            return;
        },
    };

    emitter.emit(domain::WorkerEvent::loading(WARMING_UP)).await;
    if let Err(e) = pipeline.warm_up(&config.inference.warm_up_prompt).await {
        warn!(error = %e, "Warm-up failed");
        emitter.emit_error(&e).await;
        return;
    }

    info!(adapter = %pipeline.adapter(), "Model ready");
    emitter.emit(domain::WorkerEvent::ready()).await;
}

#[instrument(skip_all, fields(variant = %variant, messages = request.len()))]
async fn run_generation(
    cache: &PipelineCache,
    variant: ModelVariant,
    request: &GenerationRequest,
    token: CancellationToken,
    mut emitter: EventEmitter,
    config: &InferenceConfig,
) {
    match generate_text(cache, variant, request, token, &mut emitter, config).await {
        Ok(GenerationOutcome::Completed(output)) => {
            emitter.emit(domain::WorkerEvent::complete(output)).await;
        },
        Ok(GenerationOutcome::Cancelled) => debug!("Generation ended by interrupt"),
        Err(e) => {
            warn!(error = %e, "Generation failed");
            emitter.emit_error(&e).await;
        },
    }
}

async fn generate_text(
    cache: &PipelineCache,
    variant: ModelVariant,
    request: &GenerationRequest,
    token: CancellationToken,
    emitter: &mut EventEmitter,
    config: &InferenceConfig,
) -> Result<GenerationOutcome, ApplicationError> {
    let session = GenerationSession::open(cache, variant, token, config).await?;
    Ok(session.run(request, emitter).await?)
}
