//! End-to-end tests for the command router over the loopback engine
//!
//! Each test drives the router with protocol commands and inspects the
//! events it emits.

use std::sync::Arc;

use ai_core::{
    ArtifactLoader, CausalModel, ComputeAdapter, DeviceSelector, Encoding, InferenceError,
    PipelineCache, ProgressCallback, TokenStream, Tokenizer,
    loopback::{LoopbackBackend, LoopbackConfig, LoopbackLoader, LoopbackTokenizer},
};
use application::{CommandRouter, LOADING_MODEL, RouterConfig, WARMING_UP, WorkerState};
use async_trait::async_trait;
use domain::{
    ChatMessage, ModelVariant, PowerPreference, SamplingParams, StatusEvent, VariantProfile,
    WorkerCommand, WorkerEvent,
};
use futures::stream;
use tokio::sync::mpsc;

// =============================================================================
// Test Helpers
// =============================================================================

struct Harness {
    router: CommandRouter,
    events: mpsc::Receiver<WorkerEvent>,
    loader: Arc<LoopbackLoader>,
}

impl Harness {
    fn new(loopback: LoopbackConfig) -> Self {
        Self::with_config(loopback, RouterConfig::default())
    }

    fn with_config(loopback: LoopbackConfig, config: RouterConfig) -> Self {
        let backend = Arc::new(LoopbackBackend::new(&loopback));
        let loader = Arc::new(LoopbackLoader::new(loopback));
        let selector = Arc::new(DeviceSelector::with_defaults(backend));
        let cache = Arc::new(PipelineCache::new(
            selector,
            Arc::clone(&loader) as Arc<dyn ArtifactLoader>,
        ));
        let (tx, events) = mpsc::channel(1024);
        Self {
            router: CommandRouter::new(cache, tx, config),
            events,
            loader,
        }
    }

    /// Dispatch commands, wait for the work they started, return the events
    async fn exchange(&mut self, commands: Vec<WorkerCommand>) -> Vec<WorkerEvent> {
        for command in commands {
            self.router.dispatch(command).await;
        }
        self.router.shutdown().await;
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Model that produces one token and then loses its device
struct FlakyModel;

#[async_trait]
impl CausalModel for FlakyModel {
    async fn generate(
        &self,
        _input: &Encoding,
        _params: &SamplingParams,
    ) -> Result<TokenStream, InferenceError> {
        Ok(Box::pin(stream::iter(vec![
            Ok(u32::from(b'Y')),
            Err(InferenceError::generation("device lost")),
        ])))
    }
}

struct FlakyLoader;

#[async_trait]
impl ArtifactLoader for FlakyLoader {
    async fn load_tokenizer(
        &self,
        _profile: &VariantProfile,
        _progress: ProgressCallback,
    ) -> Result<Arc<dyn Tokenizer>, InferenceError> {
        Ok(Arc::new(LoopbackTokenizer))
    }

    async fn load_model(
        &self,
        _profile: &VariantProfile,
        _adapter: &ComputeAdapter,
        _progress: ProgressCallback,
    ) -> Result<Arc<dyn CausalModel>, InferenceError> {
        Ok(Arc::new(FlakyModel))
    }
}

fn load(variant: Option<ModelVariant>) -> WorkerCommand {
    WorkerCommand::Load {
        model_type: variant,
    }
}

fn generate(text: &str) -> WorkerCommand {
    WorkerCommand::Generate {
        data: vec![ChatMessage::user(text)],
        model_type: None,
    }
}

fn statuses(events: &[WorkerEvent]) -> Vec<&'static str> {
    events.iter().map(WorkerEvent::status).collect()
}

fn updates(events: &[WorkerEvent]) -> Vec<(usize, Option<f64>, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Status(StatusEvent::Update(u)) => {
                Some((u.num_tokens, u.tps, u.output.clone()))
            },
            _ => None,
        })
        .collect()
}

fn completion(events: &[WorkerEvent]) -> Option<String> {
    events.iter().find_map(|e| match e {
        WorkerEvent::Status(StatusEvent::Complete { output }) => Some(output.clone()),
        _ => None,
    })
}

// =============================================================================
// Load
// =============================================================================

#[tokio::test]
async fn cold_load_reports_phases_progress_then_ready() {
    let mut h = Harness::new(LoopbackConfig::default());

    let events = h.exchange(vec![load(None)]).await;

    assert_eq!(events.first(), Some(&WorkerEvent::loading(LOADING_MODEL)));
    assert_eq!(events.last(), Some(&WorkerEvent::ready()));
    let warm_at = events
        .iter()
        .position(|e| *e == WorkerEvent::loading(WARMING_UP))
        .unwrap();
    assert_eq!(warm_at, events.len() - 2);
    assert!(events[1..warm_at].iter().all(WorkerEvent::is_progress));
    assert!(warm_at > 1);
}

#[tokio::test]
async fn second_load_goes_straight_to_ready() {
    let mut h = Harness::new(LoopbackConfig::default());

    h.exchange(vec![load(None)]).await;
    let events = h.exchange(vec![load(Some(ModelVariant::Llama))]).await;

    assert_eq!(events, vec![WorkerEvent::ready()]);
    assert_eq!(h.loader.model_loads(), 1);
}

#[tokio::test]
async fn concurrent_loads_share_one_initialization() {
    let mut h = Harness::new(LoopbackConfig::default());

    let events = h.exchange(vec![load(None), load(None), load(None)]).await;

    assert_eq!(h.loader.model_loads(), 1);
    let ready = events.iter().filter(|e| **e == WorkerEvent::ready()).count();
    assert_eq!(ready, 3);
}

#[tokio::test]
async fn load_falls_back_to_low_power_device() {
    let mut h = Harness::new(LoopbackConfig::with_adapters(vec![
        PowerPreference::LowPower,
    ]));

    let events = h.exchange(vec![load(None)]).await;

    assert_eq!(events.last(), Some(&WorkerEvent::ready()));
    assert!(!events.iter().any(WorkerEvent::is_error));
}

#[tokio::test]
async fn load_without_device_emits_single_error() {
    let mut h = Harness::new(LoopbackConfig::without_adapters());

    let events = h.exchange(vec![load(None)]).await;

    let errors: Vec<_> = events.iter().filter(|e| e.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_json().unwrap().contains("no adapter"));
    assert!(!events.contains(&WorkerEvent::ready()));
    assert!(!events.iter().any(WorkerEvent::is_progress));
}

#[tokio::test]
async fn model_type_selects_the_variant_to_load() {
    let mut h = Harness::new(LoopbackConfig::default());

    let events = h.exchange(vec![load(Some(ModelVariant::Phi))]).await;

    assert_eq!(events.last(), Some(&WorkerEvent::ready()));
    assert!(h.router.cache().contains(ModelVariant::Phi));
    assert!(!h.router.cache().contains(ModelVariant::Llama));
    let external = events.iter().any(|e| match e {
        WorkerEvent::Progress(p) => p.file().ends_with("_data"),
        WorkerEvent::Status(_) => false,
    });
    assert!(external);
}

#[tokio::test]
async fn default_variant_comes_from_config() {
    let config = RouterConfig {
        default_variant: ModelVariant::DeepSeek,
        ..RouterConfig::default()
    };
    let mut h = Harness::with_config(LoopbackConfig::default(), config);

    h.exchange(vec![load(None)]).await;

    assert_eq!(h.router.cache().loaded_variants(), vec![ModelVariant::DeepSeek]);
}

// =============================================================================
// Generate
// =============================================================================

#[tokio::test]
async fn hello_streams_and_completes() {
    let mut h = Harness::new(LoopbackConfig::default());

    h.exchange(vec![load(None)]).await;
    let events = h.exchange(vec![generate("Hello")]).await;

    assert_eq!(events.first(), Some(&WorkerEvent::start()));
    assert_eq!(events.last().map(WorkerEvent::status), Some("complete"));
    let streamed: String = updates(&events).into_iter().map(|(_, _, o)| o).collect();
    assert_eq!(streamed, "You said: Hello");
    assert!(!completion(&events).unwrap().is_empty());
}

#[tokio::test]
async fn generate_without_load_loads_silently() {
    let mut h = Harness::new(LoopbackConfig::default());

    let events = h.exchange(vec![generate("Hello")]).await;

    assert!(!events.iter().any(WorkerEvent::is_progress));
    assert_eq!(statuses(&events).first(), Some(&"start"));
    assert!(completion(&events).is_some());
}

#[tokio::test]
async fn token_counts_increase_and_tps_follows_first_token() {
    let mut h = Harness::new(LoopbackConfig::default());

    let events = h.exchange(vec![generate("count these tokens")]).await;
    let updates = updates(&events);

    assert!(updates.len() > 1);
    assert_eq!(updates[0].0, 1);
    assert!(updates[0].1.is_none());
    for pair in updates.windows(2) {
        assert!(pair[1].0 > pair[0].0);
    }
    assert!(updates[1..].iter().all(|u| u.1.is_some_and(|tps| tps > 0.0)));
}

#[tokio::test]
async fn generate_without_device_emits_single_error() {
    let mut h = Harness::new(LoopbackConfig::without_adapters());

    let events = h.exchange(vec![generate("Hello")]).await;

    assert_eq!(statuses(&events), vec!["error"]);
}

#[tokio::test]
async fn failure_after_first_token_reports_error_without_completion() {
    let backend = Arc::new(LoopbackBackend::new(&LoopbackConfig::default()));
    let selector = Arc::new(DeviceSelector::with_defaults(backend));
    let cache = Arc::new(PipelineCache::new(selector, Arc::new(FlakyLoader)));
    let (tx, mut rx) = mpsc::channel(64);
    let mut router = CommandRouter::new(cache, tx, RouterConfig::default());

    router.dispatch(generate("Hello")).await;
    router.shutdown().await;
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(statuses(&events), vec!["start", "update", "error"]);
    assert!(events[2].to_json().unwrap().contains("device lost"));
    assert!(completion(&events).is_none());
    assert_eq!(router.state(), WorkerState::Idle);
}

#[tokio::test]
async fn interrupt_before_first_update_suppresses_completion() {
    let mut h = Harness::new(LoopbackConfig::default().with_token_delay_ms(50));

    let events = h
        .exchange(vec![generate("Hello"), WorkerCommand::Interrupt])
        .await;

    assert!(completion(&events).is_none());
    assert!(updates(&events).is_empty());
    assert!(!events.iter().any(WorkerEvent::is_error));
}

#[tokio::test]
async fn busy_generate_is_rejected() {
    let mut h = Harness::new(LoopbackConfig::default().with_token_delay_ms(10));

    let events = h
        .exchange(vec![generate("first"), generate("second")])
        .await;

    let errors: Vec<_> = events.iter().filter(|e| e.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0]
            .to_json()
            .unwrap()
            .contains("generation already in progress")
    );
    assert_eq!(completion(&events).unwrap().trim_end(), "first\nYou said: first");
}

#[tokio::test]
async fn generate_after_interrupt_waits_and_runs() {
    let mut h = Harness::new(LoopbackConfig::default().with_token_delay_ms(10));

    let events = h
        .exchange(vec![
            generate("first"),
            WorkerCommand::Interrupt,
            generate("second"),
        ])
        .await;

    assert!(!events.iter().any(WorkerEvent::is_error));
    let completions: Vec<_> = events
        .iter()
        .filter(|e| e.status() == "complete")
        .collect();
    assert_eq!(completions.len(), 1);
    assert!(completion(&events).unwrap().ends_with("You said: second"));
    assert_eq!(h.router.state(), WorkerState::Idle);
}

// =============================================================================
// Interrupt / Reset / Check
// =============================================================================

#[tokio::test]
async fn reset_is_idempotent_and_silent() {
    let mut h = Harness::new(LoopbackConfig::default());

    let events = h
        .exchange(vec![WorkerCommand::Reset, WorkerCommand::Reset])
        .await;

    assert!(events.is_empty());
    assert!(!h.router.cancellation().is_signaled());
}

#[tokio::test]
async fn interrupt_while_idle_is_silent_and_cleared_by_generate() {
    let mut h = Harness::new(LoopbackConfig::default());

    assert!(h.exchange(vec![WorkerCommand::Interrupt]).await.is_empty());
    let events = h.exchange(vec![generate("Hello")]).await;

    assert!(completion(&events).is_some());
}

#[tokio::test]
async fn check_without_device_reports_error() {
    let mut h = Harness::new(LoopbackConfig::without_adapters());

    let events = h.exchange(vec![WorkerCommand::Check]).await;

    assert_eq!(statuses(&events), vec!["error"]);
}

// =============================================================================
// Dispatch loop
// =============================================================================

#[tokio::test]
async fn run_drains_in_flight_work_when_commands_end() {
    let loopback = LoopbackConfig::default().with_token_delay_ms(5);
    let backend = Arc::new(LoopbackBackend::new(&loopback));
    let selector = Arc::new(DeviceSelector::with_defaults(backend));
    let cache = Arc::new(PipelineCache::new(
        selector,
        Arc::new(LoopbackLoader::new(loopback)),
    ));
    let (event_tx, mut event_rx) = mpsc::channel(1024);
    let (command_tx, command_rx) = mpsc::channel(8);
    let router = CommandRouter::new(cache, event_tx, RouterConfig::default());

    command_tx.send(load(None)).await.unwrap();
    command_tx.send(generate("Hello")).await.unwrap();
    drop(command_tx);
    router.run(command_rx).await;

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }
    assert!(events.contains(&WorkerEvent::ready()));
    assert!(completion(&events).is_some());
}
