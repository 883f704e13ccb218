//! Worker wiring: engine, router and stdio channel

use std::sync::Arc;

use ai_core::{
    DeviceSelector, PipelineCache,
    loopback::{LoopbackBackend, LoopbackLoader},
};
use application::{CommandRouter, EventEmitter};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tracing::{info, instrument, warn};

use crate::{
    adapters::{ChannelError, read_commands, write_events},
    config::AppConfig,
};

/// Pipeline cache over the loopback engine
pub fn build_pipeline_cache(config: &AppConfig) -> Arc<PipelineCache> {
    let backend = Arc::new(LoopbackBackend::new(&config.loopback));
    let selector = Arc::new(DeviceSelector::new(
        backend,
        config.inference.adapter_preferences.clone(),
    ));
    let loader = Arc::new(LoopbackLoader::new(config.loopback.clone()));
    Arc::new(PipelineCache::new(selector, loader))
}

/// Run the worker until `input` ends and all in-flight work is drained
///
/// Commands are read from `input` and events written to `output`, both as
/// newline-delimited JSON.
#[instrument(skip_all, fields(default_variant = %config.worker.default_variant))]
pub async fn serve<R, W>(config: &AppConfig, input: R, output: W) -> Result<(), ChannelError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(config.worker.command_buffer_size);
    let (event_tx, event_rx) = mpsc::channel(config.worker.event_buffer_size);

    let writer = tokio::spawn(write_events(output, event_rx));
    let reader = tokio::spawn(read_commands(
        input,
        command_tx,
        EventEmitter::new(event_tx.clone()),
    ));

    let router = CommandRouter::new(build_pipeline_cache(config), event_tx, config.router_config());
    info!("Worker ready for commands");
    router.run(command_rx).await;

    let forwarded = join(reader).await?;
    let written = join(writer).await?;
    info!(forwarded, written, "Worker stopped");
    Ok(())
}

async fn join(
    handle: tokio::task::JoinHandle<Result<usize, ChannelError>>,
) -> Result<usize, ChannelError> {
    match handle.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Channel task ended abnormally");
            Err(ChannelError::Io(std::io::Error::other(e)))
        },
    }
}
