//! Newline-delimited JSON over async byte streams
//!
//! One command object per input line, one event object per output line.

use application::EventEmitter;
use domain::{WorkerCommand, WorkerEvent};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, instrument, warn};

/// Errors of the stdio channel
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Reading or writing the underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An event could not be serialized
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Parse command lines from `input` and forward them to the router
///
/// Blank lines are skipped. A line that is not UTF-8 or does not parse
/// produces one `error` event and is otherwise ignored. Returns the number of
/// commands forwarded once the input ends or the router stops receiving.
#[instrument(skip_all)]
pub async fn read_commands<R>(
    input: R,
    commands: mpsc::Sender<WorkerCommand>,
    emitter: EventEmitter,
) -> Result<usize, ChannelError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    let mut forwarded = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(error = %e, "Command line is not valid UTF-8");
                emitter
                    .emit(WorkerEvent::error(format!("invalid command encoding: {e}")))
                    .await;
                continue;
            },
        };
        if line.is_empty() {
            continue;
        }

        match WorkerCommand::from_json(line) {
            Ok(command) => {
                debug!(command = command.kind(), "Command received");
                if commands.send(command).await.is_err() {
                    debug!("Router stopped, no longer reading commands");
                    break;
                }
                forwarded += 1;
            },
            Err(e) => {
                warn!(error = %e, "Malformed command line");
                emitter.emit(WorkerEvent::error(e.to_string())).await;
            },
        }
    }

    debug!(forwarded, "Command input closed");
    Ok(forwarded)
}

/// Serialize events to `output`, one JSON object per line
///
/// Each line is flushed as soon as it is written. Returns the number of
/// events written once every sender is gone.
#[instrument(skip_all)]
pub async fn write_events<W>(
    mut output: W,
    mut events: mpsc::Receiver<WorkerEvent>,
) -> Result<usize, ChannelError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while let Some(event) = events.recv().await {
        let mut line = event.to_json()?;
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
        written += 1;
    }

    output.shutdown().await?;
    debug!(written, "Event output closed");
    Ok(written)
}
