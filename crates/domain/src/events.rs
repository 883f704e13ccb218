//! Status events reported by the worker to its host
//!
//! Status events are tagged by `status`. Artifact progress objects produced
//! by the loader also carry a `status` field of their own and are forwarded
//! untouched, so the two families are joined by an untagged [`WorkerEvent`].

use serde::{Deserialize, Serialize};

/// Streamed partial decode of a running generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingUpdate {
    /// Newly decoded text fragment
    pub output: String,
    /// Tokens per second since the first token (absent on the first token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tps: Option<f64>,
    /// Cumulative number of generated tokens
    #[serde(rename = "numTokens")]
    pub num_tokens: usize,
}

/// Artifact download / compile progress, as emitted by an artifact loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Fetch of a file has been scheduled
    Initiate {
        /// Artifact reference
        name: String,
        /// File within the artifact
        file: String,
    },
    /// Fetch of a file has started
    Download {
        /// Artifact reference
        name: String,
        /// File within the artifact
        file: String,
    },
    /// Bytes received so far
    Progress {
        /// Artifact reference
        name: String,
        /// File within the artifact
        file: String,
        /// Percentage in `0.0..=100.0`
        progress: f64,
        /// Bytes loaded
        loaded: u64,
        /// Total bytes
        total: u64,
    },
    /// File is available
    Done {
        /// Artifact reference
        name: String,
        /// File within the artifact
        file: String,
    },
}

impl ProgressEvent {
    /// File the event refers to
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::Initiate { file, .. }
            | Self::Download { file, .. }
            | Self::Progress { file, .. }
            | Self::Done { file, .. } => file,
        }
    }
}

/// Lifecycle status of the worker and its requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Human-readable loading phase
    Loading {
        /// Phase description
        data: String,
    },
    /// Pipeline loaded and warmed up
    Ready,
    /// Generation begun
    Start,
    /// Streamed partial decode
    Update(StreamingUpdate),
    /// Final decoded sequence
    Complete {
        /// Decoded text
        output: String,
    },
    /// Failure description
    Error {
        /// Error message
        data: String,
    },
}

/// Any message the worker sends to its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerEvent {
    /// Worker/request status
    Status(StatusEvent),
    /// Forwarded loader progress
    Progress(ProgressEvent),
}

impl WorkerEvent {
    /// Loading phase message
    pub fn loading(data: impl Into<String>) -> Self {
        Self::Status(StatusEvent::Loading { data: data.into() })
    }

    /// Pipeline ready
    #[must_use]
    pub const fn ready() -> Self {
        Self::Status(StatusEvent::Ready)
    }

    /// Generation started
    #[must_use]
    pub const fn start() -> Self {
        Self::Status(StatusEvent::Start)
    }

    /// Streamed partial decode
    #[must_use]
    pub const fn update(update: StreamingUpdate) -> Self {
        Self::Status(StatusEvent::Update(update))
    }

    /// Generation finished naturally
    pub fn complete(output: impl Into<String>) -> Self {
        Self::Status(StatusEvent::Complete {
            output: output.into(),
        })
    }

    /// Failure report
    pub fn error(data: impl Into<String>) -> Self {
        Self::Status(StatusEvent::Error { data: data.into() })
    }

    /// Value of the `status` field on the wire
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Status(StatusEvent::Loading { .. }) => "loading",
            Self::Status(StatusEvent::Ready) => "ready",
            Self::Status(StatusEvent::Start) => "start",
            Self::Status(StatusEvent::Update(_)) => "update",
            Self::Status(StatusEvent::Complete { .. }) => "complete",
            Self::Status(StatusEvent::Error { .. }) => "error",
            Self::Progress(ProgressEvent::Initiate { .. }) => "initiate",
            Self::Progress(ProgressEvent::Download { .. }) => "download",
            Self::Progress(ProgressEvent::Progress { .. }) => "progress",
            Self::Progress(ProgressEvent::Done { .. }) => "done",
        }
    }

    /// Whether this is an error report
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Status(StatusEvent::Error { .. }))
    }

    /// Whether this is forwarded loader progress
    #[must_use]
    pub const fn is_progress(&self) -> bool {
        matches!(self, Self::Progress(_))
    }

    /// Encode as one JSON document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<ProgressEvent> for WorkerEvent {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(event)
    }
}

impl From<StatusEvent> for WorkerEvent {
    fn from(event: StatusEvent) -> Self {
        Self::Status(event)
    }
}
