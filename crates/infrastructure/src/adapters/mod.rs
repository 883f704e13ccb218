//! Adapters between the router's channels and the host's byte streams

mod ndjson_channel;

pub use ndjson_channel::{ChannelError, read_commands, write_events};
