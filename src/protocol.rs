//! Wire messages
//!
//! Newline-delimited JSON messages written to stdout by every command.

use std::io::Write;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connectors::metadata::{StreamMetadata, SyncMode};
use crate::models::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMessage<'a> {
    pub stream: &'a str,
    pub data: &'a Record,
    /// Milliseconds since the Unix epoch
    pub emitted_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorSpecification {
    #[serde(rename = "documentationUrl")]
    pub documentation_url: String,
    #[serde(rename = "connectionSpecification")]
    pub connection_specification: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<StreamMetadata>,
}

/// One message of the output stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message<'a> {
    Record {
        record: RecordMessage<'a>,
    },
    Log {
        log: LogMessage,
    },
    Spec {
        spec: ConnectorSpecification,
    },
    ConnectionStatus {
        #[serde(rename = "connectionStatus")]
        connection_status: ConnectionStatus,
    },
    Catalog {
        catalog: Catalog,
    },
}

impl<'a> Message<'a> {
    pub fn record(stream: &'a str, data: &'a Record) -> Self {
        Message::Record {
            record: RecordMessage {
                stream,
                data,
                emitted_at: Utc::now().timestamp_millis(),
            },
        }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Message::Log {
            log: LogMessage {
                level,
                message: message.into(),
            },
        }
    }
}

/// A stream selected for reading, as named by the caller's configured catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfiguredStream {
    pub stream: ConfiguredStreamName,
    #[serde(default = "default_sync_mode")]
    pub sync_mode: SyncMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfiguredStreamName {
    pub name: String,
}

/// Streams the caller wants read. Other catalog fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    pub fn stream_names(&self) -> Vec<String> {
        self.streams.iter().map(|s| s.stream.name.clone()).collect()
    }
}

fn default_sync_mode() -> SyncMode {
    SyncMode::FullRefresh
}

/// Writes messages as JSON lines.
pub struct MessageWriter<W: Write> {
    out: W,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn emit(&mut self, message: &Message<'_>) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
