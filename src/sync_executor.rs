//! Sync Executor
//!
//! Runs the selected streams one after another, writing each stream's records
//! to the message stream before the next stream is requested. A failed stream
//! is reported and skipped; the run carries on with the rest.

use std::io::Write;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::connectors::jurnal::JurnalSource;
use crate::connectors::metadata::{ResourceDefinition, SyncMode};
use crate::connectors::registry::RegistryError;
use crate::connectors::trait_::HttpStream;
use crate::error::StreamError;
use crate::protocol::{ConfiguredCatalog, LogLevel, Message, MessageWriter};

/// Errors that stop a read before any stream is requested, or that make the
/// output unwritable.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("stream '{stream}' only supports full_refresh, got {mode:?}")]
    UnsupportedSyncMode { stream: String, mode: SyncMode },
    #[error("failed to write message: {0}")]
    Output(#[from] std::io::Error),
}

/// Per-stream outcome of a read
#[derive(Debug, Default)]
pub struct ReadSummary {
    pub succeeded: Vec<(String, usize)>,
    pub failed: Vec<(String, StreamError)>,
}

impl ReadSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.succeeded.iter().map(|(_, count)| count).sum()
    }
}

/// Sequential executor over a source's streams
pub struct SyncExecutor<'a> {
    source: &'a JurnalSource,
}

impl<'a> SyncExecutor<'a> {
    pub fn new(source: &'a JurnalSource) -> Self {
        Self { source }
    }

    /// Resolve which streams to read. Without a catalog every stream is read.
    pub fn plan(
        &self,
        catalog: Option<&ConfiguredCatalog>,
    ) -> Result<Vec<&'static ResourceDefinition>, ReadError> {
        let registry = self.source.registry();
        let Some(catalog) = catalog else {
            return Ok(registry.definitions().collect());
        };

        for configured in &catalog.streams {
            if configured.sync_mode != SyncMode::FullRefresh {
                return Err(ReadError::UnsupportedSyncMode {
                    stream: configured.stream.name.clone(),
                    mode: configured.sync_mode,
                });
            }
        }

        Ok(registry.select(&catalog.stream_names())?)
    }

    /// Read the planned streams, emitting records and progress logs.
    #[instrument(skip_all)]
    pub async fn run<W: Write>(
        &self,
        catalog: Option<&ConfiguredCatalog>,
        writer: &mut MessageWriter<W>,
    ) -> Result<ReadSummary, ReadError> {
        let plan = self.plan(catalog)?;
        let mut summary = ReadSummary::default();

        writer.emit(&Message::log(LogLevel::Info, "Starting syncing SourceJurnal"))?;

        for definition in plan {
            let stream = self.source.stream(definition);
            let name = stream.name();
            let started = Instant::now();

            writer.emit(&Message::log(
                LogLevel::Info,
                format!("Syncing stream: {name}"),
            ))?;

            match stream.read_records().await {
                Ok(records) => {
                    for record in &records {
                        writer.emit(&Message::record(name, record))?;
                    }
                    info!(
                        stream = %name,
                        records = records.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Stream synced"
                    );
                    writer.emit(&Message::log(
                        LogLevel::Info,
                        format!("Read {} records from {name} stream", records.len()),
                    ))?;
                    summary.succeeded.push((name.to_string(), records.len()));
                }
                Err(err) => {
                    error!(stream = %name, error = %err, "Stream sync failed");
                    writer.emit(&Message::log(
                        LogLevel::Error,
                        format!("Encountered an error while reading stream {name}: {err}"),
                    ))?;
                    summary.failed.push((name.to_string(), err));
                }
            }
        }

        writer.emit(&Message::log(
            LogLevel::Info,
            format!(
                "Finished syncing SourceJurnal: {} streams succeeded, {} failed",
                summary.succeeded.len(),
                summary.failed.len()
            ),
        ))?;

        Ok(summary)
    }
}
