use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::link::{Controller, RecordingSink};
use crate::session::{DEFAULT_DEVICE_NAME, SessionConfig};
use crate::source::{CaptureFileSource, ChunkSource, SourceError};
use crate::{SessionReport, make_stub_report};

pub const DEFAULT_CHUNK_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Bytes handed to the decoder per delivery.
    pub chunk_size: usize,
    /// Device name carried into the report.
    pub name: String,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

pub fn replay_capture_file(
    path: &Path,
    options: &ReplayOptions,
) -> Result<SessionReport, ReplayError> {
    let source = CaptureFileSource::open(path, options.chunk_size)?;
    replay_source(path, source, options)
}

/// Run a chunk source through a full session against an in-memory transport.
pub fn replay_source<S: ChunkSource>(
    path: &Path,
    mut source: S,
    options: &ReplayOptions,
) -> Result<SessionReport, ReplayError> {
    let mut controller = Controller::new(SessionConfig {
        name: options.name.clone(),
    });
    controller.attach(RecordingSink::default());

    let mut chunks = 0u64;
    let mut events = Vec::new();
    while let Some(chunk) = source.next_chunk()? {
        chunks += 1;
        events.extend(controller.on_bytes(&chunk));
    }
    controller.finish();

    let diagnostics = controller.diagnostic_summaries();
    let state = controller.snapshot();
    let commands = controller
        .detach()
        .map(RecordingSink::into_written)
        .unwrap_or_default();
    info!(
        device = %options.name,
        chunks,
        events = events.len(),
        commands = commands.len(),
        diagnostics = controller.diagnostic_count(),
        "replay complete"
    );

    let mut report = make_stub_report(
        &path.display().to_string(),
        path.metadata()?.len(),
        &options.name,
    );
    report.input.chunks = chunks;
    report.events = events;
    report.commands = commands;
    report.media_title = state.media_title();
    report.state = state;
    report.diagnostics = diagnostics;
    Ok(report)
}
