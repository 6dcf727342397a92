// Copyright 2026 Reelfeed Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed errors for the acquisition pipeline.
//!
//! Each variant is contained at the smallest scope that can degrade safely:
//! resolution errors drop one item, navigation and extraction errors drop one
//! surface, session errors drop the run. Nothing here ever reaches an HTTP
//! client; the service layer turns every failure into a fallback batch.

/// All errors that can occur while acquiring items.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The browser session could not be started or stopped cleanly.
    #[error("Session error: {0}")]
    Session(String),

    /// A page did not load within its time bound.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The extraction heuristics could not run against a surface.
    #[error("Extraction on surface '{surface}' failed: {reason}")]
    Extraction { surface: String, reason: String },

    /// No playable media URL could be found for one item.
    #[error("Could not resolve media for {id}: {reason}")]
    Resolution { id: String, reason: String },

    /// Every surface and candidate came up empty.
    #[error("Acquisition produced no playable items")]
    PipelineExhausted,

    /// The queue worker is gone; no more jobs can be served.
    #[error("Acquisition queue is closed")]
    QueueClosed,

    /// The run for this job panicked before settling.
    #[error("Acquisition job aborted: {0}")]
    JobAborted(String),
}

impl AcquisitionError {
    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AcquisitionError::Session(_) => "session",
            AcquisitionError::Navigation { .. } => "navigation",
            AcquisitionError::Extraction { .. } => "extraction",
            AcquisitionError::Resolution { .. } => "resolution",
            AcquisitionError::PipelineExhausted => "pipeline_exhausted",
            AcquisitionError::QueueClosed => "queue_closed",
            AcquisitionError::JobAborted(_) => "job_aborted",
        }
    }

    pub(crate) fn navigation(url: &str, err: impl std::fmt::Display) -> Self {
        AcquisitionError::Navigation {
            url: url.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

pub type AcquisitionResult<T> = Result<T, AcquisitionError>;
