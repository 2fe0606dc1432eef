//! Error taxonomy for document loading, decoding, and rendering

use std::error::Error as StdError;
use std::io;

/// Boundary error reported by a [`DocumentEngine`](crate::DocumentEngine)
/// implementation.
///
/// Engines live behind a trait, so their native error types are erased into
/// a detail string plus an optional source chain.
#[derive(Debug, thiserror::Error)]
#[error("{detail}")]
pub struct EngineError {
    detail: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl EngineError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            source: None,
        }
    }

    pub fn with_source(
        detail: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            detail: detail.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// The source could not be read or is not a valid document.
///
/// Terminal for that load attempt: the session is left closed and no retry
/// happens until the host calls load again.
#[derive(Debug, thiserror::Error)]
pub enum DocumentOpenError {
    #[error("failed to read document source: {0}")]
    Source(#[from] io::Error),

    #[error("engine rejected document source: {0}")]
    Engine(#[source] EngineError),
}

/// A single page failed to decode.
///
/// Logged, never propagated; the loader retries on the next access to the
/// same page.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode page {page}: {source}")]
pub struct DecodeError {
    pub page: usize,
    #[source]
    pub source: EngineError,
}

/// Failures on the render path.
///
/// `SessionClosed` and `SurfaceUnbound` occur legitimately during teardown
/// races and are swallowed as no-ops by the scheduler; engine faults are
/// logged.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RenderError {
    #[error("no document is open")]
    SessionClosed,

    #[error("no display surface is bound")]
    SurfaceUnbound,

    #[error("engine failed to rasterize page {page}: {source}")]
    Engine {
        page: usize,
        #[source]
        source: EngineError,
    },
}

/// Errors surfaced by viewer queries.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Open(#[from] DocumentOpenError),

    #[error("no document is open")]
    SessionClosed,
}
