//! Document session lifetime
//!
//! One session owns one opened document: the engine handle, the backing
//! byte stream, and the set of decoded pages. Load and close take the write
//! side of the slot; render and decode jobs hold a read guard for their
//! whole duration, so a close waits for in-flight work to drain instead of
//! pulling the handle out from under it.

use std::collections::HashSet;
use std::fs::File;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard};

use crate::engine::{DocumentEngine, DocumentSource};
use crate::error::DocumentOpenError;

/// State backing one opened document.
pub(crate) struct SessionInner<E: DocumentEngine> {
    pub(crate) doc: E::Document,
    /// Backing stream for path sources, held open until close.
    _stream: Option<File>,
    /// Immutable once the document is open.
    pub(crate) page_count: usize,
    /// Page indices the engine has already decoded.
    pub(crate) resident: Mutex<HashSet<usize>>,
}

/// Slot holding at most one open document.
pub(crate) struct DocumentSession<E: DocumentEngine> {
    slot: RwLock<Option<SessionInner<E>>>,
}

impl<E: DocumentEngine> DocumentSession<E> {
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Open `source`, closing any previously open document first. Returns
    /// the page count.
    ///
    /// On failure every partially-acquired resource is released before the
    /// error propagates and the slot stays empty.
    pub(crate) fn open(&self, engine: &E, source: &DocumentSource) -> Result<usize, DocumentOpenError> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = slot.take() {
            log::debug!("closing previous document before load");
            engine.close(previous.doc);
        }

        let stream = match source {
            DocumentSource::Path(path) => Some(File::open(path)?),
            DocumentSource::Bytes(_) => None,
        };

        let doc = engine.open(source).map_err(DocumentOpenError::Engine)?;
        let page_count = engine.page_count(&doc);
        log::debug!("document opened, {page_count} pages");

        *slot = Some(SessionInner {
            doc,
            _stream: stream,
            page_count,
            resident: Mutex::new(HashSet::new()),
        });

        Ok(page_count)
    }

    /// Release the engine handle and the backing stream. A no-op when
    /// already closed.
    pub(crate) fn close(&self, engine: &E) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(inner) = slot.take() {
            engine.close(inner.doc);
            log::debug!("document closed");
        }
    }

    /// Read access for render and decode jobs. The guard pins the session
    /// open for as long as it is held.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Option<SessionInner<E>>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn page_count(&self) -> Option<usize> {
        self.read().as_ref().map(|inner| inner.page_count)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::test_engine::MockEngine;

    #[test]
    fn open_reports_page_count() {
        let engine = MockEngine::new(7);
        let session = DocumentSession::new();

        let page_count = session
            .open(&engine, &DocumentSource::bytes(vec![0u8; 4]))
            .expect("open should succeed");

        assert_eq!(page_count, 7);
        assert_eq!(session.page_count(), Some(7));
        assert!(session.is_open());
    }

    #[test]
    fn open_from_path_holds_the_backing_stream() {
        let engine = MockEngine::new(3);
        let session = DocumentSession::new();

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"doc").expect("write");

        let page_count = session
            .open(&engine, &DocumentSource::path(file.path()))
            .expect("open should succeed");

        assert_eq!(page_count, 3);
    }

    #[test]
    fn missing_path_fails_with_source_error_and_leaves_session_closed() {
        let engine = MockEngine::new(3);
        let session = DocumentSession::new();

        let error = session
            .open(&engine, &DocumentSource::path("/definitely/not/here.pdf"))
            .expect_err("open should fail");

        assert!(matches!(error, DocumentOpenError::Source(_)));
        assert!(!session.is_open());
        assert_eq!(session.page_count(), None);
    }

    #[test]
    fn rejected_document_fails_with_engine_error() {
        let engine = MockEngine::failing_open();
        let session = DocumentSession::new();

        let error = session
            .open(&engine, &DocumentSource::bytes(vec![0u8; 4]))
            .expect_err("open should fail");

        assert!(matches!(error, DocumentOpenError::Engine(_)));
        assert!(!session.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let engine = MockEngine::new(3);
        let probe = engine.probe();
        let session = DocumentSession::new();

        session
            .open(&engine, &DocumentSource::bytes(vec![0u8; 4]))
            .expect("open should succeed");

        session.close(&engine);
        session.close(&engine);

        assert_eq!(probe.close_count(), 1);
        assert!(!session.is_open());
    }

    #[test]
    fn reopening_closes_the_previous_document() {
        let engine = MockEngine::new(3);
        let probe = engine.probe();
        let session = DocumentSession::new();

        session
            .open(&engine, &DocumentSource::bytes(vec![0u8; 4]))
            .expect("first open");
        session
            .open(&engine, &DocumentSource::bytes(vec![1u8; 4]))
            .expect("second open");

        assert_eq!(probe.close_count(), 1);
        assert!(session.is_open());
    }
}
