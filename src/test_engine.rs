//! In-memory engine and surface for the test suite

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::{DocumentEngine, DocumentSource};
use crate::error::EngineError;

/// One recorded rasterization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderCall {
    pub page: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Surface that records every rasterization it receives. Clone the log
/// handle before handing the surface to a viewer.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SurfaceLog {
        SurfaceLog {
            calls: Arc::clone(&self.calls),
        }
    }

    fn record(&self, call: RenderCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

/// Shared view of a [`RecordingSurface`]'s history.
#[derive(Clone)]
pub struct SurfaceLog {
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl SurfaceLog {
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<RenderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

/// Shared view of a [`MockEngine`]'s decode and close history.
#[derive(Clone, Default)]
pub struct EngineProbe {
    decode_calls: Arc<Mutex<Vec<usize>>>,
    close_count: Arc<AtomicUsize>,
}

impl EngineProbe {
    /// Every `open_page` call, in order, including failed ones.
    pub fn decode_calls(&self) -> Vec<usize> {
        self.decode_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn decode_count_for(&self, page: usize) -> usize {
        self.decode_calls()
            .iter()
            .filter(|&&index| index == page)
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

/// Scriptable in-memory document engine.
pub struct MockEngine {
    pages: Vec<(f32, f32)>,
    fail_open: bool,
    fail_decode: HashSet<usize>,
    probe: EngineProbe,
}

impl MockEngine {
    /// An engine whose documents have `page_count` US-Letter pages.
    pub fn new(page_count: usize) -> Self {
        Self::with_page_sizes(vec![(612.0, 792.0); page_count])
    }

    pub fn with_page_sizes(pages: Vec<(f32, f32)>) -> Self {
        Self {
            pages,
            fail_open: false,
            fail_decode: HashSet::new(),
            probe: EngineProbe::default(),
        }
    }

    /// An engine that rejects every source.
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new(0)
        }
    }

    /// Make decoding of one page fail persistently.
    pub fn fail_decode_of(mut self, page: usize) -> Self {
        self.fail_decode.insert(page);
        self
    }

    pub fn probe(&self) -> EngineProbe {
        self.probe.clone()
    }
}

pub struct MockDocument {
    pages: Vec<(f32, f32)>,
    open_pages: Mutex<HashSet<usize>>,
}

impl DocumentEngine for MockEngine {
    type Document = MockDocument;
    type Surface = RecordingSurface;

    fn open(&self, _source: &DocumentSource) -> Result<MockDocument, EngineError> {
        if self.fail_open {
            return Err(EngineError::new("not a valid document"));
        }
        Ok(MockDocument {
            pages: self.pages.clone(),
            open_pages: Mutex::new(HashSet::new()),
        })
    }

    fn page_count(&self, doc: &MockDocument) -> usize {
        doc.pages.len()
    }

    fn has_page(&self, doc: &MockDocument, index: usize) -> bool {
        doc.open_pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&index)
    }

    fn open_page(&self, doc: &MockDocument, index: usize) -> Result<(), EngineError> {
        self.probe
            .decode_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index);

        if self.fail_decode.contains(&index) {
            return Err(EngineError::new(format!("page {index} is corrupt")));
        }

        doc.open_pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index);
        Ok(())
    }

    fn page_width(&self, doc: &MockDocument, index: usize) -> f32 {
        doc.pages.get(index).map_or(0.0, |&(width, _)| width)
    }

    fn page_height(&self, doc: &MockDocument, index: usize) -> f32 {
        doc.pages.get(index).map_or(0.0, |&(_, height)| height)
    }

    fn render_page(
        &self,
        _doc: &MockDocument,
        surface: &mut RecordingSurface,
        index: usize,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<(), EngineError> {
        surface.record(RenderCall {
            page: index,
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn close(&self, _doc: MockDocument) {
        self.probe.close_count.fetch_add(1, Ordering::SeqCst);
    }
}
