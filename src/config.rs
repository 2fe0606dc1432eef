//! Load configuration and host callbacks

use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::DocumentSource;

/// Invoked once a document opens, with its page count.
pub type OnLoadComplete = Arc<dyn Fn(usize) + Send + Sync>;

/// Invoked after each completed render with the current page (1-based) and
/// the total page count.
pub type OnPageChanged = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Invoked when a document fails to open.
pub type OnErrorOccurred = Arc<dyn Fn() + Send + Sync>;

/// The callbacks installed by a load, immutable afterward.
#[derive(Clone, Default)]
pub(crate) struct ViewerCallbacks {
    pub(crate) on_load_complete: Option<OnLoadComplete>,
    pub(crate) on_page_changed: Option<OnPageChanged>,
    pub(crate) on_error_occurred: Option<OnErrorOccurred>,
}

/// Everything a load needs: the document source plus up to three optional
/// callbacks.
///
/// Built once and consumed by the viewer's load call; there is no way to
/// swap callbacks on a live viewer. Callbacks fire from worker threads and
/// never while a viewer lock is held, so they may call back into the
/// viewer.
///
/// ```
/// use leafview::LoadRequest;
///
/// let request = LoadRequest::from_path("manual.pdf")
///     .on_load_complete(|pages| println!("{pages} pages"))
///     .on_page_changed(|current, total| println!("{current}/{total}"))
///     .on_error_occurred(|| eprintln!("load failed"));
/// # let _ = request;
/// ```
pub struct LoadRequest {
    pub(crate) source: DocumentSource,
    pub(crate) callbacks: ViewerCallbacks,
}

impl LoadRequest {
    pub fn new(source: DocumentSource) -> Self {
        Self {
            source,
            callbacks: ViewerCallbacks::default(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(DocumentSource::path(path))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(DocumentSource::bytes(bytes))
    }

    pub fn on_load_complete(mut self, callback: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.callbacks.on_load_complete = Some(Arc::new(callback));
        self
    }

    pub fn on_page_changed(
        mut self,
        callback: impl Fn(usize, usize) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_page_changed = Some(Arc::new(callback));
        self
    }

    pub fn on_error_occurred(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_error_occurred = Some(Arc::new(callback));
        self
    }
}
