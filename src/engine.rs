//! External document engine boundary

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::EngineError;

/// Where a document's bytes come from.
#[derive(Clone)]
pub enum DocumentSource {
    /// A file on disk. The session opens the backing stream itself and
    /// keeps it alive for the document's lifetime.
    Path(PathBuf),

    /// An in-memory buffer.
    Bytes(Arc<[u8]>),
}

impl DocumentSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// The external decoding engine.
///
/// The viewer never touches document bytes itself; everything below this
/// trait is the host's responsibility. `Document` is the engine's handle to
/// one opened document, `Surface` the live display target pages are
/// rasterized into.
///
/// Both worker lanes may call [`open_page`](Self::open_page) and
/// [`render_page`](Self::render_page) concurrently against the same
/// document; engines must synchronize internally where their native core
/// requires it. A decode that hangs blocks its lane indefinitely, which is
/// accepted as a boundary condition.
pub trait DocumentEngine: Send + Sync + 'static {
    type Document: Send + Sync + 'static;
    type Surface: Send + 'static;

    /// Open a document. Errors mean the source is not a document this
    /// engine understands.
    fn open(&self, source: &DocumentSource) -> Result<Self::Document, EngineError>;

    fn page_count(&self, doc: &Self::Document) -> usize;

    /// Whether `index` has already been decoded.
    fn has_page(&self, doc: &Self::Document, index: usize) -> bool;

    /// Decode a page. Decoding an already-open page must be a no-op.
    fn open_page(&self, doc: &Self::Document, index: usize) -> Result<(), EngineError>;

    fn page_width(&self, doc: &Self::Document, index: usize) -> f32;

    fn page_height(&self, doc: &Self::Document, index: usize) -> f32;

    /// Rasterize a page into a sub-rectangle of the surface.
    #[allow(clippy::too_many_arguments)]
    fn render_page(
        &self,
        doc: &Self::Document,
        surface: &mut Self::Surface,
        index: usize,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<(), EngineError>;

    /// Release the document handle and every native resource behind it.
    fn close(&self, doc: Self::Document);
}
