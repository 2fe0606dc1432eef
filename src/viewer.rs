//! The viewing surface facade
//!
//! `DocumentViewer` wires the session, loader, geometry, gestures, and the
//! two scheduler lanes together behind one handle the host can call from
//! any thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::LoadRequest;
use crate::engine::DocumentEngine;
use crate::error::{DocumentOpenError, ViewerError};
use crate::geometry::{Point, Rect};
use crate::gesture::{GestureConfig, GestureInterpreter, GestureOutcome, TurnDirection};
use crate::scheduler::{BoundSurface, RenderScheduler, SurfaceState, ViewState};
use crate::session::{DocumentSession, SessionInner};

/// An embeddable single-page document viewer.
///
/// Navigation and surface events queue work on the render lane; live pan
/// and pinch-zoom rasterize synchronously on the calling thread so they
/// track the finger without waiting behind queued jobs.
pub struct DocumentViewer<E: DocumentEngine> {
    engine: Arc<E>,
    session: Arc<DocumentSession<E>>,
    view: Arc<Mutex<ViewState<E>>>,
    scheduler: RenderScheduler,
    gestures: Mutex<GestureInterpreter>,
}

impl<E: DocumentEngine> DocumentViewer<E> {
    pub fn new(engine: E) -> Self {
        Self::with_gesture_config(engine, GestureConfig::default())
    }

    pub fn with_gesture_config(engine: E, config: GestureConfig) -> Self {
        let engine = Arc::new(engine);
        let session = Arc::new(DocumentSession::new());
        let view = Arc::new(Mutex::new(ViewState::new()));
        let scheduler = RenderScheduler::spawn(engine.clone(), session.clone(), view.clone());

        Self {
            engine,
            session,
            view,
            scheduler,
            gestures: Mutex::new(GestureInterpreter::new(config)),
        }
    }

    /// Open a document, replacing any previously open one.
    ///
    /// On success the view lands on the first page, `on_load_complete`
    /// fires with the page count, and a render is queued when a surface is
    /// already bound. On failure the session is left closed,
    /// `on_error_occurred` fires, and the error is also returned.
    pub fn load(&self, request: LoadRequest) -> Result<(), DocumentOpenError> {
        let LoadRequest { source, callbacks } = request;

        let outcome = self.session.open(self.engine.as_ref(), &source);

        let surface_bound = {
            let mut state = self.lock_view();
            state.callbacks = callbacks.clone();
            state.current_page = 0;
            matches!(state.surface, SurfaceState::Bound(_))
        };

        match outcome {
            Ok(page_count) => {
                if surface_bound {
                    self.scheduler.submit_display();
                }
                if let Some(on_load_complete) = callbacks.on_load_complete {
                    on_load_complete(page_count);
                }
                Ok(())
            }
            Err(error) => {
                log::warn!("document load failed: {error}");
                if let Some(on_error_occurred) = callbacks.on_error_occurred {
                    on_error_occurred();
                }
                Err(error)
            }
        }
    }

    // --- surface lifecycle ---

    /// Bind a freshly created display surface and queue a render when a
    /// document is open.
    pub fn surface_created(&self, surface: E::Surface, width: u32, height: u32) {
        {
            let mut state = self.lock_view();
            state.surface = SurfaceState::Bound(BoundSurface {
                surface,
                width,
                height,
            });
            state.viewport.set_screen(width, height);
        }
        log::debug!("surface bound at {width}x{height}");

        if self.session.is_open() {
            self.scheduler.submit_display();
        }
    }

    /// Re-bind the surface after a size change; the fit is recomputed by
    /// the queued render.
    pub fn surface_changed(&self, surface: E::Surface, width: u32, height: u32) {
        self.surface_created(surface, width, height);
    }

    /// Tear the surface down and release the document.
    ///
    /// Safe to race against an in-flight render: the job either finishes
    /// against the still-bound surface before the teardown takes the locks,
    /// or observes the tri-state and becomes a no-op.
    pub fn surface_destroyed(&self) {
        {
            let mut state = self.lock_view();
            state.surface = SurfaceState::TearingDown;
        }

        self.session.close(self.engine.as_ref());

        let mut state = self.lock_view();
        state.surface = SurfaceState::Unbound;
        drop(state);

        log::debug!("surface destroyed");
    }

    // --- navigation ---

    /// Navigate to the 0-based `index`.
    ///
    /// Out-of-range indices are ignored without queueing any work;
    /// navigating to the current page is valid and re-renders it. This is
    /// the only path that changes the current page.
    pub fn go_to_page(&self, index: usize) {
        let Some(page_count) = self.session.page_count() else {
            log::debug!("navigation ignored: no document is open");
            return;
        };
        if index >= page_count {
            log::debug!("navigation ignored: page {index} outside 0..{page_count}");
            return;
        }

        self.lock_view().current_page = index;
        self.scheduler.submit_display();
    }

    pub fn next_page(&self) {
        self.go_to_page(self.current_index() + 1);
    }

    pub fn previous_page(&self) {
        if let Some(previous) = self.current_index().checked_sub(1) {
            self.go_to_page(previous);
        }
    }

    pub fn first_page(&self) {
        self.go_to_page(0);
    }

    pub fn last_page(&self) {
        if let Some(page_count) = self.session.page_count() {
            if let Some(last) = page_count.checked_sub(1) {
                self.go_to_page(last);
            }
        }
    }

    /// Current page, 1-based.
    pub fn current_page(&self) -> usize {
        self.current_index() + 1
    }

    /// Total pages of the open document; fails fast when none is.
    pub fn page_count(&self) -> Result<usize, ViewerError> {
        self.session.page_count().ok_or(ViewerError::SessionClosed)
    }

    pub fn zoom(&self) -> f32 {
        self.lock_view().viewport.zoom()
    }

    pub fn is_zoomed(&self) -> bool {
        self.lock_view().viewport.is_zoomed()
    }

    pub fn page_rect(&self) -> Rect {
        self.lock_view().viewport.page_rect()
    }

    // --- direct manipulation (synchronous render path) ---

    /// Pan the zoomed page and rasterize immediately on the calling thread.
    /// A no-op while not zoomed.
    pub fn pan(&self, dx: f32, dy: f32) {
        let session_guard = self.session.read();
        let mut state = self.lock_view();

        if !state.viewport.is_zoomed() {
            return;
        }

        state.viewport.pan(dx, dy);
        Self::rasterize(self.engine.as_ref(), session_guard.as_ref(), &mut state);
    }

    /// Multiply the cumulative zoom by `factor` about `pivot` and rasterize
    /// immediately. Underflow re-fits, overflow clamps at the maximum.
    pub fn zoom_to(&self, factor: f32, pivot: Point) {
        let session_guard = self.session.read();
        let mut state = self.lock_view();

        state.viewport.zoom_to(factor, pivot);
        Self::rasterize(self.engine.as_ref(), session_guard.as_ref(), &mut state);
    }

    /// Rasterize the current page rectangle into the bound surface.
    ///
    /// An unbound surface or closed session here is a teardown race, so
    /// both degrade to silent no-ops instead of surfacing.
    fn rasterize(engine: &E, session: Option<&SessionInner<E>>, state: &mut ViewState<E>) {
        let Some(inner) = session else {
            return;
        };
        let SurfaceState::Bound(bound) = &mut state.surface else {
            return;
        };

        let page = state.current_page;
        let rect = state.viewport.page_rect();

        if let Err(source) = engine.render_page(
            &inner.doc,
            &mut bound.surface,
            page,
            rect.left,
            rect.top,
            rect.width(),
            rect.height(),
        ) {
            log::warn!("engine failed to rasterize page {page}: {source}");
        }
    }

    // --- gesture entry points ---

    pub fn drag_started(&self, x: f32, y: f32) {
        self.lock_gestures().drag_started(x, y, Instant::now());
    }

    pub fn drag_moved(&self, dx: f32, dy: f32) {
        let outcome = self.lock_gestures().drag_moved(dx, dy);
        self.apply_outcome(outcome);
    }

    pub fn drag_ended(&self, x: f32, y: f32) {
        let screen_width = self.lock_view().viewport.screen_rect().width() as f32;
        let outcome = self
            .lock_gestures()
            .drag_ended(x, y, Instant::now(), screen_width);
        self.apply_outcome(outcome);
    }

    pub fn pinch_started(&self) {
        self.lock_gestures().pinch_started();
    }

    pub fn pinch_scaled(&self, factor: f32, pivot: Point) {
        let outcome = self.lock_gestures().pinch_scaled(factor, pivot);
        self.apply_outcome(outcome);
    }

    pub fn pinch_ended(&self) {
        let contained = self.lock_view().viewport.page_within_screen();
        let outcome = self.lock_gestures().pinch_ended(contained);
        self.apply_outcome(outcome);
    }

    pub fn double_tapped(&self) {
        let outcome = self.lock_gestures().double_tapped();
        self.apply_outcome(outcome);
    }

    pub fn set_double_tap_enabled(&self, enabled: bool) {
        self.lock_gestures().set_double_tap_enabled(enabled);
    }

    fn apply_outcome(&self, outcome: GestureOutcome) {
        match outcome {
            GestureOutcome::None => {}
            GestureOutcome::Pan { dx, dy } => self.pan(dx, dy),
            GestureOutcome::Zoom { factor, pivot } => self.zoom_to(factor, pivot),
            GestureOutcome::TurnPage(TurnDirection::Forward) => self.next_page(),
            GestureOutcome::TurnPage(TurnDirection::Backward) => self.previous_page(),
            GestureOutcome::Redisplay => self.go_to_page(self.current_index()),
            GestureOutcome::Refit => self.scheduler.submit_display(),
        }
    }

    // --- plumbing ---

    /// Stop both worker lanes and close the document. Runs automatically on
    /// drop.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        self.session.close(self.engine.as_ref());
    }

    fn current_index(&self) -> usize {
        self.lock_view().current_page
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewState<E>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_gestures(&self) -> MutexGuard<'_, GestureInterpreter> {
        self.gestures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: DocumentEngine> Drop for DocumentViewer<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
