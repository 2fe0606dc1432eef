//! Render scheduling
//!
//! Two worker lanes, each a dedicated thread draining its own channel: the
//! render lane displays the current page, the prefetch lane decodes
//! neighbors. One consumer per channel gives strict submission order within
//! a lane while the lanes stay independent of each other. There is no job
//! cancellation; a render for a page the user already left simply completes
//! before the newer job runs, bounding staleness by one job.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use flume::{Receiver, Sender};

use crate::config::ViewerCallbacks;
use crate::engine::DocumentEngine;
use crate::error::RenderError;
use crate::geometry::Viewport;
use crate::loader::PageLoader;
use crate::session::DocumentSession;

pub(crate) enum RenderCommand {
    /// Render the current page into the bound surface.
    Display,
    Shutdown,
}

pub(crate) enum PrefetchCommand {
    /// Decode the window around the given page.
    Around(usize),
    Shutdown,
}

/// Display-surface binding, checked at the top of every render attempt.
pub(crate) enum SurfaceState<S> {
    Unbound,
    Bound(BoundSurface<S>),
    TearingDown,
}

pub(crate) struct BoundSurface<S> {
    pub(crate) surface: S,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Mutable view state shared between the input thread and the render lane.
///
/// A single mutex region per viewer keeps a rasterization from ever
/// observing a torn pan or zoom update.
pub(crate) struct ViewState<E: DocumentEngine> {
    pub(crate) viewport: Viewport,
    pub(crate) current_page: usize,
    pub(crate) surface: SurfaceState<E::Surface>,
    pub(crate) callbacks: ViewerCallbacks,
}

impl<E: DocumentEngine> ViewState<E> {
    pub(crate) fn new() -> Self {
        Self {
            viewport: Viewport::new(),
            current_page: 0,
            surface: SurfaceState::Unbound,
            callbacks: ViewerCallbacks::default(),
        }
    }
}

pub(crate) struct RenderScheduler {
    render_tx: Sender<RenderCommand>,
    prefetch_tx: Sender<PrefetchCommand>,
}

impl RenderScheduler {
    pub(crate) fn spawn<E: DocumentEngine>(
        engine: Arc<E>,
        session: Arc<DocumentSession<E>>,
        view: Arc<Mutex<ViewState<E>>>,
    ) -> Self {
        let (render_tx, render_rx) = flume::unbounded();
        let (prefetch_tx, prefetch_rx) = flume::unbounded();

        {
            let engine = engine.clone();
            let session = session.clone();
            let prefetch_tx = prefetch_tx.clone();
            thread::spawn(move || render_worker(engine, session, view, render_rx, prefetch_tx));
        }

        thread::spawn(move || prefetch_worker(engine, session, prefetch_rx));

        Self {
            render_tx,
            prefetch_tx,
        }
    }

    /// Queue a render of the current page.
    pub(crate) fn submit_display(&self) {
        let _ = self.render_tx.send(RenderCommand::Display);
    }

    /// Ask both lanes to exit once their queues drain.
    pub(crate) fn shutdown(&self) {
        let _ = self.render_tx.send(RenderCommand::Shutdown);
        let _ = self.prefetch_tx.send(PrefetchCommand::Shutdown);
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn render_worker<E: DocumentEngine>(
    engine: Arc<E>,
    session: Arc<DocumentSession<E>>,
    view: Arc<Mutex<ViewState<E>>>,
    commands: Receiver<RenderCommand>,
    prefetch_tx: Sender<PrefetchCommand>,
) {
    for command in commands {
        match command {
            RenderCommand::Display => {
                match display_current(engine.as_ref(), &session, &view, &prefetch_tx) {
                    Ok(()) => {}
                    // Teardown races legitimately produce these; nothing to do.
                    Err(RenderError::SessionClosed | RenderError::SurfaceUnbound) => {
                        log::trace!("render skipped: no document or no surface");
                    }
                    Err(error) => log::warn!("{error}"),
                }
            }
            RenderCommand::Shutdown => break,
        }
    }
}

/// One render job: decode the current page synchronously, re-fit, rasterize,
/// kick the prefetch window, then notify the host.
fn display_current<E: DocumentEngine>(
    engine: &E,
    session: &DocumentSession<E>,
    view: &Mutex<ViewState<E>>,
    prefetch_tx: &Sender<PrefetchCommand>,
) -> Result<(), RenderError> {
    let session_guard = session.read();
    let inner = session_guard.as_ref().ok_or(RenderError::SessionClosed)?;

    let mut state_guard = view.lock().unwrap_or_else(PoisonError::into_inner);
    let state = &mut *state_guard;

    let SurfaceState::Bound(bound) = &mut state.surface else {
        return Err(RenderError::SurfaceUnbound);
    };

    let page = state.current_page;

    // First paint is never blocked by speculative work: the displayed page
    // decodes here, neighbors go to the prefetch lane afterwards.
    PageLoader::new(engine, inner).ensure_loaded(page);

    let page_width = engine.page_width(&inner.doc, page);
    let page_height = engine.page_height(&inner.doc, page);

    state.viewport.set_screen(bound.width, bound.height);
    let rect = state.viewport.fit_to_screen(page_width, page_height);

    engine
        .render_page(
            &inner.doc,
            &mut bound.surface,
            page,
            rect.left,
            rect.top,
            rect.width(),
            rect.height(),
        )
        .map_err(|source| RenderError::Engine { page, source })?;

    let page_count = inner.page_count;
    let notify = state.callbacks.on_page_changed.clone();

    // Callbacks run without any viewer lock held so they may re-enter the
    // viewer freely.
    drop(state_guard);
    drop(session_guard);

    let _ = prefetch_tx.send(PrefetchCommand::Around(page));

    if let Some(on_page_changed) = notify {
        on_page_changed(page + 1, page_count);
    }

    Ok(())
}

fn prefetch_worker<E: DocumentEngine>(
    engine: Arc<E>,
    session: Arc<DocumentSession<E>>,
    commands: Receiver<PrefetchCommand>,
) {
    for command in commands {
        match command {
            PrefetchCommand::Around(center) => {
                let guard = session.read();
                if let Some(inner) = guard.as_ref() {
                    PageLoader::new(engine.as_ref(), inner).prefetch_around(center);
                }
            }
            PrefetchCommand::Shutdown => break,
        }
    }
}
