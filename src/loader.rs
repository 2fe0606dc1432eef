//! Lazy page decoding and neighbor prefetch

use std::sync::PoisonError;

use crate::engine::DocumentEngine;
use crate::error::DecodeError;
use crate::session::SessionInner;

/// How far around the displayed page the prefetch window reaches.
pub(crate) const PREFETCH_RADIUS: usize = 2;

/// Borrow-view over a session that decodes pages on demand.
pub(crate) struct PageLoader<'a, E: DocumentEngine> {
    engine: &'a E,
    session: &'a SessionInner<E>,
}

impl<'a, E: DocumentEngine> PageLoader<'a, E> {
    pub(crate) fn new(engine: &'a E, session: &'a SessionInner<E>) -> Self {
        Self { engine, session }
    }

    /// Decode `index` if it is in range and not already resident;
    /// otherwise a no-op.
    ///
    /// Decode failures are logged and swallowed: the page stays
    /// non-resident, so the next access simply retries.
    pub(crate) fn ensure_loaded(&self, index: usize) {
        if index >= self.session.page_count {
            return;
        }

        {
            let mut resident = self
                .session
                .resident
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if resident.contains(&index) {
                return;
            }
            if self.engine.has_page(&self.session.doc, index) {
                resident.insert(index);
                return;
            }
        }

        // The resident lock is released during the decode so the render and
        // prefetch lanes can work on different pages at the same time; the
        // engine's open_page is idempotent if they ever collide on one.
        match self.engine.open_page(&self.session.doc, index) {
            Ok(()) => {
                log::trace!("decoded page {index}");
                self.session
                    .resident
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(index);
            }
            Err(source) => log::warn!("{}", DecodeError { page: index, source }),
        }
    }

    /// Opportunistically decode the window around `center`: the center
    /// itself, then its neighbors at distance 1 and 2, clipped to the
    /// document bounds.
    pub(crate) fn prefetch_around(&self, center: usize) {
        self.ensure_loaded(center);
        for offset in 1..=PREFETCH_RADIUS {
            self.ensure_loaded(center.saturating_add(offset));
            if let Some(index) = center.checked_sub(offset) {
                self.ensure_loaded(index);
            }
        }
    }
}
