//! Viewport geometry - page fit, zoom, and pan clamping
//!
//! All rectangles are integer device pixels; page dimensions arrive from the
//! engine as floats and are rounded the moment they become screen
//! coordinates, so repeated transforms cannot accumulate fractional drift.

/// Zoom factor of the "fit" display level.
pub const MINIMUM_ZOOM: f32 = 1.0;

/// Largest cumulative zoom factor a pinch can reach.
pub const MAXIMUM_ZOOM: f32 = 5.0;

/// Integer rectangle in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Whether `other` sits fully inside `self`; matching edges count as
    /// inside.
    pub const fn contains(&self, other: Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

/// Point in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Page and screen rectangles plus the zoom state connecting them.
///
/// Mutated exclusively through [`fit_to_screen`](Self::fit_to_screen),
/// [`zoom_to`](Self::zoom_to), [`pan`](Self::pan), and
/// [`move_to`](Self::move_to). When not zoomed the page rectangle always
/// equals the fit rectangle for the current page and screen dimensions.
#[derive(Clone, Debug)]
pub struct Viewport {
    page_rect: Rect,
    screen_rect: Rect,
    /// Page dimensions used by the last fit, kept so a zoom underflow can
    /// re-fit without another engine round trip.
    page_size: (f32, f32),
    zoom: f32,
    zoomed: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            page_rect: Rect::default(),
            screen_rect: Rect::default(),
            page_size: (0.0, 0.0),
            zoom: MINIMUM_ZOOM,
            zoomed: false,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_screen(&mut self, width: u32, height: u32) {
        self.screen_rect = Rect::from_size(width as i32, height as i32);
    }

    pub fn screen_rect(&self) -> Rect {
        self.screen_rect
    }

    pub fn page_rect(&self) -> Rect {
        self.page_rect
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    /// Whether the page rectangle sits fully inside the screen rectangle.
    pub fn page_within_screen(&self) -> bool {
        self.screen_rect.contains(self.page_rect)
    }

    /// Compute the fit rectangle for a page of the given dimensions and
    /// reset the zoom state to the fit level.
    ///
    /// Portrait screens pick the fit axis by comparing aspect ratios and
    /// center the page along the free axis. Landscape and square screens
    /// pick by page orientation instead, and the fit-width branch anchors
    /// the page top-left rather than centering it vertically; callers
    /// depend on that anchoring, so it stays asymmetric on purpose.
    ///
    /// Degenerate inputs (non-positive page or screen dimensions) leave the
    /// state untouched.
    pub fn fit_to_screen(&mut self, page_width: f32, page_height: f32) -> Rect {
        let screen_width = self.screen_rect.width() as f32;
        let screen_height = self.screen_rect.height() as f32;

        if page_width <= 0.0 || page_height <= 0.0 || screen_width <= 0.0 || screen_height <= 0.0
        {
            return self.page_rect;
        }

        self.page_size = (page_width, page_height);

        if screen_width < screen_height {
            if page_width / page_height < screen_width / screen_height {
                self.fit_height_centered(page_width, page_height, screen_width, screen_height);
            } else {
                self.fit_width_centered(page_width, page_height, screen_width, screen_height);
            }
        } else if page_width > page_height {
            self.fit_height_centered(page_width, page_height, screen_width, screen_height);
        } else {
            self.fit_width_top_left(page_width, page_height, screen_width);
        }

        self.zoom = MINIMUM_ZOOM;
        self.zoomed = false;
        self.page_rect
    }

    fn fit_height_centered(
        &mut self,
        page_width: f32,
        page_height: f32,
        screen_width: f32,
        screen_height: f32,
    ) {
        let scaled_width = page_width * (screen_height / page_height);
        let left = (screen_width - scaled_width) as i32 / 2;

        self.page_rect = Rect {
            left,
            top: 0,
            right: (left as f32 + scaled_width) as i32,
            bottom: screen_height as i32,
        };
    }

    fn fit_width_centered(
        &mut self,
        page_width: f32,
        page_height: f32,
        screen_width: f32,
        screen_height: f32,
    ) {
        let scaled_height = page_height * (screen_width / page_width);
        let top = (screen_height - scaled_height) as i32 / 2;

        self.page_rect = Rect {
            left: 0,
            top,
            right: screen_width as i32,
            bottom: (top as f32 + scaled_height) as i32,
        };
    }

    fn fit_width_top_left(&mut self, page_width: f32, page_height: f32, screen_width: f32) {
        let scaled_height = page_height * (screen_width / page_width);

        self.page_rect = Rect {
            left: 0,
            top: 0,
            right: screen_width as i32,
            bottom: scaled_height as i32,
        };
    }

    fn refit(&mut self) -> Rect {
        let (page_width, page_height) = self.page_size;
        self.fit_to_screen(page_width, page_height)
    }

    /// Multiply the cumulative zoom by `factor`, scaling the page rectangle
    /// about `pivot`.
    ///
    /// A cumulative zoom below [`MINIMUM_ZOOM`] re-fits instead; one above
    /// [`MAXIMUM_ZOOM`] clamps the step so the cumulative zoom lands exactly
    /// on the maximum. After scaling, any edge that overshot past the screen
    /// bound is slid back exactly enough to re-align it, never more.
    pub fn zoom_to(&mut self, factor: f32, pivot: Point) -> Rect {
        if self.page_size.0 <= 0.0 || !factor.is_finite() || factor <= 0.0 {
            return self.page_rect;
        }

        if self.zoom * factor < MINIMUM_ZOOM {
            return self.refit();
        }

        let factor = if self.zoom * factor > MAXIMUM_ZOOM {
            let clamped = MAXIMUM_ZOOM / self.zoom;
            self.zoom = MAXIMUM_ZOOM;
            clamped
        } else {
            self.zoom *= factor;
            factor
        };
        self.zoomed = true;

        let page = self.page_rect;
        self.page_rect = Rect {
            left: (pivot.x + (page.left as f32 - pivot.x) * factor) as i32,
            top: (pivot.y + (page.top as f32 - pivot.y) * factor) as i32,
            right: (pivot.x + (page.right as f32 - pivot.x) * factor) as i32,
            bottom: (pivot.y + (page.bottom as f32 - pivot.y) * factor) as i32,
        };

        let page = self.page_rect;
        let screen = self.screen_rect;
        let mut move_x = 0.0;
        let mut move_y = 0.0;
        if page.left > screen.left {
            move_x -= (page.left - screen.left) as f32;
        }
        if page.top > screen.top {
            move_y -= (page.top - screen.top) as f32;
        }
        if page.right < screen.right {
            move_x = (screen.right - page.right) as f32;
        }
        if page.bottom < screen.bottom {
            move_y = (screen.bottom - page.bottom) as f32;
        }

        self.pan(move_x, move_y)
    }

    /// Translate the zoomed page rectangle by the given deltas.
    ///
    /// Clamping is direction-aware per axis: the rectangle never gets
    /// dragged past the screen bound on the side it is moving toward. An
    /// axis along which the page is fully contained in the screen is
    /// force-centered instead of freely panned, vertical containment taking
    /// precedence over horizontal. A no-op while not zoomed.
    pub fn pan(&mut self, dx: f32, dy: f32) -> Rect {
        if !self.zoomed {
            return self.page_rect;
        }

        let page = self.page_rect;
        let screen = self.screen_rect;
        let mut dx = dx;
        let mut dy = dy;

        let new_left = page.left as f32 + dx;
        let new_right = page.right as f32 + dx;
        let new_top = page.top as f32 + dy;
        let new_bottom = page.bottom as f32 + dy;

        if dx > 0.0 && new_right >= screen.right as f32 && new_left >= screen.left as f32 {
            dx = (screen.left - page.left) as f32;
        }
        if dx < 0.0 && new_left <= screen.left as f32 && new_right <= screen.right as f32 {
            dx = (screen.right - page.right) as f32;
        }
        if dy > 0.0 && new_bottom >= screen.bottom as f32 && new_top >= screen.top as f32 {
            dy = (screen.top - page.top) as f32;
        }
        if dy < 0.0 && new_top <= screen.top as f32 && new_bottom <= screen.bottom as f32 {
            dy = (screen.bottom - page.bottom) as f32;
        }

        if screen.height() > page.height() {
            self.move_to(
                page.left as f32 + dx,
                ((screen.height() - page.height()) / 2) as f32,
            )
        } else if screen.width() > page.width() {
            self.move_to(
                ((screen.width() - page.width()) / 2) as f32,
                page.top as f32 + dy,
            )
        } else {
            self.move_to(page.left as f32 + dx, page.top as f32 + dy)
        }
    }

    /// Place the page rectangle's top-left corner at an absolute position,
    /// preserving its size.
    pub fn move_to(&mut self, left: f32, top: f32) -> Rect {
        let width = self.page_rect.width();
        let height = self.page_rect.height();

        self.page_rect.left = left as i32;
        self.page_rect.right = self.page_rect.left + width;
        self.page_rect.top = top as i32;
        self.page_rect.bottom = self.page_rect.top + height;

        self.page_rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portrait_viewport() -> Viewport {
        let mut viewport = Viewport::new();
        viewport.set_screen(400, 800);
        viewport
    }

    fn landscape_viewport() -> Viewport {
        let mut viewport = Viewport::new();
        viewport.set_screen(800, 600);
        viewport
    }

    fn aspect(rect: Rect) -> f32 {
        rect.width() as f32 / rect.height() as f32
    }

    #[test]
    fn portrait_screen_fits_narrow_page_to_height_and_centers_horizontally() {
        let mut viewport = portrait_viewport();

        let rect = viewport.fit_to_screen(100.0, 400.0);

        assert_eq!(rect, Rect::new(100, 0, 300, 800));
        assert!(!viewport.is_zoomed());
        assert_eq!(viewport.zoom(), MINIMUM_ZOOM);
    }

    #[test]
    fn portrait_screen_fits_wide_page_to_width_and_centers_vertically() {
        let mut viewport = portrait_viewport();

        let rect = viewport.fit_to_screen(400.0, 400.0);

        assert_eq!(rect, Rect::new(0, 200, 400, 600));
    }

    #[test]
    fn landscape_screen_fits_wide_page_to_height_and_centers_horizontally() {
        let mut viewport = landscape_viewport();

        let rect = viewport.fit_to_screen(200.0, 100.0);

        assert_eq!(rect, Rect::new(-200, 0, 1000, 600));
    }

    #[test]
    fn landscape_screen_anchors_tall_page_top_left() {
        let mut viewport = landscape_viewport();

        let rect = viewport.fit_to_screen(300.0, 600.0);

        // No vertical centering in this branch.
        assert_eq!(rect, Rect::new(0, 0, 800, 1600));
    }

    #[test]
    fn fit_preserves_aspect_ratio_up_to_rounding() {
        let cases = [
            (400, 800, 123.0, 457.0),
            (400, 800, 612.0, 792.0),
            (800, 600, 612.0, 792.0),
            (800, 600, 1024.0, 300.0),
            (600, 600, 612.0, 792.0),
        ];

        for (screen_w, screen_h, page_w, page_h) in cases {
            let mut viewport = Viewport::new();
            viewport.set_screen(screen_w, screen_h);
            let rect = viewport.fit_to_screen(page_w, page_h);

            let expected = page_w / page_h;
            let got = aspect(rect);
            assert!(
                (got - expected).abs() / expected < 0.02,
                "aspect drifted for {page_w}x{page_h} on {screen_w}x{screen_h}: {got} vs {expected}"
            );
        }
    }

    #[test]
    fn portrait_fit_never_overshoots_screen() {
        let pages = [(100.0, 400.0), (400.0, 400.0), (612.0, 792.0), (50.0, 900.0)];

        for (page_w, page_h) in pages {
            let mut viewport = portrait_viewport();
            let rect = viewport.fit_to_screen(page_w, page_h);
            assert!(
                viewport.screen_rect().contains(rect),
                "fit of {page_w}x{page_h} escaped the screen: {rect:?}"
            );
        }
    }

    #[test]
    fn fit_ignores_degenerate_dimensions() {
        let mut viewport = portrait_viewport();
        let fitted = viewport.fit_to_screen(100.0, 400.0);

        assert_eq!(viewport.fit_to_screen(0.0, 400.0), fitted);
        assert_eq!(viewport.fit_to_screen(100.0, -1.0), fitted);

        let mut unsized_screen = Viewport::new();
        assert_eq!(unsized_screen.fit_to_screen(100.0, 400.0), Rect::default());
    }

    #[test]
    fn zoom_accumulates_and_sets_zoomed_flag() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(100.0, 400.0);

        viewport.zoom_to(2.0, Point::new(200.0, 400.0));

        assert!(viewport.is_zoomed());
        assert_eq!(viewport.zoom(), 2.0);
    }

    #[test]
    fn zoom_clamps_exactly_at_maximum() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(100.0, 400.0);

        viewport.zoom_to(3.0, Point::new(200.0, 400.0));
        viewport.zoom_to(3.0, Point::new(200.0, 400.0));

        assert_eq!(viewport.zoom(), MAXIMUM_ZOOM);

        viewport.zoom_to(1.5, Point::new(200.0, 400.0));
        assert_eq!(viewport.zoom(), MAXIMUM_ZOOM);
    }

    #[test]
    fn zoom_underflow_restores_fit() {
        let mut viewport = portrait_viewport();
        let fitted = viewport.fit_to_screen(100.0, 400.0);

        viewport.zoom_to(2.0, Point::new(200.0, 400.0));
        let rect = viewport.zoom_to(0.2, Point::new(200.0, 400.0));

        assert_eq!(rect, fitted);
        assert_eq!(viewport.zoom(), MINIMUM_ZOOM);
        assert!(!viewport.is_zoomed());
    }

    #[test]
    fn zoom_scales_about_pivot() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(200.0, 400.0);
        assert_eq!(viewport.page_rect(), Rect::new(0, 0, 400, 800));

        let rect = viewport.zoom_to(2.0, Point::new(200.0, 400.0));

        assert_eq!(rect, Rect::new(-200, -400, 600, 1200));
    }

    #[test]
    fn zoom_realigns_overshot_edges_to_screen_bounds() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(100.0, 400.0);

        // Zooming about the top-left corner pushes growth right and down,
        // leaving the left gap intact; the re-align step slides the page
        // back until the horizontal gap re-centers and nothing overshoots
        // on the anchored edges.
        let rect = viewport.zoom_to(1.5, Point::new(100.0, 0.0));

        assert!(rect.top <= viewport.screen_rect().top);
        assert!(rect.bottom >= viewport.screen_rect().bottom);
        let gap_left = rect.left - viewport.screen_rect().left;
        let gap_right = viewport.screen_rect().right - rect.right;
        assert!((gap_left - gap_right).abs() <= 1, "page not re-centered: {rect:?}");
    }

    #[test]
    fn pan_does_nothing_when_not_zoomed() {
        let mut viewport = portrait_viewport();
        let fitted = viewport.fit_to_screen(100.0, 400.0);

        assert_eq!(viewport.pan(50.0, 50.0), fitted);
    }

    #[test]
    fn pan_moves_freely_while_page_overflows_both_axes() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(200.0, 400.0);
        viewport.zoom_to(2.0, Point::new(200.0, 400.0));
        assert_eq!(viewport.page_rect(), Rect::new(-200, -400, 600, 1200));

        let rect = viewport.pan(-100.0, -100.0);

        assert_eq!(rect, Rect::new(-300, -500, 500, 1100));
    }

    #[test]
    fn pan_clamps_each_axis_at_screen_edges() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(200.0, 400.0);
        viewport.zoom_to(2.0, Point::new(200.0, 400.0));

        // A huge leftward drag stops when the page's right edge meets the
        // screen's right edge.
        let rect = viewport.pan(-5000.0, 0.0);
        assert_eq!(rect.right, viewport.screen_rect().right);

        // And a huge downward drag stops at the top edge.
        let rect = viewport.pan(0.0, 5000.0);
        assert_eq!(rect.top, viewport.screen_rect().top);
    }

    #[test]
    fn pan_centers_horizontal_axis_when_page_is_narrower_than_screen() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(100.0, 400.0);
        viewport.zoom_to(1.5, Point::new(200.0, 400.0));

        let rect = viewport.pan(37.0, -20.0);

        let gap_left = rect.left - viewport.screen_rect().left;
        let gap_right = viewport.screen_rect().right - rect.right;
        assert!((gap_left - gap_right).abs() <= 1, "x axis not centered: {rect:?}");
    }

    #[test]
    fn pan_overshoot_is_zero_after_any_drag() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(200.0, 400.0);
        viewport.zoom_to(3.0, Point::new(200.0, 400.0));

        for (dx, dy) in [(1e4, 0.0), (-1e4, 0.0), (0.0, 1e4), (0.0, -1e4)] {
            let rect = viewport.pan(dx, dy);
            let screen = viewport.screen_rect();
            assert!(rect.left <= screen.left, "left gap opened: {rect:?}");
            assert!(rect.top <= screen.top, "top gap opened: {rect:?}");
            assert!(rect.right >= screen.right, "right gap opened: {rect:?}");
            assert!(rect.bottom >= screen.bottom, "bottom gap opened: {rect:?}");
        }
    }

    #[test]
    fn page_within_screen_tracks_containment() {
        let mut viewport = portrait_viewport();
        viewport.fit_to_screen(100.0, 400.0);
        assert!(viewport.page_within_screen());

        viewport.zoom_to(2.0, Point::new(200.0, 400.0));
        assert!(!viewport.page_within_screen());
    }
}
