//! Drag and pinch interpretation
//!
//! Turns the semantic pointer events delivered by the host's gesture
//! detectors into viewport commands. Two orthogonal gesture sessions exist,
//! dragging and pinching, with pinching taking priority: drag events are
//! suppressed while a pinch is active. Session state never survives past
//! the end of its gesture.

use std::time::{Duration, Instant};

use crate::geometry::Point;

/// Thresholds for classifying a drag as a page turn.
#[derive(Clone, Debug)]
pub struct GestureConfig {
    /// Minimum horizontal displacement of a flick, in device pixels.
    pub quick_move_distance: f32,
    /// Maximum duration of a flick.
    pub quick_move_time: Duration,
    /// Whether double taps are delivered at all.
    pub double_tap_enabled: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            quick_move_distance: 120.0,
            quick_move_time: Duration::from_millis(250),
            double_tap_enabled: true,
        }
    }
}

/// What the viewer should do in response to a gesture event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutcome {
    None,
    /// Forward to the viewport pan.
    Pan { dx: f32, dy: f32 },
    /// Forward to the viewport zoom; `factor` is the raw per-event scale,
    /// or a neutral 1.0 while the accumulated pinch sits at its floor.
    Zoom { factor: f32, pivot: Point },
    /// Navigate one page in the given direction.
    TurnPage(TurnDirection),
    /// Re-navigate to the current page, restoring its position.
    Redisplay,
    /// Reset the viewport to the fit rectangle.
    Refit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnDirection {
    Forward,
    Backward,
}

#[derive(Debug)]
struct DragState {
    started_at: Instant,
    start: Point,
}

#[derive(Debug)]
struct PinchState {
    accumulated: f32,
}

/// The drag/pinch decision state machine.
#[derive(Debug)]
pub struct GestureInterpreter {
    config: GestureConfig,
    drag: Option<DragState>,
    pinch: Option<PinchState>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            drag: None,
            pinch: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_double_tap_enabled(&mut self, enabled: bool) {
        self.config.double_tap_enabled = enabled;
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    pub fn drag_started(&mut self, x: f32, y: f32, at: Instant) {
        self.drag = Some(DragState {
            started_at: at,
            start: Point::new(x, y),
        });
    }

    pub fn drag_moved(&mut self, dx: f32, dy: f32) -> GestureOutcome {
        if self.drag.is_none() || self.is_pinching() {
            return GestureOutcome::None;
        }
        GestureOutcome::Pan { dx, dy }
    }

    /// Classify the finished drag.
    ///
    /// A page turn is either a flick (fast and past the quick-move distance)
    /// or a deliberate drag past one third of the screen width. Dragging
    /// left (negative displacement) turns forward, dragging right turns
    /// backward. Anything else asks for a redisplay of the current page.
    pub fn drag_ended(&mut self, x: f32, _y: f32, at: Instant, screen_width: f32) -> GestureOutcome {
        let Some(drag) = self.drag.take() else {
            return GestureOutcome::None;
        };
        if self.is_pinching() {
            return GestureOutcome::None;
        }

        let distance = x - drag.start.x;
        let elapsed = at.saturating_duration_since(drag.started_at);
        log::trace!("drag ended: {distance}px over {elapsed:?}");

        if self.is_quick_move(distance, elapsed) || self.is_page_change(distance, screen_width) {
            let direction = if distance > 0.0 {
                TurnDirection::Backward
            } else {
                TurnDirection::Forward
            };
            GestureOutcome::TurnPage(direction)
        } else {
            GestureOutcome::Redisplay
        }
    }

    pub fn pinch_started(&mut self) {
        self.pinch = Some(PinchState { accumulated: 1.0 });
    }

    /// Fold one scale event into the pinch.
    ///
    /// The accumulated product is floored at 1.0, so a single gesture can
    /// never shrink the page below its fit size. The raw factor is
    /// forwarded only while the accumulated product sits above the floor;
    /// at the floor a neutral 1.0 goes out instead.
    pub fn pinch_scaled(&mut self, factor: f32, pivot: Point) -> GestureOutcome {
        if !factor.is_finite() || factor <= 0.0 {
            return GestureOutcome::None;
        }

        let pinch = self.pinch.get_or_insert(PinchState { accumulated: 1.0 });
        pinch.accumulated = (pinch.accumulated * factor).max(1.0);

        let forwarded = if pinch.accumulated > 1.0 { factor } else { 1.0 };
        GestureOutcome::Zoom {
            factor: forwarded,
            pivot,
        }
    }

    /// Close the pinch session.
    ///
    /// When the accumulated scale settled back at its floor but the page
    /// rectangle no longer sits fully inside the screen, the viewport is
    /// asked to re-fit.
    pub fn pinch_ended(&mut self, page_within_screen: bool) -> GestureOutcome {
        let Some(pinch) = self.pinch.take() else {
            return GestureOutcome::None;
        };

        if pinch.accumulated <= 1.0 && !page_within_screen {
            GestureOutcome::Refit
        } else {
            GestureOutcome::None
        }
    }

    /// Reserved hook for a future reset-to-fit animation.
    pub fn double_tapped(&mut self) -> GestureOutcome {
        if !self.config.double_tap_enabled {
            return GestureOutcome::None;
        }
        GestureOutcome::None
    }

    fn is_quick_move(&self, distance: f32, elapsed: Duration) -> bool {
        distance.abs() >= self.config.quick_move_distance && elapsed <= self.config.quick_move_time
    }

    fn is_page_change(&self, distance: f32, screen_width: f32) -> bool {
        distance.abs() > (screen_width / 3.0).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN_WIDTH: f32 = 1000.0;

    fn interpreter() -> GestureInterpreter {
        GestureInterpreter::default()
    }

    #[test]
    fn fast_leftward_drag_is_a_forward_flick() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(300.0, 10.0, start);
        let outcome = gestures.drag_ended(
            50.0,
            10.0,
            start + Duration::from_millis(80),
            SCREEN_WIDTH,
        );

        assert_eq!(outcome, GestureOutcome::TurnPage(TurnDirection::Forward));
    }

    #[test]
    fn fast_rightward_drag_is_a_backward_flick() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(50.0, 10.0, start);
        let outcome = gestures.drag_ended(
            300.0,
            10.0,
            start + Duration::from_millis(80),
            SCREEN_WIDTH,
        );

        assert_eq!(outcome, GestureOutcome::TurnPage(TurnDirection::Backward));
    }

    #[test]
    fn slow_drag_past_a_third_of_the_screen_still_turns_the_page() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(800.0, 10.0, start);
        let outcome =
            gestures.drag_ended(400.0, 10.0, start + Duration::from_secs(2), SCREEN_WIDTH);

        assert_eq!(outcome, GestureOutcome::TurnPage(TurnDirection::Forward));
    }

    #[test]
    fn short_slow_drag_redisplays_the_current_page() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(300.0, 10.0, start);
        let outcome =
            gestures.drag_ended(250.0, 10.0, start + Duration::from_secs(1), SCREEN_WIDTH);

        assert_eq!(outcome, GestureOutcome::Redisplay);
    }

    #[test]
    fn fast_but_short_drag_is_not_a_flick() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(300.0, 10.0, start);
        let outcome = gestures.drag_ended(
            250.0,
            10.0,
            start + Duration::from_millis(40),
            SCREEN_WIDTH,
        );

        assert_eq!(outcome, GestureOutcome::Redisplay);
    }

    #[test]
    fn drag_state_does_not_survive_the_gesture() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(300.0, 10.0, start);
        gestures.drag_ended(50.0, 10.0, start, SCREEN_WIDTH);

        assert_eq!(
            gestures.drag_ended(50.0, 10.0, start, SCREEN_WIDTH),
            GestureOutcome::None
        );
    }

    #[test]
    fn drag_moves_forward_to_pan() {
        let mut gestures = interpreter();
        gestures.drag_started(300.0, 10.0, Instant::now());

        assert_eq!(
            gestures.drag_moved(-5.0, 3.0),
            GestureOutcome::Pan { dx: -5.0, dy: 3.0 }
        );
    }

    #[test]
    fn pinch_suppresses_drag_events() {
        let mut gestures = interpreter();
        let start = Instant::now();

        gestures.drag_started(300.0, 10.0, start);
        gestures.pinch_started();

        assert_eq!(gestures.drag_moved(-5.0, 0.0), GestureOutcome::None);
        assert_eq!(
            gestures.drag_ended(50.0, 10.0, start, SCREEN_WIDTH),
            GestureOutcome::None
        );
    }

    #[test]
    fn pinch_forwards_raw_factors_once_accumulated_exceeds_unity() {
        let mut gestures = interpreter();
        gestures.pinch_started();

        let first = gestures.pinch_scaled(1.3, Point::default());
        assert_eq!(
            first,
            GestureOutcome::Zoom {
                factor: 1.3,
                pivot: Point::default()
            }
        );

        // 1.3 * 0.9 = 1.17, still above the floor, so the raw shrink factor
        // goes through.
        let second = gestures.pinch_scaled(0.9, Point::default());
        assert_eq!(
            second,
            GestureOutcome::Zoom {
                factor: 0.9,
                pivot: Point::default()
            }
        );
    }

    #[test]
    fn pinch_below_the_floor_forwards_a_neutral_factor() {
        let mut gestures = interpreter();
        gestures.pinch_started();

        let outcome = gestures.pinch_scaled(0.8, Point::default());

        assert_eq!(
            outcome,
            GestureOutcome::Zoom {
                factor: 1.0,
                pivot: Point::default()
            }
        );

        // The floor holds the accumulated product at 1.0, so the next
        // zoom-in forwards its raw factor immediately.
        let outcome = gestures.pinch_scaled(1.5, Point::default());
        assert_eq!(
            outcome,
            GestureOutcome::Zoom {
                factor: 1.5,
                pivot: Point::default()
            }
        );
    }

    #[test]
    fn pinch_end_refits_when_settled_at_floor_and_page_overflows() {
        let mut gestures = interpreter();
        gestures.pinch_started();
        gestures.pinch_scaled(1.5, Point::default());
        gestures.pinch_scaled(0.5, Point::default());

        assert_eq!(gestures.pinch_ended(false), GestureOutcome::Refit);
        assert_eq!(gestures.pinch_ended(false), GestureOutcome::None);
    }

    #[test]
    fn pinch_end_keeps_zoom_when_accumulated_stays_above_floor() {
        let mut gestures = interpreter();
        gestures.pinch_started();
        gestures.pinch_scaled(1.3, Point::default());
        gestures.pinch_scaled(0.9, Point::default());

        assert_eq!(gestures.pinch_ended(false), GestureOutcome::None);
    }

    #[test]
    fn pinch_end_skips_refit_when_page_is_contained() {
        let mut gestures = interpreter();
        gestures.pinch_started();
        gestures.pinch_scaled(1.5, Point::default());
        gestures.pinch_scaled(0.5, Point::default());

        assert_eq!(gestures.pinch_ended(true), GestureOutcome::None);
    }

    #[test]
    fn double_tap_is_currently_a_no_op() {
        let mut gestures = interpreter();
        assert_eq!(gestures.double_tapped(), GestureOutcome::None);

        gestures.set_double_tap_enabled(false);
        assert_eq!(gestures.double_tapped(), GestureOutcome::None);
    }
}
