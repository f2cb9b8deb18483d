use serde::{Deserialize, Serialize};

use crate::core::types::{PixelPoint, Rect};

/// Pointer buttons the gesture machine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    /// Starts a zoom-rectangle drag.
    Left,
    /// Starts a context (pan) drag.
    Right,
    /// Starts a restore-previous-view press.
    Restore,
}

/// Typed transition inputs driving the gesture machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Press { button: PointerButton, at: PixelPoint },
    Move { at: PixelPoint },
    Release { button: PointerButton, at: PixelPoint },
    Wheel { at: PixelPoint, steps: f64 },
}

/// Current gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GestureState {
    #[default]
    Idle,
    ZoomDrag {
        start: PixelPoint,
        current: PixelPoint,
    },
    ContextDrag {
        last: PixelPoint,
    },
    RestoreDrag {
        start: PixelPoint,
    },
}

/// Tuning for gesture recognition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Zoom rectangles under this size on either side cancel the zoom.
    pub cancel_threshold_px: f64,
    /// Zoom factor applied per wheel step.
    pub wheel_step_factor: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cancel_threshold_px: 3.0,
            wheel_step_factor: 1.2,
        }
    }
}

/// One commit/cancel outcome per completed gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    None,
    /// A zoom rectangle was committed; bounds should be set from it.
    ZoomCommitted { rect: Rect },
    /// The zoom rectangle was too small; automatic bounds are restored.
    ZoomCancelled,
    /// Incremental pan displacement from a context drag.
    Pan { dx: f64, dy: f64 },
    /// The restore button was released; the previous view is recalled.
    RestoreRequested,
    /// Wheel zoom around an anchor position.
    WheelZoom { at: PixelPoint, factor: f64 },
}

/// Pointer-gesture finite-state machine.
///
/// States: idle, zoom drag (left button), context drag (right button),
/// restore drag. Every completed gesture resolves to exactly one
/// [`GestureOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureMachine {
    state: GestureState,
    config: GestureConfig,
}

impl GestureMachine {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            state: GestureState::Idle,
            config,
        }
    }

    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> GestureConfig {
        self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Rubber-band rectangle of an in-progress zoom drag.
    #[must_use]
    pub fn zoom_rect(&self) -> Option<Rect> {
        match self.state {
            GestureState::ZoomDrag { start, current } => Some(corner_rect(start, current)),
            _ => None,
        }
    }

    /// Feeds one pointer event; returns the gesture outcome, if any.
    pub fn handle(&mut self, event: PointerEvent) -> GestureOutcome {
        match (self.state, event) {
            (GestureState::Idle, PointerEvent::Press { button, at }) => {
                self.state = match button {
                    PointerButton::Left => GestureState::ZoomDrag {
                        start: at,
                        current: at,
                    },
                    PointerButton::Right => GestureState::ContextDrag { last: at },
                    PointerButton::Restore => GestureState::RestoreDrag { start: at },
                };
                GestureOutcome::None
            }
            (GestureState::Idle, PointerEvent::Wheel { at, steps }) => {
                if steps == 0.0 || !steps.is_finite() {
                    return GestureOutcome::None;
                }
                GestureOutcome::WheelZoom {
                    at,
                    factor: self.config.wheel_step_factor.powf(steps),
                }
            }
            (GestureState::ZoomDrag { start, .. }, PointerEvent::Move { at }) => {
                self.state = GestureState::ZoomDrag { start, current: at };
                GestureOutcome::None
            }
            (
                GestureState::ZoomDrag { start, .. },
                PointerEvent::Release {
                    button: PointerButton::Left,
                    at,
                },
            ) => {
                self.state = GestureState::Idle;
                let rect = corner_rect(start, at);
                if rect.width < self.config.cancel_threshold_px
                    || rect.height < self.config.cancel_threshold_px
                {
                    GestureOutcome::ZoomCancelled
                } else {
                    GestureOutcome::ZoomCommitted { rect }
                }
            }
            (GestureState::ContextDrag { last }, PointerEvent::Move { at }) => {
                self.state = GestureState::ContextDrag { last: at };
                GestureOutcome::Pan {
                    dx: at.x - last.x,
                    dy: at.y - last.y,
                }
            }
            (
                GestureState::ContextDrag { .. },
                PointerEvent::Release {
                    button: PointerButton::Right,
                    ..
                },
            ) => {
                self.state = GestureState::Idle;
                GestureOutcome::None
            }
            (
                GestureState::RestoreDrag { .. },
                PointerEvent::Release {
                    button: PointerButton::Restore,
                    ..
                },
            ) => {
                self.state = GestureState::Idle;
                GestureOutcome::RestoreRequested
            }
            // Unmatched button releases abandon the gesture.
            (_, PointerEvent::Release { .. }) => {
                self.state = GestureState::Idle;
                GestureOutcome::None
            }
            _ => GestureOutcome::None,
        }
    }
}

fn corner_rect(a: PixelPoint, b: PixelPoint) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    Rect::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_drag_commits_zoom_rectangle() {
        let mut machine = GestureMachine::default();
        machine.handle(PointerEvent::Press {
            button: PointerButton::Left,
            at: PixelPoint::new(10.0, 10.0),
        });
        machine.handle(PointerEvent::Move {
            at: PixelPoint::new(60.0, 40.0),
        });
        let outcome = machine.handle(PointerEvent::Release {
            button: PointerButton::Left,
            at: PixelPoint::new(60.0, 40.0),
        });
        assert_eq!(
            outcome,
            GestureOutcome::ZoomCommitted {
                rect: Rect::new(10.0, 10.0, 50.0, 30.0)
            }
        );
        assert_eq!(machine.state(), GestureState::Idle);
    }

    #[test]
    fn tiny_zoom_rectangle_cancels() {
        let mut machine = GestureMachine::default();
        machine.handle(PointerEvent::Press {
            button: PointerButton::Left,
            at: PixelPoint::new(10.0, 10.0),
        });
        let outcome = machine.handle(PointerEvent::Release {
            button: PointerButton::Left,
            at: PixelPoint::new(11.0, 40.0),
        });
        assert_eq!(outcome, GestureOutcome::ZoomCancelled);
    }

    #[test]
    fn context_drag_emits_incremental_pan() {
        let mut machine = GestureMachine::default();
        machine.handle(PointerEvent::Press {
            button: PointerButton::Right,
            at: PixelPoint::new(100.0, 100.0),
        });
        let first = machine.handle(PointerEvent::Move {
            at: PixelPoint::new(110.0, 95.0),
        });
        assert_eq!(first, GestureOutcome::Pan { dx: 10.0, dy: -5.0 });
        let second = machine.handle(PointerEvent::Move {
            at: PixelPoint::new(115.0, 95.0),
        });
        assert_eq!(second, GestureOutcome::Pan { dx: 5.0, dy: 0.0 });
    }

    #[test]
    fn restore_release_requests_previous_view() {
        let mut machine = GestureMachine::default();
        machine.handle(PointerEvent::Press {
            button: PointerButton::Restore,
            at: PixelPoint::new(5.0, 5.0),
        });
        let outcome = machine.handle(PointerEvent::Release {
            button: PointerButton::Restore,
            at: PixelPoint::new(5.0, 5.0),
        });
        assert_eq!(outcome, GestureOutcome::RestoreRequested);
    }

    #[test]
    fn wheel_in_idle_scales_by_step_factor() {
        let mut machine = GestureMachine::default();
        let outcome = machine.handle(PointerEvent::Wheel {
            at: PixelPoint::new(50.0, 50.0),
            steps: 2.0,
        });
        let GestureOutcome::WheelZoom { factor, .. } = outcome else {
            panic!("expected wheel zoom");
        };
        assert!((factor - 1.44).abs() <= 1e-9);
    }
}
