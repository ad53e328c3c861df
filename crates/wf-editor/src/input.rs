//! Input abstraction layer.
//!
//! Normalizes browser mouse/pointer events into an `InputEvent` enum that
//! the page dispatches to element listeners.

use wf_core::Point;

/// Pointer coordinates carried by every input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerData {
    /// Position in the viewport (`clientX`/`clientY`).
    pub client: Point,
    /// Position on the physical screen (`screenX`/`screenY`).
    pub screen: Point,
}

impl PointerData {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            client: Point::new(x, y),
            screen: Point::new(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerData),
    PointerMove(PointerData),
    PointerUp(PointerData),
    /// Pointer left the element the event is dispatched to. Does not bubble.
    PointerLeave(PointerData),
    /// Mouse wheel; positive `delta_y` scrolls down.
    Wheel { delta_y: f64, pointer: PointerData },
    Click(PointerData),
    DoubleClick(PointerData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Wheel,
    Click,
    DoubleClick,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerDown(_) => EventKind::PointerDown,
            Self::PointerMove(_) => EventKind::PointerMove,
            Self::PointerUp(_) => EventKind::PointerUp,
            Self::PointerLeave(_) => EventKind::PointerLeave,
            Self::Wheel { .. } => EventKind::Wheel,
            Self::Click(_) => EventKind::Click,
            Self::DoubleClick(_) => EventKind::DoubleClick,
        }
    }

    pub fn pointer(&self) -> PointerData {
        match self {
            Self::PointerDown(p)
            | Self::PointerMove(p)
            | Self::PointerUp(p)
            | Self::PointerLeave(p)
            | Self::Click(p)
            | Self::DoubleClick(p) => *p,
            Self::Wheel { pointer, .. } => *pointer,
        }
    }

    pub fn bubbles(&self) -> bool {
        !matches!(self, Self::PointerLeave(_))
    }
}

/// Mutable per-dispatch flags set by listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventState {
    pub propagation_stopped: bool,
    pub default_prevented: bool,
}

impl EventState {
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_does_not_bubble() {
        assert!(!InputEvent::PointerLeave(PointerData::default()).bubbles());
        assert!(InputEvent::PointerMove(PointerData::default()).bubbles());
    }

    #[test]
    fn wheel_carries_pointer() {
        let e = InputEvent::Wheel {
            delta_y: -3.0,
            pointer: PointerData::at(4.0, 5.0),
        };
        assert_eq!(e.kind(), EventKind::Wheel);
        assert_eq!(e.pointer().client, Point::new(4.0, 5.0));
    }
}
