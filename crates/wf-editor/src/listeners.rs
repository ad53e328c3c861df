//! Event listener table.
//!
//! Listeners are plain data: an element, an event kind, and the [`Action`]
//! to run. The page looks them up while walking the propagation path and
//! runs each action against the component that owns it.

use crate::input::EventKind;
use wf_core::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Begin dragging `movable` within the canvas whose svg is `svg`.
    StartDrag { svg: NodeIndex, movable: NodeIndex },
    Drag { svg: NodeIndex },
    EndDrag { svg: NodeIndex },
    /// Write pointer coordinates into the canvas's readout.
    MouseLog { canvas: NodeIndex },
    Zoom { canvas: NodeIndex, direction: f64 },
    /// Zoom by the inverted wheel delta.
    WheelZoom { canvas: NodeIndex },
    ZoomReset { canvas: NodeIndex },
    Center { canvas: NodeIndex },
    ToggleSelected { node: NodeIndex },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    pub target: NodeIndex,
    pub kind: EventKind,
    pub action: Action,
}

#[derive(Debug, Clone, Default)]
pub struct Listeners {
    entries: Vec<Listener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: NodeIndex, kind: EventKind, action: Action) {
        self.entries.push(Listener {
            target,
            kind,
            action,
        });
    }

    /// Actions registered on `target` for `kind`, in registration order.
    pub fn actions_for(&self, target: NodeIndex, kind: EventKind) -> Vec<Action> {
        self.entries
            .iter()
            .filter(|l| l.target == target && l.kind == kind)
            .map(|l| l.action)
            .collect()
    }

    pub fn remove_target(&mut self, target: NodeIndex) {
        self.entries.retain(|l| l.target != target);
    }

    pub fn remove_where(&mut self, mut pred: impl FnMut(&Listener) -> bool) {
        self.entries.retain(|l| !pred(l));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
