//! Pointer gesture state machine for the canvas.
//!
//! Two gestures exist, both started by pointer-down on a distinct affordance
//! and both ended by pointer-up anywhere:
//!
//! - drag: pointer-down on a node body, moves the node;
//! - connect: pointer-down on a node's output port, proposes a transition.
//!
//! At most one gesture is active. Its [`GestureHandle`] is the subscription
//! token for pointer-move delivery; ending the gesture releases it.

use serde::Serialize;

use crate::config::CanvasConfig;
use crate::error::{DesignerError, Result};
use crate::geometry::{Point, clamp_node_origin};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum InteractionState {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Dragging {
        state_key: String,
        /// Pointer position relative to the node's top-left corner.
        pointer_offset: Point,
    },
    #[serde(rename_all = "camelCase")]
    Connecting {
        from_state_key: String,
        current_point: Point,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }
}

/// One selected node, one selected edge, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Node(String),
    Edge(usize),
}

impl Selection {
    pub fn node(&self) -> Option<&str> {
        match self {
            Selection::Node(key) => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<usize> {
        match self {
            Selection::Edge(index) => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureHandle(u64);

impl GestureHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEffect {
    NodeMoved { state_key: String, position: Point },
    PreviewMoved { from_state_key: String, point: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The handle did not belong to the active gesture.
    Ignored,
    DragFinished { state_key: String },
    ConnectRequested { from_state_key: String, to_state_key: String },
    /// Connect released over empty canvas or back on its source node.
    ConnectDiscarded { from_state_key: String },
}

#[derive(Debug, Default)]
pub struct InteractionController {
    state: InteractionState,
    selection: Selection,
    active: Option<GestureHandle>,
    next_handle: u64,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_gesture(&self) -> Option<GestureHandle> {
        self.active
    }

    /// Starts moving `state_key`. `pointer_offset` is the pointer position
    /// relative to the node's top-left corner; keeping it fixed for the whole
    /// gesture keeps the node anchored where it was grabbed. Selects the node.
    pub fn begin_drag(&mut self, state_key: &str, pointer_offset: Point) -> Result<GestureHandle> {
        let handle = self.claim()?;
        self.state = InteractionState::Dragging {
            state_key: state_key.to_string(),
            pointer_offset,
        };
        self.selection = Selection::Node(state_key.to_string());
        tracing::debug!(state_key, gesture = handle.0, "drag started");
        Ok(handle)
    }

    /// Starts a rubber-band connection out of `from_state_key`'s output port.
    pub fn begin_connect(&mut self, from_state_key: &str, pointer: Point) -> Result<GestureHandle> {
        let handle = self.claim()?;
        self.state = InteractionState::Connecting {
            from_state_key: from_state_key.to_string(),
            current_point: pointer,
        };
        tracing::debug!(from_state_key, gesture = handle.0, "connect started");
        Ok(handle)
    }

    /// Pointer position in canvas coordinates. Dragging yields the clamped
    /// new node origin, connecting yields the new preview point, idle yields
    /// nothing.
    pub fn pointer_move(&mut self, pointer: Point, canvas: &CanvasConfig) -> Option<PointerEffect> {
        if !pointer.is_finite() {
            return None;
        }
        match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::Dragging {
                state_key,
                pointer_offset,
            } => {
                let position = clamp_node_origin(pointer.minus(*pointer_offset), canvas);
                Some(PointerEffect::NodeMoved {
                    state_key: state_key.clone(),
                    position,
                })
            }
            InteractionState::Connecting {
                from_state_key,
                current_point,
            } => {
                *current_point = pointer;
                Some(PointerEffect::PreviewMoved {
                    from_state_key: from_state_key.clone(),
                    point: pointer,
                })
            }
        }
    }

    /// Pointer-up. `target` is the node body under the pointer, if any.
    /// Returns to idle whenever `handle` is the active gesture.
    pub fn end_gesture(&mut self, handle: GestureHandle, target: Option<&str>) -> GestureOutcome {
        if self.active != Some(handle) {
            tracing::debug!(gesture = handle.0, "ignoring end of inactive gesture");
            return GestureOutcome::Ignored;
        }
        self.active = None;
        let outcome = match std::mem::take(&mut self.state) {
            InteractionState::Idle => GestureOutcome::Ignored,
            InteractionState::Dragging { state_key, .. } => GestureOutcome::DragFinished { state_key },
            InteractionState::Connecting { from_state_key, .. } => match target {
                Some(to) if to != from_state_key => GestureOutcome::ConnectRequested {
                    to_state_key: to.to_string(),
                    from_state_key,
                },
                _ => GestureOutcome::ConnectDiscarded { from_state_key },
            },
        };
        tracing::debug!(gesture = handle.0, ?outcome, "gesture ended");
        outcome
    }

    /// Drops any active gesture without an outcome, e.g. when the graph is
    /// replaced underneath it.
    pub fn cancel(&mut self) {
        self.active = None;
        self.state = InteractionState::Idle;
    }

    pub fn select_node(&mut self, state_key: &str) {
        self.selection = Selection::Node(state_key.to_string());
    }

    pub fn select_edge(&mut self, index: usize) {
        self.selection = Selection::Edge(index);
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    fn claim(&mut self) -> Result<GestureHandle> {
        if self.active.is_some() {
            return Err(DesignerError::GestureActive);
        }
        self.next_handle += 1;
        let handle = GestureHandle(self.next_handle);
        self.active = Some(handle);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_moves_by_pointer_minus_offset() {
        let canvas = CanvasConfig::default();
        let mut ctl = InteractionController::new();
        let handle = ctl.begin_drag("NEW", Point::new(10.0, 5.0)).unwrap();
        let effect = ctl.pointer_move(Point::new(300.0, 200.0), &canvas);
        assert_eq!(
            effect,
            Some(PointerEffect::NodeMoved {
                state_key: "NEW".to_string(),
                position: Point::new(290.0, 195.0),
            })
        );
        assert_eq!(
            ctl.end_gesture(handle, None),
            GestureOutcome::DragFinished {
                state_key: "NEW".to_string()
            }
        );
        assert!(ctl.state().is_idle());
    }

    #[test]
    fn drag_selects_node_and_clears_edge() {
        let mut ctl = InteractionController::new();
        ctl.select_edge(3);
        ctl.begin_drag("NEW", Point::default()).unwrap();
        assert_eq!(ctl.selection(), &Selection::Node("NEW".to_string()));
    }

    #[test]
    fn second_gesture_is_rejected_while_one_is_active() {
        let mut ctl = InteractionController::new();
        let handle = ctl.begin_connect("A", Point::new(1.0, 1.0)).unwrap();
        assert!(matches!(
            ctl.begin_drag("B", Point::default()),
            Err(DesignerError::GestureActive)
        ));
        ctl.end_gesture(handle, None);
        assert!(ctl.begin_drag("B", Point::default()).is_ok());
    }

    #[test]
    fn connect_to_other_node_requests_edge() {
        let mut ctl = InteractionController::new();
        let handle = ctl.begin_connect("NEW", Point::new(0.0, 0.0)).unwrap();
        assert_eq!(
            ctl.end_gesture(handle, Some("ASSIGNED")),
            GestureOutcome::ConnectRequested {
                from_state_key: "NEW".to_string(),
                to_state_key: "ASSIGNED".to_string(),
            }
        );
    }

    #[test]
    fn connect_on_self_or_canvas_is_discarded() {
        let mut ctl = InteractionController::new();
        let handle = ctl.begin_connect("NEW", Point::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            ctl.end_gesture(handle, Some("NEW")),
            GestureOutcome::ConnectDiscarded { .. }
        ));
        let handle = ctl.begin_connect("NEW", Point::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            ctl.end_gesture(handle, None),
            GestureOutcome::ConnectDiscarded { .. }
        ));
    }

    #[test]
    fn connect_move_only_updates_preview() {
        let canvas = CanvasConfig::default();
        let mut ctl = InteractionController::new();
        ctl.begin_connect("NEW", Point::new(0.0, 0.0)).unwrap();
        ctl.pointer_move(Point::new(5000.0, 5000.0), &canvas);
        assert_eq!(
            ctl.state(),
            &InteractionState::Connecting {
                from_state_key: "NEW".to_string(),
                current_point: Point::new(5000.0, 5000.0),
            }
        );
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut ctl = InteractionController::new();
        let first = ctl.begin_drag("A", Point::default()).unwrap();
        ctl.end_gesture(first, None);
        let second = ctl.begin_drag("B", Point::default()).unwrap();
        assert_eq!(ctl.end_gesture(first, None), GestureOutcome::Ignored);
        assert_eq!(ctl.active_gesture(), Some(second));
    }

    #[test]
    fn idle_pointer_moves_do_nothing() {
        let mut ctl = InteractionController::new();
        assert!(ctl.pointer_move(Point::new(1.0, 1.0), &CanvasConfig::default()).is_none());
    }
}
