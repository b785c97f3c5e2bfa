//! Pointer-driven interaction state machines.
//!
//! Only one gesture can be live at a time: drag and resize share a single
//! [`Gesture`] slot.

pub mod drag;
pub mod reorder_animation;
pub mod resize;

pub use drag::{ColumnOrderChange, DragState, reorder};
pub use reorder_animation::{
    Easing, HeaderElement, HeaderRect, HeaderRegistry, HeaderSlide, SlideTransition,
};
pub use resize::{CaptureHandle, NoCapture, PointerCapture, ResizeSession, ResizeState};

/// The gesture currently in progress.
#[derive(Debug, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        source: String,
        over: Option<String>,
    },
    Resizing(ResizeSession),
}

impl Gesture {
    pub fn is_resizing(&self) -> bool {
        matches!(self, Gesture::Resizing(_))
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Gesture::Dragging { .. })
    }

    pub fn drag_state(&self) -> DragState {
        match self {
            Gesture::Dragging { source, over } => DragState {
                source: Some(source.clone()),
                over: over.clone(),
            },
            _ => DragState::default(),
        }
    }

    pub fn resize_session(&self) -> Option<&ResizeSession> {
        match self {
            Gesture::Resizing(session) => Some(session),
            _ => None,
        }
    }
}
