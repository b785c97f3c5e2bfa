//! Column width resizing and global pointer capture.

use std::fmt;
use std::sync::Arc;

use crate::reconcile::MIN_COLUMN_WIDTH;

/// Releases a global pointer capture when dropped.
///
/// Hosts return one from [`PointerCapture::capture`]. The table keeps it
/// inside the active resize session, so ending the session in any way
/// (pointer release, a new resize, teardown, dropping the table) runs the
/// release exactly once.
pub struct CaptureHandle {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CaptureHandle {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Host hook that routes pointer move/release events to the table for the
/// duration of a resize, regardless of which element the pointer is over.
pub trait PointerCapture: Send + Sync {
    fn capture(&self) -> CaptureHandle;
}

/// Capture for hosts that already deliver every pointer event to the table.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn capture(&self) -> CaptureHandle {
        CaptureHandle::noop()
    }
}

pub(crate) fn default_capture() -> Arc<dyn PointerCapture> {
    Arc::new(NoCapture)
}

/// Public view of an active resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub column_key: String,
    pub start_pointer_x: f64,
    pub start_width: f64,
}

/// An active resize gesture. Owns the pointer capture.
#[derive(Debug)]
pub struct ResizeSession {
    state: ResizeState,
    _capture: CaptureHandle,
}

impl ResizeSession {
    /// Start a session. `start_width` is clamped to the minimum width.
    pub fn new(column_key: impl Into<String>, pointer_x: f64, start_width: f64, capture: CaptureHandle) -> Self {
        Self {
            state: ResizeState {
                column_key: column_key.into(),
                start_pointer_x: pointer_x,
                start_width: start_width.max(MIN_COLUMN_WIDTH),
            },
            _capture: capture,
        }
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn column_key(&self) -> &str {
        &self.state.column_key
    }

    /// Width for the current pointer position.
    pub fn width_at(&self, pointer_x: f64) -> f64 {
        resized_width(self.state.start_width, self.state.start_pointer_x, pointer_x)
    }
}

/// `max(MIN_COLUMN_WIDTH, round(start_width + (pointer_x - start_x)))`.
///
/// ```
/// use tablestate::interaction::resize::resized_width;
///
/// assert_eq!(resized_width(200.0, 100.0, 130.0), 230.0);
/// assert_eq!(resized_width(200.0, 100.0, -1000.0), 140.0);
/// ```
pub fn resized_width(start_width: f64, start_x: f64, pointer_x: f64) -> f64 {
    let delta = pointer_x - start_x;
    let width = (start_width + delta).round();
    if width.is_nan() {
        return MIN_COLUMN_WIDTH;
    }
    width.max(MIN_COLUMN_WIDTH)
}
