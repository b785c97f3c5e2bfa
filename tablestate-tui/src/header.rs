//! Terminal-side header cells and pointer capture.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::debug;
use tablestate::interaction::{
    CaptureHandle, HeaderElement, HeaderRect, PointerCapture, SlideTransition,
};

/// Layout units per terminal cell. Column widths are stored in units.
pub const UNITS_PER_CELL: f64 = 10.0;

pub fn cells(units: f64) -> u16 {
    (units / UNITS_PER_CELL).round().clamp(1.0, u16::MAX as f64) as u16
}

pub fn units(cell: u16) -> f64 {
    cell as f64 * UNITS_PER_CELL
}

/// A drawn header. Its rect is refreshed every frame.
#[derive(Debug, Default)]
pub struct TermHeader {
    rect: Mutex<Option<HeaderRect>>,
    slide: Mutex<Option<(SlideTransition, Instant)>>,
}

impl TermHeader {
    pub fn place(&self, x: u16, width: u16) {
        if let Ok(mut rect) = self.rect.lock() {
            *rect = Some(HeaderRect {
                left: units(x),
                width: units(width),
            });
        }
    }

    pub fn hide(&self) {
        if let Ok(mut rect) = self.rect.lock() {
            *rect = None;
        }
    }

    /// Current slide offset in cells. Finished slides are dropped.
    pub fn offset(&self) -> i32 {
        let Ok(mut slide) = self.slide.lock() else {
            return 0;
        };
        let Some((transition, started)) = *slide else {
            return 0;
        };
        let elapsed = started.elapsed();
        if transition.is_finished(elapsed) {
            *slide = None;
            return 0;
        }
        (transition.offset_at(elapsed) / UNITS_PER_CELL).round() as i32
    }

    pub fn is_animating(&self) -> bool {
        self.slide.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

impl HeaderElement for TermHeader {
    fn bounds(&self) -> Option<HeaderRect> {
        self.rect.lock().ok().and_then(|rect| *rect)
    }

    fn animate(&self, transition: SlideTransition) {
        if let Ok(mut slide) = self.slide.lock() {
            *slide = Some((transition, Instant::now()));
        }
    }
}

/// The terminal reports every mouse event anyway; capture only tells the
/// app to route drags to the resize while it lasts.
#[derive(Debug, Clone, Default)]
pub struct TerminalCapture {
    captured: Arc<AtomicBool>,
}

impl TerminalCapture {
    pub fn is_captured(&self) -> bool {
        self.captured.load(Ordering::SeqCst)
    }
}

impl PointerCapture for TerminalCapture {
    fn capture(&self) -> CaptureHandle {
        self.captured.store(true, Ordering::SeqCst);
        debug!("Pointer captured");
        let captured = Arc::clone(&self.captured);
        CaptureHandle::new(move || {
            captured.store(false, Ordering::SeqCst);
            debug!("Pointer released");
        })
    }
}
