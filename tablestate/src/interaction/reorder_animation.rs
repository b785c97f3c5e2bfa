//! Slide-in animation for headers displaced by a column reorder.
//!
//! Before the order changes, the left edge of every visible header is
//! recorded. Once the host has rendered the new order it asks the table to
//! flush the animation: each header that moved by at least one unit gets a
//! [`SlideTransition`] from its old offset back to zero.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Slide duration for displaced headers.
pub const REORDER_DURATION: Duration = Duration::from_millis(220);

/// Ease-out curve used for displaced headers.
pub const REORDER_EASING: Easing = Easing::CubicBezier(0.22, 1.0, 0.36, 1.0);

/// Displacements smaller than this are not animated.
const MIN_DISPLACEMENT: f64 = 1.0;

/// Horizontal extent of a rendered header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeaderRect {
    pub left: f64,
    pub width: f64,
}

/// A rendered header cell, registered by the view layer.
///
/// `bounds` may be called while the table is locked and must not call back
/// into it. `animate` is called with the lock released.
pub trait HeaderElement: Send + Sync {
    /// Current on-screen extent, or `None` if the header is not laid out.
    fn bounds(&self) -> Option<HeaderRect>;

    /// Start a slide transition on this header.
    fn animate(&self, transition: SlideTransition);
}

/// Easing function for transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// CSS-style cubic Bézier with control points `(x1, y1)`, `(x2, y2)`.
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply easing to progress (0.0 to 1.0).
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

fn bezier_component(p1: f32, p2: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Solve x(t) = x by bisection, then evaluate y(t). x(t) is monotonic for
/// control points with x in [0, 1].
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let (x1, x2) = (x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    let mut t = x;
    for _ in 0..48 {
        let current = bezier_component(x1, x2, t);
        if (current - x).abs() < 1e-6 {
            break;
        }
        if current < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    bezier_component(y1, y2, t)
}

/// Horizontal slide from `from_offset` back to the header's resting place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideTransition {
    pub from_offset: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl SlideTransition {
    pub fn new(from_offset: f64) -> Self {
        Self {
            from_offset,
            duration: REORDER_DURATION,
            easing: REORDER_EASING,
        }
    }

    /// Offset to draw the header at, `elapsed` after the slide started.
    pub fn offset_at(&self, elapsed: Duration) -> f64 {
        if self.is_finished(elapsed) {
            return 0.0;
        }
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let eased = self.easing.apply(progress) as f64;
        self.from_offset * (1.0 - eased)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        self.duration.is_zero() || elapsed >= self.duration
    }
}

/// A started slide, reported back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSlide {
    pub column_key: String,
    pub transition: SlideTransition,
}

/// Header elements registered by the view layer, keyed by column.
#[derive(Default, Clone)]
pub struct HeaderRegistry {
    elements: HashMap<String, Arc<dyn HeaderElement>>,
}

impl fmt::Debug for HeaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.elements.keys().collect();
        keys.sort();
        f.debug_struct("HeaderRegistry").field("keys", &keys).finish()
    }
}

impl HeaderRegistry {
    /// Register or, with `None`, forget the header for `key`.
    pub fn register(&mut self, key: &str, element: Option<Arc<dyn HeaderElement>>) {
        match element {
            Some(element) => {
                self.elements.insert(key.to_string(), element);
            }
            None => {
                self.elements.remove(key);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn HeaderElement>> {
        self.elements.get(key)
    }

    pub fn width(&self, key: &str) -> Option<f64> {
        self.get(key)?.bounds().map(|rect| rect.width)
    }

    /// Left edges of the given headers, for those that are laid out.
    pub fn positions<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> HashMap<String, f64> {
        keys.into_iter()
            .filter_map(|key| {
                let rect = self.get(key)?.bounds()?;
                Some((key.to_string(), rect.left))
            })
            .collect()
    }

    /// Compare `before` with the current positions and start a slide on
    /// each header that moved by at least one unit.
    pub fn animate_from(&self, before: &HashMap<String, f64>) -> Vec<HeaderSlide> {
        let mut slides = Vec::new();
        for (key, before_left) in before {
            let Some(element) = self.get(key) else { continue };
            let Some(after) = element.bounds() else { continue };
            let delta = before_left - after.left;
            if delta.abs() < MIN_DISPLACEMENT {
                continue;
            }
            let transition = SlideTransition::new(delta);
            element.animate(transition);
            slides.push(HeaderSlide {
                column_key: key.clone(),
                transition,
            });
        }
        slides.sort_by(|a, b| a.column_key.cmp(&b.column_key));
        slides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_boundaries() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            REORDER_EASING,
        ] {
            assert_eq!(easing.apply(0.0), 0.0, "{:?} at 0", easing);
            assert_eq!(easing.apply(1.0), 1.0, "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_reorder_easing_is_front_loaded() {
        // (0.22, 1, 0.36, 1) covers most of the distance early.
        assert!(REORDER_EASING.apply(0.3) > 0.7);
        let mut prev = 0.0;
        for i in 1..=20 {
            let value = REORDER_EASING.apply(i as f32 / 20.0);
            assert!(value >= prev - 1e-4, "not monotonic at step {}", i);
            prev = value;
        }
    }

    #[test]
    fn test_slide_offset_converges_to_zero() {
        let slide = SlideTransition::new(-120.0);
        assert_eq!(slide.offset_at(Duration::ZERO), -120.0);
        let mid = slide.offset_at(Duration::from_millis(110));
        assert!(mid > -120.0 && mid < 0.0);
        assert_eq!(slide.offset_at(REORDER_DURATION), 0.0);
        assert!(slide.is_finished(Duration::from_secs(1)));
    }
}
