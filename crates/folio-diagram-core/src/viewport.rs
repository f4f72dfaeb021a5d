//! Zoom/pan/fullscreen presentation state layered over rendered markup.
//!
//! The only consumer is a `translate(..) scale(..)` composite on the markup container, so the
//! state is a clamped zoom factor plus an unconstrained screen-space offset rather than a general
//! affine transform.

use serde::Serialize;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const WHEEL_ZOOM_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub fullscreen: bool,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            fullscreen: false,
        }
    }
}

fn round_1e6(v: f64) -> f64 {
    let v = (v * 1e6).round() / 1e6;
    if v == -0.0 { 0.0 } else { v }
}

/// Clamps into `[MIN_ZOOM, MAX_ZOOM]`, snapping float drift so repeated steps land on
/// `0.1`, `0.2`, ... exactly.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    round_1e6(zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

impl ViewportState {
    #[must_use]
    pub fn with_zoom(self, zoom: f64) -> Self {
        Self {
            zoom: clamp_zoom(zoom),
            ..self
        }
    }

    #[must_use]
    pub fn zoom_in(self) -> Self {
        self.with_zoom(self.zoom + ZOOM_STEP)
    }

    #[must_use]
    pub fn zoom_out(self) -> Self {
        self.with_zoom(self.zoom - ZOOM_STEP)
    }

    /// Wheel zoom: scrolling down (`delta_y > 0`) zooms out.
    #[must_use]
    pub fn wheel_zoom(self, delta_y: f64) -> Self {
        let step = if delta_y > 0.0 {
            -WHEEL_ZOOM_STEP
        } else {
            WHEEL_ZOOM_STEP
        };
        self.with_zoom(self.zoom + step)
    }

    /// Resets zoom and pan. Fullscreen is left alone.
    #[must_use]
    pub fn fit_to_screen(self) -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            ..self
        }
    }

    #[must_use]
    pub fn panned_to(self, pan_x: f64, pan_y: f64) -> Self {
        Self {
            pan_x,
            pan_y,
            ..self
        }
    }

    #[must_use]
    pub fn with_fullscreen(self, fullscreen: bool) -> Self {
        Self { fullscreen, ..self }
    }

    /// CSS transform for the markup container. Translation is applied before scaling, so pan
    /// offsets stay in screen pixels regardless of zoom.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            round_1e6(self.pan_x),
            round_1e6(self.pan_y),
            self.zoom
        )
    }

    /// Maps a point in container (screen) space to diagram content space.
    pub fn screen_to_content(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pan_x) / self.zoom, (y - self.pan_y) / self.zoom)
    }

    pub fn content_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.zoom + self.pan_x, y * self.zoom + self.pan_y)
    }
}
