//! Raw input → viewport intents.
//!
//! Hosts translate their native events into the small input types below and feed them to the
//! viewer. The state machine here is pure: it never touches listeners or the platform, it only
//! computes the next [`ViewportState`] and tells the host whether the native default action
//! should be suppressed.

use crate::viewport::ViewportState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Ctrl on Linux/Windows, Cmd on macOS. Either one turns the wheel into a zoom gesture.
    pub fn zoom_modifier(self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn primary(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelEvent {
    pub delta_y: f64,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }
}

/// What the host should do with the native event after the viewer saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventDisposition {
    pub handled: bool,
    pub prevent_default: bool,
}

impl EventDisposition {
    pub const IGNORED: Self = Self {
        handled: false,
        prevent_default: false,
    };

    pub const CONSUMED: Self = Self {
        handled: true,
        prevent_default: true,
    };

    pub const HANDLED: Self = Self {
        handled: true,
        prevent_default: false,
    };
}

/// Which interactive controls the hosting page enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub zoom: bool,
    pub pan: bool,
    pub export: bool,
    pub fullscreen: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            zoom: true,
            pan: true,
            export: true,
            fullscreen: true,
        }
    }
}

/// Named viewer commands reachable from toolbar buttons and keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ZoomIn,
    ZoomOut,
    FitToScreen,
    ToggleFullscreen,
    ExitFullscreen,
}

/// Keyboard shortcuts. Chords with ctrl/meta are left to the host (browser zoom, copy, ...).
pub fn keymap(event: KeyEvent, features: FeatureFlags, fullscreen: bool) -> Option<Intent> {
    if event.modifiers.zoom_modifier() {
        return None;
    }
    match event.key {
        Key::Char('+' | '=') if features.zoom => Some(Intent::ZoomIn),
        Key::Char('-' | '_') if features.zoom => Some(Intent::ZoomOut),
        Key::Char('0') if features.zoom => Some(Intent::FitToScreen),
        Key::Char('f' | 'F') if features.fullscreen => Some(Intent::ToggleFullscreen),
        Key::Escape if fullscreen => Some(Intent::ExitFullscreen),
        _ => None,
    }
}

/// Applies a wheel event. Returns `None` when the wheel should scroll the page as usual.
pub fn wheel(
    viewport: ViewportState,
    event: WheelEvent,
    features: FeatureFlags,
) -> Option<ViewportState> {
    if !features.zoom || !event.modifiers.zoom_modifier() {
        return None;
    }
    Some(viewport.wheel_zoom(event.delta_y))
}

/// Drag-to-pan gesture state.
///
/// The anchor is `pointer - pan` at drag start, so every move sets `pan = pointer - anchor`.
/// Offsets are screen-space and therefore independent of zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanSession {
    #[default]
    Idle,
    Dragging { anchor_x: f64, anchor_y: f64 },
}

impl PanSession {
    pub fn begin(x: f64, y: f64, viewport: &ViewportState) -> Self {
        PanSession::Dragging {
            anchor_x: x - viewport.pan_x,
            anchor_y: y - viewport.pan_y,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, PanSession::Dragging { .. })
    }

    /// Next viewport for a pointer move, or `None` when no drag is active.
    pub fn drag_to(&self, x: f64, y: f64, viewport: ViewportState) -> Option<ViewportState> {
        match *self {
            PanSession::Idle => None,
            PanSession::Dragging { anchor_x, anchor_y } => {
                Some(viewport.panned_to(x - anchor_x, y - anchor_y))
            }
        }
    }
}
