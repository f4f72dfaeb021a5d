#![forbid(unsafe_code)]

//! Headless state for the folio diagram viewer.
//!
//! Everything in this crate is synchronous and free of I/O:
//! - diagram model + type/title detection (`model`, `detect`)
//! - viewport zoom/pan/fullscreen transitions (`viewport`)
//! - pointer/wheel/keyboard interaction state machine (`interaction`)
//! - theme + engine/viewer configuration (`theme`, `config`)
//!
//! The async render pipeline, export pipeline and host bindings live in the `folio-diagram`
//! crate.

pub mod config;
pub mod detect;
pub mod error;
pub mod interaction;
pub mod model;
pub mod theme;
pub mod viewport;

pub use config::{EngineConfig, ViewerOptions};
pub use detect::{DiagramType, detect_title, detect_type};
pub use error::{Error, Result};
pub use interaction::{
    EventDisposition, FeatureFlags, Intent, Key, KeyEvent, Modifiers, PanSession, PointerButton,
    PointerEvent, WheelEvent,
};
pub use model::{DiagramModel, DiagramSource, RenderResult};
pub use theme::{SecurityLevel, Theme};
pub use viewport::ViewportState;
