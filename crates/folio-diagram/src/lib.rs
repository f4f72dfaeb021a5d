#![forbid(unsafe_code)]

//! Interactive diagram viewer.
//!
//! A [`DiagramViewer`] owns one diagram source, renders it through a shared [`DiagramEngine`],
//! wires the resulting markup for node clicks, and tracks zoom/pan/fullscreen/theme. Platform
//! concerns (fullscreen, document listeners, downloads, timers) go through [`ViewerHost`].
//!
//! Headless state (model, viewport, interaction, config) lives in `folio-diagram-core` and is
//! re-exported here as [`core`].

pub mod bridge;
pub mod engine;
pub mod export;
pub mod host;
pub mod render;
pub mod viewer;
pub mod wiring;

pub use folio_diagram_core as core;

pub use bridge::{SubscriptionId, ViewerSnapshot};
pub use engine::{DiagramEngine, EngineError, SharedEngine};
pub use export::{Artifact, ExportError, ExportFormat, ExportOutcome};
pub use host::{Blob, HostError, ListenerId, ObjectUrl, ViewerHost};
pub use render::RenderOutcome;
pub use viewer::{DiagramViewer, NodeClick};
pub use wiring::{NodeBinding, NodeKind};

#[cfg(feature = "raster")]
pub use export::raster::{ImageRasterizer, RasterOptions, ResvgRasterizer};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] folio_diagram_core::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, Error>;
