//! Seam to the external diagram-rendering engine.
//!
//! The engine is a black box: it is configured with a JSON-ish [`EngineConfig`] and turns
//! diagram text into SVG markup. Engines are typically process-global (one instance configured
//! imperatively), so viewers share them through [`SharedEngine`], which serializes
//! configure + render as one unit.

use folio_diagram_core::EngineConfig;
use futures::future::LocalBoxFuture;
use futures::lock::Mutex;
use std::rc::Rc;

/// Engine failure, carried as the engine's own human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait DiagramEngine {
    /// Applies theme/security configuration. Called before every render.
    fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Renders `source` to SVG markup. `id` is unique per render attempt and is used by engines
    /// as the root element id and as a prefix for internal ids.
    fn render_to_markup<'a>(
        &'a mut self,
        id: &'a str,
        source: &'a str,
    ) -> LocalBoxFuture<'a, Result<String, EngineError>>;
}

/// Handle to an engine shared by every viewer on a page.
pub struct SharedEngine<E> {
    inner: Rc<Mutex<E>>,
}

impl<E> Clone for SharedEngine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: DiagramEngine> SharedEngine<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Rc::new(Mutex::new(engine)),
        }
    }

    /// Configures and renders while holding the engine exclusively, so another viewer cannot
    /// swap the theme between this viewer's configure and its render.
    pub async fn render_exclusive(
        &self,
        config: &EngineConfig,
        id: &str,
        source: &str,
    ) -> Result<String, EngineError> {
        let mut engine = self.inner.lock().await;
        engine.configure(config)?;
        engine.render_to_markup(id, source).await
    }
}

/// Converts an arbitrary string into a conservative SVG `id` token.
///
/// Engines prefix internal ids (markers, titles) with the root id, so two diagrams inlined in
/// the same document must not share one.
pub fn sanitize_render_id(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "fd-untitled".to_string();
    }

    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == ':' || ch == '.';
        out.push(if ok { ch } else { '-' });
    }

    let starts_ok = out.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_ok {
        out.insert_str(0, "fd-");
    }

    while out.contains("--") {
        out = out.replace("--", "-");
    }
    let out = out.trim_matches('-');
    if out.is_empty() || out == "fd" {
        return "fd-untitled".to_string();
    }
    out.to_string()
}
