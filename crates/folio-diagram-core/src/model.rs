use crate::detect::{DiagramType, detect_title, detect_type};
use std::sync::Arc;

/// Diagram text as supplied by the hosting page. Immutable; a new source means a new model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagramSource(Arc<str>);

impl DiagramSource {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DiagramSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for DiagramSource {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Outcome of one render attempt. Always replaced as a whole, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// Engine output, verbatim.
    pub markup: Option<String>,
    pub error: Option<String>,
}

impl RenderResult {
    pub fn success(markup: String) -> Self {
        Self {
            markup: Some(markup),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            markup: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.markup.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct DiagramModel {
    source: DiagramSource,
    diagram_type: DiagramType,
    title: Option<String>,
    result: RenderResult,
    /// Markup as mounted in the view (after node wiring). Raster export serializes this.
    live_markup: Option<String>,
    loading: bool,
}

impl DiagramModel {
    /// A model starts out loading: the first render is issued right after construction.
    pub fn new(source: DiagramSource) -> Self {
        let diagram_type = detect_type(source.as_str());
        let title = detect_title(source.as_str());
        Self {
            source,
            diagram_type,
            title,
            result: RenderResult::default(),
            live_markup: None,
            loading: true,
        }
    }

    pub fn source(&self) -> &DiagramSource {
        &self.source
    }

    pub fn diagram_type(&self) -> DiagramType {
        self.diagram_type
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn result(&self) -> &RenderResult {
        &self.result
    }

    pub fn markup(&self) -> Option<&str> {
        self.result.markup.as_deref()
    }

    pub fn live_markup(&self) -> Option<&str> {
        self.live_markup.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.result.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Installs a successful render. `live_markup` is the wired form of `markup`.
    pub fn commit_success(&mut self, markup: String, live_markup: String) {
        self.result = RenderResult::success(markup);
        self.live_markup = Some(live_markup);
        self.loading = false;
    }

    pub fn commit_failure(&mut self, message: impl Into<String>) {
        self.result = RenderResult::failure(message);
        self.live_markup = None;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_model_derives_type_and_title() {
        let model = DiagramModel::new("pie\ntitle Pets\n\"Dogs\": 3".into());
        assert_eq!(model.diagram_type(), DiagramType::Pie);
        assert_eq!(model.title(), Some("Pets"));
        assert!(model.is_loading());
        assert_eq!(model.markup(), None);
    }

    #[test]
    fn failure_replaces_previous_success() {
        let mut model = DiagramModel::new("graph TD\nA-->B".into());
        model.commit_success("<svg/>".to_string(), "<svg data-x/>".to_string());
        assert_eq!(model.markup(), Some("<svg/>"));
        assert_eq!(model.live_markup(), Some("<svg data-x/>"));

        model.commit_failure("Parse error on line 2");
        assert_eq!(model.markup(), None);
        assert_eq!(model.live_markup(), None);
        assert_eq!(model.error(), Some("Parse error on line 2"));
        assert!(!model.is_loading());
    }

    #[test]
    fn success_clears_previous_error() {
        let mut model = DiagramModel::new("graph TD".into());
        model.commit_failure("boom");
        model.commit_success("<svg/>".to_string(), "<svg/>".to_string());
        assert_eq!(model.error(), None);
        assert!(model.result().is_success());
    }
}
