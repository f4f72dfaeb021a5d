//! The diagram viewer: one diagram source, its render state, its viewport, and the wiring to
//! the host page.
//!
//! All state lives behind `&self` (single UI thread, interior mutability). Borrows are never held
//! across an `.await` or across a call into the host or a user callback.

use crate::bridge::{SubscriptionId, Subscribers, ViewerSnapshot};
use crate::engine::{DiagramEngine, SharedEngine};
use crate::export::{self, Artifact, Downloads, ExportFormat, ExportOutcome};
use crate::host::{ListenerId, ViewerHost};
use crate::render::{RenderOutcome, RenderTokens};
use crate::wiring::{NodeBinding, NodeKind, wire_nodes};
use folio_diagram_core::interaction::{self, keymap};
use folio_diagram_core::{
    DiagramModel, DiagramSource, EventDisposition, Intent, KeyEvent, PanSession, PointerButton,
    PointerEvent, Theme, ViewerOptions, ViewportState, WheelEvent,
};
use std::cell::{Cell, RefCell};

#[cfg(feature = "raster")]
use crate::export::raster::{self, ImageRasterizer, RasterOptions, ResvgRasterizer};

/// Click on a wired node or edge label.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeClick {
    pub id: String,
    pub kind: NodeKind,
    pub event: PointerEvent,
}

type NodeClickHandler = Box<dyn Fn(&NodeClick)>;
type ErrorHandler = Box<dyn Fn(&str)>;

struct ViewerState {
    model: DiagramModel,
    viewport: ViewportState,
    theme: Theme,
    pan: PanSession,
    pan_listener: Option<ListenerId>,
    bindings: Vec<NodeBinding>,
}

pub struct DiagramViewer<E: DiagramEngine, H: ViewerHost> {
    engine: SharedEngine<E>,
    host: H,
    options: ViewerOptions,
    tokens: RenderTokens,
    state: RefCell<ViewerState>,
    downloads: Downloads,
    subscribers: Subscribers,
    on_node_click: Option<NodeClickHandler>,
    on_error: Option<ErrorHandler>,
    #[cfg(feature = "raster")]
    rasterizer: Box<dyn ImageRasterizer>,
    torn_down: Cell<bool>,
}

impl<E: DiagramEngine, H: ViewerHost> DiagramViewer<E, H> {
    /// Builds a viewer without rendering. Call [`DiagramViewer::mounted`] or
    /// [`DiagramViewer::render_diagram`] to issue the first render.
    pub fn new(
        source: impl Into<DiagramSource>,
        options: ViewerOptions,
        engine: SharedEngine<E>,
        host: H,
    ) -> Self {
        let instance = uuid::Uuid::new_v4().simple().to_string();
        let theme = options.theme;
        Self {
            engine,
            host,
            tokens: RenderTokens::new(&instance[..12]),
            state: RefCell::new(ViewerState {
                model: DiagramModel::new(source.into()),
                viewport: ViewportState::default(),
                theme,
                pan: PanSession::Idle,
                pan_listener: None,
                bindings: Vec::new(),
            }),
            options,
            downloads: Downloads::default(),
            subscribers: Subscribers::default(),
            on_node_click: None,
            on_error: None,
            #[cfg(feature = "raster")]
            rasterizer: Box::new(ResvgRasterizer),
            torn_down: Cell::new(false),
        }
    }

    /// Like [`DiagramViewer::new`], with options read from the page's JSON attribute.
    pub fn from_options_json(
        source: impl Into<DiagramSource>,
        options_json: &str,
        engine: SharedEngine<E>,
        host: H,
    ) -> crate::Result<Self> {
        let options = ViewerOptions::from_json_str(options_json)?;
        Ok(Self::new(source, options, engine, host))
    }

    pub fn with_node_click(mut self, handler: impl Fn(&NodeClick) + 'static) -> Self {
        self.on_node_click = Some(Box::new(handler));
        self
    }

    pub fn with_error_handler(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    #[cfg(feature = "raster")]
    pub fn with_rasterizer(mut self, rasterizer: impl ImageRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// Issues the initial render and returns the viewer once it settled.
    pub async fn mounted(self) -> Self {
        self.render_diagram().await;
        self
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn subscribe(&self, listener: impl FnMut(&ViewerSnapshot) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        let st = self.state.borrow();
        ViewerSnapshot {
            zoom: st.viewport.zoom,
            pan_x: st.viewport.pan_x,
            pan_y: st.viewport.pan_y,
            fullscreen: st.viewport.fullscreen,
            is_loading: st.model.is_loading(),
            error_message: st.model.error().map(str::to_string),
            diagram_type: st.model.diagram_type(),
            diagram_title: st.model.title().map(str::to_string),
            theme: st.theme,
            features: self.options.features(),
            has_markup: st.model.markup().is_some(),
        }
    }

    pub fn viewport(&self) -> ViewportState {
        self.state.borrow().viewport
    }

    pub fn theme(&self) -> Theme {
        self.state.borrow().theme
    }

    /// Engine output of the current render, verbatim.
    pub fn markup(&self) -> Option<String> {
        self.state.borrow().model.markup().map(str::to_string)
    }

    /// Markup as it should be mounted: wired for pointer interaction.
    pub fn live_markup(&self) -> Option<String> {
        self.state.borrow().model.live_markup().map(str::to_string)
    }

    pub fn node_bindings(&self) -> Vec<NodeBinding> {
        self.state.borrow().bindings.clone()
    }

    pub fn is_panning(&self) -> bool {
        self.state.borrow().pan.is_dragging()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }

    pub fn pending_downloads(&self) -> usize {
        self.downloads.outstanding()
    }

    fn notify(&self) {
        if self.torn_down.get() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers.notify(&snapshot);
    }

    fn update_viewport(&self, f: impl FnOnce(ViewportState) -> ViewportState) -> ViewportState {
        let next = {
            let mut st = self.state.borrow_mut();
            st.viewport = f(st.viewport);
            st.viewport
        };
        self.notify();
        next
    }

    // --- Render pipeline ---

    /// Renders the current source with the current theme.
    ///
    /// Only the most recently issued render may commit; a render that completes after a newer
    /// one was requested is dropped. Failures become the current result, leave the viewport
    /// alone and are reported to the error handler. There is no automatic retry.
    pub async fn render_diagram(&self) -> RenderOutcome {
        if self.torn_down.get() {
            return RenderOutcome::Abandoned;
        }

        let ticket = self.tokens.issue();
        let (source, theme) = {
            let mut st = self.state.borrow_mut();
            st.model.set_loading(true);
            (st.model.source().clone(), st.theme)
        };
        self.notify();

        let config = self.options.engine_config(theme);
        tracing::debug!(
            render_id = %ticket.render_id,
            token = ticket.token,
            %theme,
            "render started"
        );
        let result = self
            .engine
            .render_exclusive(&config, &ticket.render_id, source.as_str())
            .await;

        if self.torn_down.get() {
            tracing::debug!(render_id = %ticket.render_id, "render finished after teardown; dropped");
            return RenderOutcome::Abandoned;
        }
        if !self.tokens.is_latest(&ticket) {
            tracing::debug!(
                render_id = %ticket.render_id,
                latest = self.tokens.latest(),
                "stale render dropped"
            );
            return RenderOutcome::Superseded;
        }

        let outcome = match result {
            Ok(markup) => {
                let wired = wire_nodes(&markup);
                let mut st = self.state.borrow_mut();
                st.bindings = wired.bindings;
                st.model.commit_success(markup, wired.markup);
                tracing::debug!(
                    render_id = %ticket.render_id,
                    nodes = st.bindings.len(),
                    "render committed"
                );
                RenderOutcome::Rendered
            }
            Err(err) => {
                tracing::warn!(render_id = %ticket.render_id, error = %err, "render failed");
                {
                    let mut st = self.state.borrow_mut();
                    st.bindings.clear();
                    st.model.commit_failure(err.message.clone());
                }
                if let Some(on_error) = &self.on_error {
                    on_error(&err.message);
                }
                RenderOutcome::Failed
            }
        };
        self.notify();
        outcome
    }

    /// Replaces the diagram source: fresh model, fresh viewport (fullscreen is platform state and
    /// carries over), then a render.
    pub async fn set_source(&self, source: impl Into<DiagramSource>) -> RenderOutcome {
        if self.torn_down.get() {
            return RenderOutcome::Abandoned;
        }
        self.end_pan();
        {
            let mut st = self.state.borrow_mut();
            let fullscreen = st.viewport.fullscreen;
            st.model = DiagramModel::new(source.into());
            st.viewport = ViewportState::default().with_fullscreen(fullscreen);
            st.bindings.clear();
        }
        self.render_diagram().await
    }

    /// Flips light/dark and re-renders; the engine is reconfigured with the new theme first.
    pub async fn toggle_theme(&self) -> RenderOutcome {
        if self.torn_down.get() {
            return RenderOutcome::Abandoned;
        }
        {
            let mut st = self.state.borrow_mut();
            st.theme = st.theme.toggled();
        }
        self.render_diagram().await
    }

    // --- Viewport commands ---

    pub fn zoom_in(&self) -> ViewportState {
        self.update_viewport(ViewportState::zoom_in)
    }

    pub fn zoom_out(&self) -> ViewportState {
        self.update_viewport(ViewportState::zoom_out)
    }

    pub fn fit_to_screen(&self) -> ViewportState {
        self.update_viewport(ViewportState::fit_to_screen)
    }

    /// Asks the host to enter or leave fullscreen. The local flag is not touched here; it
    /// follows [`DiagramViewer::on_fullscreen_change`]. Returns whether the request was accepted.
    pub fn toggle_fullscreen(&self) -> bool {
        if self.viewport().fullscreen {
            self.exit_fullscreen()
        } else {
            match self.host.request_fullscreen() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "fullscreen request failed");
                    false
                }
            }
        }
    }

    fn exit_fullscreen(&self) -> bool {
        match self.host.exit_fullscreen() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "fullscreen exit failed");
                false
            }
        }
    }

    /// Platform fullscreen-change notification.
    pub fn on_fullscreen_change(&self, active: bool) {
        if self.viewport().fullscreen != active {
            self.update_viewport(|vp| vp.with_fullscreen(active));
        }
    }

    pub fn dispatch(&self, intent: Intent) {
        match intent {
            Intent::ZoomIn => {
                self.zoom_in();
            }
            Intent::ZoomOut => {
                self.zoom_out();
            }
            Intent::FitToScreen => {
                self.fit_to_screen();
            }
            Intent::ToggleFullscreen => {
                self.toggle_fullscreen();
            }
            Intent::ExitFullscreen => {
                self.exit_fullscreen();
            }
        }
    }

    // --- Input ---

    pub fn on_wheel(&self, event: WheelEvent) -> EventDisposition {
        let features = self.options.features();
        match interaction::wheel(self.viewport(), event, features) {
            Some(next) => {
                self.update_viewport(|_| next);
                EventDisposition::CONSUMED
            }
            None => EventDisposition::IGNORED,
        }
    }

    pub fn on_key(&self, event: KeyEvent) -> EventDisposition {
        let features = self.options.features();
        match keymap(event, features, self.viewport().fullscreen) {
            Some(intent) => {
                self.dispatch(intent);
                EventDisposition::CONSUMED
            }
            None => EventDisposition::IGNORED,
        }
    }

    /// Starts a drag-to-pan and asks the host for document-level move/up routing.
    pub fn on_pointer_down(&self, event: PointerEvent) -> EventDisposition {
        if self.torn_down.get()
            || !self.options.features().pan
            || event.button != PointerButton::Primary
        {
            return EventDisposition::IGNORED;
        }

        // A previous drag whose pointer-up never arrived must not leave its listeners behind.
        let stale = self.state.borrow_mut().pan_listener.take();
        if let Some(id) = stale {
            self.host.unlisten_document_pointer(id);
        }

        let listener = self.host.listen_document_pointer();
        let mut st = self.state.borrow_mut();
        let session = PanSession::begin(event.x, event.y, &st.viewport);
        st.pan = session;
        st.pan_listener = Some(listener);
        EventDisposition::CONSUMED
    }

    pub fn on_pointer_move(&self, event: PointerEvent) -> EventDisposition {
        let next = {
            let st = self.state.borrow();
            st.pan.drag_to(event.x, event.y, st.viewport)
        };
        match next {
            Some(next) => {
                self.update_viewport(|_| next);
                EventDisposition::HANDLED
            }
            None => EventDisposition::IGNORED,
        }
    }

    pub fn on_pointer_up(&self, _event: PointerEvent) -> EventDisposition {
        if self.end_pan() {
            EventDisposition::HANDLED
        } else {
            EventDisposition::IGNORED
        }
    }

    /// Ends any active drag and releases its listeners. Returns whether a drag was active.
    fn end_pan(&self) -> bool {
        let (was_dragging, listener) = {
            let mut st = self.state.borrow_mut();
            let was_dragging = st.pan.is_dragging();
            st.pan = PanSession::Idle;
            (was_dragging, st.pan_listener.take())
        };
        if let Some(id) = listener {
            self.host.unlisten_document_pointer(id);
        }
        was_dragging
    }

    /// Host-dispatched click on an element of the mounted markup. Returns whether it hit a
    /// wired node of the current render.
    pub fn on_element_click(&self, element_id: &str, event: PointerEvent) -> bool {
        let binding = self
            .state
            .borrow()
            .bindings
            .iter()
            .find(|b| b.id == element_id)
            .cloned();
        let Some(binding) = binding else {
            return false;
        };
        if let Some(on_click) = &self.on_node_click {
            on_click(&NodeClick {
                id: binding.id,
                kind: binding.kind,
                event,
            });
        }
        true
    }

    // --- Export ---

    /// Markup, theme and title of the current successful render, if any.
    fn export_input(&self, live: bool) -> Option<(String, Theme, Option<String>)> {
        let st = self.state.borrow();
        let markup = if live {
            st.model.live_markup()
        } else {
            st.model.markup()
        }?;
        Some((
            markup.to_string(),
            st.theme,
            st.model.title().map(str::to_string),
        ))
    }

    /// Downloads the engine markup as `image/svg+xml`.
    pub async fn export_vector(&self) -> export::Result<ExportOutcome> {
        if self.torn_down.get() {
            return Ok(ExportOutcome::Abandoned);
        }
        let Some((markup, _, title)) = self.export_input(false) else {
            return Ok(ExportOutcome::NothingRendered);
        };
        let artifact = export::vector_artifact(&markup, title.as_deref());
        self.downloads.deliver(&self.host, artifact).await
    }

    /// Downloads a PNG of the mounted markup on the theme background.
    ///
    /// Rasterization is bounded by `raster_timeout_ms`; on timeout the pending rasterization is
    /// dropped and nothing is downloaded.
    #[cfg(feature = "raster")]
    pub async fn export_raster(&self) -> export::Result<ExportOutcome> {
        use futures::future::{Either, select};
        use std::time::Duration;

        if self.torn_down.get() {
            return Ok(ExportOutcome::Abandoned);
        }
        let Some((svg, theme, title)) = self.export_input(true) else {
            return Ok(ExportOutcome::NothingRendered);
        };
        let options = RasterOptions {
            scale: self.options.raster_scale,
            background: Some(theme.background().to_string()),
        };
        let after_ms = self.options.raster_timeout_ms;
        let job = self.rasterizer.rasterize(svg, options);
        let timeout = self.host.delay(Duration::from_millis(after_ms));

        let png = match select(job, timeout).await {
            Either::Left((Ok(png), _)) => png,
            Either::Left((Err(err), _)) => {
                tracing::warn!(error = %err, "raster export failed");
                return Err(err);
            }
            Either::Right(((), _)) => {
                tracing::warn!(after_ms, "raster export timed out");
                return Err(export::ExportError::Timeout { after_ms });
            }
        };
        if self.torn_down.get() {
            return Ok(ExportOutcome::Abandoned);
        }

        let artifact = Artifact::new(ExportFormat::Raster, png, title.as_deref());
        self.downloads.deliver(&self.host, artifact).await
    }

    /// Downloads a single-page vector PDF of the engine markup on the theme background.
    #[cfg(feature = "raster")]
    pub async fn export_document(&self) -> export::Result<ExportOutcome> {
        if self.torn_down.get() {
            return Ok(ExportOutcome::Abandoned);
        }
        let Some((svg, theme, title)) = self.export_input(false) else {
            return Ok(ExportOutcome::NothingRendered);
        };
        let pdf = raster::svg_to_pdf(&svg, Some(theme.background())).inspect_err(|err| {
            tracing::warn!(error = %err, "document export failed");
        })?;
        let artifact = Artifact::new(ExportFormat::Document, pdf, title.as_deref());
        self.downloads.deliver(&self.host, artifact).await
    }

    // --- Lifecycle ---

    /// Releases everything the viewer holds on the host: pan listeners and outstanding download
    /// URLs. In-flight renders are dropped when they complete. Idempotent; also runs on drop.
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        self.end_pan();
        self.downloads.revoke_all(&self.host);
        self.subscribers.clear();
        tracing::debug!("viewer torn down");
    }
}

impl<E: DiagramEngine, H: ViewerHost> Drop for DiagramViewer<E, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
