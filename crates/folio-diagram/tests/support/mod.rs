#![allow(dead_code)]

use folio_diagram::core::EngineConfig;
use folio_diagram::{
    Blob, DiagramEngine, EngineError, HostError, ListenerId, ObjectUrl, SharedEngine, ViewerHost,
};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

pub const FLOWCHART: &str = "flowchart TD\n  title Release Flow\n  A[Start] --> B[Ship]\n  B --> A";

/// Engine-shaped markup: two nodes, one edge label with only a `data-id`.
pub fn flowchart_svg(id: &str, label: &str) -> String {
    format!(
        r##"<svg id="{id}" xmlns="http://www.w3.org/2000/svg" width="120" height="60" viewBox="0 0 120 60"><g class="nodes"><g class="node default" id="{id}-A"><rect x="5" y="5" width="40" height="20" fill="#ececff"></rect></g><g class="node default" id="{id}-B"><rect x="75" y="5" width="40" height="20" fill="#ececff"></rect></g></g><g class="edgeLabels"><g class="edgeLabel" data-id="L_A_B_0"><text x="50" y="50">{label}</text></g></g></svg>"##
    )
}

pub fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    fut.poll_unpin(&mut cx)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Configure { theme: String },
    Render { id: String, source: String },
}

type Gate = oneshot::Receiver<Result<String, EngineError>>;

/// Records every call. Renders answer immediately unless a gate was queued, in which case the
/// next render waits for the test to send its result.
#[derive(Default)]
pub struct ScriptedEngine {
    calls: Rc<RefCell<Vec<EngineCall>>>,
    gates: Rc<RefCell<VecDeque<Gate>>>,
}

#[derive(Clone)]
pub struct EngineHandle {
    calls: Rc<RefCell<Vec<EngineCall>>>,
    gates: Rc<RefCell<VecDeque<Gate>>>,
}

impl EngineHandle {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn configured_themes(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Configure { theme } => Some(theme.clone()),
                EngineCall::Render { .. } => None,
            })
            .collect()
    }

    pub fn render_ids(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                EngineCall::Render { id, .. } => Some(id.clone()),
                EngineCall::Configure { .. } => None,
            })
            .collect()
    }

    /// Holds the next render until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<Result<String, EngineError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }
}

impl ScriptedEngine {
    pub fn shared() -> (SharedEngine<ScriptedEngine>, EngineHandle) {
        let engine = ScriptedEngine::default();
        let handle = EngineHandle {
            calls: Rc::clone(&engine.calls),
            gates: Rc::clone(&engine.gates),
        };
        (SharedEngine::new(engine), handle)
    }
}

impl DiagramEngine for ScriptedEngine {
    fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let theme = config.get_str("theme").unwrap_or_default().to_string();
        self.calls
            .borrow_mut()
            .push(EngineCall::Configure { theme });
        Ok(())
    }

    fn render_to_markup<'a>(
        &'a mut self,
        id: &'a str,
        source: &'a str,
    ) -> LocalBoxFuture<'a, Result<String, EngineError>> {
        self.calls.borrow_mut().push(EngineCall::Render {
            id: id.to_string(),
            source: source.to_string(),
        });
        let gate = self.gates.borrow_mut().pop_front();
        async move {
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(EngineError::new("engine gate dropped"))),
                None if source.contains("invalid") => {
                    Err(EngineError::new("Parse error on line 2"))
                }
                None => Ok(flowchart_svg(id, "ok")),
            }
        }
        .boxed_local()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    RequestFullscreen,
    ExitFullscreen,
    Listen(ListenerId),
    Unlisten(ListenerId),
    CreateUrl(ObjectUrl),
    Download { url: ObjectUrl, filename: String },
    Revoke(ObjectUrl),
    Delay(Duration),
}

#[derive(Default)]
pub struct RecordingHost {
    events: RefCell<Vec<HostEvent>>,
    blobs: RefCell<Vec<Blob>>,
    next_id: Cell<u64>,
    pub deny_fullscreen: Cell<bool>,
    pub fail_downloads: Cell<bool>,
    /// When set, `delay` futures stay pending until `fire_delays`.
    pub hold_delays: Cell<bool>,
    held: RefCell<Vec<oneshot::Sender<()>>>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn blobs(&self) -> Vec<Blob> {
        self.blobs.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&HostEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn fire_delays(&self) {
        for tx in self.held.borrow_mut().drain(..) {
            let _ = tx.send(());
        }
    }

    fn next(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl ViewerHost for RecordingHost {
    fn request_fullscreen(&self) -> Result<(), HostError> {
        if self.deny_fullscreen.get() {
            return Err(HostError::FullscreenDenied {
                reason: "not allowed by permissions policy".to_string(),
            });
        }
        self.record(HostEvent::RequestFullscreen);
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<(), HostError> {
        self.record(HostEvent::ExitFullscreen);
        Ok(())
    }

    fn listen_document_pointer(&self) -> ListenerId {
        let id = ListenerId(self.next());
        self.record(HostEvent::Listen(id));
        id
    }

    fn unlisten_document_pointer(&self, id: ListenerId) {
        self.record(HostEvent::Unlisten(id));
    }

    fn create_object_url(&self, blob: &Blob) -> ObjectUrl {
        let url = ObjectUrl(format!("blob:test/{}", self.next()));
        self.blobs.borrow_mut().push(blob.clone());
        self.record(HostEvent::CreateUrl(url.clone()));
        url
    }

    fn trigger_download(&self, url: &ObjectUrl, filename: &str) -> Result<(), HostError> {
        if self.fail_downloads.get() {
            return Err(HostError::DownloadFailed {
                reason: "blocked".to_string(),
            });
        }
        self.record(HostEvent::Download {
            url: url.clone(),
            filename: filename.to_string(),
        });
        Ok(())
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        self.record(HostEvent::Revoke(url.clone()));
    }

    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.record(HostEvent::Delay(duration));
        if self.hold_delays.get() {
            let (tx, rx) = oneshot::channel();
            self.held.borrow_mut().push(tx);
            async move {
                let _ = rx.await;
            }
            .boxed_local()
        } else {
            futures::future::ready(()).boxed_local()
        }
    }
}
