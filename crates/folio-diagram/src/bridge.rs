//! State surface observed by the surrounding UI shell (toolbar, status footer).
//!
//! The viewer pushes a fresh [`ViewerSnapshot`] to every subscriber after each state change. How
//! a subscriber schedules its redraw (signal write, invalidate, request-animation-frame) is its
//! own business.

use folio_diagram_core::{DiagramType, FeatureFlags, Theme};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSnapshot {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub fullscreen: bool,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub diagram_type: DiagramType,
    pub diagram_title: Option<String>,
    pub theme: Theme,
    pub features: FeatureFlags,
    pub has_markup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<RefCell<Box<dyn FnMut(&ViewerSnapshot)>>>;

#[derive(Default)]
pub struct Subscribers {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.listeners.borrow().len())
            .finish()
    }
}

impl Subscribers {
    pub fn subscribe(&self, listener: impl FnMut(&ViewerSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let listener: Box<dyn FnMut(&ViewerSnapshot)> = Box::new(listener);
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    fn contains(&self, id: SubscriptionId) -> bool {
        self.listeners.borrow().iter().any(|(sid, _)| *sid == id)
    }

    /// Calls every listener with `snapshot`.
    ///
    /// Runs over a copy of the list, so listeners may subscribe, unsubscribe or clear from inside
    /// the call. A listener removed mid-notification is not called again, not even later in the
    /// same round; one added mid-notification first runs on the next notification. A listener
    /// that triggers a nested notification is skipped by that nested round.
    pub fn notify(&self, snapshot: &ViewerSnapshot) {
        let running: Vec<(SubscriptionId, Listener)> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();
        for (id, listener) in running {
            if !self.contains(id) {
                continue;
            }
            if let Ok(mut listener) = listener.try_borrow_mut() {
                let call: &mut dyn FnMut(&ViewerSnapshot) = &mut **listener;
                call(snapshot);
            }
        }
    }
}
