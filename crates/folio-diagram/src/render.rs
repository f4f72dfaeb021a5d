//! Render request bookkeeping.
//!
//! Each render attempt gets a ticket with a monotonically increasing token. Only the holder of
//! the most recently issued ticket may commit its result; anything that completes after a newer
//! request was issued is discarded, whatever order the engine finishes in.

use crate::engine::sanitize_render_id;
use std::cell::Cell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    pub token: u64,
    /// Unique engine-facing id for this attempt.
    pub render_id: String,
}

/// What happened to one `render_diagram` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Markup committed and wired.
    Rendered,
    /// The engine failed; the error is now the current result.
    Failed,
    /// A newer render was requested while this one was in flight; its result was dropped.
    Superseded,
    /// The viewer was torn down before the engine finished.
    Abandoned,
}

#[derive(Debug)]
pub struct RenderTokens {
    prefix: String,
    latest: Cell<u64>,
}

impl RenderTokens {
    pub fn new(instance: &str) -> Self {
        Self {
            prefix: sanitize_render_id(&format!("fd-{instance}")),
            latest: Cell::new(0),
        }
    }

    pub fn issue(&self) -> RenderTicket {
        let token = self.latest.get() + 1;
        self.latest.set(token);
        RenderTicket {
            token,
            render_id: format!("{}-{token}", self.prefix),
        }
    }

    pub fn latest(&self) -> u64 {
        self.latest.get()
    }

    pub fn is_latest(&self, ticket: &RenderTicket) -> bool {
        ticket.token == self.latest.get()
    }
}
