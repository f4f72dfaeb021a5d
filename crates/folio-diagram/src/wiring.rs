//! Post-render node wiring.
//!
//! After every successful render the markup is rewritten so that diagram nodes and edge labels
//! advertise a pointer cursor, and their ids are collected as the click targets for this render.
//! The binding list is rebuilt from scratch per render, which means clicks can never reach
//! handlers that belonged to replaced markup.

use lol_html::{RewriteStrSettings, element, rewrite_str};
use std::cell::RefCell;

pub const INTERACTIVE_ATTR: &str = "data-folio-interactive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Node,
    EdgeLabel,
}

impl NodeKind {
    fn as_str(self) -> &'static str {
        match self {
            NodeKind::Node => "node",
            NodeKind::EdgeLabel => "edge-label",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBinding {
    pub id: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiredMarkup {
    pub markup: String,
    pub bindings: Vec<NodeBinding>,
}

fn with_pointer_cursor(style: Option<String>) -> String {
    match style {
        Some(s) if !s.trim().is_empty() => {
            let s = s.trim().trim_end_matches(';');
            format!("{s};cursor: pointer")
        }
        _ => "cursor: pointer".to_string(),
    }
}

fn target_id(id: Option<String>, data_id: Option<String>) -> Option<String> {
    id.or(data_id).filter(|id| !id.trim().is_empty())
}

fn record_binding(bindings: &RefCell<Vec<NodeBinding>>, id: Option<String>, kind: NodeKind) {
    if let Some(id) = id {
        bindings.borrow_mut().push(NodeBinding { id, kind });
    }
}

/// Rewrites rendered markup for interaction and returns it with its click targets.
///
/// Elements classed `node` or `edgeLabel` are wired. The target id is the element's `id`,
/// falling back to `data-id`; elements with neither still get the cursor affordance but are not
/// clickable. If the markup cannot be rewritten it is returned untouched with no bindings.
pub fn wire_nodes(markup: &str) -> WiredMarkup {
    let bindings: RefCell<Vec<NodeBinding>> = RefCell::new(Vec::new());

    let rewritten = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(".node", |el| {
                    let style = with_pointer_cursor(el.get_attribute("style"));
                    el.set_attribute("style", &style)?;
                    el.set_attribute(INTERACTIVE_ATTR, NodeKind::Node.as_str())?;
                    record_binding(
                        &bindings,
                        target_id(el.get_attribute("id"), el.get_attribute("data-id")),
                        NodeKind::Node,
                    );
                    Ok(())
                }),
                element!(".edgeLabel", |el| {
                    let style = with_pointer_cursor(el.get_attribute("style"));
                    el.set_attribute("style", &style)?;
                    el.set_attribute(INTERACTIVE_ATTR, NodeKind::EdgeLabel.as_str())?;
                    record_binding(
                        &bindings,
                        target_id(el.get_attribute("id"), el.get_attribute("data-id")),
                        NodeKind::EdgeLabel,
                    );
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    );

    match rewritten {
        Ok(markup) => WiredMarkup {
            markup,
            bindings: bindings.into_inner(),
        },
        Err(err) => {
            tracing::warn!(error = %err, "node wiring failed; markup left non-interactive");
            WiredMarkup {
                markup: markup.to_string(),
                bindings: Vec::new(),
            }
        }
    }
}
