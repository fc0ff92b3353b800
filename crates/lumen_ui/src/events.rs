//! Lifecycle notifications.
//!
//! Handlers are keyed by `(node, kind)`. During dispatch the handlers for one
//! key are taken out of the channel, so a handler may freely mutate the tree,
//! subscribe more handlers or destroy its own node.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use lumen_core::NodeId;

use crate::error::ConfigError;
use crate::tree::NodeTree;

/// Notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The node (or an ancestor) was attached to a parent.
    AttachedToParent,
    /// The node (or an ancestor) was detached from its parent.
    DetachedFromParent,
    /// An animator's start delay ran out.
    OnDelayEnd,
    /// An animator ran past its last period.
    OnExpire,
    /// The node became the focused node.
    GainFocus,
    /// The node stopped being the focused node.
    LoseFocus,
}

impl EventKind {
    /// Returns the event's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AttachedToParent => "AttachedToParent",
            Self::DetachedFromParent => "DetachedFromParent",
            Self::OnDelayEnd => "OnDelayEnd",
            Self::OnExpire => "OnExpire",
            Self::GainFocus => "GainFocus",
            Self::LoseFocus => "LoseFocus",
        }
    }

    /// Whether the event is also delivered to the target's descendants.
    #[must_use]
    pub const fn propagates(self) -> bool {
        matches!(self, Self::AttachedToParent | Self::DetachedFromParent)
    }
}

impl FromStr for EventKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "AttachedToParent" => Self::AttachedToParent,
            "DetachedFromParent" => Self::DetachedFromParent,
            "OnDelayEnd" => Self::OnDelayEnd,
            "OnExpire" => Self::OnExpire,
            "GainFocus" => Self::GainFocus,
            "LoseFocus" => Self::LoseFocus,
            other => return Err(ConfigError::UnknownType(other.to_owned())),
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional data carried by an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A related node: the new parent, the old parent, or the other focus
    /// target.
    Node(NodeId),
    /// A numeric value, e.g. the frozen value of an expired animator.
    Value(f32),
    /// Free-form text.
    Text(String),
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// The node the event was raised on.
    pub source: NodeId,
    /// The node receiving this delivery (a descendant for propagated events).
    pub target: NodeId,
    /// Optional data.
    pub payload: Option<EventPayload>,
}

/// Subscriber callback.
pub type EventHandler = Box<dyn FnMut(&mut NodeTree, &Event)>;

/// Handler table keyed by node and event kind.
#[derive(Default)]
pub struct EventChannel {
    handlers: HashMap<(NodeId, EventKind), Vec<EventHandler>>,
    /// Handlers currently taken out for dispatch, by key.
    in_flight: HashMap<(NodeId, EventKind), usize>,
    /// Keys unsubscribed while their handlers were in flight.
    cancelled: HashSet<(NodeId, EventKind)>,
}

impl EventChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler.
    pub fn subscribe(&mut self, node: NodeId, kind: EventKind, handler: EventHandler) {
        self.handlers.entry((node, kind)).or_default().push(handler);
    }

    /// Drops every handler of `node` for `kind`. Returns how many were removed.
    ///
    /// Handlers that are being dispatched right now are dropped once the
    /// dispatch finishes instead of being put back.
    pub fn unsubscribe(&mut self, node: NodeId, kind: EventKind) -> usize {
        let key = (node, kind);
        let mut removed = self.handlers.remove(&key).map_or(0, |h| h.len());
        if let Some(&taken) = self.in_flight.get(&key) {
            if self.cancelled.insert(key) {
                removed += taken;
            }
        }
        removed
    }

    /// Drops every handler of `node`.
    pub fn remove_node(&mut self, node: NodeId) {
        self.handlers.retain(|(id, _), _| *id != node);
        self.in_flight.retain(|(id, _), _| *id != node);
        self.cancelled.retain(|(id, _)| *id != node);
    }

    /// Number of handlers registered for `(node, kind)`.
    #[must_use]
    pub fn count(&self, node: NodeId, kind: EventKind) -> usize {
        self.handlers.get(&(node, kind)).map_or(0, Vec::len)
    }

    /// Takes the handlers out for dispatch.
    pub(crate) fn take(&mut self, node: NodeId, kind: EventKind) -> Option<Vec<EventHandler>> {
        let handlers = self.handlers.remove(&(node, kind))?;
        self.in_flight.insert((node, kind), handlers.len());
        Some(handlers)
    }

    /// Puts dispatched handlers back in front of any added meanwhile, unless
    /// the key was unsubscribed during dispatch.
    pub(crate) fn restore(&mut self, node: NodeId, kind: EventKind, mut handlers: Vec<EventHandler>) {
        let key = (node, kind);
        self.in_flight.remove(&key);
        if self.cancelled.remove(&key) {
            return;
        }
        let entry = self.handlers.entry(key).or_default();
        handlers.append(entry);
        *entry = handlers;
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("keys", &self.handlers.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
