//! The node tree: structure, derived state, hit-testing and the per-frame update.
//!
//! Nodes live in a generational [`Arena`]; parents own their children by id and
//! children keep a non-owning back-reference. Derived properties are pure
//! functions of a node and its ancestor chain and are recomputed on every
//! query. Structural operations validate everything before mutating.

use lumen_core::{Arena, NodeId, Rect, Vec2};
use tracing::{debug, trace};

use crate::animator::{Animator, AnimatorState, Facet, StepEvents, Waveform};
use crate::behavior::DrawContext;
use crate::config::UiConfig;
use crate::error::{ConfigError, HierarchyError, UiResult};
use crate::events::{Event, EventChannel, EventHandler, EventKind, EventPayload};
use crate::node::{Node, NodeFlags};
use crate::render::{DrawCommand, DrawList};

/// Arena-backed node tree.
#[derive(Debug)]
pub struct NodeTree {
    nodes: Arena<Node>,
    events: EventChannel,
    cursor: Vec2,
    acceleration_epsilon: f32,
    /// Snapshot stack for child iteration during `update`.
    scratch: Vec<NodeId>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates an empty tree with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&UiConfig::default())
    }

    /// Creates an empty tree.
    #[must_use]
    pub fn with_config(config: &UiConfig) -> Self {
        Self {
            nodes: Arena::with_capacity(64),
            events: EventChannel::new(),
            cursor: Vec2::ZERO,
            acceleration_epsilon: config.acceleration_epsilon,
            scratch: Vec::with_capacity(64),
        }
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Returns the node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns the node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Returns the node or [`HierarchyError::StaleId`].
    ///
    /// # Errors
    ///
    /// Fails if `id` is not live.
    pub fn try_node(&self, id: NodeId) -> Result<&Node, HierarchyError> {
        self.nodes.get(id).ok_or(HierarchyError::StaleId(id))
    }

    fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node, HierarchyError> {
        self.nodes.get_mut(id).ok_or(HierarchyError::StaleId(id))
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of `id` in declaration order (empty for stale ids).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// The animator carried by `id`.
    #[must_use]
    pub fn animator(&self, id: NodeId) -> Option<&Animator> {
        self.nodes.get(id).and_then(Node::animator)
    }

    /// The animator carried by `id`, mutably.
    pub fn animator_mut(&mut self, id: NodeId) -> Option<&mut Animator> {
        self.nodes.get_mut(id).and_then(Node::animator_mut)
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// `id` and all its descendants, pre-order.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(next) {
                out.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Cursor position used by hover presence.
    #[must_use]
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Moves the cursor.
    pub fn set_cursor(&mut self, cursor: Vec2) {
        self.cursor = cursor;
    }

    /// True if the cursor is inside the effective rect of `id`.
    #[must_use]
    pub fn is_cursor_inside(&self, id: NodeId) -> bool {
        self.effective_rect(id).is_some_and(|r| r.contains(self.cursor))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Allocates a detached plain node.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.insert(Node::new(name))
    }

    /// Allocates a detached animator node. It stays inert until attached.
    pub fn create_animator(&mut self, name: impl Into<String>, animator: Animator) -> NodeId {
        self.insert(Node::with_animator(name, animator))
    }

    /// Allocates a detached, pre-built node.
    pub fn insert(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        node.is_root = false;
        self.nodes.insert(node)
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// Fires [`EventKind::AttachedToParent`] on the child and its subtree.
    ///
    /// # Errors
    ///
    /// Fails without mutating if either id is stale, the child already has a
    /// parent or is a scene root, the attach would create a cycle, or the
    /// child is an animator whose facet the parent does not expose.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> UiResult<()> {
        let parent_node = self.try_node(parent)?;
        let child_node = self.try_node(child)?;
        if let Some(current) = child_node.parent {
            return Err(HierarchyError::AlreadyAttached {
                child: child_node.name().to_owned(),
                parent: self.name_of(current),
            }
            .into());
        }
        if child_node.is_root {
            return Err(HierarchyError::IsRoot(child_node.name().to_owned()).into());
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(HierarchyError::Cycle {
                child: child_node.name().to_owned(),
                parent: parent_node.name().to_owned(),
            }
            .into());
        }
        if let Some(animator) = child_node.animator() {
            if animator.facet().read(parent_node).is_none() {
                return Err(ConfigError::UnsupportedFacet {
                    animator: child_node.name().to_owned(),
                    facet: animator.facet().to_string(),
                    owner: parent_node.name().to_owned(),
                }
                .into());
            }
        }

        debug!(parent = %parent, child = %child, "attach");
        self.try_node_mut(parent)?.children.push(child);
        self.try_node_mut(child)?.parent = Some(parent);
        self.notify(child, EventKind::AttachedToParent, Some(EventPayload::Node(parent)));
        Ok(())
    }

    /// Removes `child` from its parent. The child keeps its own fields.
    ///
    /// Fires [`EventKind::DetachedFromParent`] on the child and its subtree.
    /// Returns the former parent.
    ///
    /// # Errors
    ///
    /// Fails if the id is stale or the node has no parent.
    pub fn detach(&mut self, child: NodeId) -> UiResult<NodeId> {
        let node = self.try_node(child)?;
        let parent = node
            .parent
            .ok_or_else(|| HierarchyError::NotAttached(node.name().to_owned()))?;

        debug!(parent = %parent, child = %child, "detach");
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|c| *c != child);
        }
        self.try_node_mut(child)?.parent = None;
        self.notify(child, EventKind::DetachedFromParent, Some(EventPayload::Node(parent)));
        Ok(parent)
    }

    /// Detaches `id` if attached, then frees it and its whole subtree.
    /// Returns the number of nodes freed.
    ///
    /// # Errors
    ///
    /// Fails if the id is stale.
    pub fn destroy(&mut self, id: NodeId) -> UiResult<usize> {
        if self.try_node(id)?.parent.is_some() {
            self.detach(id)?;
        }
        let doomed = self.subtree(id);
        for node in &doomed {
            self.events.remove_node(*node);
            self.nodes.remove(*node);
        }
        debug!(node = %id, freed = doomed.len(), "destroy");
        Ok(doomed.len())
    }

    /// Sets a node's z-order.
    ///
    /// # Errors
    ///
    /// Fails if the id is stale.
    pub fn set_z_order(&mut self, id: NodeId, z_order: i32) -> UiResult<()> {
        self.try_node_mut(id)?.z_order = z_order;
        Ok(())
    }

    /// Moves `id` to the end of its parent's children (drawn last among equal z).
    ///
    /// # Errors
    ///
    /// Fails if the id is stale or the node has no parent.
    pub fn move_to_front(&mut self, id: NodeId) -> UiResult<()> {
        let siblings = self.siblings_mut(id)?;
        siblings.retain(|c| *c != id);
        siblings.push(id);
        Ok(())
    }

    /// Moves `id` to the start of its parent's children.
    ///
    /// # Errors
    ///
    /// Fails if the id is stale or the node has no parent.
    pub fn move_to_back(&mut self, id: NodeId) -> UiResult<()> {
        let siblings = self.siblings_mut(id)?;
        siblings.retain(|c| *c != id);
        siblings.insert(0, id);
        Ok(())
    }

    fn siblings_mut(&mut self, id: NodeId) -> Result<&mut Vec<NodeId>, HierarchyError> {
        let node = self.try_node(id)?;
        let parent = node
            .parent
            .ok_or_else(|| HierarchyError::NotAttached(node.name().to_owned()))?;
        Ok(&mut self.try_node_mut(parent)?.children)
    }

    /// Children stable-sorted by z-order (ties keep declaration order).
    #[must_use]
    pub fn z_ordered_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = self.children(id).to_vec();
        order.sort_by_key(|c| self.nodes.get(*c).map_or(0, |n| n.z_order));
        order
    }

    pub(crate) fn set_root_flag(&mut self, id: NodeId, is_root: bool) -> Result<(), HierarchyError> {
        let node = self.try_node_mut(id)?;
        if is_root && node.parent.is_some() {
            return Err(HierarchyError::HasParent(node.name().to_owned()));
        }
        node.is_root = is_root;
        Ok(())
    }

    fn name_of(&self, id: NodeId) -> String {
        self.nodes
            .get(id)
            .map_or_else(|| id.to_string(), |n| n.name().to_owned())
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Own alpha times the parent's effective alpha / 255 when inheriting.
    #[must_use]
    pub fn effective_alpha(&self, id: NodeId) -> Option<u8> {
        let node = self.nodes.get(id)?;
        let own = node.alpha();
        if !node.inherits_alpha() {
            return Some(own);
        }
        Some(match node.parent.and_then(|p| self.effective_alpha(p)) {
            Some(parent) => (f32::from(own) * f32::from(parent) / 255.0) as u8,
            None => own,
        })
    }

    /// Own scale composed with every ancestor's.
    #[must_use]
    pub fn effective_scale(&self, id: NodeId) -> Option<Vec2> {
        let node = self.nodes.get(id)?;
        Some(match node.parent.and_then(|p| self.effective_scale(p)) {
            Some(parent) => node.scale.mul_elem(parent),
            None => node.scale,
        })
    }

    /// Own rect scaled about the pivot, then mapped through the parent's
    /// effective rect and scale.
    #[must_use]
    pub fn effective_rect(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let local = node.rect.scaled_about(node.scale, node.pivot);
        Some(match node.parent {
            Some(parent) => {
                let parent_rect = self.effective_rect(parent)?;
                let parent_scale = self.effective_scale(parent)?;
                parent_rect.local_to_parent(&local, parent_scale)
            }
            None => local,
        })
    }

    /// True if the node and every ancestor are enabled.
    #[must_use]
    pub fn effective_enabled(&self, id: NodeId) -> bool {
        self.all_ancestors(id, Node::is_enabled)
    }

    /// True if the node and every ancestor are visible.
    #[must_use]
    pub fn effective_visible(&self, id: NodeId) -> bool {
        self.all_ancestors(id, Node::is_visible)
    }

    fn all_ancestors(&self, id: NodeId, test: impl Fn(&Node) -> bool) -> bool {
        let mut current = Some(id);
        let mut seen = false;
        while let Some(node) = current.and_then(|c| self.nodes.get(c)) {
            if !test(node) {
                return false;
            }
            seen = true;
            current = node.parent;
        }
        seen
    }

    /// Reads a facet of a node.
    #[must_use]
    pub fn facet_value(&self, id: NodeId, facet: &Facet) -> Option<f32> {
        facet.read(self.nodes.get(id)?)
    }

    // ------------------------------------------------------------------
    // Hit-testing
    // ------------------------------------------------------------------

    /// Returns the deepest visible, enabled, non-clickthrough node under
    /// `point` in the subtree of `id`.
    ///
    /// Children are scanned from the top of the z-order down; on equal z the
    /// most recently added child wins. Animators are never hit.
    #[must_use]
    pub fn hit_test(&self, id: NodeId, point: Vec2) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        if node.is_animator() || !node.is_visible() || !node.is_enabled() {
            return None;
        }
        let rect = self.effective_rect(id)?;
        let inside = if node.behaviors().is_empty() {
            rect.contains(point)
        } else {
            node.behaviors().iter().all(|b| b.contains(&rect, point))
        };
        if !inside {
            return None;
        }
        for child in self.z_ordered_children(id).into_iter().rev() {
            if let Some(hit) = self.hit_test(child, point) {
                return Some(hit);
            }
        }
        (!node.is_clickthrough()).then_some(id)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Advances `id` and its subtree by `dt` seconds.
    ///
    /// The node's own animator runs first, then the children in declaration
    /// order. Children are iterated from a snapshot, so handlers may attach,
    /// detach or destroy nodes mid-update; a snapshotted child that is gone or
    /// has moved to another parent is skipped.
    pub fn update(&mut self, id: NodeId, dt: f32) {
        if !self.nodes.contains(id) {
            return;
        }
        self.update_animator(id, dt);

        let start = self.scratch.len();
        if let Some(node) = self.nodes.get(id) {
            self.scratch.extend_from_slice(&node.children);
        }
        let end = self.scratch.len();
        for i in start..end {
            let child = self.scratch[i];
            if self.nodes.get(child).is_some_and(|n| n.parent == Some(id)) {
                self.update(child, dt);
            }
        }
        self.scratch.truncate(start);
    }

    fn update_animator(&mut self, id: NodeId, dt: f32) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let owner = node.parent;
        let Some(mut animator) = node.animator.take() else {
            return;
        };
        let events = match owner {
            Some(owner) => self.drive(&mut animator, owner, dt),
            None => StepEvents::default(),
        };
        let value = animator.value();
        if let Some(node) = self.nodes.get_mut(id) {
            node.animator = Some(animator);
        }

        if events.delay_ended {
            trace!(animator = %id, "delay ended");
            self.notify(id, EventKind::OnDelayEnd, None);
        }
        if events.expired {
            trace!(animator = %id, value, "expired");
            self.notify(id, EventKind::OnExpire, Some(EventPayload::Value(value)));
        }
    }

    /// Steps the clock and writes the value into the owner.
    ///
    /// Writes happen while active, on the frame that expires and, with
    /// `reset_on_expire`, every expired frame. Nothing is written while delayed.
    fn drive(&mut self, animator: &mut Animator, owner: NodeId, dt: f32) -> StepEvents {
        let was_live = animator.is_animated();
        let events = animator.step(dt, self.acceleration_epsilon);
        let writes = animator.state() != AnimatorState::Delayed
            && (was_live
                || animator.is_animated()
                || (animator.is_expired() && animator.resets_on_expire() && animator.is_enabled()));
        if writes {
            let present = animator.waveform() == Waveform::Hover
                && animator.is_present(self, owner);
            let value = animator.compute_value(present);
            if let Some(owner_node) = self.nodes.get_mut(owner) {
                animator.write_back(owner_node, value);
            }
        }
        events
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribes a handler to `kind` events delivered to `node`.
    ///
    /// # Errors
    ///
    /// Fails if the id is stale.
    pub fn subscribe(
        &mut self,
        node: NodeId,
        kind: EventKind,
        handler: impl FnMut(&mut NodeTree, &Event) + 'static,
    ) -> UiResult<()> {
        self.try_node(node)?;
        let handler: EventHandler = Box::new(handler);
        self.events.subscribe(node, kind, handler);
        Ok(())
    }

    /// Drops every handler of `node` for `kind`.
    pub fn unsubscribe(&mut self, node: NodeId, kind: EventKind) -> usize {
        self.events.unsubscribe(node, kind)
    }

    /// The handler table.
    #[must_use]
    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Raises `kind` on `source`, and on its descendants for propagating kinds.
    pub fn notify(&mut self, source: NodeId, kind: EventKind, payload: Option<EventPayload>) {
        let event = Event {
            kind,
            source,
            target: source,
            payload,
        };
        if kind.propagates() {
            for target in self.subtree(source) {
                self.deliver(&Event { target, ..event.clone() });
            }
        } else {
            self.deliver(&event);
        }
    }

    fn deliver(&mut self, event: &Event) {
        let target = event.target;
        let Some(node) = self.nodes.get_mut(target) else {
            return;
        };
        for behavior in node.behaviors_mut() {
            behavior.on_event(event);
        }
        if event.kind == EventKind::AttachedToParent {
            self.inherit_animator_value(target);
        }

        if let Some(mut handlers) = self.events.take(target, event.kind) {
            for handler in &mut handlers {
                handler(self, event);
            }
            if self.nodes.contains(target) {
                self.events.restore(target, event.kind, handlers);
            }
        }
    }

    fn inherit_animator_value(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let owner = node.parent;
        let Some(mut animator) = node.animator.take() else {
            return;
        };
        if let Some(owner_node) = owner.and_then(|o| self.nodes.get(o)) {
            animator.inherit_from(owner_node);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.animator = Some(animator);
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Applies a string property to a node. `Ok(false)` for unknown names.
    ///
    /// Changing an attached animator's `facet` is checked against its owner.
    ///
    /// # Errors
    ///
    /// Fails for stale ids, malformed values, or an unsupported facet.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: &str) -> UiResult<bool> {
        let node = self.try_node(id)?;
        if name == "facet" && node.is_animator() {
            let facet: Facet = value.parse()?;
            if let Some(owner) = node.parent.and_then(|p| self.nodes.get(p)) {
                if facet.read(owner).is_none() {
                    return Err(ConfigError::UnsupportedFacet {
                        animator: node.name().to_owned(),
                        facet: facet.to_string(),
                        owner: owner.name().to_owned(),
                    }
                    .into());
                }
            }
        }
        Ok(self.try_node_mut(id)?.set_property(name, value)?)
    }

    /// Reads a string property of a node.
    #[must_use]
    pub fn get_property(&self, id: NodeId, name: &str) -> Option<String> {
        self.nodes.get(id)?.get_property(name)
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Emits draw commands for `id` and its subtree in z-order.
    pub fn draw(&self, id: NodeId, list: &mut DrawList) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.is_animator() || !node.is_visible() {
            return;
        }
        let (Some(rect), Some(alpha)) = (self.effective_rect(id), self.effective_alpha(id)) else {
            return;
        };
        let ctx = DrawContext {
            node: id,
            rect,
            color: node.color.with_alpha(alpha),
            angle: node.angle,
        };
        let mut drawn = false;
        for behavior in node.behaviors() {
            drawn |= behavior.draw(&ctx, list);
        }
        if !drawn && node.behaviors().is_empty() {
            list.push(DrawCommand::Quad {
                node: id,
                bounds: ctx.rect,
                color: ctx.color,
                angle: ctx.angle,
            });
        }

        let clip = node.flags.has(NodeFlags::CLIP_CHILDREN);
        if clip {
            list.push_clip(rect);
        }
        for child in self.z_ordered_children(id) {
            self.draw(child, list);
        }
        if clip {
            list.pop_clip();
        }
    }
}
