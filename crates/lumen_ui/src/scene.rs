//! Scene: the aggregation root driving one update/draw per frame.

use std::collections::HashMap;
use std::fmt;

use lumen_core::{NodeId, Vec2};
use tracing::{debug, warn};

use crate::animator::Animator;
use crate::config::UiConfig;
use crate::error::{ConfigError, HierarchyError, UiResult};
use crate::events::{EventKind, EventPayload};
use crate::render::DrawList;
use crate::tree::NodeTree;

/// Named callback invoked through [`Scene::trigger_callback`].
pub type Callback = Box<dyn FnMut(&mut NodeTree)>;

/// Owns the node tree, the named top-level nodes and the focus.
pub struct Scene {
    tree: NodeTree,
    roots: Vec<NodeId>,
    names: HashMap<String, NodeId>,
    focused: Option<NodeId>,
    callbacks: HashMap<String, Callback>,
    config: UiConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(UiConfig::default())
    }

    /// Creates an empty scene.
    #[must_use]
    pub fn with_config(config: UiConfig) -> Self {
        Self {
            tree: NodeTree::with_config(&config),
            roots: Vec::new(),
            names: HashMap::new(),
            focused: None,
            callbacks: HashMap::new(),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// The node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The node tree, mutably.
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// Creates a named node.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateName`] if the name is taken.
    pub fn create_node(&mut self, name: &str) -> UiResult<NodeId> {
        self.ensure_free(name)?;
        let id = self.tree.create_node(name);
        self.names.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Creates a named animator node.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateName`] if the name is taken.
    pub fn create_animator(&mut self, name: &str, animator: Animator) -> UiResult<NodeId> {
        self.ensure_free(name)?;
        let id = self.tree.create_animator(name, animator);
        self.names.insert(name.to_owned(), id);
        Ok(id)
    }

    fn ensure_free(&self, name: &str) -> Result<(), ConfigError> {
        match self.names.get(name) {
            Some(id) if self.tree.contains(*id) => Err(ConfigError::DuplicateName(name.to_owned())),
            _ => Ok(()),
        }
    }

    /// Indexes an existing node under its name.
    ///
    /// # Errors
    ///
    /// Fails for stale ids or names already taken by another node.
    pub fn register(&mut self, id: NodeId) -> UiResult<()> {
        let name = self.tree.try_node(id)?.name().to_owned();
        if self.names.get(&name).is_some_and(|other| *other != id && self.tree.contains(*other)) {
            return Err(ConfigError::DuplicateName(name).into());
        }
        self.names.insert(name, id);
        Ok(())
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied().filter(|id| self.tree.contains(*id))
    }

    /// Promotes a detached node to a scene root.
    ///
    /// # Errors
    ///
    /// Fails for stale ids or nodes that have a parent.
    pub fn add_root(&mut self, id: NodeId) -> UiResult<()> {
        self.tree.set_root_flag(id, true)?;
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        debug!(root = %id, "add root");
        Ok(())
    }

    /// Removes a node from the root list (the node stays alive).
    ///
    /// # Errors
    ///
    /// Fails if the node is not a root.
    pub fn remove_root(&mut self, id: NodeId) -> UiResult<()> {
        let Some(position) = self.roots.iter().position(|r| *r == id) else {
            let name = self.tree.try_node(id)?.name().to_owned();
            return Err(HierarchyError::NotRoot(name).into());
        };
        self.roots.remove(position);
        if self.tree.contains(id) {
            self.tree.set_root_flag(id, false)?;
        }
        Ok(())
    }

    /// Top-level nodes in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Destroys a node and its subtree, dropping names, roots and focus that
    /// referred to it.
    ///
    /// # Errors
    ///
    /// Fails for stale ids.
    pub fn destroy(&mut self, id: NodeId) -> UiResult<usize> {
        let freed = self.tree.destroy(id)?;
        self.prune();
        Ok(freed)
    }

    fn prune(&mut self) {
        let tree = &self.tree;
        self.roots.retain(|r| tree.contains(*r));
        self.names.retain(|_, id| tree.contains(*id));
        if self.focused.is_some_and(|f| !tree.contains(f)) {
            self.focused = None;
        }
    }

    /// Advances every root subtree by `dt` seconds, in declaration order.
    pub fn update(&mut self, dt: f32) {
        for i in 0..self.roots.len() {
            let Some(root) = self.roots.get(i).copied() else {
                break;
            };
            self.tree.update(root, dt);
        }
        self.prune();
    }

    /// Draws all roots (in z-order) into a fresh list.
    #[must_use]
    pub fn draw(&self) -> DrawList {
        let mut list = DrawList::new();
        self.draw_into(&mut list);
        list
    }

    /// Draws all roots into `list`, clearing it first.
    pub fn draw_into(&self, list: &mut DrawList) {
        list.begin_frame();
        for root in self.roots_by_z() {
            self.tree.draw(root, list);
        }
    }

    fn roots_by_z(&self) -> Vec<NodeId> {
        let mut roots = self.roots.clone();
        roots.sort_by_key(|r| self.tree.node(*r).map_or(0, |n| n.z_order));
        roots
    }

    /// Top-most node under `point`, across all roots.
    #[must_use]
    pub fn hit_test(&self, point: Vec2) -> Option<NodeId> {
        self.roots_by_z()
            .into_iter()
            .rev()
            .find_map(|root| self.tree.hit_test(root, point))
    }

    /// Moves the cursor used by hover animators.
    pub fn set_cursor(&mut self, cursor: Vec2) {
        self.tree.set_cursor(cursor);
    }

    /// Currently focused node.
    #[must_use]
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Moves focus. Fires `LoseFocus` on the old target and `GainFocus` on
    /// the new one; refocusing the same node fires nothing.
    ///
    /// # Errors
    ///
    /// Fails for stale ids.
    pub fn set_focus(&mut self, target: Option<NodeId>) -> UiResult<()> {
        if let Some(id) = target {
            self.tree.try_node(id)?;
        }
        if target == self.focused {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.focused, target);
        debug!(?previous, ?target, "focus");
        if let Some(old) = previous.filter(|p| self.tree.contains(*p)) {
            self.tree
                .notify(old, EventKind::LoseFocus, target.map(EventPayload::Node));
        }
        if let Some(new) = target {
            self.tree
                .notify(new, EventKind::GainFocus, previous.map(EventPayload::Node));
        }
        self.prune();
        Ok(())
    }

    /// Registers (or replaces) a named callback.
    pub fn register_callback(
        &mut self,
        name: impl Into<String>,
        callback: impl FnMut(&mut NodeTree) + 'static,
    ) {
        self.callbacks.insert(name.into(), Box::new(callback));
    }

    /// Invokes a named callback. Returns false if none is registered.
    pub fn trigger_callback(&mut self, name: &str) -> bool {
        let Some(callback) = self.callbacks.get_mut(name) else {
            return false;
        };
        callback(&mut self.tree);
        true
    }

    /// Applies a batch of string properties to a node.
    ///
    /// Unknown names are rejected when `strict_properties` is set and logged
    /// otherwise. Properties before a failing one stay applied.
    ///
    /// # Errors
    ///
    /// Fails for stale ids, malformed values and (strict mode) unknown names.
    pub fn configure<'a>(
        &mut self,
        id: NodeId,
        properties: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> UiResult<()> {
        for (name, value) in properties {
            if self.tree.set_property(id, name, value)? {
                continue;
            }
            let node = self.tree.try_node(id)?.name().to_owned();
            if self.config.strict_properties {
                return Err(ConfigError::UnknownProperty {
                    node,
                    name: name.to_owned(),
                }
                .into());
            }
            warn!(node = %node, property = name, "ignoring unknown property");
        }
        Ok(())
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("roots", &self.roots)
            .field("names", &self.names.len())
            .field("focused", &self.focused)
            .field("callbacks", &self.callbacks.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
