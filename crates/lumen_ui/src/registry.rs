//! Type-name registry for animators and behaviors.
//!
//! Built once at application start and handed to whatever builds trees from
//! declarative input. Nothing is registered implicitly.

use std::collections::HashMap;
use std::fmt;

use lumen_core::NodeId;

use crate::animator::{Animator, Facet, Rounding};
use crate::behavior::{Behavior, FrameStrip, Progress};
use crate::config::AnimatorDefaults;
use crate::error::{ConfigError, HierarchyError, UiResult};
use crate::node::Node;
use crate::tree::NodeTree;

/// Builds a configured animator from the registry defaults.
pub type AnimatorCtor = Box<dyn Fn(&AnimatorDefaults) -> Animator>;

/// Builds a behavior.
pub type BehaviorCtor = Box<dyn Fn() -> Box<dyn Behavior>>;

/// Name → constructor tables.
pub struct Registry {
    defaults: AnimatorDefaults,
    animators: HashMap<String, AnimatorCtor>,
    behaviors: HashMap<String, BehaviorCtor>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(defaults: AnimatorDefaults) -> Self {
        Self {
            defaults,
            animators: HashMap::new(),
            behaviors: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in animator and behavior types.
    #[must_use]
    pub fn with_defaults(defaults: AnimatorDefaults) -> Self {
        let mut registry = Self::new(defaults);
        for (name, facet) in [
            ("MoverX", Facet::X),
            ("MoverY", Facet::Y),
            ("ScalerX", Facet::ScaleX),
            ("ScalerY", Facet::ScaleY),
            ("ResizerX", Facet::Width),
            ("ResizerY", Facet::Height),
            ("Rotator", Facet::Angle),
            ("AlphaChanger", Facet::Alpha),
            ("RedChanger", Facet::Red),
            ("GreenChanger", Facet::Green),
            ("BlueChanger", Facet::Blue),
            ("ProgressChanger", Facet::Custom(Progress::FACET.to_owned())),
        ] {
            registry.register_animator(name, move |defaults| {
                Animator::from_defaults(facet.clone(), defaults)
            });
        }
        registry.register_animator("FrameAnimation", |defaults| {
            Animator::from_defaults(Facet::Custom(FrameStrip::FACET.to_owned()), defaults)
                .with_discrete(1.0, Rounding::Floor)
        });
        registry.register_behavior("FrameStrip", || Box::new(FrameStrip::default()));
        registry.register_behavior("Progress", || Box::new(Progress::new()));
        registry
    }

    /// Animator defaults handed to constructors.
    #[must_use]
    pub fn defaults(&self) -> &AnimatorDefaults {
        &self.defaults
    }

    /// Registers (or replaces) an animator type.
    pub fn register_animator(
        &mut self,
        name: impl Into<String>,
        ctor: impl Fn(&AnimatorDefaults) -> Animator + 'static,
    ) {
        self.animators.insert(name.into(), Box::new(ctor));
    }

    /// Registers (or replaces) a behavior type.
    pub fn register_behavior(
        &mut self,
        name: impl Into<String>,
        ctor: impl Fn() -> Box<dyn Behavior> + 'static,
    ) {
        self.behaviors.insert(name.into(), Box::new(ctor));
    }

    /// True if `name` is a registered animator type.
    #[must_use]
    pub fn has_animator(&self, name: &str) -> bool {
        self.animators.contains_key(name)
    }

    /// True if `name` is a registered behavior type.
    #[must_use]
    pub fn has_behavior(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    /// Builds an animator of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for unregistered names.
    pub fn create_animator(&self, type_name: &str) -> Result<Animator, ConfigError> {
        self.animators
            .get(type_name)
            .map(|ctor| ctor(&self.defaults))
            .ok_or_else(|| ConfigError::UnknownType(type_name.to_owned()))
    }

    /// Builds a behavior of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for unregistered names.
    pub fn create_behavior(&self, type_name: &str) -> Result<Box<dyn Behavior>, ConfigError> {
        self.behaviors
            .get(type_name)
            .map(|ctor| ctor())
            .ok_or_else(|| ConfigError::UnknownType(type_name.to_owned()))
    }

    /// Allocates a detached animator node of a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for unregistered names.
    pub fn spawn_animator(
        &self,
        tree: &mut NodeTree,
        type_name: &str,
        name: impl Into<String>,
    ) -> UiResult<NodeId> {
        let animator = self.create_animator(type_name)?;
        Ok(tree.insert(Node::with_animator(name, animator).with_type_name(type_name)))
    }

    /// Attaches a behavior of a registered type to an existing node.
    ///
    /// # Errors
    ///
    /// Fails for unregistered names or stale ids.
    pub fn add_behavior(&self, tree: &mut NodeTree, id: NodeId, type_name: &str) -> UiResult<()> {
        let behavior = self.create_behavior(type_name)?;
        tree.node_mut(id)
            .ok_or(HierarchyError::StaleId(id))?
            .add_behavior(behavior);
        Ok(())
    }

    /// Registered animator type names, sorted.
    #[must_use]
    pub fn animator_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.animators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered behavior type names, sorted.
    #[must_use]
    pub fn behavior_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults(AnimatorDefaults::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("defaults", &self.defaults)
            .field("animators", &self.animator_types())
            .field("behaviors", &self.behavior_types())
            .finish()
    }
}
