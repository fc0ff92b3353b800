//! Node data: local transform, flags, color and attached components.
//!
//! Nodes hold only their OWN state. Anything composed with the ancestor
//! chain (effective alpha, rect, scale...) is computed by [`crate::NodeTree`].

use lumen_core::{Color, NodeId, Rect, Vec2};

use crate::animator::Animator;
use crate::behavior::Behavior;
use crate::error::ConfigError;
use crate::property::{format_bool, invalid, parse_bool, parse_f32, parse_i32, parse_u8};

/// Node state flags (bitfield).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFlags(u32);

impl NodeFlags {
    /// Node is drawn and hit-tested.
    pub const VISIBLE: u32 = 1 << 0;
    /// Node accepts input.
    pub const ENABLED: u32 = 1 << 1;
    /// Hit-testing passes through the node itself (children still hit).
    pub const CLICKTHROUGH: u32 = 1 << 2;
    /// Alpha is multiplied by the parent's effective alpha.
    pub const INHERITS_ALPHA: u32 = 1 << 3;
    /// Children are clipped to the node's rect when drawn.
    pub const CLIP_CHILDREN: u32 = 1 << 4;

    /// Default flags for a new node.
    pub const DEFAULT: Self = Self(Self::VISIBLE | Self::ENABLED | Self::INHERITS_ALPHA);

    /// Returns true if the flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Sets or clears a flag.
    #[inline]
    pub fn assign(&mut self, flag: u32, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A tree entity.
#[derive(Debug)]
pub struct Node {
    name: String,
    type_name: String,
    /// Local rectangle (position relative to the parent, and size).
    pub rect: Rect,
    /// Scale factors, applied about `pivot`.
    pub scale: Vec2,
    /// Scale pivot in local coordinates.
    pub pivot: Vec2,
    /// Rotation in degrees.
    pub angle: f32,
    /// Own color, alpha included.
    pub color: Color,
    /// Sibling ordering for hit-testing and drawing.
    pub z_order: i32,
    /// State flags.
    pub flags: NodeFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) is_root: bool,
    pub(crate) animator: Option<Box<Animator>>,
    behaviors: Vec<Box<dyn Behavior>>,
}

impl Node {
    /// Type name of plain nodes.
    pub const TYPE_NAME: &'static str = "Object";

    /// Creates a detached node with identity transform and white color.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Self::TYPE_NAME.to_owned(),
            rect: Rect::ZERO,
            scale: Vec2::ONE,
            pivot: Vec2::ZERO,
            angle: 0.0,
            color: Color::WHITE,
            z_order: 0,
            flags: NodeFlags::DEFAULT,
            parent: None,
            children: Vec::new(),
            is_root: false,
            animator: None,
            behaviors: Vec::new(),
        }
    }

    /// Creates a node carrying an animator.
    #[must_use]
    pub fn with_animator(name: impl Into<String>, animator: Animator) -> Self {
        let mut node = Self::new(name);
        node.type_name = "Animator".to_owned();
        node.rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        node.flags.assign(NodeFlags::ENABLED, animator.is_enabled());
        node.animator = Some(Box::new(animator));
        node
    }

    /// Sets the local rect.
    #[must_use]
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the type name reported through the `type` property.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name (`Object`, `Animator`, or a registry name).
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Parent, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True if the node is a scene root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// True if the node carries an animator.
    #[must_use]
    pub fn is_animator(&self) -> bool {
        self.animator.is_some()
    }

    /// The node's animator.
    #[must_use]
    pub fn animator(&self) -> Option<&Animator> {
        self.animator.as_deref()
    }

    /// The node's animator, mutably.
    pub fn animator_mut(&mut self) -> Option<&mut Animator> {
        self.animator.as_deref_mut()
    }

    /// Attached behaviors.
    #[must_use]
    pub fn behaviors(&self) -> &[Box<dyn Behavior>] {
        &self.behaviors
    }

    /// Attached behaviors, mutably.
    pub fn behaviors_mut(&mut self) -> &mut [Box<dyn Behavior>] {
        &mut self.behaviors
    }

    /// Attaches a behavior.
    pub fn add_behavior(&mut self, behavior: Box<dyn Behavior>) {
        self.behaviors.push(behavior);
    }

    /// Finds the first behavior with the given type name.
    #[must_use]
    pub fn behavior(&self, type_name: &str) -> Option<&dyn Behavior> {
        self.behaviors
            .iter()
            .find(|b| b.type_name() == type_name)
            .map(|b| &**b)
    }

    /// Own visibility flag.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.flags.has(NodeFlags::VISIBLE)
    }

    /// Own enabled flag. Animator nodes report their animator's clock.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.animator
            .as_deref()
            .map_or(self.flags.has(NodeFlags::ENABLED), Animator::is_enabled)
    }

    /// Own clickthrough flag.
    #[must_use]
    pub fn is_clickthrough(&self) -> bool {
        self.flags.has(NodeFlags::CLICKTHROUGH)
    }

    /// Whether alpha composes with the parent.
    #[must_use]
    pub fn inherits_alpha(&self) -> bool {
        self.flags.has(NodeFlags::INHERITS_ALPHA)
    }

    /// Sets the visibility flag.
    pub fn set_visible(&mut self, visible: bool) {
        self.flags.assign(NodeFlags::VISIBLE, visible);
    }

    /// Sets the enabled flag. For animator nodes this also stops the clock.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.flags.assign(NodeFlags::ENABLED, enabled);
        if let Some(animator) = self.animator.as_deref_mut() {
            animator.set_enabled(enabled);
        }
    }

    /// Sets the clickthrough flag.
    pub fn set_clickthrough(&mut self, clickthrough: bool) {
        self.flags.assign(NodeFlags::CLICKTHROUGH, clickthrough);
    }

    /// Sets alpha inheritance.
    pub fn set_inherits_alpha(&mut self, inherits: bool) {
        self.flags.assign(NodeFlags::INHERITS_ALPHA, inherits);
    }

    /// Own alpha.
    #[must_use]
    pub fn alpha(&self) -> u8 {
        self.color.a
    }

    /// Sets own alpha.
    pub fn set_alpha(&mut self, alpha: u8) {
        self.color.a = alpha;
    }

    /// Applies a string property: node fields first, then the animator, then
    /// each behavior. Returns `Ok(false)` if nobody recognized the name.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed values.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        match name {
            "x" => self.rect.x = parse_f32(name, value)?,
            "y" => self.rect.y = parse_f32(name, value)?,
            "w" | "width" => self.rect.width = parse_f32(name, value)?,
            "h" | "height" => self.rect.height = parse_f32(name, value)?,
            "scale_x" => self.scale.x = parse_f32(name, value)?,
            "scale_y" => self.scale.y = parse_f32(name, value)?,
            "scale" => {
                let s = parse_f32(name, value)?;
                self.scale = Vec2::new(s, s);
            }
            "pivot_x" => self.pivot.x = parse_f32(name, value)?,
            "pivot_y" => self.pivot.y = parse_f32(name, value)?,
            "angle" => self.angle = parse_f32(name, value)?,
            "alpha" => self.color.a = parse_u8(name, value)?,
            "red" => self.color.r = parse_u8(name, value)?,
            "green" => self.color.g = parse_u8(name, value)?,
            "blue" => self.color.b = parse_u8(name, value)?,
            "color" => self.color = Color::parse_hex(value.trim()).ok_or_else(|| invalid(name, value))?,
            "visible" => self.set_visible(parse_bool(name, value)?),
            "enabled" => self.set_enabled(parse_bool(name, value)?),
            "clickthrough" => self.set_clickthrough(parse_bool(name, value)?),
            "inherit_alpha" | "inherits_alpha" => self.set_inherits_alpha(parse_bool(name, value)?),
            "clip" => self.flags.assign(NodeFlags::CLIP_CHILDREN, parse_bool(name, value)?),
            "zorder" | "z_order" => self.z_order = parse_i32(name, value)?,
            _ => {
                if let Some(animator) = self.animator.as_deref_mut() {
                    if animator.set_property(name, value)? {
                        return Ok(true);
                    }
                }
                for behavior in &mut self.behaviors {
                    if behavior.set_property(name, value)? {
                        return Ok(true);
                    }
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Reads a string property. `None` if nobody recognized the name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<String> {
        Some(match name {
            "name" => self.name.clone(),
            "type" => self.type_name.clone(),
            "x" => self.rect.x.to_string(),
            "y" => self.rect.y.to_string(),
            "w" | "width" => self.rect.width.to_string(),
            "h" | "height" => self.rect.height.to_string(),
            "scale_x" => self.scale.x.to_string(),
            "scale_y" => self.scale.y.to_string(),
            "pivot_x" => self.pivot.x.to_string(),
            "pivot_y" => self.pivot.y.to_string(),
            "angle" => self.angle.to_string(),
            "alpha" => self.color.a.to_string(),
            "red" => self.color.r.to_string(),
            "green" => self.color.g.to_string(),
            "blue" => self.color.b.to_string(),
            "color" => format!("{:08X}", self.color.to_hex()),
            "visible" => format_bool(self.is_visible()),
            "enabled" => format_bool(self.is_enabled()),
            "clickthrough" => format_bool(self.is_clickthrough()),
            "inherit_alpha" | "inherits_alpha" => format_bool(self.inherits_alpha()),
            "clip" => format_bool(self.flags.has(NodeFlags::CLIP_CHILDREN)),
            "zorder" | "z_order" => self.z_order.to_string(),
            _ => {
                return self
                    .animator
                    .as_deref()
                    .and_then(|a| a.get_property(name))
                    .or_else(|| self.behaviors.iter().find_map(|b| b.get_property(name)));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::Facet;

    #[test]
    fn test_defaults() {
        let node = Node::new("panel");
        assert!(node.is_visible());
        assert!(node.is_enabled());
        assert!(node.inherits_alpha());
        assert!(!node.is_clickthrough());
        assert_eq!(node.scale, Vec2::ONE);
        assert_eq!(node.type_name(), "Object");
    }

    #[test]
    fn test_property_surface() {
        let mut node = Node::new("panel");
        assert_eq!(node.set_property("x", "12"), Ok(true));
        assert_eq!(node.set_property("color", "#FF000080"), Ok(true));
        assert_eq!(node.color, Color::rgba(255, 0, 0, 128));
        assert_eq!(node.set_property("visible", "0"), Ok(true));
        assert!(!node.is_visible());
        assert_eq!(node.set_property("zorder", "-3"), Ok(true));
        assert_eq!(node.z_order, -3);
        assert_eq!(node.set_property("wobble", "1"), Ok(false));
        assert!(node.set_property("alpha", "300").is_err());

        assert_eq!(node.get_property("x").as_deref(), Some("12"));
        assert_eq!(node.get_property("color").as_deref(), Some("FF000080"));
        assert_eq!(node.get_property("wobble"), None);
    }

    #[test]
    fn test_animator_properties_fall_through() {
        let mut node = Node::with_animator("mover", Animator::new(Facet::X));
        assert_eq!(node.set_property("speed", "4"), Ok(true));
        assert_eq!(node.animator().map(Animator::speed), Some(4.0));
        assert_eq!(node.get_property("speed").as_deref(), Some("4"));

        node.set_enabled(false);
        assert!(!node.animator().is_some_and(Animator::is_enabled));
    }

    #[test]
    fn test_enabled_follows_animator_clock() {
        let mut node = Node::with_animator("mover", Animator::new(Facet::X));
        if let Some(animator) = node.animator_mut() {
            animator.set_enabled(false);
        }
        assert!(!node.is_enabled());
        assert_eq!(node.get_property("enabled").as_deref(), Some("0"));

        if let Some(animator) = node.animator_mut() {
            animator.set_enabled(true);
        }
        assert!(node.is_enabled());
    }
}
