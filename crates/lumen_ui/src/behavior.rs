//! Behaviors: capability components attached to nodes.
//!
//! A behavior can expose custom facets to animators, refine hit-testing,
//! draw the node and react to lifecycle events. Every hook has a no-op
//! default, so an implementation only overrides what it needs.

use std::fmt;

use lumen_core::{Color, NodeId, Rect, Vec2};

use crate::error::ConfigError;
use crate::events::Event;
use crate::property::{parse_f32, parse_i32};
use crate::render::{DrawCommand, DrawList};

/// Resolved state handed to [`Behavior::draw`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    /// The node being drawn.
    pub node: NodeId,
    /// Effective rect.
    pub rect: Rect,
    /// Own color with effective alpha.
    pub color: Color,
    /// Own angle.
    pub angle: f32,
}

/// A capability component.
pub trait Behavior: fmt::Debug {
    /// Registry name of the behavior.
    fn type_name(&self) -> &str;

    /// Reads a custom facet.
    fn facet(&self, _name: &str) -> Option<f32> {
        None
    }

    /// Writes a custom facet. Returns false if the facet is not served here.
    fn set_facet(&mut self, _name: &str, _value: f32) -> bool {
        false
    }

    /// Refines hit-testing. `rect` is the node's effective rect.
    fn contains(&self, rect: &Rect, point: Vec2) -> bool {
        rect.contains(point)
    }

    /// Draws the node. Returns true if anything was emitted.
    fn draw(&self, _ctx: &DrawContext, _list: &mut DrawList) -> bool {
        false
    }

    /// Reacts to an event delivered to the node.
    fn on_event(&mut self, _event: &Event) {}

    /// Applies a string property. `Ok(false)` for unknown names.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed values.
    fn set_property(&mut self, _name: &str, _value: &str) -> Result<bool, ConfigError> {
        Ok(false)
    }

    /// Reads a string property.
    fn get_property(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Image strip with a selectable frame, driven through the `frame` facet.
///
/// Draws the image named `base` followed by the frame index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStrip {
    base: String,
    frame: i32,
    first_frame: i32,
    frame_count: i32,
}

impl FrameStrip {
    /// Facet name.
    pub const FACET: &'static str = "frame";

    /// Creates a strip over images `base{first}` .. `base{first+count-1}`.
    #[must_use]
    pub fn new(base: impl Into<String>, first_frame: i32, frame_count: i32) -> Self {
        Self {
            base: base.into(),
            frame: first_frame,
            first_frame,
            frame_count,
        }
    }

    /// Current frame index.
    #[must_use]
    pub fn frame(&self) -> i32 {
        self.frame
    }

    /// Name of the image currently shown.
    #[must_use]
    pub fn image_name(&self) -> String {
        format!("{}{}", self.base, self.frame)
    }

    /// Sets the frame. With a positive frame count, indices wrap into range.
    pub fn set_frame(&mut self, frame: i32) {
        self.frame = if self.frame_count > 0 {
            self.first_frame + (frame - self.first_frame).rem_euclid(self.frame_count)
        } else {
            frame
        };
    }
}

impl Behavior for FrameStrip {
    fn type_name(&self) -> &str {
        "FrameStrip"
    }

    fn facet(&self, name: &str) -> Option<f32> {
        (name == Self::FACET).then_some(self.frame as f32)
    }

    fn set_facet(&mut self, name: &str, value: f32) -> bool {
        if name != Self::FACET {
            return false;
        }
        self.set_frame(value.floor() as i32);
        true
    }

    fn draw(&self, ctx: &DrawContext, list: &mut DrawList) -> bool {
        list.push(DrawCommand::Image {
            node: ctx.node,
            bounds: ctx.rect,
            image: self.image_name(),
            color: ctx.color,
            angle: ctx.angle,
        });
        true
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        match name {
            "image" => self.base = value.to_owned(),
            "frame" => self.set_frame(parse_i32(name, value)?),
            "first_frame" => self.first_frame = parse_i32(name, value)?,
            "frame_count" => self.frame_count = parse_i32(name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn get_property(&self, name: &str) -> Option<String> {
        match name {
            "image" => Some(self.base.clone()),
            "frame" => Some(self.frame.to_string()),
            "first_frame" => Some(self.first_frame.to_string()),
            "frame_count" => Some(self.frame_count.to_string()),
            _ => None,
        }
    }
}

/// Progress fill in [0, 1], driven through the `progress` facet.
///
/// Draws a quad covering the filled fraction of the node's width.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Progress {
    progress: f32,
}

impl Progress {
    /// Facet name.
    pub const FACET: &'static str = "progress";

    /// Creates an empty progress fill.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current progress.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Sets progress, clamped to [0, 1].
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }
}

impl Behavior for Progress {
    fn type_name(&self) -> &str {
        "Progress"
    }

    fn facet(&self, name: &str) -> Option<f32> {
        (name == Self::FACET).then_some(self.progress)
    }

    fn set_facet(&mut self, name: &str, value: f32) -> bool {
        if name != Self::FACET {
            return false;
        }
        self.set_progress(value);
        true
    }

    fn draw(&self, ctx: &DrawContext, list: &mut DrawList) -> bool {
        if self.progress <= 0.0 {
            return false;
        }
        let mut bounds = ctx.rect;
        bounds.width *= self.progress;
        list.push(DrawCommand::Quad {
            node: ctx.node,
            bounds,
            color: ctx.color,
            angle: ctx.angle,
        });
        true
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        if name != Self::FACET {
            return Ok(false);
        }
        self.set_progress(parse_f32(name, value)?);
        Ok(true)
    }

    fn get_property(&self, name: &str) -> Option<String> {
        (name == Self::FACET).then(|| self.progress.to_string())
    }
}
