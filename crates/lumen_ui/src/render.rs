//! Draw list generation.
//!
//! The scene fills a [`DrawList`] each frame; an external renderer consumes
//! the commands or the flattened [`QuadVertex`] stream.

use lumen_core::{Color, NodeId, Rect, Vec2};

/// A draw command for the external renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Solid quad.
    Quad {
        /// Emitting node.
        node: NodeId,
        /// Effective bounds.
        bounds: Rect,
        /// Color with effective alpha.
        color: Color,
        /// Rotation in degrees about the bounds center.
        angle: f32,
    },
    /// Image quad.
    Image {
        /// Emitting node.
        node: NodeId,
        /// Effective bounds.
        bounds: Rect,
        /// Image name, resolved by the renderer.
        image: String,
        /// Tint with effective alpha.
        color: Color,
        /// Rotation in degrees about the bounds center.
        angle: f32,
    },
    /// Scissor rect (clip children).
    PushClip {
        /// Clip bounds.
        bounds: Rect,
    },
    /// Pop scissor rect.
    PopClip,
}

/// Commands collected for one frame.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    clip_stack: Vec<Rect>,
}

impl DrawList {
    /// Creates an empty draw list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(256),
            clip_stack: Vec::with_capacity(8),
        }
    }

    /// Clears the list for a new frame, keeping capacity.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.clip_stack.clear();
    }

    /// Adds a command.
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Pushes a clip rect, intersected with the current one.
    pub fn push_clip(&mut self, bounds: Rect) {
        let clip = match self.clip_stack.last() {
            Some(current) => current.intersection(&bounds).unwrap_or(Rect::ZERO),
            None => bounds,
        };
        self.clip_stack.push(clip);
        self.commands.push(DrawCommand::PushClip { bounds: clip });
    }

    /// Pops the current clip rect.
    pub fn pop_clip(&mut self) {
        self.clip_stack.pop();
        self.commands.push(DrawCommand::PopClip);
    }

    /// Current clip rect.
    #[must_use]
    pub fn current_clip(&self) -> Option<Rect> {
        self.clip_stack.last().copied()
    }

    /// Commands in submission order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if nothing was drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Nodes in draw order (back to front).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Quad { node, .. } | DrawCommand::Image { node, .. } => Some(*node),
            DrawCommand::PushClip { .. } | DrawCommand::PopClip => None,
        })
    }

    /// Flattens quads and images into two triangles each.
    #[must_use]
    pub fn vertices(&self) -> Vec<QuadVertex> {
        let mut out = Vec::with_capacity(self.commands.len() * 6);
        for command in &self.commands {
            if let DrawCommand::Quad { bounds, color, angle, .. }
            | DrawCommand::Image { bounds, color, angle, .. } = command
            {
                push_quad(&mut out, bounds, *color, *angle);
            }
        }
        out
    }
}

fn push_quad(out: &mut Vec<QuadVertex>, bounds: &Rect, color: Color, angle: f32) {
    let center = bounds.center();
    let (sin, cos) = angle.to_radians().sin_cos();
    let rotate = |p: Vec2| {
        let d = p - center;
        Vec2::new(center.x + d.x * cos - d.y * sin, center.y + d.x * sin + d.y * cos)
    };
    let color = color.to_array_f32();
    let corners = [
        (Vec2::new(bounds.x, bounds.y), [0.0, 0.0]),
        (Vec2::new(bounds.right(), bounds.y), [1.0, 0.0]),
        (Vec2::new(bounds.right(), bounds.bottom()), [1.0, 1.0]),
        (Vec2::new(bounds.x, bounds.bottom()), [0.0, 1.0]),
    ];
    for index in [0, 1, 2, 0, 2, 3] {
        let (pos, uv) = corners[index];
        out.push(QuadVertex::new(rotate(pos).to_array(), uv, color));
    }
}

/// Vertex for UI rendering.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Position (x, y).
    pub position: [f32; 2],
    /// UV coordinates.
    pub uv: [f32; 2],
    /// Color (RGBA, normalized).
    pub color: [f32; 4],
}

impl QuadVertex {
    /// Creates a new vertex.
    #[must_use]
    pub const fn new(position: [f32; 2], uv: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, uv, color }
    }

    /// Views a vertex slice as raw bytes for upload.
    #[must_use]
    pub fn as_bytes(vertices: &[Self]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}
