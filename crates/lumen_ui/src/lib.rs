//! # LUMEN UI
//!
//! Retained-mode scene graph with time-driven property animators:
//! - Node tree with derived alpha, rect, scale, visibility and enablement
//! - Z-ordered hit testing and draw lists
//! - Animators: child nodes that drive one facet of their owner per frame
//! - Lifecycle events, behaviors, a type registry and the [`Scene`] root
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      FRAME PIPELINE                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  Scene::update(dt) → roots → node → animator → children  │
//! │                                  ↓                       │
//! │                    step clock → waveform → write facet   │
//! │                                                          │
//! │  Scene::draw() → z-ordered walk → DrawList → renderer    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - Derived state is recomputed on every query, never cached
//! - Structural errors are rejected before anything is mutated
//! - The per-frame path returns no errors

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod animator;
pub mod behavior;
pub mod config;
pub mod error;
pub mod events;
pub mod node;
pub mod property;
pub mod registry;
pub mod render;
pub mod scene;
pub mod tree;

pub use animator::{Animator, AnimatorState, Facet, Rounding, Waveform, WritePolicy};
pub use behavior::{Behavior, DrawContext, FrameStrip, Progress};
pub use config::{AnimatorDefaults, UiConfig};
pub use error::{ConfigError, HierarchyError, UiError, UiResult};
pub use events::{Event, EventKind, EventPayload};
pub use node::{Node, NodeFlags};
pub use registry::Registry;
pub use render::{DrawCommand, DrawList, QuadVertex};
pub use scene::Scene;
pub use tree::NodeTree;

pub use lumen_core::{Color, NodeId, Rect, Vec2};
