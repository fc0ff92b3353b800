//! # LUMEN Core
//!
//! Storage and geometry primitives for the LUMEN retained-mode UI toolkit:
//! - Generational [`NodeId`]s that never alias a recycled slot
//! - A slot [`Arena`] with free-list recycling
//! - [`Vec2`], [`Rect`] and 8-bit [`Color`]
//!
//! ## Architecture Rules
//!
//! 1. **No UI semantics** - this crate knows nothing about nodes or animators
//! 2. **No allocations in the hot path** - slots are recycled, never shrunk
//! 3. **GPU-ready layout** - math types are `Pod`
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_core::{Arena, Rect, Vec2};
//!
//! let mut arena = Arena::new();
//! let id = arena.insert(Rect::new(0.0, 0.0, 10.0, 10.0));
//! assert!(arena[id].contains(Vec2::new(5.0, 5.0)));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arena;
pub mod color;
pub mod id;
pub mod math;

pub use arena::Arena;
pub use color::Color;
pub use id::NodeId;
pub use math::{Rect, Vec2};
