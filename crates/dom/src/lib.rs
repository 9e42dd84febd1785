//! Mensa DOM Processing Library
//!
//! Takes the fully rendered cafeteria menu page (as delivered by the
//! browser over CDP) and rewrites it into a flat, de-duplicated shape that
//! reads well as a chat message.
//!
//! ## Core Design
//!
//! ```text
//! CDP JSON → DomArena (roles classified) → normalize() → DomSerializer → text / HTML
//!                  ↓
//!            NodeId (u32)
//! ```
//!
//! The normalizer is synchronous, holds no state between runs and touches
//! nothing but the arena it is given.

pub mod arena;
pub mod error;
pub mod menu;
pub mod normalizer;
pub mod serializer;
pub mod service;
pub mod types;
pub mod utils;

#[cfg(test)]
mod fixtures;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use menu::{is_menu_available, visible_day_plan};
pub use normalizer::{normalize, NormalizeReport, Pass};
pub use serializer::{DomSerializer, SerializerConfig};
pub use service::DomService;
pub use types::*;
