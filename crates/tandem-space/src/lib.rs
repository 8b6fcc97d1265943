//! Broad-phase and narrow-phase collision for Tandem simulations.
//!
//! - [`Aabb`]: axis-aligned box over [`Fixed`](tandem_core::Fixed) coordinates.
//! - [`SpatialHash`]: uniform-grid broad phase. Queries return a superset
//!   of the true overlaps, never a subset.
//! - [`CollisionSystem`]: per-frame detection and push-out resolution in
//!   canonical `(lower id, higher id)` pair order.
//!
//! This crate knows nothing about entities beyond their ids. Callers hand
//! the collision system a slice of [`BodyProxy`] values (world-space bounds
//! plus velocity) and write the corrected values back.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aabb;
pub mod body;
pub mod collision;
pub mod error;
pub mod spatial_hash;

pub use aabb::Aabb;
pub use body::{BodyKind, BodyProxy, CollisionBody};
pub use collision::{CollisionSystem, Contact, ContactKind};
pub use error::SpaceError;
pub use spatial_hash::SpatialHash;
