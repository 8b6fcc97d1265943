//! Core numeric types, ids, and randomness for the Tandem lockstep core.
//!
//! This is the leaf crate with zero internal dependencies. Everything a
//! peer computes in the determinism-critical path is built from the types
//! defined here:
//!
//! - [`Fixed`] and [`Vec2`]: Q16.16 fixed-point scalars and vectors whose
//!   arithmetic is pure integer math, bit-identical on every target.
//! - [`trig`]: table-driven `sin`/`cos`/`atan2` over [`Fixed`] radians.
//! - [`DeterministicRng`]: a seeded ChaCha8 stream whose output depends only
//!   on the seed and the number of draws.
//! - Strongly-typed identifiers ([`EntityId`], [`PlayerId`], [`FrameId`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fixed;
pub mod id;
pub mod rng;
pub mod trig;
pub mod vec2;

pub use error::ArithmeticError;
pub use fixed::Fixed;
pub use id::{EntityId, FrameId, PlayerId};
pub use rng::DeterministicRng;
pub use vec2::Vec2;
