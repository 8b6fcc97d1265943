//! Tandem: a deterministic lockstep simulation core for multiplayer
//! platformers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tandem sub-crates. For most users, adding `tandem` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tandem::prelude::*;
//!
//! let players = vec![PlayerId(1)];
//! let transport = ChannelTransport::mesh(&players, 16)
//!     .remove(&PlayerId(1))
//!     .unwrap();
//! let config = SessionConfig::new(42, PlayerId(1), players);
//! let mut session = LockstepSession::new(config, transport).unwrap();
//!
//! // Input lands `input_delay` (2) frames after submission.
//! session.submit(Action::Join { name: "solo".into() });
//! for _ in 0..3 {
//!     session.tick().unwrap();
//! }
//! assert_eq!(session.frame(), FrameId(3));
//! assert!(session.state().controlled_entity(PlayerId(1)).is_some());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tandem-core` | Fixed-point math, trig tables, RNG, ids |
//! | [`space`] | `tandem-space` | AABBs, spatial hash, collision resolution |
//! | [`state`] | `tandem-state` | Entities, players, commands, checksums, codec |
//! | [`replay`] | `tandem-replay` | Input recording and replay logs |
//! | [`engine`] | `tandem-engine` | Frame stepping and lockstep sessions |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Fixed-point math, trigonometry, deterministic RNG, and ids
/// (`tandem-core`).
pub use tandem_core as types;

/// Geometry and broad/narrow-phase collision (`tandem-space`).
///
/// [`space::CollisionSystem`] resolves overlaps in canonical pair order
/// over a [`space::SpatialHash`] broad phase.
pub use tandem_space as space;

/// Simulation state and commands (`tandem-state`).
pub use tandem_state as state;

/// Input recording, replay logs, and verification (`tandem-replay`).
///
/// Write logs with [`replay::ReplayWriter`], verify them with
/// [`replay::replay_and_compare`].
pub use tandem_replay as replay;

/// Frame stepping and peer sessions (`tandem-engine`).
pub use tandem_engine as engine;

/// Common imports for typical Tandem usage.
///
/// ```rust
/// use tandem::prelude::*;
/// ```
pub mod prelude {
    // Math and ids
    pub use tandem_core::{DeterministicRng, EntityId, Fixed, FrameId, PlayerId, Vec2};

    // Geometry
    pub use tandem_space::{Aabb, BodyKind, CollisionSystem, SpatialHash};

    // State
    pub use tandem_state::{
        Action, Checksum, Command, Entity, EntityDef, EntityKind, EntityPayload, GameState,
        GameStateData, Player,
    };

    // Replay
    pub use tandem_replay::{InputRecorder, ReplayReader, ReplayWriter};

    // Engine
    pub use tandem_engine::{
        ChannelTransport, FrameReport, FrameStepper, LockstepSession, SessionConfig,
        SessionError, SessionMetrics, StateChecksum, Transport,
    };
}
