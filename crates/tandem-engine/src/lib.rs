//! Frame stepping and lockstep peer sessions for Tandem.
//!
//! [`FrameStepper`] advances a [`GameState`](tandem_state::GameState) by
//! one deterministic frame. [`LockstepSession`] wraps it into a peer: it
//! schedules local input with a fixed delay, collects every player's batch
//! through a [`Transport`], exchanges checksums, and recovers from desyncs
//! by rolling back to a retained snapshot or resyncing from a peer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checksum;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ring;
pub mod session;
pub mod step;
pub mod transport;

pub use checksum::{ChecksumLedger, DesyncDetected, StateChecksum};
pub use config::{CollisionConfig, ConfigError, PhysicsConfig, SessionConfig};
pub use error::SessionError;
pub use metrics::SessionMetrics;
pub use ring::{BufferOverflowError, RingBuffer};
pub use session::LockstepSession;
pub use step::{FrameReport, FrameStepper, RejectedCommand};
pub use transport::{ChannelTransport, PeerMessage, Transport, TransportError};
