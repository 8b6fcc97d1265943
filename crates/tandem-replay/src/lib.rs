//! Input recording and deterministic replay for Tandem sessions.
//!
//! # Architecture
//!
//! - [`InputRecorder`] keeps every peer's commands per frame, hands them
//!   out in canonical order, and re-drives a state from a snapshot for
//!   rollback.
//! - [`ReplayWriter`] streams a recorded session to any `Write` sink.
//! - [`ReplayReader`] plays frames back from any `Read` source.
//! - [`replay_and_compare`] and [`compare_states`] verify determinism.
//!
//! # Format
//!
//! ```text
//! [MAGIC "TNDM"] [VERSION u8] [config_hash u64] [initial state]
//! [Frame 1] [Frame 2] ... [Frame N]
//! ```
//!
//! Each frame holds its frame number, the canonical commands applied at
//! that frame, and the checksum of the state those commands produced.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod compare;
pub mod error;
pub mod hash;
pub mod reader;
pub mod recorder;
pub mod types;
pub mod writer;

pub use compare::{compare_states, replay_and_compare, DivergenceReport, Side, StateDivergence};
pub use error::ReplayError;
pub use hash::{config_hash, fnv1a};
pub use reader::{FrameIter, ReplayReader};
pub use recorder::InputRecorder;
pub use types::{Frame, ReplayHeader};
pub use writer::ReplayWriter;

/// Magic bytes at the start of every replay log.
pub const MAGIC: [u8; 4] = *b"TNDM";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
