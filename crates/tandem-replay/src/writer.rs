//! Replay recording writer.
//!
//! [`ReplayWriter`] streams frames to any `Write` sink. The header is
//! written immediately on construction.

use std::io::Write;

use tandem_core::FrameId;
use tandem_state::{Checksum, Command};

use crate::codec::{encode_frame, encode_header};
use crate::error::ReplayError;
use crate::types::{Frame, ReplayHeader};

/// Writes a replay log to a byte stream.
///
/// Frames must be written in consecutive order starting at the header's
/// initial frame.
///
/// # Examples
///
/// ```
/// use tandem_core::FrameId;
/// use tandem_replay::{ReplayHeader, ReplayReader, ReplayWriter};
/// use tandem_state::{Checksum, GameState};
///
/// let header = ReplayHeader {
///     config_hash: 0,
///     initial: GameState::new(7).create_snapshot(),
/// };
///
/// let mut buf = Vec::new();
/// let mut writer = ReplayWriter::new(&mut buf, &header).unwrap();
/// writer.write_frame(FrameId(0), &[], Checksum(10)).unwrap();
/// writer.write_frame(FrameId(1), &[], Checksum(11)).unwrap();
/// assert_eq!(writer.frames_written(), 2);
/// drop(writer);
///
/// let mut reader = ReplayReader::open(buf.as_slice()).unwrap();
/// assert_eq!(reader.header(), &header);
/// assert_eq!(reader.next_frame().unwrap().unwrap().checksum, Checksum(10));
/// assert_eq!(reader.next_frame().unwrap().unwrap().frame, FrameId(1));
/// assert!(reader.next_frame().unwrap().is_none());
/// ```
pub struct ReplayWriter<W: Write> {
    writer: W,
    next: FrameId,
    frames_written: u64,
}

impl<W: Write> ReplayWriter<W> {
    /// Create a writer, immediately writing the header.
    pub fn new(mut writer: W, header: &ReplayHeader) -> Result<Self, ReplayError> {
        encode_header(&mut writer, header)?;
        Ok(Self {
            writer,
            next: header.start_frame(),
            frames_written: 0,
        })
    }

    /// Record the canonical commands applied at `frame` and the checksum
    /// of the state they produced.
    pub fn write_frame(
        &mut self,
        frame: FrameId,
        commands: &[Command],
        checksum: Checksum,
    ) -> Result<(), ReplayError> {
        self.write_raw_frame(&Frame {
            frame,
            commands: commands.to_vec(),
            checksum,
        })
    }

    /// Write a pre-built frame.
    pub fn write_raw_frame(&mut self, frame: &Frame) -> Result<(), ReplayError> {
        if frame.frame != self.next {
            return Err(ReplayError::FrameOutOfOrder {
                expected: self.next,
                found: frame.frame,
            });
        }
        encode_frame(&mut self.writer, frame)?;
        self.next = frame.frame.next();
        self.frames_written += 1;
        Ok(())
    }

    /// Frame the next record must carry.
    pub fn next_frame(&self) -> FrameId {
        self.next
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
