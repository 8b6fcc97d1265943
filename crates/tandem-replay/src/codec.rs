//! Binary encoding for the replay log.
//!
//! All integers are little-endian. Primitives and command encoding are
//! shared with the state codec in [`tandem_state::codec`].
//!
//! ```text
//! header: [MAGIC 4] [VERSION u8] [config_hash u64] [initial state: len u32 + bytes]
//! frame:  [frame u64] [command_count u32] [command]* [checksum u32]
//! ```

use std::io::{ErrorKind, Read, Write};

use tandem_core::FrameId;
use tandem_state::codec::{
    decode_commands, decode_state_data_exact, encode_commands, encode_state_data,
    read_length_prefixed_bytes, read_u32_le, read_u64_le, read_u8, write_length_prefixed_bytes,
    write_u32_le, write_u64_le, write_u8,
};
use tandem_state::{Checksum, CodecError};

use crate::error::ReplayError;
use crate::types::{Frame, ReplayHeader};
use crate::{FORMAT_VERSION, MAGIC};

/// Write the replay header.
pub fn encode_header(w: &mut dyn Write, header: &ReplayHeader) -> Result<(), ReplayError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u64_le(w, header.config_hash)?;

    let mut state = Vec::new();
    encode_state_data(&mut state, &header.initial, false)?;
    write_length_prefixed_bytes(w, &state)?;
    Ok(())
}

/// Read and validate the replay header.
pub fn decode_header(r: &mut dyn Read) -> Result<ReplayHeader, ReplayError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::InvalidMagic { expected: MAGIC }.into());
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version }.into());
    }
    let config_hash = read_u64_le(r)?;
    let state = read_length_prefixed_bytes(r)?;
    let initial = decode_state_data_exact(&state)?;
    Ok(ReplayHeader {
        config_hash,
        initial,
    })
}

/// Write one frame record.
pub fn encode_frame(w: &mut dyn Write, frame: &Frame) -> Result<(), ReplayError> {
    write_u64_le(w, frame.frame.0)?;
    encode_commands(w, &frame.commands)?;
    write_u32_le(w, frame.checksum.0)?;
    Ok(())
}

/// Read one frame record, or `None` at a clean end of stream.
///
/// A stream that ends partway through the frame number is truncated and
/// reported as malformed.
pub fn decode_frame(r: &mut dyn Read) -> Result<Option<Frame>, ReplayError> {
    let mut buf = [0u8; 8];
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(CodecError::Malformed {
                    detail: format!("truncated frame header: got {filled} of 8 bytes"),
                }
                .into());
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let frame = FrameId(u64::from_le_bytes(buf));

    let commands = decode_commands(r)?;
    if let Some(c) = commands.iter().find(|c| c.frame != frame) {
        return Err(CodecError::Malformed {
            detail: format!("command for frame {} stored under frame {frame}", c.frame),
        }
        .into());
    }
    let checksum = Checksum(read_u32_le(r)?);
    Ok(Some(Frame {
        frame,
        commands,
        checksum,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{PlayerId, Vec2};
    use tandem_state::{Action, Command, EntityDef, EntityKind, GameState};

    fn header() -> ReplayHeader {
        let mut s = GameState::new(99);
        s.add_entity(EntityDef::new(EntityKind::Ship).at(Vec2::from_ints(3, 4)));
        ReplayHeader {
            config_hash: 0xABCD,
            initial: s.create_snapshot(),
        }
    }

    #[test]
    fn header_round_trip() {
        let h = header();
        let mut buf = Vec::new();
        encode_header(&mut buf, &h).unwrap();
        assert_eq!(&buf[..4], b"TNDM");
        let back = decode_header(&mut buf.as_slice()).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &header()).unwrap();

        let mut bad = buf.clone();
        bad[0] = b'X';
        assert!(matches!(
            decode_header(&mut bad.as_slice()),
            Err(ReplayError::Codec(CodecError::InvalidMagic { .. }))
        ));

        let mut bad = buf;
        bad[4] = 77;
        assert!(matches!(
            decode_header(&mut bad.as_slice()),
            Err(ReplayError::Codec(CodecError::UnsupportedVersion { found: 77 }))
        ));
    }

    #[test]
    fn frame_round_trip_and_clean_eof() {
        let f = Frame {
            frame: FrameId(7),
            commands: vec![Command::new(
                FrameId(7),
                PlayerId(1),
                Action::Move {
                    velocity: Vec2::from_ints(-1, 0),
                },
            )],
            checksum: Checksum(0xFEED),
        };
        let mut buf = Vec::new();
        encode_frame(&mut buf, &f).unwrap();
        let mut cursor = buf.as_slice();
        assert_eq!(decode_frame(&mut cursor).unwrap(), Some(f));
        assert_eq!(decode_frame(&mut cursor).unwrap(), None);
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let mut buf = Vec::new();
        encode_frame(
            &mut buf,
            &Frame {
                frame: FrameId(1),
                commands: vec![],
                checksum: Checksum(1),
            },
        )
        .unwrap();
        let err = decode_frame(&mut &buf[..3]).unwrap_err();
        assert!(matches!(err, ReplayError::Codec(CodecError::Malformed { .. })));

        // Header intact, checksum cut short.
        let err = decode_frame(&mut &buf[..buf.len() - 1]).unwrap_err();
        assert!(matches!(err, ReplayError::Codec(CodecError::Io(_))));
    }

    #[test]
    fn command_frame_must_match_record() {
        let f = Frame {
            frame: FrameId(2),
            commands: vec![Command::new(FrameId(3), PlayerId(1), Action::Idle)],
            checksum: Checksum(0),
        };
        let mut buf = Vec::new();
        encode_frame(&mut buf, &f).unwrap();
        assert!(decode_frame(&mut buf.as_slice()).is_err());
    }
}
