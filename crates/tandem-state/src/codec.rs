//! Binary encode/decode for game state and commands.
//!
//! All integers are little-endian. Strings and byte arrays are length-prefixed
//! with a `u32` length. Fixed-point values are written as their raw `i32`.
//!
//! # State layout
//!
//! ```text
//! [MAGIC "TNDS"] [VERSION u8] [FLAGS u8]
//! [frame u64] [seed u64]
//! [entity count u32] [Entity]*     ascending id
//! [player count u32] [Player]*     ascending id
//! [body count u32]   [Body]*       only when FLAGS & HAS_BODIES
//! ```
//!
//! Decoding fails fast on the first problem. A partially decoded state is
//! never returned.

use std::io::{Read, Write};

use tandem_core::{EntityId, Fixed, FrameId, PlayerId, Vec2};
use tandem_space::{Aabb, BodyKind, CollisionBody};

use crate::command::{Action, Command};
use crate::entity::{Entity, EntityKind, EntityPayload};
use crate::error::CodecError;
use crate::player::Player;
use crate::state::GameStateData;

/// Magic bytes at the start of every encoded state.
pub const STATE_MAGIC: [u8; 4] = *b"TNDS";

/// Current state format version.
pub const STATE_FORMAT_VERSION: u8 = 1;

/// Flag bit: a body section follows the players.
const HAS_BODIES: u8 = 0b0000_0001;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CodecError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a boolean as one byte (`0` or `1`).
pub fn write_bool(w: &mut dyn Write, v: bool) -> Result<(), CodecError> {
    write_u8(w, v as u8)
}

/// Write a little-endian u16.
pub fn write_u16_le(w: &mut dyn Write, v: u16) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a [`Fixed`] as its raw little-endian i32.
pub fn write_fixed(w: &mut dyn Write, v: Fixed) -> Result<(), CodecError> {
    write_i32_le(w, v.raw())
}

/// Write a [`Vec2`] as two raw fixed-point values.
pub fn write_vec2(w: &mut dyn Write, v: Vec2) -> Result<(), CodecError> {
    write_fixed(w, v.x)?;
    write_fixed(w, v.y)
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), CodecError> {
    write_length_prefixed_bytes(w, s.as_bytes())
}

/// Write a length-prefixed byte array (u32 length + bytes).
pub fn write_length_prefixed_bytes(w: &mut dyn Write, b: &[u8]) -> Result<(), CodecError> {
    let len = u32::try_from(b.len()).map_err(|_| CodecError::Malformed {
        detail: format!("byte array of {} bytes exceeds u32 length prefix", b.len()),
    })?;
    write_u32_le(w, len)?;
    w.write_all(b)?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a boolean written by [`write_bool`]. Any byte other than 0 or 1
/// is rejected.
pub fn read_bool(r: &mut dyn Read) -> Result<bool, CodecError> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::Malformed {
            detail: format!("invalid bool byte {other}"),
        }),
    }
}

/// Read a little-endian u16.
pub fn read_u16_le(r: &mut dyn Read) -> Result<u16, CodecError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read a raw [`Fixed`].
pub fn read_fixed(r: &mut dyn Read) -> Result<Fixed, CodecError> {
    Ok(Fixed::from_raw(read_i32_le(r)?))
}

/// Read a [`Vec2`].
pub fn read_vec2(r: &mut dyn Read) -> Result<Vec2, CodecError> {
    Ok(Vec2::new(read_fixed(r)?, read_fixed(r)?))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, CodecError> {
    let buf = read_length_prefixed_bytes(r)?;
    String::from_utf8(buf).map_err(|e| CodecError::Malformed {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

/// Read a length-prefixed byte array.
///
/// The buffer grows only as bytes actually arrive, so a corrupt length
/// prefix cannot force a huge allocation.
pub fn read_length_prefixed_bytes(r: &mut dyn Read) -> Result<Vec<u8>, CodecError> {
    let len = read_u32_le(r)? as u64;
    let mut buf = Vec::new();
    (&mut *r).take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(CodecError::Malformed {
            detail: format!("truncated byte array: got {} of {len} bytes", buf.len()),
        });
    }
    Ok(buf)
}

// ── Entities, players, bodies ───────────────────────────────────

const PAYLOAD_NONE: u8 = 0;
const PAYLOAD_AVATAR: u8 = 1;
const PAYLOAD_PROJECTILE: u8 = 2;
const PAYLOAD_PICKUP: u8 = 3;
const PAYLOAD_PLATFORM: u8 = 4;

/// Encode one entity.
pub fn encode_entity(w: &mut dyn Write, e: &Entity) -> Result<(), CodecError> {
    write_u32_le(w, e.id.0)?;
    write_u8(w, e.kind.tag())?;
    write_vec2(w, e.position)?;
    write_vec2(w, e.velocity)?;
    write_i32_le(w, e.health)?;
    write_bool(w, e.active)?;
    match e.payload {
        None => write_u8(w, PAYLOAD_NONE)?,
        Some(EntityPayload::Avatar { facing, jumps_left }) => {
            write_u8(w, PAYLOAD_AVATAR)?;
            write_u8(w, facing as u8)?;
            write_u8(w, jumps_left)?;
        }
        Some(EntityPayload::Projectile { owner, ttl }) => {
            write_u8(w, PAYLOAD_PROJECTILE)?;
            write_u32_le(w, owner.0)?;
            write_u16_le(w, ttl)?;
        }
        Some(EntityPayload::Pickup { points }) => {
            write_u8(w, PAYLOAD_PICKUP)?;
            write_i32_le(w, points)?;
        }
        Some(EntityPayload::Platform { size }) => {
            write_u8(w, PAYLOAD_PLATFORM)?;
            write_vec2(w, size)?;
        }
    }
    Ok(())
}

/// Decode one entity.
pub fn decode_entity(r: &mut dyn Read) -> Result<Entity, CodecError> {
    let id = EntityId(read_u32_le(r)?);
    let kind_tag = read_u8(r)?;
    let kind = EntityKind::from_tag(kind_tag).ok_or(CodecError::UnknownTag {
        kind: "entity kind",
        tag: kind_tag,
    })?;
    let position = read_vec2(r)?;
    let velocity = read_vec2(r)?;
    let health = read_i32_le(r)?;
    let active = read_bool(r)?;
    let payload = match read_u8(r)? {
        PAYLOAD_NONE => None,
        PAYLOAD_AVATAR => Some(EntityPayload::Avatar {
            facing: read_u8(r)? as i8,
            jumps_left: read_u8(r)?,
        }),
        PAYLOAD_PROJECTILE => Some(EntityPayload::Projectile {
            owner: PlayerId(read_u32_le(r)?),
            ttl: read_u16_le(r)?,
        }),
        PAYLOAD_PICKUP => Some(EntityPayload::Pickup {
            points: read_i32_le(r)?,
        }),
        PAYLOAD_PLATFORM => Some(EntityPayload::Platform {
            size: read_vec2(r)?,
        }),
        tag => {
            return Err(CodecError::UnknownTag {
                kind: "entity payload",
                tag,
            })
        }
    };
    Ok(Entity {
        id,
        kind,
        position,
        velocity,
        health,
        active,
        payload,
    })
}

/// Encode one player. A missing entity is written as id `0`.
pub fn encode_player(w: &mut dyn Write, p: &Player) -> Result<(), CodecError> {
    write_u32_le(w, p.id.0)?;
    write_u32_le(w, p.entity_raw())?;
    write_length_prefixed_str(w, &p.name)?;
    write_i32_le(w, p.score)?;
    write_bool(w, p.connected)?;
    Ok(())
}

/// Decode one player.
pub fn decode_player(r: &mut dyn Read) -> Result<Player, CodecError> {
    let id = PlayerId(read_u32_le(r)?);
    let entity = match read_u32_le(r)? {
        0 => None,
        raw => Some(EntityId(raw)),
    };
    Ok(Player {
        id,
        entity,
        name: read_length_prefixed_str(r)?,
        score: read_i32_le(r)?,
        connected: read_bool(r)?,
    })
}

/// Encode one collision body.
pub fn encode_body(w: &mut dyn Write, b: &CollisionBody) -> Result<(), CodecError> {
    write_u32_le(w, b.entity.0)?;
    write_u8(w, b.kind.tag())?;
    write_vec2(w, b.shape.min)?;
    write_vec2(w, b.shape.max)?;
    Ok(())
}

/// Decode one collision body.
pub fn decode_body(r: &mut dyn Read) -> Result<CollisionBody, CodecError> {
    let entity = EntityId(read_u32_le(r)?);
    let tag = read_u8(r)?;
    let kind = BodyKind::from_tag(tag).ok_or(CodecError::UnknownTag {
        kind: "body kind",
        tag,
    })?;
    let min = read_vec2(r)?;
    let max = read_vec2(r)?;
    Ok(CollisionBody::new(entity, Aabb::new(min, max), kind))
}

// ── State encode/decode ─────────────────────────────────────────

/// Encode a state. Bodies are written only when `with_bodies` is set.
///
/// Fails with [`CodecError::Malformed`] if the state does not pass
/// [`GameStateData::validate`]; such a state could not be decoded.
pub fn encode_state_data(
    w: &mut dyn Write,
    data: &GameStateData,
    with_bodies: bool,
) -> Result<(), CodecError> {
    check_references(data)?;
    w.write_all(&STATE_MAGIC)?;
    write_u8(w, STATE_FORMAT_VERSION)?;
    write_u8(w, if with_bodies { HAS_BODIES } else { 0 })?;
    write_u64_le(w, data.frame.0)?;
    write_u64_le(w, data.seed)?;

    write_count(w, data.entities.len())?;
    for e in &data.entities {
        encode_entity(w, e)?;
    }
    write_count(w, data.players.len())?;
    for p in &data.players {
        encode_player(w, p)?;
    }
    if with_bodies {
        write_count(w, data.bodies.len())?;
        for b in &data.bodies {
            encode_body(w, b)?;
        }
    }
    Ok(())
}

/// Decode and validate a state.
///
/// Entity, player, and body ids must be non-zero and strictly ascending.
/// Player and body references must pass [`GameStateData::validate`].
pub fn decode_state_data(r: &mut dyn Read) -> Result<GameStateData, CodecError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != STATE_MAGIC {
        return Err(CodecError::InvalidMagic {
            expected: STATE_MAGIC,
        });
    }
    let version = read_u8(r)?;
    if version != STATE_FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }
    let flags = read_u8(r)?;
    if flags & !HAS_BODIES != 0 {
        return Err(CodecError::Malformed {
            detail: format!("unknown state flags {flags:#04x}"),
        });
    }

    let frame = FrameId(read_u64_le(r)?);
    let seed = read_u64_le(r)?;

    let entities = read_sorted(r, "entity", decode_entity, |e| e.id.0)?;
    let players = read_sorted(r, "player", decode_player, |p| p.id.0)?;
    let bodies = if flags & HAS_BODIES != 0 {
        read_sorted(r, "body", decode_body, |b| b.entity.0)?
    } else {
        Vec::new()
    };

    let data = GameStateData {
        frame,
        seed,
        entities,
        players,
        bodies,
    };
    check_references(&data)?;
    Ok(data)
}

fn check_references(data: &GameStateData) -> Result<(), CodecError> {
    data.validate().map_err(|e| CodecError::Malformed {
        detail: e.to_string(),
    })
}

/// Decode a state that must occupy all of `bytes`.
pub fn decode_state_data_exact(bytes: &[u8]) -> Result<GameStateData, CodecError> {
    let mut cursor = bytes;
    let data = decode_state_data(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CodecError::Malformed {
            detail: format!("{} trailing bytes after state", cursor.len()),
        });
    }
    Ok(data)
}

fn write_count(w: &mut dyn Write, n: usize) -> Result<(), CodecError> {
    let n = u32::try_from(n).map_err(|_| CodecError::Malformed {
        detail: format!("count {n} exceeds u32"),
    })?;
    write_u32_le(w, n)
}

fn read_sorted<T>(
    r: &mut dyn Read,
    what: &str,
    decode: fn(&mut dyn Read) -> Result<T, CodecError>,
    key: fn(&T) -> u32,
) -> Result<Vec<T>, CodecError> {
    let count = read_u32_le(r)?;
    let mut out: Vec<T> = Vec::new();
    let mut prev = 0u32;
    for _ in 0..count {
        let item = decode(r)?;
        let id = key(&item);
        if id <= prev {
            return Err(CodecError::Malformed {
                detail: format!("{what} id {id} not strictly ascending (after {prev})"),
            });
        }
        prev = id;
        out.push(item);
    }
    Ok(out)
}

// ── Command encode/decode ───────────────────────────────────────

/// Encode one command: frame, player, action tag, action fields.
pub fn encode_command(w: &mut dyn Write, cmd: &Command) -> Result<(), CodecError> {
    write_u64_le(w, cmd.frame.0)?;
    write_u32_le(w, cmd.player.0)?;
    write_u8(w, cmd.action.tag())?;
    match &cmd.action {
        Action::Join { name } => write_length_prefixed_str(w, name)?,
        Action::Leave | Action::Idle => {}
        Action::Move { velocity } => write_vec2(w, *velocity)?,
        Action::Jump { impulse } => write_fixed(w, *impulse)?,
        Action::Attack { target, damage } => {
            write_u32_le(w, target.0)?;
            write_i32_le(w, *damage)?;
        }
        Action::Fire { velocity, ttl } => {
            write_vec2(w, *velocity)?;
            write_u16_le(w, *ttl)?;
        }
    }
    Ok(())
}

/// Decode one command.
pub fn decode_command(r: &mut dyn Read) -> Result<Command, CodecError> {
    let frame = FrameId(read_u64_le(r)?);
    let player = PlayerId(read_u32_le(r)?);
    let action = match read_u8(r)? {
        0 => Action::Join {
            name: read_length_prefixed_str(r)?,
        },
        1 => Action::Leave,
        2 => Action::Move {
            velocity: read_vec2(r)?,
        },
        3 => Action::Jump {
            impulse: read_fixed(r)?,
        },
        4 => Action::Attack {
            target: EntityId(read_u32_le(r)?),
            damage: read_i32_le(r)?,
        },
        5 => Action::Fire {
            velocity: read_vec2(r)?,
            ttl: read_u16_le(r)?,
        },
        6 => Action::Idle,
        tag => return Err(CodecError::UnknownTag { kind: "action", tag }),
    };
    Ok(Command::new(frame, player, action))
}

/// Encode a command batch (u32 count + commands).
pub fn encode_commands(w: &mut dyn Write, cmds: &[Command]) -> Result<(), CodecError> {
    write_count(w, cmds.len())?;
    for c in cmds {
        encode_command(w, c)?;
    }
    Ok(())
}

/// Decode a command batch written by [`encode_commands`].
pub fn decode_commands(r: &mut dyn Read) -> Result<Vec<Command>, CodecError> {
    let count = read_u32_le(r)?;
    let mut out = Vec::new();
    for _ in 0..count {
        out.push(decode_command(r)?);
    }
    Ok(out)
}
