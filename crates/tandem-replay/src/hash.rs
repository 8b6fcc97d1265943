//! FNV-1a hashing for configuration fingerprints.
//!
//! These hashes are not cryptographically secure. They let a replay log
//! refuse to play under a configuration other than the one it was
//! recorded with.

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Incremental 64-bit FNV-1a hasher over little-endian encodings.
///
/// # Examples
///
/// ```
/// use tandem_replay::hash::{fnv1a, Fnv1a};
///
/// let mut h = Fnv1a::new();
/// h.write_u32(7);
/// assert_eq!(h.finish(), fnv1a(&7u32.to_le_bytes()));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a(u64);

impl Fnv1a {
    /// A hasher at the offset basis.
    pub fn new() -> Self {
        Self(FNV_OFFSET)
    }

    /// Feed raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 ^ b as u64).wrapping_mul(FNV_PRIME);
        }
    }

    /// Feed one byte.
    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    /// Feed a u32 as 4 LE bytes.
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed an i32 as 4 LE bytes.
    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a u64 as 8 LE bytes.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// The current hash value.
    pub fn finish(&self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

/// FNV-1a over a byte slice.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h = Fnv1a::new();
    h.write(bytes);
    h.finish()
}

/// Hash a configuration's canonical encoding.
///
/// The caller supplies the encoding; any field that affects simulation
/// results must be part of it.
pub fn config_hash(encoded: &[u8]) -> u64 {
    fnv1a(encoded)
}
