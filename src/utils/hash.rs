// Tue Jan 20 2026 - Alex

use std::fmt;

const FNV_PRIME: u64 = 0x00000100000001B3;
const FNV_OFFSET: u64 = 0xcbf29ce484222325;

/// Digests used for content addressing and seed derivation.
pub struct HashComputer;

impl HashComputer {
    /// FNV-1a (64-bit)
    pub fn fnv1a_64(data: &[u8]) -> u64 {
        Self::fnv1a_64_continue(FNV_OFFSET, data)
    }

    /// Continue an FNV-1a digest from a previous state.
    pub fn fnv1a_64_continue(state: u64, data: &[u8]) -> u64 {
        let mut hash = state;
        for byte in data {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    /// Mix several byte strings into one digest. Each part is length-prefixed
    /// so ("ab", "c") and ("a", "bc") never collide.
    pub fn fnv1a_64_parts(parts: &[&[u8]]) -> u64 {
        let mut hash = FNV_OFFSET;
        for part in parts {
            hash = Self::fnv1a_64_continue(hash, &(part.len() as u64).to_le_bytes());
            hash = Self::fnv1a_64_continue(hash, part);
        }
        hash
    }
}

/// A 64-bit content digest rendered as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub u64);

impl Digest {
    pub fn of(data: &[u8]) -> Self {
        Digest(HashComputer::fnv1a_64(data))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
