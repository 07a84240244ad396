//! Content hashing for change detection.
//!
//! BLAKE3 is used everywhere: `compute` for quick equality checks (config
//! reloads) and [`Fingerprinter`] for the hex fingerprints persisted in the
//! build manifest.

/// 64-bit digest of `bytes`, for in-memory change detection.
pub fn compute(bytes: &[u8]) -> u64 {
    let hash = blake3::hash(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Hex-encoded BLAKE3 digest of `bytes`.
pub fn hex_digest(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Incremental fingerprint builder.
///
/// Every field is length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// never collide.
#[derive(Default)]
pub struct Fingerprinter {
    hasher: blake3::Hasher,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    pub fn str_field(&mut self, value: &str) -> &mut Self {
        self.field(value.as_bytes())
    }

    pub fn finish(&self) -> String {
        hex::encode(self.hasher.finalize().as_bytes())
    }
}
