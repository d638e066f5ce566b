use std::fmt;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable identity for a media source, derived from its locator.
///
/// FNV-1a over the locator bytes, rendered as hex. The same locator maps to
/// the same identity across runs and builds, so cache directories survive
/// restarts. Hash collisions between distinct locators are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceIdentity(String);

impl SourceIdentity {
    pub fn from_locator(locator: &str) -> Self {
        let mut hash = FNV_OFFSET_BASIS;
        for byte in locator.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        Self(format!("{hash:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addresses one transcribed segment of one source.
///
/// `start_ms` is always a multiple of the configured segment duration; keys
/// are produced via [`crate::shared::timing::round_to_boundary`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    pub source: SourceIdentity,
    pub start_ms: u64,
}

impl SegmentKey {
    pub fn new(source: SourceIdentity, start_ms: u64) -> Self {
        Self { source, start_ms }
    }
}
