/// Read-only view of the external player's clock.
pub trait PlaybackClock: Send {
    fn position_ms(&self) -> u64;
}
