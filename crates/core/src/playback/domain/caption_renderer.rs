/// Rendering surface for caption lines, implemented by the embedding UI.
pub trait CaptionRenderer: Send {
    /// Replace the displayed cues with `lines`, newest last.
    fn set_cues(&mut self, lines: &[String]);

    /// Remove all displayed cues.
    fn clear(&mut self);
}
