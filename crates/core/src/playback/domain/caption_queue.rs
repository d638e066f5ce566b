use crate::shared::constants::{CAPTION_CHUNK_CHARS, CAPTION_QUEUE_CAPACITY};

/// Rolling buffer of caption lines currently on screen.
///
/// A pushed transcript is split into fixed-width chunks, each enqueued as
/// its own line. After every push the oldest lines are evicted until the
/// queue is back under capacity, so a long transcript immediately scrolls
/// earlier lines out.
#[derive(Debug)]
pub struct CaptionQueue {
    lines: Vec<String>,
    chunk_chars: usize,
    capacity: usize,
}

impl CaptionQueue {
    pub fn new() -> Self {
        Self::with_limits(CAPTION_CHUNK_CHARS, CAPTION_QUEUE_CAPACITY)
    }

    pub fn with_limits(chunk_chars: usize, capacity: usize) -> Self {
        Self {
            lines: Vec::new(),
            chunk_chars,
            capacity,
        }
    }

    pub fn push(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(self.chunk_chars) {
            self.lines.push(chunk.iter().collect());
        }
        while self.lines.len() >= self.capacity {
            self.lines.remove(0);
        }
    }

    /// Surviving lines in display order, newest last.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined with newlines for rendering.
    pub fn snapshot(&self) -> String {
        self.lines.join("\n")
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for CaptionQueue {
    fn default() -> Self {
        Self::new()
    }
}
