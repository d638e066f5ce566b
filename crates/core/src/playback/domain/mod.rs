pub mod caption_queue;
pub mod caption_renderer;
pub mod playback_clock;
