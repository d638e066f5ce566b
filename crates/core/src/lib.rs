pub mod audio;
pub mod cache;
pub mod extraction;
pub mod pipeline;
pub mod playback;
pub mod shared;
pub mod transcription;
