pub mod subtitle_cache;
