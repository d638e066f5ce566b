pub mod fs_subtitle_cache;
