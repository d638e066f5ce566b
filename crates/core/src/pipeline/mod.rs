pub mod preload_subtitles_use_case;
