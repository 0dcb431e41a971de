pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
pub mod http_video_store;
pub mod local_video_store;
