pub mod youtube;

pub use youtube::{extract_video_id, extract_video_id_str, YouTubeDataApi};
