pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod output;
pub mod utils;

pub use crate::config::{ColumnMapping, Config};
pub use crate::core::{
    enrich, Diagnostic, EnrichedRow, EnrichmentOutcome, JudgeError, MetadataClient,
    MetadataRecord, MetadataTable, Pipeline, RosterSheet, RosterWorkbook, RunOutput, VideoId,
    VideosApi, Visibility,
};
pub use crate::extractors::{extract_video_id, YouTubeDataApi};
