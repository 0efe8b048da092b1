pub mod client;
pub mod enricher;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod roster;

pub use client::{MetadataClient, VideoItem, VideosApi, CHUNK_SIZE};
pub use enricher::{enrich, Diagnostic, EnrichedRow, EnrichmentOutcome};
pub use error::{ApiError, JudgeError};
pub use metadata::{MetadataRecord, MetadataTable, VideoId, Visibility};
pub use pipeline::{JobSettings, Pipeline, RunOutput, SheetOutput, SkippedSheet};
pub use roster::{CellValue, RosterRow, RosterSheet, RosterWorkbook};
