use crate::config::Config;
use crate::core::error::ApiError;
use crate::core::roster::CellValue;
use crate::core::{VideoId, VideoItem, VideosApi, Visibility};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use url::Url;

lazy_static! {
    // Tried in order; the first match wins.
    static ref VIDEO_ID_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11}).*").unwrap(),
        Regex::new(r"(?:youtu\.be/)([0-9A-Za-z_-]{11})").unwrap(),
        Regex::new(r"(?:embed/)([0-9A-Za-z_-]{11})").unwrap(),
    ];
}

/// Pulls the 11-character video id out of a YouTube link.
///
/// Watch, shorts, short-link and embed URLs all resolve. Anything else,
/// including non-text cells, yields `None`.
pub fn extract_video_id(value: &CellValue) -> Option<VideoId> {
    extract_video_id_str(value.as_text()?)
}

pub fn extract_video_id_str(url: &str) -> Option<VideoId> {
    VIDEO_ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|m| VideoId::new(m.as_str()))
    })
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    status: VideoStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus {
    #[serde(default)]
    privacy_status: String,
}

impl From<VideoResource> for VideoItem {
    fn from(resource: VideoResource) -> Self {
        VideoItem {
            id: VideoId::new(resource.id),
            duration: resource.content_details.duration,
            visibility: Visibility::from(resource.status.privacy_status),
        }
    }
}

/// `videos.list` client for the YouTube Data API v3.
pub struct YouTubeDataApi {
    client: reqwest::Client,
    endpoint: Url,
}

impl YouTubeDataApi {
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = Url::parse(&config.api_endpoint)
            .with_context(|| format!("invalid API endpoint: {}", config.api_endpoint))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl VideosApi for YouTubeDataApi {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn list_videos(&self, api_key: &str, ids: &[VideoId]) -> Result<Vec<VideoItem>, ApiError> {
        let joined = ids.iter().map(VideoId::as_str).collect::<Vec<_>>().join(",");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("part", "contentDetails,status"), ("id", joined.as_str()), ("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("videos.list returned {} for {} ids", status, ids.len());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_video_list(&body)
    }
}

fn parse_video_list(body: &str) -> Result<Vec<VideoItem>, ApiError> {
    let response: VideoListResponse = serde_json::from_str(body)?;
    Ok(response.items.into_iter().map(VideoItem::from).collect())
}
