use crate::core::error::ApiError;
use crate::core::{MetadataRecord, MetadataTable, VideoId, Visibility};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, error};

/// Batch limit of the YouTube Data API `videos.list` endpoint.
pub const CHUNK_SIZE: usize = 50;

/// One entry of a `videos.list` response.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoItem {
    pub id: VideoId,
    pub duration: String,
    pub visibility: Visibility,
}

/// Transport for a single batched metadata request of at most
/// [`CHUNK_SIZE`] ids.
#[async_trait]
pub trait VideosApi: Send + Sync {
    fn name(&self) -> &'static str;
    async fn list_videos(&self, api_key: &str, ids: &[VideoId]) -> Result<Vec<VideoItem>, ApiError>;
}

pub struct MetadataClient<A: VideosApi> {
    api: A,
}

impl<A: VideosApi> MetadataClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Looks up every id, one request per chunk. A failed chunk is reported
    /// and its ids stay absent; the remaining chunks are still fetched.
    pub async fn fetch(&self, api_key: &str, ids: &BTreeSet<VideoId>) -> MetadataTable {
        let mut table = MetadataTable::new();
        if api_key.is_empty() || ids.is_empty() {
            return table;
        }

        let ids: Vec<VideoId> = ids.iter().cloned().collect();
        for (index, chunk) in ids.chunks(CHUNK_SIZE).enumerate() {
            debug!("{}: requesting chunk {} ({} ids)", self.api.name(), index + 1, chunk.len());

            match self.api.list_videos(api_key, chunk).await {
                Ok(items) => {
                    for item in items {
                        // The API may echo ids we never asked for
                        if !chunk.contains(&item.id) {
                            continue;
                        }
                        table.insert(item.id, MetadataRecord::new(item.duration, item.visibility));
                    }
                }
                Err(e) => {
                    error!("YouTube API communication error ({} ids skipped): {}", chunk.len(), e);
                }
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers every id as public except those listed in `missing`,
    /// and fails any chunk containing an id from `failing`.
    struct FakeApi {
        calls: Mutex<Vec<usize>>,
        missing: Vec<String>,
        failing: Vec<String>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                missing: Vec::new(),
                failing: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl VideosApi for FakeApi {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn list_videos(&self, _api_key: &str, ids: &[VideoId]) -> Result<Vec<VideoItem>, ApiError> {
            self.calls.lock().unwrap().push(ids.len());
            if ids.iter().any(|id| self.failing.iter().any(|f| f == id.as_str())) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "backend error".to_string(),
                });
            }
            Ok(ids
                .iter()
                .filter(|id| !self.missing.iter().any(|m| m == id.as_str()))
                .map(|id| VideoItem {
                    id: id.clone(),
                    duration: "PT1M".to_string(),
                    visibility: Visibility::Public,
                })
                .collect())
        }
    }

    fn ids(count: usize) -> BTreeSet<VideoId> {
        (0..count).map(|i| VideoId::new(format!("vid{:08}", i))).collect()
    }

    #[tokio::test]
    async fn test_fetch_splits_into_chunks_of_fifty() {
        let client = MetadataClient::new(FakeApi::new());
        let table = client.fetch("key", &ids(120)).await;

        assert_eq!(*client.api().calls.lock().unwrap(), vec![50, 50, 20]);
        assert_eq!(table.len(), 120);
    }

    #[tokio::test]
    async fn test_fetch_without_key_or_ids_makes_no_request() {
        let client = MetadataClient::new(FakeApi::new());

        assert!(client.fetch("", &ids(3)).await.is_empty());
        assert!(client.fetch("key", &BTreeSet::new()).await.is_empty());
        assert!(client.api().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_omits_ids_the_api_does_not_return() {
        let mut api = FakeApi::new();
        api.missing.push("vid00000001".to_string());
        let client = MetadataClient::new(api);

        let requested = ids(3);
        let table = client.fetch("key", &requested).await;

        assert_eq!(table.len(), 2);
        assert!(!table.contains_key(&VideoId::new("vid00000001")));
        assert!(table.keys().all(|id| requested.contains(id)));
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_the_others() {
        let mut api = FakeApi::new();
        // lands in the second chunk
        api.failing.push("vid00000060".to_string());
        let client = MetadataClient::new(api);

        let table = client.fetch("key", &ids(120)).await;

        assert_eq!(client.api().calls.lock().unwrap().len(), 3);
        assert_eq!(table.len(), 70);
        assert!(table.contains_key(&VideoId::new("vid00000000")));
        assert!(!table.contains_key(&VideoId::new("vid00000060")));
        assert!(table.contains_key(&VideoId::new("vid00000119")));
    }
}
