//! Footage resolution: search, rank, download into the cache.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use videer_cache::{CacheKind, CacheManager, Fingerprint};
use videer_models::{FootageCandidate, FootageQuery, MinSize, Quality};

use crate::client::PexelsClient;
use crate::error::{FootageError, FootageResult};
use crate::retry::RetryPolicy;

/// A candidate that could not be downloaded after retries.
#[derive(Debug)]
pub struct ResolveFailure {
    pub candidate_id: u64,
    pub error: FootageError,
}

/// Result of resolving one query: successfully cached candidates in
/// selection order, plus recorded per-candidate failures.
#[derive(Debug)]
pub struct ResolveOutcome {
    pub candidates: Vec<FootageCandidate>,
    pub failures: Vec<ResolveFailure>,
}

/// Order candidates by the selection policy: candidates meeting the size
/// tier come first, closest-above-tier resolution first, longer duration
/// breaking ties (longer clips reduce the need for chaining downstream).
/// The provider's own ordering is not trusted to be size-monotonic.
pub fn rank_candidates(
    mut candidates: Vec<FootageCandidate>,
    min_size: MinSize,
) -> Vec<FootageCandidate> {
    candidates.sort_by(|a, b| {
        let a_meets = a.meets(min_size);
        let b_meets = b.meets(min_size);
        b_meets
            .cmp(&a_meets)
            .then_with(|| {
                if a_meets && b_meets {
                    a.long_edge().cmp(&b.long_edge())
                } else {
                    b.long_edge().cmp(&a.long_edge())
                }
            })
            .then_with(|| {
                b.duration
                    .partial_cmp(&a.duration)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    candidates
}

/// Resolves footage queries into locally cached clips.
///
/// Safe to invoke concurrently across segments sharing one cache manager;
/// downloads for a single query run with bounded parallelism.
pub struct FootageResolver {
    client: PexelsClient,
    cache: CacheManager,
    retry: RetryPolicy,
    max_parallel: usize,
}

impl FootageResolver {
    pub fn new(client: PexelsClient, cache: CacheManager, retry: RetryPolicy) -> Self {
        Self {
            client,
            cache,
            retry,
            max_parallel: 2,
        }
    }

    /// Limit concurrent downloads within one query.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Resolve a query: search, rank, then download every returned
    /// candidate through the cache. A failed download is recorded and the
    /// remaining candidates still resolve; only the search itself can fail
    /// the whole call.
    pub async fn resolve(&self, query: &FootageQuery) -> FootageResult<ResolveOutcome> {
        let found = self
            .retry
            .retry_if(
                "footage-search",
                FootageError::is_retryable,
                || self.client.search(query),
            )
            .await?;

        let ranked = rank_candidates(found, query.min_size);
        info!(
            keywords = %query.keywords,
            candidates = ranked.len(),
            "resolving footage candidates"
        );

        let results: Vec<Result<FootageCandidate, ResolveFailure>> = stream::iter(
            ranked
                .into_iter()
                .map(|candidate| self.fetch_candidate(candidate, query.quality)),
        )
        .buffered(self.max_parallel)
        .collect()
        .await;

        let mut outcome = ResolveOutcome {
            candidates: Vec::new(),
            failures: Vec::new(),
        };
        for result in results {
            match result {
                Ok(candidate) => outcome.candidates.push(candidate),
                Err(failure) => {
                    warn!(
                        candidate_id = failure.candidate_id,
                        error = %failure.error,
                        "candidate download failed"
                    );
                    outcome.failures.push(failure);
                }
            }
        }
        Ok(outcome)
    }

    /// Download one candidate through the cache, with retries. Partial
    /// files never survive: each attempt writes to a staged path that is
    /// deleted unless published.
    async fn fetch_candidate(
        &self,
        mut candidate: FootageCandidate,
        quality: Quality,
    ) -> Result<FootageCandidate, ResolveFailure> {
        let fp = download_fingerprint(candidate.id, quality);

        if let Some(path) = self.cache.get(CacheKind::Footage, &fp, "mp4").await {
            debug!(candidate_id = candidate.id, "footage cache hit");
            candidate.local_path = Some(path);
            return Ok(candidate);
        }

        let url = match PexelsClient::pick_download_url(&candidate, quality) {
            Some(url) => url.to_string(),
            None => {
                return Err(ResolveFailure {
                    candidate_id: candidate.id,
                    error: FootageError::download(format!(
                        "candidate {} has no downloadable rendition",
                        candidate.id
                    )),
                })
            }
        };

        let attempt = || async {
            let staged = self.cache.stage(CacheKind::Footage, &fp, "mp4").await?;
            self.client.download(&url, staged.path()).await?;
            Ok::<_, FootageError>(staged.publish().await?)
        };

        match self
            .retry
            .retry_if("footage-download", FootageError::is_retryable, attempt)
            .await
        {
            Ok(path) => {
                candidate.local_path = Some(path);
                Ok(candidate)
            }
            Err(error) => Err(ResolveFailure {
                candidate_id: candidate.id,
                error,
            }),
        }
    }
}

/// Cache fingerprint for a candidate download.
fn download_fingerprint(candidate_id: u64, quality: Quality) -> Fingerprint {
    Fingerprint::of(&format!(
        "footage-download\x1f{}\x1f{}",
        candidate_id, quality
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate(id: u64, width: u32, height: u32, duration: f64) -> FootageCandidate {
        FootageCandidate {
            id,
            duration,
            width,
            height,
            creator: String::new(),
            page_url: String::new(),
            files: vec![],
            local_path: None,
        }
    }

    #[test]
    fn test_rank_prefers_closest_above_tier() {
        let ranked = rank_candidates(
            vec![
                candidate(1, 3840, 2160, 10.0),
                candidate(2, 1920, 1080, 10.0),
                candidate(3, 1280, 720, 10.0),
            ],
            MinSize::Medium,
        );
        let ids: Vec<u64> = ranked.iter().map(|c| c.id).collect();
        // 1920 meets the tier most tightly; 4K next; 720p fails the tier.
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_rank_breaks_resolution_ties_by_duration() {
        let ranked = rank_candidates(
            vec![
                candidate(1, 1920, 1080, 8.0),
                candidate(2, 1920, 1080, 30.0),
            ],
            MinSize::Medium,
        );
        assert_eq!(ranked[0].id, 2);
    }

    fn wire_video(id: u64, link: &str) -> serde_json::Value {
        json!({
            "id": id,
            "duration": 12,
            "width": 1920,
            "height": 1080,
            "url": format!("https://provider/video/{id}"),
            "user": {"name": "creator"},
            "video_files": [
                {"quality": "hd", "link": link, "width": 1920, "height": 1080}
            ]
        })
    }

    async fn mock_provider() -> (MockServer, PexelsClient) {
        let server = MockServer::start().await;
        let client = PexelsClient::with_base_url("test-key", server.uri());
        (server, client)
    }

    fn test_query() -> FootageQuery {
        let mut q = FootageQuery::new("sunset beach");
        q.count = 5;
        q
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(2)
            .with_base_delay(Duration::from_millis(1))
            .without_jitter()
    }

    #[tokio::test]
    async fn test_search_sends_credential_and_params() {
        let (server, client) = mock_provider().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(header("Authorization", "test-key"))
            .and(query_param("query", "sunset beach"))
            .and(query_param("per_page", "5"))
            .and(query_param("orientation", "landscape"))
            .and(query_param("size", "medium"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 1,
                "videos": [wire_video(11, "https://cdn/11.mp4")]
            })))
            .mount(&server)
            .await;

        let found = client.search(&test_query()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 11);
        assert_eq!(found[0].creator, "creator");
    }

    #[tokio::test]
    async fn test_search_rejected_key_is_connection_error() {
        let (server, client) = mock_provider().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client.search(&test_query()).await.unwrap_err();
        assert!(matches!(err, FootageError::Connection(_)));
    }

    #[tokio::test]
    async fn test_search_zero_results_is_search_error() {
        let (server, client) = mock_provider().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 0,
                "videos": []
            })))
            .mount(&server)
            .await;

        let err = client.search(&test_query()).await.unwrap_err();
        assert!(matches!(err, FootageError::Search(_)));
    }

    #[tokio::test]
    async fn test_resolve_isolates_failed_downloads() {
        let (server, client) = mock_provider().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::open(dir.path()).await.unwrap();

        let videos: Vec<_> = (1..=5u64)
            .map(|id| wire_video(id, &format!("{}/files/{}.mp4", server.uri(), id)))
            .collect();

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 5,
                "videos": videos
            })))
            .mount(&server)
            .await;

        // Three candidates download fine, two always fail.
        for id in [1u64, 2, 3] {
            Mock::given(method("GET"))
                .and(path(format!("/files/{}.mp4", id)))
                .respond_with(
                    ResponseTemplate::new(200).set_body_bytes(format!("clip-{}", id)),
                )
                .mount(&server)
                .await;
        }
        for id in [4u64, 5] {
            Mock::given(method("GET"))
                .and(path(format!("/files/{}.mp4", id)))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;
        }

        let resolver = FootageResolver::new(client, cache.clone(), fast_retry());
        let outcome = resolver.resolve(&test_query()).await.unwrap();

        assert_eq!(outcome.candidates.len(), 3);
        assert_eq!(outcome.failures.len(), 2);
        for c in &outcome.candidates {
            let local = c.local_path.as_ref().unwrap();
            assert!(local.exists());
        }
        for f in &outcome.failures {
            assert!(matches!(f.error, FootageError::Download(_)));
        }

        // No partial files anywhere in the cache.
        let footage_dir = dir.path().join("footage");
        let mut read = tokio::fs::read_dir(&footage_dir).await.unwrap();
        let mut published = 0;
        while let Some(entry) = read.next_entry().await.unwrap() {
            let name = entry.file_name();
            let name = name.to_string_lossy().into_owned();
            assert!(!name.ends_with(".part"), "partial file left behind: {}", name);
            published += 1;
        }
        assert_eq!(published, 3);
    }

    #[tokio::test]
    async fn test_resolve_hits_cache_on_second_run() {
        let (server, client) = mock_provider().await;
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::open(dir.path()).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 1,
                "videos": [wire_video(7, &format!("{}/files/7.mp4", server.uri()))]
            })))
            .mount(&server)
            .await;

        // The file endpoint only tolerates a single request.
        Mock::given(method("GET"))
            .and(path("/files/7.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes("clip-7"))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = FootageResolver::new(client, cache, fast_retry());
        let first = resolver.resolve(&test_query()).await.unwrap();
        let second = resolver.resolve(&test_query()).await.unwrap();

        assert_eq!(first.candidates.len(), 1);
        assert_eq!(second.candidates.len(), 1);
        assert_eq!(
            first.candidates[0].local_path,
            second.candidates[0].local_path
        );
    }
}
