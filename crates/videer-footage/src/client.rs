//! Provider HTTP client (Pexels wire contract).

use futures::StreamExt;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use videer_models::{FootageCandidate, FootageQuery, Quality, VideoFile};

use crate::error::{FootageError, FootageResult};

/// Default provider endpoint.
const DEFAULT_BASE_URL: &str = "https://api.pexels.com/videos";

/// Request timeout for search calls.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout for downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "PEXELS_API_KEY";

/// Client for the stock footage provider.
#[derive(Debug, Clone)]
pub struct PexelsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Provider search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    videos: Vec<WireVideo>,
}

#[derive(Debug, Deserialize)]
struct WireVideo {
    id: u64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    url: String,
    #[serde(default)]
    user: WireUser,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUser {
    #[serde(default)]
    name: String,
}

impl From<WireVideo> for FootageCandidate {
    fn from(v: WireVideo) -> Self {
        Self {
            id: v.id,
            duration: v.duration,
            width: v.width,
            height: v.height,
            creator: v.user.name,
            page_url: v.url,
            files: v.video_files,
            local_path: None,
        }
    }
}

impl PexelsClient {
    /// Create a client with the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the `PEXELS_API_KEY` environment variable.
    ///
    /// A missing or placeholder key is a connection error the user can act
    /// on, not a crash.
    pub fn from_env() -> FootageResult<Self> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() && key != "your_api_key_here" => {
                Ok(Self::new(key.trim().to_string()))
            }
            _ => Err(FootageError::connection(format!(
                "{} is not set; get a free key at https://www.pexels.com/api/",
                API_KEY_VAR
            ))),
        }
    }

    /// Search for footage candidates.
    ///
    /// Zero results map to a search error; credential rejection and
    /// network failures map to connection errors.
    pub async fn search(&self, query: &FootageQuery) -> FootageResult<Vec<FootageCandidate>> {
        let url = format!("{}/search", self.base_url);
        debug!(keywords = %query.keywords, "searching footage provider");

        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query.keywords.as_str()),
                ("per_page", &query.clamped_count().to_string()),
                ("orientation", query.orientation.as_str()),
                ("size", query.min_size.as_str()),
            ])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| FootageError::connection(format!("provider unreachable: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(FootageError::connection(format!(
                "provider rejected the API key (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(FootageError::search(format!(
                "provider returned HTTP {} for query {:?}",
                status.as_u16(),
                query.keywords
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FootageError::search(format!("malformed provider response: {}", e)))?;

        if body.videos.is_empty() {
            return Err(FootageError::search(format!(
                "no results for query {:?}",
                query.keywords
            )));
        }

        debug!(
            total = body.total_results,
            returned = body.videos.len(),
            "provider search complete"
        );
        Ok(body.videos.into_iter().map(Into::into).collect())
    }

    /// Stream a download to `dest`, returning the byte count.
    ///
    /// The caller hands in a staged path; a failed transfer leaves cleanup
    /// to the staging guard, so no partial file survives.
    pub async fn download(&self, url: &str, dest: &Path) -> FootageResult<u64> {
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| FootageError::download(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FootageError::download(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| FootageError::download(format!("transfer failed: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            warn!(url = %url, "download produced an empty file");
            return Err(FootageError::download(format!("empty response body for {}", url)));
        }

        Ok(written)
    }

    /// Pick the download URL for a candidate at the requested quality,
    /// falling back to the first available rendition.
    pub fn pick_download_url<'a>(
        candidate: &'a FootageCandidate,
        quality: Quality,
    ) -> Option<&'a str> {
        candidate
            .files
            .iter()
            .find(|f| f.quality.as_deref() == Some(quality.as_str()))
            .or_else(|| candidate.files.first())
            .map(|f| f.link.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_with_files(files: Vec<VideoFile>) -> FootageCandidate {
        FootageCandidate {
            id: 1,
            duration: 10.0,
            width: 1920,
            height: 1080,
            creator: "tester".to_string(),
            page_url: String::new(),
            files,
            local_path: None,
        }
    }

    fn file(quality: &str, link: &str) -> VideoFile {
        VideoFile {
            quality: Some(quality.to_string()),
            link: link.to_string(),
            width: None,
            height: None,
        }
    }

    #[test]
    fn test_pick_exact_quality() {
        let c = candidate_with_files(vec![
            file("sd", "https://cdn/video_sd.mp4"),
            file("hd", "https://cdn/video_hd.mp4"),
        ]);
        assert_eq!(
            PexelsClient::pick_download_url(&c, Quality::Hd),
            Some("https://cdn/video_hd.mp4")
        );
        assert_eq!(
            PexelsClient::pick_download_url(&c, Quality::Sd),
            Some("https://cdn/video_sd.mp4")
        );
    }

    #[test]
    fn test_pick_falls_back_to_first() {
        let c = candidate_with_files(vec![file("sd", "https://cdn/only_sd.mp4")]);
        assert_eq!(
            PexelsClient::pick_download_url(&c, Quality::Hd),
            Some("https://cdn/only_sd.mp4")
        );
    }

    #[test]
    fn test_pick_none_without_files() {
        let c = candidate_with_files(vec![]);
        assert_eq!(PexelsClient::pick_download_url(&c, Quality::Hd), None);
    }
}
