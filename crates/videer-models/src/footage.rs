//! Footage queries and provider candidates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Clip orientation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            "square" => Ok(Orientation::Square),
            other => Err(format!(
                "unknown orientation {:?} (expected landscape, portrait or square)",
                other
            )),
        }
    }
}

/// Download quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Hd,
    Sd,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hd => "hd",
            Quality::Sd => "sd",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hd" => Ok(Quality::Hd),
            "sd" => Ok(Quality::Sd),
            other => Err(format!("unknown quality {:?} (expected hd or sd)", other)),
        }
    }
}

/// Minimum size tier, as understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MinSize {
    Large,
    #[default]
    Medium,
    Small,
}

impl MinSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinSize::Large => "large",
            MinSize::Medium => "medium",
            MinSize::Small => "small",
        }
    }

    /// Minimum long-edge pixel count implied by the tier
    /// (large = 4K, medium = Full HD, small = HD).
    pub fn min_long_edge(&self) -> u32 {
        match self {
            MinSize::Large => 3840,
            MinSize::Medium => 1920,
            MinSize::Small => 1280,
        }
    }
}

impl fmt::Display for MinSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MinSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "large" => Ok(MinSize::Large),
            "medium" => Ok(MinSize::Medium),
            "small" => Ok(MinSize::Small),
            other => Err(format!(
                "unknown size {:?} (expected large, medium or small)",
                other
            )),
        }
    }
}

/// Job-level footage search preferences, applied to every segment's query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootagePrefs {
    /// Candidates requested per segment.
    pub count: u32,
    pub orientation: Orientation,
    pub quality: Quality,
    pub min_size: MinSize,
}

impl Default for FootagePrefs {
    fn default() -> Self {
        Self {
            count: 5,
            orientation: Orientation::default(),
            quality: Quality::default(),
            min_size: MinSize::default(),
        }
    }
}

impl FootagePrefs {
    /// Build the query for one segment's search text.
    pub fn query_for(&self, keywords: impl Into<String>) -> FootageQuery {
        FootageQuery {
            keywords: keywords.into(),
            count: self.count,
            orientation: self.orientation,
            quality: self.quality,
            min_size: self.min_size,
        }
    }
}

/// A footage search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootageQuery {
    /// Search keywords.
    pub keywords: String,
    /// Number of candidates requested (provider accepts 1-80).
    pub count: u32,
    pub orientation: Orientation,
    pub quality: Quality,
    pub min_size: MinSize,
}

impl FootageQuery {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            count: 5,
            orientation: Orientation::default(),
            quality: Quality::default(),
            min_size: MinSize::default(),
        }
    }

    /// Clamp `count` to the provider's accepted range.
    pub fn clamped_count(&self) -> u32 {
        self.count.clamp(1, 80)
    }

    /// Canonical string for cache fingerprinting. Every semantic parameter
    /// participates; two distinct queries never share this string.
    pub fn fingerprint_input(&self) -> String {
        format!(
            "footage-search\x1f{}\x1f{}\x1f{}\x1f{}\x1f{}",
            self.keywords,
            self.clamped_count(),
            self.orientation,
            self.quality,
            self.min_size
        )
    }
}

/// One downloadable rendition of a provider video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub quality: Option<String>,
    pub link: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// A provider search result, optionally resolved to a local cache entry.
///
/// `local_path` is either absent or points to a fully-written file; a failed
/// download never leaves a populated path behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootageCandidate {
    /// Provider-assigned id.
    pub id: u64,
    /// Declared duration in seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Creator attribution.
    pub creator: String,
    /// Provider page URL.
    pub page_url: String,
    /// Downloadable renditions by quality.
    pub files: Vec<VideoFile>,
    /// Local cache path, populated after a successful download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl FootageCandidate {
    /// Long edge of the declared resolution.
    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Whether the declared resolution meets a size tier.
    pub fn meets(&self, min_size: MinSize) -> bool {
        self.long_edge() >= min_size.min_long_edge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_clamped() {
        let mut q = FootageQuery::new("sunset");
        q.count = 500;
        assert_eq!(q.clamped_count(), 80);
        q.count = 0;
        assert_eq!(q.clamped_count(), 1);
    }

    #[test]
    fn test_fingerprint_input_distinguishes_params() {
        let a = FootageQuery::new("sunset beach");
        let mut b = a.clone();
        b.orientation = Orientation::Portrait;
        assert_ne!(a.fingerprint_input(), b.fingerprint_input());
    }

    #[test]
    fn test_size_tiers() {
        let candidate = FootageCandidate {
            id: 1,
            duration: 10.0,
            width: 1920,
            height: 1080,
            creator: "someone".to_string(),
            page_url: String::new(),
            files: vec![],
            local_path: None,
        };
        assert!(candidate.meets(MinSize::Medium));
        assert!(candidate.meets(MinSize::Small));
        assert!(!candidate.meets(MinSize::Large));
    }
}
