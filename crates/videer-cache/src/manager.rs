//! Cache manager: atomic writes, pins, age-based eviction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::fingerprint::Fingerprint;

/// Suffix for staged (not yet published) entries.
const PART_SUFFIX: &str = "part";

/// Kind of cached artifact; each kind gets its own subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Downloaded stock footage clips
    Footage,
    /// Synthesized narration audio
    Speech,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Footage => "footage",
            CacheKind::Speech => "speech",
        }
    }
}

/// Report returned by [`CacheManager::evict_older_than`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub files_removed: u64,
    pub bytes_reclaimed: u64,
}

/// Process-wide on-disk artifact store.
///
/// Cheap to clone; clones share the pin table, so one instance can be handed
/// to concurrently-running jobs.
#[derive(Debug, Clone)]
pub struct CacheManager {
    root: PathBuf,
    pins: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl CacheManager {
    /// Open a cache rooted at `root`, creating it if missing.
    pub async fn open(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(CacheError::InvalidRoot(root));
        }
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            pins: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path for an entry.
    pub fn entry_path(&self, kind: CacheKind, fp: &Fingerprint, ext: &str) -> PathBuf {
        self.root
            .join(kind.as_str())
            .join(format!("{}.{}", fp.as_str(), ext))
    }

    /// Look up an entry. Absent and zero-byte files are misses.
    pub async fn get(&self, kind: CacheKind, fp: &Fingerprint, ext: &str) -> Option<PathBuf> {
        let path = self.entry_path(kind, fp, ext);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Some(path),
            _ => None,
        }
    }

    /// Reserve a staged `.part` path for an entry and return a guard that
    /// deletes the partial file unless it is published.
    ///
    /// The staged path lives next to the final path, so publishing is a
    /// same-filesystem rename and readers never see partial data.
    pub async fn stage(
        &self,
        kind: CacheKind,
        fp: &Fingerprint,
        ext: &str,
    ) -> CacheResult<StagedEntry> {
        let final_path = self.entry_path(kind, fp, ext);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let staged_path = final_path.with_extension(format!("{}.{}", ext, PART_SUFFIX));
        self.pin_path(&staged_path);
        Ok(StagedEntry {
            pins: Arc::clone(&self.pins),
            staged_path,
            final_path,
            published: false,
        })
    }

    /// Store a byte buffer, returning the published path.
    pub async fn put_bytes(
        &self,
        kind: CacheKind,
        fp: &Fingerprint,
        ext: &str,
        bytes: &[u8],
    ) -> CacheResult<PathBuf> {
        let staged = self.stage(kind, fp, ext).await?;
        fs::write(staged.path(), bytes).await?;
        staged.publish().await
    }

    /// Ingest an existing file (e.g. the output of an external tool),
    /// returning the published path. The source is consumed.
    pub async fn put_file(
        &self,
        kind: CacheKind,
        fp: &Fingerprint,
        ext: &str,
        src: impl AsRef<Path>,
    ) -> CacheResult<PathBuf> {
        let staged = self.stage(kind, fp, ext).await?;
        move_file(src.as_ref(), staged.path()).await?;
        staged.publish().await
    }

    /// Pin an artifact for the duration of the returned guard. Pinned
    /// artifacts are skipped by [`Self::evict_older_than`].
    pub fn pin(&self, path: impl Into<PathBuf>) -> PinGuard {
        let path = path.into();
        self.pin_path(&path);
        PinGuard {
            pins: Arc::clone(&self.pins),
            path,
        }
    }

    fn pin_path(&self, path: &Path) {
        let mut pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        *pins.entry(path.to_path_buf()).or_insert(0) += 1;
    }

    fn is_pinned(&self, path: &Path) -> bool {
        let pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        pins.get(path).copied().unwrap_or(0) > 0
    }

    /// Delete unpinned entries whose modification time is older than
    /// `max_age`, plus abandoned `.part` files of any age.
    pub async fn evict_older_than(&self, max_age: Duration) -> CacheResult<CleanupReport> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut report = CleanupReport::default();

        for kind in [CacheKind::Footage, CacheKind::Speech] {
            let dir = self.root.join(kind.as_str());
            let mut entries = match fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(_) => continue,
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = match entry.metadata().await {
                    Ok(m) if m.is_file() => m,
                    _ => continue,
                };
                if self.is_pinned(&path) {
                    debug!(path = %path.display(), "skipping pinned cache entry");
                    continue;
                }

                let abandoned_part = path
                    .extension()
                    .is_some_and(|e| e == PART_SUFFIX);
                let expired = meta
                    .modified()
                    .map(|mtime| mtime < cutoff)
                    .unwrap_or(false);

                if abandoned_part || expired {
                    match fs::remove_file(&path).await {
                        Ok(()) => {
                            report.files_removed += 1;
                            report.bytes_reclaimed += meta.len();
                            debug!(path = %path.display(), "evicted cache entry");
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "failed to evict cache entry");
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}

/// RAII pin over a cache artifact. Dropping the guard releases the pin.
#[derive(Debug)]
pub struct PinGuard {
    pins: Arc<Mutex<HashMap<PathBuf, usize>>>,
    path: PathBuf,
}

impl PinGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        let mut pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = pins.get_mut(&self.path) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&self.path);
            }
        }
    }
}

/// A staged cache write: a `.part` path that becomes the final entry on
/// [`StagedEntry::publish`], or is deleted when the guard drops.
#[derive(Debug)]
pub struct StagedEntry {
    pins: Arc<Mutex<HashMap<PathBuf, usize>>>,
    staged_path: PathBuf,
    final_path: PathBuf,
    published: bool,
}

impl StagedEntry {
    /// The `.part` path to write into.
    pub fn path(&self) -> &Path {
        &self.staged_path
    }

    /// Atomically move the staged file into its final location.
    pub async fn publish(mut self) -> CacheResult<PathBuf> {
        fs::rename(&self.staged_path, &self.final_path).await?;
        self.published = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for StagedEntry {
    fn drop(&mut self) {
        let mut pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = pins.get_mut(&self.staged_path) {
            *count -= 1;
            if *count == 0 {
                pins.remove(&self.staged_path);
            }
        }
        drop(pins);

        if !self.published {
            // Abandoned download or synthesis: remove the partial file.
            if let Err(e) = std::fs::remove_file(&self.staged_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        path = %self.staged_path.display(),
                        error = %e,
                        "failed to remove abandoned staged file"
                    );
                }
            }
        }
    }
}

/// Move a file, falling back to copy-and-delete for cross-device moves.
///
/// The copy lands on a temp path in the destination directory first, so the
/// final step is always a same-filesystem rename.
async fn move_file(src: &Path, dst: &Path) -> CacheResult<()> {
    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "cross-device rename, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            let tmp_dst = dst.with_extension("xdev-tmp");
            fs::copy(src, &tmp_dst).await?;
            if let Err(e) = fs::rename(&tmp_dst, dst).await {
                let _ = std::fs::remove_file(&tmp_dst);
                return Err(CacheError::Io(e));
            }
            if let Err(e) = fs::remove_file(src).await {
                warn!(path = %src.display(), error = %e, "failed to remove source after move");
            }
            Ok(())
        }
        Err(e) => Err(CacheError::Io(e)),
    }
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}
