//! Favorite articles and their on-disk persistence.
//!
//! The favorites file is a UTF-8 JSON array of `{title, description}`
//! records.  Every mutation rewrites the whole file; the write goes to a
//! temporary file in the same directory which is then renamed over the old
//! one, so a crash mid-write leaves the previous contents intact.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::source::RawArticle;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("favorites file {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Insertion-ordered set of articles keyed by structural equality.
///
/// Built from records with [`FromIterator`], which drops duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    items: Vec<RawArticle>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, article: &RawArticle) -> bool {
        self.items.contains(article)
    }

    /// Add `article` if absent, remove it if present.
    ///
    /// Returns the new membership.
    pub fn toggle(&mut self, article: &RawArticle) -> bool {
        match self.items.iter().position(|a| a == article) {
            Some(i) => {
                self.items.remove(i);
                false
            }
            None => {
                self.items.push(article.clone());
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawArticle> {
        self.items.iter()
    }
}

impl FromIterator<RawArticle> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = RawArticle>>(iter: I) -> Self {
        let mut set = FavoriteSet::new();
        for article in iter {
            if !set.contains(&article) {
                set.items.push(article);
            }
        }
        set
    }
}

/// Read the favorites file.
///
/// A missing file is an empty set.  Duplicate records collapse to one.
pub fn load(path: &Path) -> Result<FavoriteSet, PersistenceError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FavoriteSet::new()),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let records: Vec<RawArticle> =
        serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(records.into_iter().collect())
}

/// Atomically replace the favorites file with `set`.
pub fn save(path: &Path, set: &FavoriteSet) -> Result<(), PersistenceError> {
    let write_err = |source: io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let json = serde_json::to_vec_pretty(set).map_err(|e| write_err(e.into()))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), count = set.len(), "favorites saved");
    Ok(())
}

/// The favorite set together with the file that backs it.
#[derive(Debug)]
pub struct FavoriteStore {
    path: PathBuf,
    set: FavoriteSet,
}

impl FavoriteStore {
    /// Load favorites from `path`, recovering from a corrupt file.
    ///
    /// An unreadable or undecodable file is logged and treated as empty so
    /// the app still starts; the broken file is left in place until the next
    /// successful save replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let set = match load(&path) {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, "starting with no favorites");
                FavoriteSet::new()
            }
        };
        Self { path, set }
    }

    /// Write the current set on the blocking pool.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        let path = self.path.clone();
        let set = self.set.clone();
        tokio::task::spawn_blocking(move || save(&path, &set))
            .await
            .unwrap_or_else(|e| {
                Err(PersistenceError::Write {
                    path: self.path.clone(),
                    source: io::Error::other(e),
                })
            })
    }

    /// Flip membership and persist.  If the write fails the flip is undone,
    /// so memory never disagrees with disk.
    pub async fn toggle_and_save(
        &mut self,
        article: &RawArticle,
    ) -> Result<bool, PersistenceError> {
        let now_favorite = self.set.toggle(article);
        if let Err(e) = self.save().await {
            self.set.toggle(article);
            return Err(e);
        }
        Ok(now_favorite)
    }

    /// A consistent copy for a pipeline run.
    pub fn snapshot(&self) -> FavoriteSet {
        self.set.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn a(title: &str) -> RawArticle {
        RawArticle::new(title, format!("{title} body"))
    }

    #[test]
    fn double_toggle_restores_membership() {
        let mut set = FavoriteSet::new();
        set.toggle(&a("keep"));
        let before = set.clone();

        assert!(set.toggle(&a("x")));
        assert!(!set.toggle(&a("x")));
        assert_eq!(set, before);

        assert!(!set.toggle(&a("keep")));
        assert!(set.toggle(&a("keep")));
        assert!(set.contains(&a("keep")));
    }

    #[test]
    fn toggle_preserves_insertion_order() {
        let mut set = FavoriteSet::new();
        set.toggle(&a("1"));
        set.toggle(&a("2"));
        set.toggle(&a("3"));
        set.toggle(&a("2"));

        let titles: Vec<_> = set.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["1", "3"]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let set = load(&dir.path().join("favorites.json")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn save_then_load_keeps_order_and_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let set: FavoriteSet = vec![a("東京"), a("Paris")].into_iter().collect();

        save(&path, &set).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("東京"), "non-ASCII text is written as-is");
        assert_eq!(load(&path).unwrap(), set);
    }

    #[test]
    fn invalid_json_is_decode_error_but_open_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load(&path), Err(PersistenceError::Decode { .. })));

        let store = FavoriteStore::open(&path);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn duplicate_records_on_disk_collapse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        std::fs::write(
            &path,
            r#"[{"title":"A","description":"B"},{"title":"A","description":"B"}]"#,
        )
        .unwrap();

        assert_eq!(load(&path).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let mut store = FavoriteStore::open(&path);

        store.toggle_and_save(&a("one")).await.unwrap();
        store.toggle_and_save(&a("two")).await.unwrap();
        store.toggle_and_save(&a("one")).await.unwrap();

        let on_disk = load(&path).unwrap();
        assert_eq!(on_disk.iter().cloned().collect::<Vec<_>>(), vec![a("two")]);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "no temp files left behind");
    }

    #[tokio::test]
    async fn failed_save_reverts_toggle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("favorites.json");
        let mut store = FavoriteStore::open(&path);

        let err = store.toggle_and_save(&a("x")).await.unwrap_err();

        assert!(matches!(err, PersistenceError::Write { .. }));
        assert!(!store.snapshot().contains(&a("x")));
    }
}
