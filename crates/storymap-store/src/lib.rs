//! Persisted map storage: one JSON document per named map, plus derived
//! HTML and share-link artifacts.
//!
//! The store owns the map lifecycle. Maps are created on first save and
//! replaced whole on every save (write-to-temp-then-rename, so a racing
//! reader never sees a partial document; last writer wins). User edits go
//! through [`MapStore::apply_edit`], the same owned path as reconciled
//! updates — nothing mutates a stored map in place.

mod error;
pub mod render;

pub use error::StoreError;

use std::fs;
use std::path::{Path, PathBuf};

use storymap_core::{PlaceMap, Sentiment};
use tracing::{debug, info};

/// File-backed store keyed by map name.
pub struct MapStore {
    data_dir: PathBuf,
}

impl MapStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn map_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.map_path(name).is_file()
    }

    /// Load a map by name.
    pub fn load(&self, name: &str) -> Result<PlaceMap, StoreError> {
        let path = self.map_path(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let json = fs::read_to_string(&path)?;
        let map: PlaceMap = serde_json::from_str(&json)?;
        debug!(name, places = map.places.len(), "loaded map");
        Ok(map)
    }

    /// Load a map, or start an empty one if it does not exist yet.
    pub fn load_or_create(&self, name: &str) -> Result<PlaceMap, StoreError> {
        match self.load(name) {
            Ok(map) => Ok(map),
            Err(StoreError::NotFound(_)) => Ok(PlaceMap::new(name)),
            Err(e) => Err(e),
        }
    }

    /// Persist a map, replacing any previous version atomically.
    ///
    /// The id-uniqueness invariant is re-checked on every save; a duplicate
    /// aborts the save with nothing written.
    pub fn save(&self, map: &PlaceMap) -> Result<(), StoreError> {
        if let Some(id) = map.duplicate_id() {
            return Err(StoreError::InvariantViolation {
                map: map.name.clone(),
                id: id.to_string(),
            });
        }

        let path = self.map_path(&map.name);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(map)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        info!(name = %map.name, places = map.places.len(), "saved map");
        Ok(())
    }

    /// Names of all stored maps, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove a map and its derived artifacts. Explicit user action only —
    /// reconciliation never deletes.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.map_path(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        for artifact in [
            self.data_dir.join(format!("{name}.html")),
            self.data_dir.join(format!("{name}_url.txt")),
        ] {
            if artifact.is_file() {
                fs::remove_file(&artifact)?;
            }
        }
        info!(name, "deleted map");
        Ok(())
    }

    /// Apply a user edit to one place and persist the result.
    ///
    /// Unlike extraction-sourced updates, an explicit edit may override a
    /// known sentiment.
    pub fn apply_edit(
        &self,
        map: &mut PlaceMap,
        id: &str,
        note: Option<String>,
        sentiment: Option<Sentiment>,
    ) -> Result<(), StoreError> {
        let place = map
            .places
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::PlaceNotFound(id.to_string()))?;

        if let Some(note) = note {
            place.note = note;
        }
        if let Some(sentiment) = sentiment {
            place.sentiment = sentiment;
        }
        map.updated_at = chrono::Utc::now();
        self.save(map)
    }

    /// Write the derived artifacts next to the map document: the rendered
    /// HTML page and, when the map has places, a shareable directions link.
    /// Read-only outputs — never read back by the pipeline.
    pub fn save_artifacts(&self, map: &PlaceMap) -> Result<PathBuf, StoreError> {
        let html_path = self.data_dir.join(format!("{}.html", map.name));
        fs::write(&html_path, render::render_html(map))?;

        if let Some(url) = render::share_url(map) {
            fs::write(self.data_dir.join(format!("{}_url.txt", map.name)), url)?;
        }
        debug!(name = %map.name, "wrote map artifacts");
        Ok(html_path)
    }
}
