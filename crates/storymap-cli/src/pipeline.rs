//! The extract-and-merge cycle, plus route lookup.
//!
//! All session state is explicit: a [`Session`] owns the store and the
//! configured service credentials, and each operation loads, transforms and
//! persists a map in one pass. One cycle runs to completion before the next
//! starts; a failed extraction or resolution aborts before anything is
//! written, so the stored map is never half-updated.

use std::path::{Path, PathBuf};

use anyhow::Context;
use storymap_core::{PlaceMap, RawMention, ReconcileSummary, TagRules, reconcile};
use storymap_extract::{Extractor, LlmExtractor, RuleBasedExtractor, fetch_text};
use storymap_geo::{DirectionsClient, GeoClient, Route, TravelMode};
use storymap_store::MapStore;
use tracing::{info, warn};

/// Which extraction backend(s) a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ner,
    Llm,
    Both,
}

/// Where the source text comes from.
#[derive(Debug, Clone)]
pub enum TextSource {
    File(PathBuf),
    Url(String),
    Stdin,
}

/// Session-scoped context: the open store and service credentials.
pub struct Session {
    pub store: MapStore,
    llm_api_key: Option<String>,
    geo_api_key: Option<String>,
}

impl Session {
    pub fn open(
        data_dir: &Path,
        llm_api_key: Option<String>,
        geo_api_key: Option<String>,
    ) -> Result<Self, storymap_store::StoreError> {
        Ok(Self {
            store: MapStore::open(data_dir)?,
            llm_api_key,
            geo_api_key,
        })
    }

    /// Run one full cycle: read text, extract, resolve, merge, persist.
    pub async fn run_extract(
        &self,
        map_name: &str,
        source: TextSource,
        backend: Backend,
        near: Option<String>,
    ) -> anyhow::Result<ReconcileSummary> {
        let text = read_source(source).await?;
        anyhow::ensure!(!text.trim().is_empty(), "source text is empty");

        let mentions = self.run_backends(&text, backend).await?;
        info!(count = mentions.len(), "extraction finished");

        let geo = self.geo_client(near)?;
        let resolved = geo
            .resolve_batch(&mentions)
            .await
            .context("geocoding failed; map left untouched")?;

        let map = self.store.load_or_create(map_name)?;
        let (merged, summary) = reconcile(&map, &resolved, &TagRules::default());

        self.store.save(&merged)?;
        self.store.save_artifacts(&merged)?;
        Ok(summary)
    }

    /// Route between two places already on a map. Pass-through only.
    pub async fn run_route(
        &self,
        map: &PlaceMap,
        from: &str,
        to: &str,
        via: &[String],
        mode: TravelMode,
    ) -> anyhow::Result<Option<Route>> {
        let origin = find_place(map, from)?;
        let destination = find_place(map, to)?;
        let waypoints: Vec<(f64, f64)> = via
            .iter()
            .map(|id| find_place(map, id).map(|p| (p.lat, p.lng)))
            .collect::<anyhow::Result<_>>()?;

        let key = self.geo_key()?;
        let client = DirectionsClient::new(key);
        Ok(client
            .route(
                (origin.lat, origin.lng),
                (destination.lat, destination.lng),
                &waypoints,
                mode,
            )
            .await?)
    }

    /// Run the requested backend(s), concatenating their mentions.
    ///
    /// Each backend surfaces its own result; with `Both`, one failure
    /// degrades to a warning as long as the other backend ran. Every
    /// requested backend failing aborts the cycle.
    async fn run_backends(
        &self,
        text: &str,
        backend: Backend,
    ) -> anyhow::Result<Vec<RawMention>> {
        let mut backends: Vec<Box<dyn Extractor>> = Vec::new();
        match backend {
            Backend::Ner => backends.push(Box::new(RuleBasedExtractor::new())),
            Backend::Llm => backends.push(Box::new(self.llm_extractor()?)),
            Backend::Both => {
                backends.push(Box::new(RuleBasedExtractor::new()));
                match self.llm_extractor() {
                    Ok(llm) => backends.push(Box::new(llm)),
                    Err(e) => warn!(error = %e, "llm backend unavailable, continuing without it"),
                }
            }
        }

        let mut mentions = Vec::new();
        let mut failures = 0;
        let mut last_error = None;
        for extractor in &backends {
            match extractor.extract(text).await {
                Ok(found) => {
                    info!(backend = extractor.name(), count = found.len(), "backend finished");
                    mentions.extend(found);
                }
                Err(e) => {
                    warn!(backend = extractor.name(), error = %e, "backend failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if failures == backends.len()
            && let Some(e) = last_error
        {
            return Err(anyhow::Error::new(e).context("every extraction backend failed"));
        }
        Ok(mentions)
    }

    fn llm_extractor(&self) -> anyhow::Result<LlmExtractor> {
        let key = self
            .llm_api_key
            .as_ref()
            .context("LLM API key required (--llm-api-key or STORYMAP_LLM_API_KEY)")?;
        Ok(LlmExtractor::new(key))
    }

    fn geo_key(&self) -> anyhow::Result<&str> {
        self.geo_api_key
            .as_deref()
            .context("geocoding API key required (--geo-api-key or STORYMAP_GEO_API_KEY)")
    }

    fn geo_client(&self, near: Option<String>) -> anyhow::Result<GeoClient> {
        let mut client = GeoClient::new(self.geo_key()?);
        if let Some(bias) = near {
            client = client.with_locality_bias(bias);
        }
        Ok(client)
    }
}

async fn read_source(source: TextSource) -> anyhow::Result<String> {
    match source {
        TextSource::File(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display())),
        TextSource::Url(url) => Ok(fetch_text(&url).await?),
        TextSource::Stdin => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn find_place<'a>(map: &'a PlaceMap, id: &str) -> anyhow::Result<&'a storymap_core::Place> {
    map.find(id)
        .with_context(|| format!("no place with id {id} on '{}'", map.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path(), None, None).unwrap();
        (dir, session)
    }

    #[tokio::test]
    async fn ner_backend_extracts_without_keys() {
        let (_dir, session) = session();
        let mentions = session
            .run_backends("We stayed in Lisbon.", Backend::Ner)
            .await
            .unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].text, "Lisbon");
    }

    #[test]
    fn llm_backend_without_key_fails() {
        let (_dir, session) = session();
        assert!(session.llm_extractor().is_err());
    }

    #[tokio::test]
    async fn both_degrades_to_ner_without_llm_key() {
        let (_dir, session) = session();
        let mentions = session
            .run_backends("We stayed in Lisbon.", Backend::Both)
            .await
            .unwrap();
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn missing_geo_key_is_an_error() {
        let (_dir, session) = session();
        assert!(session.geo_key().is_err());
    }
}
