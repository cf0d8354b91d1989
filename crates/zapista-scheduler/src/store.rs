//! Durable job store: a single JSON document, written atomically.
//!
//! The whole job list is small (hundreds to thousands of entries), so every
//! mutation rewrites the entire file rather than attempting incremental
//! serialization — a temp file is written alongside the target and renamed
//! into place, which is atomic on the same filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::CronJob;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    jobs: Vec<CronJob>,
}

/// In-memory mirror of the on-disk document. Every public mutation persists
/// before returning.
pub struct JobStore {
    path: PathBuf,
    jobs: Vec<CronJob>,
}

impl JobStore {
    /// Load the store from `path`, creating an empty one if the file does
    /// not yet exist. A missing parent directory is created.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let jobs = match fs::read(&path) {
            Ok(bytes) => {
                let doc: StoreDocument = serde_json::from_slice(&bytes)?;
                debug!(count = doc.jobs.len(), path = %path.display(), "loaded cron store");
                doc.jobs
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cron store yet; starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, jobs })
    }

    pub fn jobs(&self) -> &[CronJob] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&CronJob> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CronJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn existing_ids(&self) -> std::collections::HashSet<String> {
        self.jobs.iter().map(|j| j.id.clone()).collect()
    }

    pub fn insert(&mut self, job: CronJob) -> Result<()> {
        self.jobs.push(job);
        self.persist()
    }

    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        let removed = self.jobs.len() != before;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Persist any in-place mutation made via [`Self::get_mut`].
    pub fn save(&self) -> Result<()> {
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let doc = StoreDocument {
            version: STORE_VERSION,
            jobs: self.jobs.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zapista_core::reminder::CronPayload;
    use zapista_core::types::Owner;

    fn sample_job(id: &str) -> CronJob {
        CronJob {
            id: id.to_string(),
            owner: Owner::new("whatsapp", "5511999998888"),
            name: "test".to_string(),
            enabled: true,
            schedule: crate::types::CronSchedule::At { at_ms: 1_000 },
            payload: CronPayload::agent_turn("hi", "whatsapp", "5511999998888"),
            state: Default::default(),
            created_at_ms: 0,
            updated_at_ms: 0,
            delete_after_run: false,
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir("round-trip");
        let path = dir.join("jobs.json");

        let mut store = JobStore::load(&path).unwrap();
        store.insert(sample_job("RM01")).unwrap();

        let reloaded = JobStore::load(&path).unwrap();
        assert_eq!(reloaded.jobs().len(), 1);
        assert_eq!(reloaded.jobs()[0].id, "RM01");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn remove_persists_and_reload_reflects_it() {
        let dir = tempdir("remove");
        let path = dir.join("jobs.json");

        let mut store = JobStore::load(&path).unwrap();
        store.insert(sample_job("RM01")).unwrap();
        assert!(store.remove("RM01").unwrap());

        let reloaded = JobStore::load(&path).unwrap();
        assert!(reloaded.jobs().is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    fn tempdir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "zapista-scheduler-test-{}-{}",
            std::process::id(),
            label
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
