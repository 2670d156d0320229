//! Reconciles the on-device store with the cloud mirror: writes land locally
//! first and are pushed in the background, reads prefer the cloud and fall
//! back to the local store.

use color_eyre::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    persist::{
        LocalStore,
        model::{Entry, sort_newest_first},
    },
    remote::RemoteStore,
};

/// What to do when the cloud answers a read with a non-empty result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// The cloud result wins outright. Entries that only exist locally stay
    /// invisible until the next reconcile pushes them up.
    #[default]
    Replace,
    /// Union by id, cloud wins on conflict.
    Merge,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub pushed: usize,
    pub failed: usize,
}

pub struct Synchronizer<R: RemoteStore> {
    local: LocalStore,
    remote: Option<R>,
    read_policy: ReadPolicy,
}

impl<R: RemoteStore> Synchronizer<R> {
    pub fn new(local: LocalStore, remote: Option<R>, read_policy: ReadPolicy) -> Self {
        Self {
            local,
            remote,
            read_policy,
        }
    }

    /// Persist an entry. The local write must succeed and its failure is the
    /// caller's problem; the cloud push happens on a detached task whose
    /// errors are logged here and nowhere else. A lost push heals on the
    /// next save of the same id or the next reconcile.
    pub async fn save(&mut self, record: &Entry) -> Result<()> {
        self.local.put(record)?;

        if let Some(remote) = &self.remote {
            let remote = remote.clone();
            let record = record.clone();
            tokio::spawn(async move {
                if let Err(err) = remote.upsert(&record).await {
                    warn!("background push of entry {} failed: {err:?}", record.id);
                }
            });
        }
        Ok(())
    }

    /// All entries, newest id first. A non-empty cloud read is applied under
    /// the configured [`ReadPolicy`]; an empty or failed one falls back to
    /// the local store.
    pub async fn load(&mut self) -> Result<Vec<Entry>> {
        if let Some(remote) = &self.remote {
            match remote.list_all().await {
                Ok(rows) if rows.is_empty() => {
                    debug!("cloud returned no entries, using local store");
                }
                Ok(rows) => {
                    let mut entries = match self.read_policy {
                        ReadPolicy::Replace => rows,
                        ReadPolicy::Merge => merge_by_id(self.local.get_all()?, rows),
                    };
                    sort_newest_first(&mut entries);
                    return Ok(entries);
                }
                Err(err) => warn!("cloud read failed, using local store: {err:?}"),
            }
        }

        let mut entries = self.local.get_all()?;
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    /// Push every local entry to the cloud, one at a time. Per-item failures
    /// are counted, never propagated; with no cloud configured everything
    /// counts as failed.
    pub async fn reconcile_all_local_to_remote(&mut self) -> Result<ReconcileReport> {
        let entries = self.local.get_all()?;

        let Some(remote) = &self.remote else {
            debug!("no cloud store configured, nothing to reconcile against");
            return Ok(ReconcileReport {
                pushed: 0,
                failed: entries.len(),
            });
        };

        let mut report = ReconcileReport::default();
        for record in &entries {
            match remote.upsert(record).await {
                Ok(()) => report.pushed += 1,
                Err(err) => {
                    warn!("reconcile push of entry {} failed: {err:?}", record.id);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    pub fn local_mut(&mut self) -> &mut LocalStore {
        &mut self.local
    }
}

fn merge_by_id(local: Vec<Entry>, remote: Vec<Entry>) -> Vec<Entry> {
    let mut merged: Vec<Entry> = local;
    for row in remote {
        match merged.iter_mut().find(|e| e.id == row.id) {
            Some(existing) => *existing = row,
            None => merged.push(row),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use color_eyre::eyre::eyre;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeRemote {
        rows: Arc<Mutex<Vec<Entry>>>,
        down: Arc<AtomicBool>,
        reject_ids: Arc<Mutex<Vec<String>>>,
    }

    impl FakeRemote {
        fn seeded(entries: &[Entry]) -> Self {
            let fake = Self::default();
            fake.rows.lock().unwrap().extend_from_slice(entries);
            fake
        }

        fn unreachable() -> Self {
            let fake = Self::default();
            fake.down.store(true, Ordering::SeqCst);
            fake
        }

        fn stored_ids(&self) -> Vec<String> {
            self.rows.lock().unwrap().iter().map(|e| e.id.clone()).collect()
        }
    }

    impl RemoteStore for FakeRemote {
        async fn upsert(&self, record: &Entry) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(eyre!("cloud down"));
            }
            if self.reject_ids.lock().unwrap().contains(&record.id) {
                return Err(eyre!("row rejected"));
            }
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|e| e.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => rows.push(record.clone()),
            }
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<Entry>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(eyre!("cloud down"));
            }
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn entry(id: &str, mood: &str) -> Entry {
        Entry {
            id: id.to_string(),
            date: "Jan 5".to_string(),
            mood: mood.to_string(),
            image_url: String::new(),
            summary: String::new(),
        }
    }

    fn synchronizer(remote: Option<FakeRemote>, policy: ReadPolicy) -> Synchronizer<FakeRemote> {
        Synchronizer::new(LocalStore::open_in_memory().unwrap(), remote, policy)
    }

    #[tokio::test]
    async fn save_then_load_without_cloud_returns_the_entry() {
        let mut sync = synchronizer(None, ReadPolicy::Replace);
        sync.save(&entry("100", "calm")).await.unwrap();

        let loaded = sync.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "100");
    }

    #[tokio::test]
    async fn save_then_load_with_unreachable_cloud_falls_back_to_local() {
        let mut sync = synchronizer(Some(FakeRemote::unreachable()), ReadPolicy::Replace);
        sync.save(&entry("100", "calm")).await.unwrap();

        let loaded = sync.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "100");
    }

    #[tokio::test]
    async fn save_pushes_to_the_cloud_in_the_background() {
        let remote = FakeRemote::default();
        let mut sync = synchronizer(Some(remote.clone()), ReadPolicy::Replace);
        sync.save(&entry("100", "calm")).await.unwrap();

        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(remote.stored_ids(), vec!["100".to_string()]);
    }

    #[tokio::test]
    async fn two_saves_with_a_reachable_cloud_both_come_back() {
        let remote = FakeRemote::default();
        let mut sync = synchronizer(Some(remote.clone()), ReadPolicy::Replace);
        sync.save(&entry("100", "calm")).await.unwrap();
        sync.save(&entry("200", "bright")).await.unwrap();
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        let loaded = sync.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        // newest id first
        assert_eq!(loaded[0].id, "200");
        assert_eq!(loaded[1].id, "100");
    }

    #[tokio::test]
    async fn partial_cloud_result_replaces_local_outright() {
        // The cloud only knows about one of the two entries, so the other
        // stays invisible until reconciled. Deliberate behavior.
        let remote = FakeRemote::seeded(&[entry("100", "calm")]);
        let mut sync = synchronizer(Some(remote), ReadPolicy::Replace);
        sync.local_mut().put(&entry("100", "calm")).unwrap();
        sync.local_mut().put(&entry("200", "bright")).unwrap();

        let loaded = sync.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "100");
    }

    #[tokio::test]
    async fn merge_policy_unions_by_id_and_cloud_wins() {
        let remote = FakeRemote::seeded(&[entry("100", "cloud-truth")]);
        let mut sync = synchronizer(Some(remote), ReadPolicy::Merge);
        sync.local_mut().put(&entry("100", "stale")).unwrap();
        sync.local_mut().put(&entry("200", "bright")).unwrap();

        let loaded = sync.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "200");
        assert_eq!(loaded[1].id, "100");
        assert_eq!(loaded[1].mood, "cloud-truth");
    }

    #[tokio::test]
    async fn empty_cloud_result_falls_back_to_local() {
        let remote = FakeRemote::default();
        let mut sync = synchronizer(Some(remote), ReadPolicy::Replace);
        sync.local_mut().put(&entry("100", "calm")).unwrap();

        let loaded = sync.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "100");
    }

    #[tokio::test]
    async fn local_fallback_is_sorted_newest_first() {
        let mut sync = synchronizer(None, ReadPolicy::Replace);
        for id in ["300", "100", "200"] {
            sync.save(&entry(id, "calm")).await.unwrap();
        }

        let ids: Vec<String> = sync.load().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["300", "200", "100"]);
    }

    #[tokio::test]
    async fn reconcile_counts_partial_failures() {
        let remote = FakeRemote::default();
        remote.reject_ids.lock().unwrap().push("200".to_string());
        let mut sync = synchronizer(Some(remote.clone()), ReadPolicy::Replace);
        for id in ["100", "200", "300"] {
            sync.local_mut().put(&entry(id, "calm")).unwrap();
        }

        let report = sync.reconcile_all_local_to_remote().await.unwrap();
        assert_eq!(report, ReconcileReport { pushed: 2, failed: 1 });

        let mut ids = remote.stored_ids();
        ids.sort();
        assert_eq!(ids, vec!["100".to_string(), "300".to_string()]);
    }

    #[tokio::test]
    async fn reconcile_without_cloud_counts_everything_failed() {
        let mut sync = synchronizer(None, ReadPolicy::Replace);
        sync.local_mut().put(&entry("100", "calm")).unwrap();

        let report = sync.reconcile_all_local_to_remote().await.unwrap();
        assert_eq!(report, ReconcileReport { pushed: 0, failed: 1 });
    }
}
