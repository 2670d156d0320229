use std::future::Future;

use color_eyre::{Result, eyre::eyre};
use postgrest::Postgrest;
use serde::{Deserialize, Serialize};

use crate::{config::RemoteConfig, persist::Entry};

/// Cloud mirror of the entry table. Availability is not guaranteed: every
/// operation is fallible and callers must treat failures as non-fatal.
pub trait RemoteStore: Clone + Send + Sync + 'static {
    /// Insert-or-replace by id.
    fn upsert(&self, record: &Entry) -> impl Future<Output = Result<()>> + Send;
    /// All rows, newest id first where the backend supports ordering.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Entry>>> + Send;
}

/// Wire shape of one row in the hosted table. `created_at` is assigned by
/// the server and ignored on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRow {
    pub id: String,
    pub date: String,
    pub mood: String,
    pub image_url: String,
    pub summary: String,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

impl From<&Entry> for RemoteRow {
    fn from(e: &Entry) -> Self {
        Self {
            id: e.id.clone(),
            date: e.date.clone(),
            mood: e.mood.clone(),
            image_url: e.image_url.clone(),
            summary: e.summary.clone(),
            created_at: None,
        }
    }
}

impl From<RemoteRow> for Entry {
    fn from(r: RemoteRow) -> Self {
        Self {
            id: r.id,
            date: r.date,
            mood: r.mood,
            image_url: r.image_url,
            summary: r.summary,
        }
    }
}

/// PostgREST-backed store (Supabase). Cheap to clone; a fresh client is
/// built per request, like every other caller of this API does it.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    rest_url: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    /// `None` when the remote is not configured.
    pub fn from_config(cfg: &RemoteConfig) -> Option<Self> {
        let url = cfg.url.as_deref()?;
        let api_key = cfg.api_key.as_deref()?;
        Some(Self {
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            table: cfg.table.clone(),
        })
    }

    fn client(&self) -> Postgrest {
        Postgrest::new(self.rest_url.as_str())
            .insert_header("apikey", self.api_key.clone())
            .insert_header("Authorization", format!("Bearer {}", self.api_key))
    }
}

impl RemoteStore for SupabaseStore {
    async fn upsert(&self, record: &Entry) -> Result<()> {
        let body = serde_json::to_string(&RemoteRow::from(record))?;
        let response = self.client().from(&self.table).upsert(body).execute().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("cloud upsert of entry {} rejected: {status}", record.id));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Entry>> {
        let response = self
            .client()
            .from(&self.table)
            .select("*")
            .order("id.desc")
            .execute()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("cloud list rejected: {status}"));
        }
        let rows: Vec<RemoteRow> = response.json().await?;
        Ok(rows.into_iter().map(Entry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::RemoteConfig;

    #[test]
    fn row_translation_preserves_every_field_and_drops_created_at() {
        let row: RemoteRow = serde_json::from_str(
            r#"{
                "id": "1700000000000",
                "date": "Nov 14",
                "mood": "wired",
                "image_url": "data:image/png;base64,AAAA",
                "summary": "shipping day",
                "created_at": "2023-11-14T22:13:20Z"
            }"#,
        )
        .unwrap();

        let entry = Entry::from(row.clone());
        assert_eq!(entry.id, "1700000000000");
        assert_eq!(entry.date, "Nov 14");
        assert_eq!(entry.mood, "wired");
        assert_eq!(entry.image_url, "data:image/png;base64,AAAA");
        assert_eq!(entry.summary, "shipping day");

        // created_at never travels back on writes
        let body = serde_json::to_string(&RemoteRow::from(&entry)).unwrap();
        assert!(!body.contains("created_at"));
    }

    #[test]
    fn unconfigured_remote_yields_no_store() {
        assert!(SupabaseStore::from_config(&RemoteConfig::default()).is_none());

        let cfg = RemoteConfig {
            url: Some("https://db.example.supabase.co/".to_string()),
            api_key: Some("key".to_string()),
            table: "entries".to_string(),
        };
        let store = SupabaseStore::from_config(&cfg).unwrap();
        assert_eq!(store.rest_url, "https://db.example.supabase.co/rest/v1");
    }
}
