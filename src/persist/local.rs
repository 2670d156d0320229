use std::path::Path;

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use diesel::{Connection, RunQueryDsl, SqliteConnection, prelude::*};
use diesel_migrations::MigrationHarness;
use tracing::{debug, info};

use super::{MIGRATIONS, model::Entry, schema::entry};

/// On-device entry store. Owns its connection; open it once at startup and
/// pass it to whoever needs it instead of going through a global handle.
pub struct LocalStore {
    conn: SqliteConnection,
}

impl LocalStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let db_url = db_path
            .to_str()
            .ok_or_else(|| eyre!("database path is not valid UTF-8: {db_path:?}"))?;
        let mut conn = SqliteConnection::establish(db_url)
            .wrap_err_with(|| format!("connecting to sqlite {db_url}"))?;
        run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = SqliteConnection::establish(":memory:")?;
        run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Idempotent upsert keyed by id.
    pub fn put(&mut self, record: &Entry) -> Result<()> {
        diesel::insert_into(entry::table)
            .values(record)
            .on_conflict(entry::id)
            .do_update()
            .set(record)
            .execute(&mut self.conn)
            .wrap_err("saving entry")?;
        Ok(())
    }

    /// Every stored entry, in no particular order.
    pub fn get_all(&mut self) -> Result<Vec<Entry>> {
        entry::table
            .select(Entry::as_select())
            .load::<Entry>(&mut self.conn)
            .wrap_err("loading entries")
    }

    /// Entries posted on one display day ("Jan 5"), via the date index.
    pub fn on_date(&mut self, date: &str) -> Result<Vec<Entry>> {
        entry::table
            .filter(entry::date.eq(date))
            .select(Entry::as_select())
            .load::<Entry>(&mut self.conn)
            .wrap_err_with(|| format!("loading entries of {date}"))
    }

    /// Delete by id; returns the number of rows removed (0 if absent).
    pub fn delete(&mut self, id: &str) -> Result<usize> {
        diesel::delete(entry::table.filter(entry::id.eq(id)))
            .execute(&mut self.conn)
            .wrap_err("delete entry")
    }
}

fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    debug!("Running any pending migrations now.");
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(migrations_run) => {
            for migration in migrations_run {
                info!("Schema migration run: {}", migration);
            }
        }
        Err(e) => Err(eyre!(e)).wrap_err_with(|| "running sqlite migrations")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample(id: &str, date: &str, mood: &str) -> Entry {
        Entry {
            id: id.to_string(),
            date: date.to_string(),
            mood: mood.to_string(),
            image_url: format!("selfie-{id}.jpg"),
            summary: "a note".to_string(),
        }
    }

    #[test]
    fn put_is_an_upsert_by_id() {
        let mut store = LocalStore::open_in_memory().unwrap();
        store.put(&sample("100", "Jan 5", "calm")).unwrap();
        store.put(&sample("100", "Jan 5", "stormy")).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].mood, "stormy");
    }

    #[test]
    fn on_date_groups_by_display_day() {
        let mut store = LocalStore::open_in_memory().unwrap();
        store.put(&sample("100", "Jan 5", "calm")).unwrap();
        store.put(&sample("200", "Jan 5", "bright")).unwrap();
        store.put(&sample("300", "Jan 6", "tired")).unwrap();

        let day = store.on_date("Jan 5").unwrap();
        assert_eq!(day.len(), 2);
        assert!(day.iter().all(|e| e.date == "Jan 5"));
    }

    #[test]
    fn delete_missing_id_is_a_noop() {
        let mut store = LocalStore::open_in_memory().unwrap();
        store.put(&sample("100", "Jan 5", "calm")).unwrap();

        assert_eq!(store.delete("999").unwrap(), 0);
        assert_eq!(store.delete("100").unwrap(), 1);
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn entries_survive_reopening_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("moodshot.sqlite3");

        {
            let mut store = LocalStore::open(&db_path).unwrap();
            store.put(&sample("100", "Jan 5", "calm")).unwrap();
        }

        let mut reopened = LocalStore::open(&db_path).unwrap();
        let all = reopened.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "100");
    }
}
