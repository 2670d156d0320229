use std::path::PathBuf;

use chrono::{Local, NaiveDate, TimeZone};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sync::ReconcileReport;

/// One diary record. `id` is the decimal string of the creation wall-clock
/// in milliseconds and doubles as the ordering key; `date` is the display
/// day ("Jan 5") derived from it at creation and never recomputed.
#[derive(
    Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, PartialEq, Eq,
    Serialize, Deserialize,
)]
#[diesel(table_name = super::schema::entry)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Entry {
    pub id: String,
    pub date: String,
    pub mood: String,
    pub image_url: String,
    pub summary: String,
}

impl Entry {
    pub fn compose(mood: String, image_url: String, summary: String) -> Self {
        let now = Local::now();
        Self {
            id: now.timestamp_millis().to_string(),
            date: date_display(now.date_naive()),
            mood,
            image_url,
            summary,
        }
    }

    /// Creation instant in epoch milliseconds, if the id parses.
    pub fn created_ms(&self) -> Option<i64> {
        self.id.parse::<i64>().ok()
    }

    /// Calendar day of creation in the local timezone.
    pub fn local_day(&self) -> Option<NaiveDate> {
        let stamp = Local.timestamp_millis_opt(self.created_ms()?).earliest()?;
        Some(stamp.date_naive())
    }
}

/// Month abbreviation plus unpadded day, no year.
pub const DATE_DISPLAY_FORMAT: &str = "%b %-d";

pub fn date_display(day: NaiveDate) -> String {
    day.format(DATE_DISPLAY_FORMAT).to_string()
}

/// Numeric id order, newest first. Ids that do not parse sort last.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_unstable_by_key(|e| std::cmp::Reverse(e.created_ms().unwrap_or(i64::MIN)));
}

#[derive(Debug, Clone)]
pub enum Command {
    PostEntry {
        mood: String,
        image_url: Option<String>,
        summary: String,
    },
    LoadEntries,
    LoadDay { date: String },
    ExportCsv { path: PathBuf },
    Reconcile,
}

#[derive(Debug, Clone)]
pub enum Event {
    EntryPosted { entry: Entry, phrase: String },
    EntriesLoaded { entries: Vec<Entry> },
    DayLoaded { date: String, entries: Vec<Entry> },
    Exported { path: PathBuf, rows: usize },
    Reconciled { report: ReconcileReport },
    Failure(String),
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry_with_id(id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            date: String::new(),
            mood: "ok".to_string(),
            image_url: String::new(),
            summary: String::new(),
        }
    }

    #[test]
    fn compose_derives_date_from_creation_instant() {
        let entry = Entry::compose("calm".into(), "selfie.jpg".into(), "note".into());
        let day = entry.local_day().expect("fresh id parses");
        assert_eq!(entry.date, date_display(day));
    }

    #[test]
    fn date_display_has_no_year_and_no_padding() {
        let jan5 = Local.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
        assert_eq!(
            jan5.format(DATE_DISPLAY_FORMAT).to_string(),
            "Jan 5".to_string()
        );
    }

    #[test]
    fn sort_is_numeric_not_lexicographic() {
        // "900" is lexicographically larger than "1700000000000".
        let mut entries = vec![entry_with_id("900"), entry_with_id("1700000000000")];
        sort_newest_first(&mut entries);
        assert_eq!(entries[0].id, "1700000000000");
        assert_eq!(entries[1].id, "900");
    }

    #[test]
    fn unparseable_ids_sort_last() {
        let mut entries = vec![entry_with_id("bogus"), entry_with_id("1700000000000")];
        sort_newest_first(&mut entries);
        assert_eq!(entries[1].id, "bogus");
    }
}
