//! Consecutive-day posting streak.

use chrono::{Local, NaiveDate};

use crate::persist::Entry;

/// Number of consecutive calendar days with at least one entry, ending today
/// or yesterday (yesterday keeps the streak alive because today isn't over).
///
/// Expects entries sorted newest-id-first; this function does not sort, and
/// input that isn't descending ends the walk early.
pub fn current_streak(entries: &[Entry]) -> u32 {
    current_streak_on(entries, Local::now().date_naive())
}

fn current_streak_on(entries: &[Entry], today: NaiveDate) -> u32 {
    let Some(newest) = entries.first() else {
        return 0;
    };
    let Some(mut prev_day) = newest.local_day() else {
        return 0;
    };

    let alive =
        prev_day == today || today.pred_opt().is_some_and(|yesterday| prev_day == yesterday);
    if !alive {
        return 0;
    }

    let mut streak = 1;
    for record in &entries[1..] {
        let Some(day) = record.local_day() else {
            break;
        };
        match (prev_day - day).num_days() {
            1 => {
                streak += 1;
                prev_day = day;
            }
            // several posts on the same day count once
            0 => {}
            // a gap, or out-of-order input: the streak ends here
            _ => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Local, NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()
    }

    fn days_ago(n: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(n)).unwrap()
    }

    /// Entry posted at the given local hour of the given day.
    fn entry_at(day: NaiveDate, hour: u32) -> Entry {
        let stamp = Local
            .from_local_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
            .earliest()
            .unwrap();
        Entry {
            id: stamp.timestamp_millis().to_string(),
            date: day.format("%b %-d").to_string(),
            mood: "ok".to_string(),
            image_url: String::new(),
            summary: String::new(),
        }
    }

    fn entry_on(day: NaiveDate) -> Entry {
        entry_at(day, 12)
    }

    #[test]
    fn no_entries_means_no_streak() {
        assert_eq!(current_streak_on(&[], today()), 0);
    }

    #[test]
    fn consecutive_days_ending_today_count_in_full() {
        let entries: Vec<Entry> = (0..5).map(|n| entry_on(days_ago(n))).collect();
        assert_eq!(current_streak_on(&entries, today()), 5);
    }

    #[test]
    fn a_streak_ending_yesterday_is_still_alive() {
        let entries = vec![entry_on(days_ago(1)), entry_on(days_ago(2)), entry_on(days_ago(3))];
        assert_eq!(current_streak_on(&entries, today()), 3);
    }

    #[test]
    fn newest_entry_older_than_yesterday_breaks_everything() {
        let entries: Vec<Entry> = (2..10).map(|n| entry_on(days_ago(n))).collect();
        assert_eq!(current_streak_on(&entries, today()), 0);
    }

    #[test]
    fn several_posts_on_one_day_count_once() {
        let entries = vec![
            entry_at(days_ago(0), 21),
            entry_at(days_ago(0), 9),
            entry_on(days_ago(1)),
        ];
        assert_eq!(current_streak_on(&entries, today()), 2);
    }

    #[test]
    fn a_gap_truncates_at_the_gap() {
        // days D, D-1, D-1, D-3: the missing D-2 makes D-3 unreachable.
        let entries = vec![
            entry_on(days_ago(0)),
            entry_at(days_ago(1), 18),
            entry_at(days_ago(1), 8),
            entry_on(days_ago(3)),
        ];
        assert_eq!(current_streak_on(&entries, today()), 2);
    }

    #[test]
    fn history_beyond_a_gap_is_ignored() {
        let entries = vec![
            entry_on(days_ago(0)),
            entry_on(days_ago(1)),
            entry_on(days_ago(2)),
            entry_on(days_ago(4)),
            entry_on(days_ago(5)),
        ];
        assert_eq!(current_streak_on(&entries, today()), 3);
    }

    #[test]
    fn out_of_order_input_ends_the_walk() {
        let entries = vec![entry_on(days_ago(0)), entry_on(days_ago(1)), entry_on(days_ago(0))];
        assert_eq!(current_streak_on(&entries, today()), 2);
    }

    #[test]
    fn unparseable_id_ends_the_walk() {
        let mut bogus = entry_on(days_ago(1));
        bogus.id = "not-a-timestamp".to_string();

        let entries = vec![entry_on(days_ago(0)), bogus, entry_on(days_ago(1))];
        assert_eq!(current_streak_on(&entries, today()), 1);

        let entries = vec![Entry {
            id: "not-a-timestamp".to_string(),
            ..entry_on(days_ago(0))
        }];
        assert_eq!(current_streak_on(&entries, today()), 0);
    }
}
