use chrono::Datelike;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use educe::Educe;
use itertools::Itertools;
use ratatui::{
    prelude::*,
    style::palette::tailwind,
    widgets::{
        calendar::{CalendarEventStore, Monthly},
        *,
    },
};
use time::{Date, OffsetDateTime, ext::NumericalDuration, format_description};
use tokio::sync::mpsc::UnboundedSender;

use super::Component;
use crate::{
    action::{Action, Page, RelevantKey},
    layout,
    persist::{self, Command, Entry},
};

#[derive(Educe)]
#[educe(Default)]
pub struct Calendar {
    persist_tx: Option<UnboundedSender<Command>>,
    #[educe(Default = true)]
    suspended: bool,

    #[educe(Default(expression = today()))]
    day: Date,
    days_with_entries: Vec<Date>,
    day_entries: Vec<Entry>,
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Same display shape the entries carry: "Jan 5".
fn display_date(day: Date) -> Result<String> {
    let format = format_description::parse("[month repr:short] [day padding:none]")?;
    Ok(day.format(&format)?)
}

fn to_time_date(day: chrono::NaiveDate) -> Option<Date> {
    let month = time::Month::try_from(day.month() as u8).ok()?;
    Date::from_calendar_date(day.year(), month, day.day() as u8).ok()
}

impl Calendar {
    fn keys() -> Vec<RelevantKey> {
        vec![
            RelevantKey::new("←↑↓→", "Move day"),
            RelevantKey::new("t", "Today"),
            RelevantKey::new("Tab", "Journal"),
            RelevantKey::new("q", "Quit"),
        ]
    }

    fn fetch_selected_day(&mut self) -> Result<()> {
        self.day_entries.clear();
        if let Some(tx) = &self.persist_tx {
            let _ = tx.send(Command::LoadDay {
                date: display_date(self.day)?,
            });
        }
        Ok(())
    }

    fn handle_day_movement(&mut self, key: KeyEvent) -> Result<bool> {
        let delta = match key.code {
            KeyCode::Left | KeyCode::Char('h') => (-1).days(),
            KeyCode::Right | KeyCode::Char('l') => 1.days(),
            KeyCode::Up | KeyCode::Char('k') => (-7).days(),
            KeyCode::Down | KeyCode::Char('j') => 7.days(),
            KeyCode::Char('t') => {
                self.day = today();
                self.fetch_selected_day()?;
                return Ok(true);
            }
            _ => return Ok(false),
        };
        self.day = self.day.saturating_add(delta);
        self.fetch_selected_day()?;
        Ok(true)
    }
}

impl Component for Calendar {
    fn register_persist_handler(&mut self, tx: UnboundedSender<Command>) -> Result<()> {
        self.persist_tx = Some(tx);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn init(&mut self, _area: Size) -> Result<()> {
        self.fetch_selected_day()?;
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        if self.handle_day_movement(key)? {
            return Ok(None);
        }
        match key.code {
            KeyCode::Tab | KeyCode::Esc => Ok(Some(Action::SetActivePage(Page::Journal))),
            KeyCode::Char('q') => Ok(Some(Action::Quit)),
            _ => Ok(None),
        }
    }

    fn handle_persisted(&mut self, event: persist::Event) -> Result<Option<Action>> {
        match event {
            persist::Event::EntriesLoaded { entries } => {
                self.days_with_entries = entries
                    .iter()
                    .filter_map(|e| e.local_day().and_then(to_time_date))
                    .unique()
                    .collect();
                Ok(None)
            }
            persist::Event::DayLoaded { date, entries } => {
                // Ignore answers for a day we already moved away from.
                if date == display_date(self.day)? {
                    self.day_entries = entries;
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Action::SetActivePage(page) = action {
            let was_suspended = self.suspended;
            self.suspended = page != Page::Calendar;
            if was_suspended && !self.suspended {
                self.fetch_selected_day()?;
                return Ok(Some(Action::SetRelevantKeys(Self::keys())));
            }
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let (canvas, _) = layout::canvas_and_statusbar(area);
        let [calendar_area, list_area] =
            Layout::horizontal([Constraint::Length(26), Constraint::Min(20)]).areas(canvas);

        let mut events = CalendarEventStore::default();
        for day in &self.days_with_entries {
            events.add(*day, Style::new().fg(tailwind::EMERALD.c400).bold());
        }
        events.add(self.day, Style::new().bg(tailwind::SLATE.c600));

        let calendar_block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(" Calendar ");
        let calendar_inner = calendar_block.inner(calendar_area);
        frame.render_widget(calendar_block, calendar_area);
        frame.render_widget(
            Monthly::new(self.day, events)
                .show_month_header(Style::new().bold())
                .show_weekdays_header(Style::new().dim()),
            calendar_inner,
        );

        let list_block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(format!(" {} ", display_date(self.day)?));
        if self.day_entries.is_empty() {
            frame.render_widget(
                Paragraph::new("No check-in on this day.").block(list_block),
                list_area,
            );
            return Ok(());
        }
        let items: Vec<ListItem> = self
            .day_entries
            .iter()
            .map(|e| {
                ListItem::new(Line::from(vec![
                    Span::from(e.mood.clone()).bold(),
                    Span::from("  "),
                    Span::from(e.summary.lines().next().unwrap_or("").to_string()),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(list_block), list_area);
        Ok(())
    }
}
