use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{prelude::*, style::palette::tailwind, widgets::*};
use tokio::sync::mpsc::UnboundedSender;

use super::Component;
use crate::{
    action::{Action, Page, RelevantKey},
    cli::Role,
    config::Config,
    layout,
    persist::{self, Command},
};

/// Entry list plus the compose form. The owner posts here; a viewer only
/// browses.
pub struct Journal {
    role: Role,
    config: Config,
    action_tx: Option<UnboundedSender<Action>>,
    persist_tx: Option<UnboundedSender<Command>>,
    suspended: bool,
    entries: Vec<persist::Entry>,
    table_state: TableState,
    compose: Option<Compose>,
}

impl Journal {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            config: Config::default(),
            action_tx: None,
            persist_tx: None,
            suspended: false,
            entries: Vec::new(),
            table_state: TableState::default(),
            compose: None,
        }
    }

    fn send_command(&self, cmd: Command) {
        if let Some(tx) = &self.persist_tx {
            let _ = tx.send(cmd);
        }
    }

    fn browse_keys(&self) -> Vec<RelevantKey> {
        let mut keys = Vec::new();
        if self.role == Role::Owner {
            keys.push(RelevantKey::new("n", "New check-in"));
        }
        keys.push(RelevantKey::new("e", "Export CSV"));
        if self.role == Role::Owner {
            keys.push(RelevantKey::new("r", "Cloud sync"));
        }
        keys.push(RelevantKey::new("Tab", "Calendar"));
        keys.push(RelevantKey::new("q", "Quit"));
        keys
    }

    fn compose_keys() -> Vec<RelevantKey> {
        vec![
            RelevantKey::new("Enter", "Next field / post"),
            RelevantKey::new("Esc", "Discard"),
        ]
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('q') => Ok(Some(Action::Quit)),
            KeyCode::Tab => Ok(Some(Action::SetActivePage(Page::Calendar))),
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                Ok(None)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                Ok(None)
            }
            KeyCode::Char('n') if self.role == Role::Owner => {
                self.compose = Some(Compose::default());
                Ok(Some(Action::SetRelevantKeys(Self::compose_keys())))
            }
            KeyCode::Char('e') => {
                let path = self.config.config.data_dir.join("moodshot-export.csv");
                self.send_command(Command::ExportCsv { path });
                Ok(Some(Action::SetStatusLine("Exporting…".into())))
            }
            KeyCode::Char('r') if self.role == Role::Owner => {
                self.send_command(Command::Reconcile);
                Ok(Some(Action::SetStatusLine(
                    "Pushing local entries to the cloud…".into(),
                )))
            }
            _ => Ok(None),
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let Some(mut compose) = self.compose.take() else {
            return Ok(None);
        };
        match key.code {
            KeyCode::Esc => {
                return Ok(Some(Action::SetRelevantKeys(self.browse_keys())));
            }
            KeyCode::Enter if compose.field == Field::Summary => {
                return self.submit_compose(compose);
            }
            KeyCode::Enter | KeyCode::Tab => compose.field = compose.field.next(),
            KeyCode::BackTab => compose.field = compose.field.previous(),
            KeyCode::Backspace => {
                compose.field_mut().pop();
            }
            KeyCode::Char(ch) => compose.field_mut().push(ch),
            _ => {}
        }
        self.compose = Some(compose);
        Ok(None)
    }

    fn submit_compose(&mut self, compose: Compose) -> Result<Option<Action>> {
        let mood = compose.mood.trim().to_string();
        if mood.is_empty() {
            let hint = "A mood is required — how are you?".to_string();
            self.compose = Some(compose);
            return Ok(Some(Action::SetStatusLine(hint)));
        }
        let image = compose.image_url.trim();
        let image_url = (!image.is_empty()).then(|| image.to_string());
        self.send_command(Command::PostEntry {
            mood,
            image_url,
            summary: compose.summary.trim().to_string(),
        });
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::SetRelevantKeys(self.browse_keys()));
        }
        Ok(Some(Action::SetStatusLine("Posting…".into())))
    }

    fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let next = self
            .table_state
            .selected()
            .map_or(0, |i| (i + 1).min(self.entries.len() - 1));
        self.table_state.select(Some(next));
    }

    fn select_previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let previous = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(previous));
    }
}

impl Component for Journal {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(tx);
        Ok(())
    }

    fn register_persist_handler(&mut self, tx: UnboundedSender<Command>) -> Result<()> {
        self.persist_tx = Some(tx);
        Ok(())
    }

    fn register_config_handler(&mut self, config: Config) -> Result<()> {
        self.config = config;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn init(&mut self, _area: Size) -> Result<()> {
        self.send_command(Command::LoadEntries);
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::SetRelevantKeys(self.browse_keys()));
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        if self.compose.is_some() {
            self.handle_compose_key(key)
        } else {
            self.handle_browse_key(key)
        }
    }

    fn handle_persisted(&mut self, event: persist::Event) -> Result<Option<Action>> {
        match event {
            persist::Event::EntriesLoaded { entries } => {
                self.entries = entries;
                if self.table_state.selected().is_none() && !self.entries.is_empty() {
                    self.table_state.select(Some(0));
                }
                Ok(None)
            }
            persist::Event::EntryPosted { entry, phrase } => {
                self.send_command(Command::LoadEntries);
                let line = if phrase.is_empty() {
                    format!("Posted for {} ✓", entry.date)
                } else {
                    format!("Posted for {} ✓ — {phrase}", entry.date)
                };
                Ok(Some(Action::SetStatusLine(line)))
            }
            persist::Event::Exported { path, rows } => Ok(Some(Action::SetStatusLine(format!(
                "Exported {rows} entries to {}",
                path.display()
            )))),
            persist::Event::Reconciled { report } => Ok(Some(Action::SetStatusLine(format!(
                "Cloud sync: {} pushed, {} failed",
                report.pushed, report.failed
            )))),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Action::SetActivePage(page) = action {
            let was_suspended = self.suspended;
            self.suspended = page != Page::Journal;
            if was_suspended && !self.suspended {
                return Ok(Some(Action::SetRelevantKeys(self.browse_keys())));
            }
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let (canvas, _) = layout::canvas_and_statusbar(area);

        if let Some(compose) = &self.compose {
            draw_compose_form(frame, canvas, compose);
            return Ok(());
        }

        let title = match self.role {
            Role::Owner => " Journal ".to_string(),
            Role::Viewer => " Journal (read-only) ".to_string(),
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title);

        if self.entries.is_empty() {
            let hint = match self.role {
                Role::Owner => "No entries yet — press n to post your first check-in.",
                Role::Viewer => "No entries yet.",
            };
            frame.render_widget(Paragraph::new(hint).block(block), canvas);
            return Ok(());
        }

        let header = Row::new(["Date", "Mood", "Note"]).style(Style::new().bold());
        let rows = self.entries.iter().map(|e| {
            Row::new([
                e.date.clone(),
                e.mood.clone(),
                e.summary.lines().next().unwrap_or("").to_string(),
            ])
        });
        let widths = [
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(Style::new().bg(tailwind::SLATE.c700))
            .block(block);
        frame.render_stateful_widget(table, canvas, &mut self.table_state);
        Ok(())
    }
}

#[derive(Default)]
struct Compose {
    field: Field,
    mood: String,
    image_url: String,
    summary: String,
}

impl Compose {
    fn field_mut(&mut self) -> &mut String {
        match self.field {
            Field::Mood => &mut self.mood,
            Field::Image => &mut self.image_url,
            Field::Summary => &mut self.summary,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    #[default]
    Mood,
    Image,
    Summary,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Self::Mood => Self::Image,
            Self::Image => Self::Summary,
            Self::Summary => Self::Mood,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Mood => Self::Summary,
            Self::Image => Self::Mood,
            Self::Summary => Self::Image,
        }
    }
}

fn draw_compose_form(frame: &mut Frame, area: Rect, compose: &Compose) {
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .title(" New check-in ")
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [mood_row, image_row, summary_rows, hint_row] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    draw_field(frame, mood_row, "Mood", &compose.mood, compose.field == Field::Mood);
    draw_field(frame, image_row, "Image", &compose.image_url, compose.field == Field::Image);
    draw_field(frame, summary_rows, "Note", &compose.summary, compose.field == Field::Summary);

    let hint = Line::from("Leave the image empty to get an avatar instead.").dim();
    frame.render_widget(hint, hint_row);
}

fn draw_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let cursor = if active { "▏" } else { "" };
    let mut line = Line::from(vec![
        Span::from(format!("{label:>6}: ")).bold(),
        Span::from(value.to_string()),
        Span::from(cursor),
    ]);
    if active {
        line = line.style(Style::new().fg(tailwind::AMBER.c300));
    }
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: false }), area);
}
