use color_eyre::Result;
use ratatui::{
    Frame,
    layout::Rect,
    style::Stylize,
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Padding},
};

use super::Component;
use crate::{
    action::{Action, RelevantKey},
    persist,
    streak::current_streak,
};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusBar {
    status_line: String,
    keys: Vec<RelevantKey>,
    streak: u32,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self {
            status_line: "How was your day?".to_owned(),
            keys: vec![RelevantKey::new("q", "Quit")],
            streak: 0,
        }
    }
}

impl StatusBar {
    fn streak_label(&self) -> String {
        match self.streak {
            0 => "no streak".to_owned(),
            1 => "🔥 1 day".to_owned(),
            n => format!("🔥 {n} days"),
        }
    }
}

impl Component for StatusBar {
    fn handle_persisted(&mut self, event: persist::Event) -> Result<Option<Action>> {
        match event {
            persist::Event::EntriesLoaded { entries } => {
                // load() hands these over newest-first, which is what the
                // streak walk expects.
                self.streak = current_streak(&entries);
            }
            persist::Event::Failure(msg) => {
                let first = msg.lines().next().unwrap_or("unknown error").to_owned();
                self.status_line = format!("Failed: {first} — try again");
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::SetStatusLine(msg) => self.status_line = msg,
            Action::SetRelevantKeys(keys) => self.keys = keys,
            Action::Error(msg) => self.status_line = msg,
            _ => {}
        };
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let (_, area) = crate::layout::canvas_and_statusbar(area);

        let block = Block::new()
            .borders(!Borders::BOTTOM)
            .border_type(BorderType::Rounded)
            .padding(Padding::horizontal(2))
            .title_top(Line::from(self.status_line.clone()).centered())
            .title_top(Line::from(self.streak_label()).right_aligned());
        frame.render_widget(&block, area);

        let mut keys_text = Text::default();
        let mut first = true;
        for key in self.keys.iter() {
            if !first {
                keys_text.push_span("  ");
            } else {
                first = false;
            }
            keys_text.push_span(format!("<{}> ", key.key).blue().bold());
            keys_text.push_span(Span::from(key.text.clone()));
        }
        frame.render_widget(keys_text, block.inner(area));

        Ok(())
    }
}
