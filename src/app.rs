//! Application state and the terminal event loop

use crate::config::Config;
use crate::dispatcher::{Dispatcher, Rejection, SubmitOutcome};
use crate::theme::AccentColor;
use crate::transport::ChatTransport;
use crate::ui::Header;
use crate::ui::conversation::composer::PLACEHOLDER;
use crate::ui::conversation::{
    ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand, SlashCommand,
    help_lines,
};
use crate::ui::terminal::{self, Tui};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const SCROLL_STEP: usize = 5;
const MIN_TICK_MILLIS: u64 = 10;

/// Everything the chat screen needs between frames
pub struct App {
    dispatcher: Dispatcher,
    composer: ConversationComposer,
    history: ConversationHistory,
    accent: AccentColor,
    status: Option<String>,
    show_help: bool,
    should_quit: bool,
    started: Instant,
}

impl App {
    pub fn new(dispatcher: Dispatcher, accent: AccentColor) -> Self {
        Self {
            dispatcher,
            composer: ConversationComposer::new(PLACEHOLDER, accent.color()),
            history: ConversationHistory::new(),
            accent,
            status: None,
            show_help: false,
            should_quit: false,
            started: Instant::now(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn accent(&self) -> AccentColor {
        self.accent
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_accent(&mut self, accent: AccentColor) {
        debug!(%accent, "accent changed");
        self.accent = accent;
        self.composer.set_accent(accent.color());
    }

    /// Pick up a finished request and sync the composer with the loading flag
    pub fn tick(&mut self) {
        if self.dispatcher.poll_reply() {
            self.history.scroll_to_bottom();
        }
        self.composer.set_enabled(!self.dispatcher.is_loading());
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            self.show_help = false;
            if key.code == KeyCode::Esc {
                return;
            }
        }

        match key.code {
            KeyCode::F(2) => {
                self.set_accent(self.accent.next());
                return;
            }
            KeyCode::PageUp => {
                self.history.scroll_up(SCROLL_STEP);
                return;
            }
            KeyCode::PageDown => {
                self.history.scroll_down(SCROLL_STEP);
                return;
            }
            // Also moves the composer cursor to the end of the line
            KeyCode::End => self.history.scroll_to_bottom(),
            KeyCode::Esc if !self.composer.is_palette_open() => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => self.submit(&text),
            ComposerResult::Command(command) => self.run_command(command),
            ComposerResult::None => {}
        }
    }

    fn submit(&mut self, text: &str) {
        match self.dispatcher.submit(text) {
            SubmitOutcome::Dispatched => {
                self.status = None;
                self.history.scroll_to_bottom();
            }
            SubmitOutcome::Rejected(Rejection::Busy) => {
                self.status = Some("Still waiting for the previous reply".to_string());
            }
            SubmitOutcome::Rejected(Rejection::Empty) => {}
        }
        self.composer.set_enabled(!self.dispatcher.is_loading());
    }

    fn run_command(&mut self, command: ParsedCommand) {
        match command.command {
            SlashCommand::Accent => match (command.argument(), command.accent_target()) {
                (_, Some(target)) => self.set_accent(target),
                (None, None) => self.set_accent(self.accent.next()),
                (Some(name), None) => {
                    let names: Vec<_> = AccentColor::all().iter().map(|c| c.name()).collect();
                    self.status = Some(format!(
                        "Unknown accent '{}'. Try one of: {}",
                        name,
                        names.join(", ")
                    ));
                }
            },
            SlashCommand::Help => {
                self.show_help = true;
            }
            SlashCommand::Quit => {
                self.should_quit = true;
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(3),    // History
                Constraint::Length(3), // Composer
                Constraint::Length(1), // Status
            ])
            .split(frame.size());

        frame.render_widget(Header::new(self.accent), chunks[0]);

        let history = self.history.view(
            self.dispatcher.conversation().all(),
            self.dispatcher.is_loading(),
            self.accent.color(),
            self.started.elapsed().as_millis(),
        );
        frame.render_widget(history, chunks[1]);

        frame.render_widget(&self.composer, chunks[2]);

        let palette_height = self.composer.palette_height().min(chunks[1].height);
        if palette_height > 0 {
            let palette_area = Rect {
                x: chunks[2].x + 1,
                y: chunks[2].y - palette_height,
                width: chunks[2].width.saturating_sub(2),
                height: palette_height,
            };
            self.composer.render_palette(palette_area, frame.buffer_mut());
        }

        frame.render_widget(Paragraph::new(self.status_line()), chunks[3]);

        if self.show_help {
            self.draw_help(frame, chunks[1]);
        }
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(status) = &self.status {
            return Line::from(Span::styled(
                format!(" {status}"),
                Style::default().fg(Color::Yellow),
            ));
        }

        let hint = Style::default().fg(Color::DarkGray);
        if self.dispatcher.is_loading() {
            Line::from(vec![
                Span::styled(" Waiting for reply…", Style::default().fg(self.accent.color())),
                Span::styled("  ·  Ctrl+C quit", hint),
            ])
        } else {
            Line::from(Span::styled(
                " Enter send  ·  / commands  ·  F2 accent  ·  Ctrl+C quit",
                hint,
            ))
        }
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = help_lines().into_iter().map(Line::from).collect();
        let height = (lines.len() as u16 + 2).min(area.height);
        let width = area.width.min(72);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Style::default().fg(self.accent.color()));
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Run the chat screen until the user quits
pub fn run(config: &Config, transport: Arc<dyn ChatTransport>) -> Result<()> {
    let mut terminal = terminal::enter()?;
    let mut app = App::new(Dispatcher::new(transport), config.ui.accent);
    info!(endpoint = %config.endpoint, "chat session started");

    let tick = Duration::from_millis(config.ui.tick_millis.max(MIN_TICK_MILLIS));
    let result = run_loop(&mut terminal, &mut app, tick);

    terminal::restore()?;
    terminal.show_cursor()?;

    info!(
        messages = app.dispatcher().conversation().len(),
        "chat session ended"
    );
    result
}

fn run_loop(terminal: &mut Tui, app: &mut App, tick: Duration) -> Result<()> {
    while !app.should_quit() {
        app.tick();
        terminal.draw(|frame| app.draw(frame))?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}
