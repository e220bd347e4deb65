#![cfg(feature = "tui")]

use crate::app;
use crate::command::{self, ChatCommand};
use crate::session::{Backends, Session, Surface, MISSING_KEY_NOTICE};
use crate::transcript::{Role, Turn};
use anyhow::Context;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
struct ChatLine {
    role: &'static str,
    text: String,
}

/// Chat pane plus input line. Every fragment triggers a redraw.
struct TuiSurface<B: Backend> {
    terminal: Terminal<B>,
    lines: Vec<ChatLine>,
    model: &'static str,
    input: String,
}

impl<B: Backend> TuiSurface<B> {
    fn new(terminal: Terminal<B>, model: &'static str) -> Self {
        Self { terminal, lines: Vec::new(), model, input: String::new() }
    }

    fn push(&mut self, role: &'static str, text: impl Into<String>) {
        self.lines.push(ChatLine { role, text: text.into() });
    }

    fn draw(&mut self) -> anyhow::Result<()> {
        draw(&mut self.terminal, self.model, &self.lines, &masked(&self.input))
    }
}

impl<B: Backend> Surface for TuiSurface<B> {
    fn notice(&mut self, text: &str) -> anyhow::Result<()> {
        self.push("system", text);
        self.draw()
    }

    fn render_turn(&mut self, turn: &Turn) -> anyhow::Result<()> {
        self.push(turn.role().as_str(), turn.content());
        self.draw()
    }

    fn begin_stream(&mut self, role: Role) -> anyhow::Result<()> {
        self.push(role.as_str(), String::new());
        self.draw()
    }

    fn render_fragment(&mut self, text: &str) -> anyhow::Result<()> {
        if let Some(last) = self.lines.last_mut() {
            last.text.push_str(text);
        }
        self.draw()
    }

    fn end_stream(&mut self) -> anyhow::Result<()> {
        self.draw()
    }
}

/// Hide the key while it is being typed.
fn masked(input: &str) -> String {
    match input.strip_prefix("/key ") {
        Some(rest) => format!("/key {}", "*".repeat(rest.chars().count())),
        None => input.to_string(),
    }
}

pub async fn run_tui(mut session: Session, backends: &Backends) -> anyhow::Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("create terminal")?;

    let (ev_tx, mut ev_rx) = mpsc::unbounded_channel::<Event>();
    std::thread::spawn(move || {
        while let Ok(ev) = crossterm::event::read() {
            if ev_tx.send(ev).is_err() {
                break;
            }
        }
    });

    let mut surface = TuiSurface::new(terminal, session.model().id);
    surface.push("system", format!("Type a message and press Enter. {}", app::HELP));
    if !session.has_api_key() {
        surface.push("system", MISSING_KEY_NOTICE);
    }

    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(33));

    let res = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = surface.draw() {
                    break Err(e);
                }
            }
            Some(ev) = ev_rx.recv() => {
                if let Event::Key(key) = ev {
                    match handle_key(key, &mut session, backends, &mut surface).await {
                        Ok(true) => break Ok(()),
                        Ok(false) => {}
                        Err(e) => break Err(e),
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(surface.terminal.backend_mut(), LeaveAlternateScreen).ok();
    surface.terminal.show_cursor().ok();

    res
}

/// Returns `Ok(true)` when the user asked to quit.
async fn handle_key<B: Backend>(
    key: KeyEvent,
    session: &mut Session,
    backends: &Backends,
    surface: &mut TuiSurface<B>,
) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    match key.code {
        KeyCode::Esc => return Ok(true),
        KeyCode::Char(c) => surface.input.push(c),
        KeyCode::Backspace => {
            surface.input.pop();
        }
        KeyCode::Enter => {
            let line = std::mem::take(&mut surface.input);
            return dispatch(&line, session, backends, surface).await;
        }
        _ => {}
    }

    Ok(false)
}

/// Act on one submitted input line. Returns `Ok(true)` on quit.
async fn dispatch<B: Backend>(
    line: &str,
    session: &mut Session,
    backends: &Backends,
    surface: &mut TuiSurface<B>,
) -> anyhow::Result<bool> {
    let Some(cmd) = command::parse(line) else {
        return Ok(false);
    };

    match cmd {
        ChatCommand::Quit => return Ok(true),
        ChatCommand::Clear => {
            session.reset();
            surface.lines.clear();
        }
        ChatCommand::History => {
            if session.transcript().is_empty() {
                surface.push("system", "(history is empty)");
            }
            session.replay(surface)?;
        }
        ChatCommand::Models => {
            let mut listing = Vec::new();
            app::print_models(&mut listing)?;
            surface.push("system", String::from_utf8_lossy(&listing).trim_end());
        }
        ChatCommand::ShowModel => surface.push("system", format!("model: {}", session.model().id)),
        ChatCommand::SelectModel(id) => match session.select_model(id) {
            Ok(()) => {
                surface.model = session.model().id;
                surface.push("system", format!("model set to: {}", surface.model));
            }
            Err(e) => surface.push("error", format!("{e:#}")),
        },
        ChatCommand::SetKey(key) => {
            session.set_api_key(key);
            let note = if session.has_api_key() { "API key set" } else { MISSING_KEY_NOTICE };
            surface.push("system", note);
        }
        ChatCommand::Prompt(msg) => {
            if let Err(e) = session.submit(msg, backends, surface).await {
                tracing::error!(model = session.model().id, error = %format!("{e:#}"), "turn failed");
                surface.push("error", format!("{e:#}"));
            }
        }
    }

    surface.draw()?;
    Ok(false)
}

fn draw<B: Backend>(
    terminal: &mut Terminal<B>,
    model: &str,
    lines: &[ChatLine],
    input: &str,
) -> anyhow::Result<()> {
    terminal.draw(|f| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(f.area());

        let mut text = Text::default();
        for l in lines {
            let role = format!("{}: ", l.role);
            let style = match l.role {
                "user" | "error" => Style::default().add_modifier(Modifier::BOLD),
                "system" => Style::default().add_modifier(Modifier::DIM),
                _ => Style::default(),
            };
            text.lines.push(Line::styled(role, style));
            text.lines.extend(Text::from(l.text.clone()).lines);
            text.lines.push(Line::from(""));
        }

        // Keep the newest lines in view.
        let width = chunks[0].width.saturating_sub(2).max(1) as usize;
        let height = chunks[0].height.saturating_sub(2) as usize;
        let rows: usize = text.lines.iter().map(|l| l.width().div_ceil(width).max(1)).sum();
        let scroll = rows.saturating_sub(height).min(u16::MAX as usize) as u16;

        let chat = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(format!("chatbot | model: {model}")))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));

        let input_w = Paragraph::new(input.to_string())
            .block(Block::default().borders(Borders::ALL).title("input"))
            .wrap(Wrap { trim: false });

        f.render_widget(chat, chunks[0]);
        f.render_widget(input_w, chunks[1]);

        let x = chunks[1].x + 1 + input.chars().count() as u16;
        let y = chunks[1].y + 1;
        f.set_cursor_position((x.min(chunks[1].x + chunks[1].width.saturating_sub(2)), y));
    })?;
    Ok(())
}
