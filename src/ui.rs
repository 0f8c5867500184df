use std::io::{self, Stdout};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};

use crate::data::{Item, Listing, Selection};

const COLOR_SITE: Color = Color::Rgb(166, 227, 161);
const COLOR_COMMENTS: Color = Color::Rgb(249, 226, 175);
const COLOR_STATUS_FG: Color = Color::Rgb(205, 214, 244);
const COLOR_STATUS_BG: Color = Color::Rgb(49, 50, 68);

const KEY_HINT: &str = " q/Enter open  j/k scroll  g/G top/bottom";

/// A decoded keystroke. Anything that is not a navigation command is
/// offered to the listing as an item key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Abort,
    ScrollUp,
    ScrollDown,
    Top,
    Bottom,
    Activate(char),
}

impl Command {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return (key.code == KeyCode::Char('c')).then_some(Command::Abort);
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Enter => Some(Command::Quit),
            KeyCode::Char('k') => Some(Command::ScrollUp),
            KeyCode::Char('j') | KeyCode::Char(' ') => Some(Command::ScrollDown),
            KeyCode::Char('g') => Some(Command::Top),
            KeyCode::Char('G') => Some(Command::Bottom),
            KeyCode::Char(ch) => Some(Command::Activate(ch)),
            _ => None,
        }
    }
}

/// Scroll window over the listing. `scroll_offset` stays within
/// `0..=total.saturating_sub(height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_offset: usize,
    pub height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            height: 1,
        }
    }
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            scroll_offset: 0,
            height: height.max(1),
        }
    }

    fn max_offset(&self, total: usize) -> usize {
        total.saturating_sub(self.height)
    }

    pub fn resize(&mut self, height: usize, total: usize) {
        self.height = height.max(1);
        self.clamp(total);
    }

    pub fn clamp(&mut self, total: usize) {
        self.scroll_offset = self.scroll_offset.min(self.max_offset(total));
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, total: usize) {
        self.scroll_offset += 1;
        if self.scroll_offset + self.height > total {
            self.scroll_offset = self.max_offset(total);
        }
    }

    pub fn top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn bottom(&mut self, total: usize) {
        self.scroll_offset = self.max_offset(total);
    }

    pub fn visible(&self, total: usize) -> Range<usize> {
        let start = self.scroll_offset.min(total);
        let end = (start + self.height).min(total);
        start..end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuExit {
    Confirmed(Listing),
    Cancelled,
}

/// Source of keystrokes for a menu session.
pub trait KeySource {
    /// Blocks for the next keystroke. `Ok(None)` means the display changed
    /// (for example a resize) and the menu should redraw.
    fn next_key(&mut self) -> Result<Option<KeyEvent>>;
}

/// Keystrokes from the controlling terminal.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> Result<Option<KeyEvent>> {
        loop {
            match event::read().context("read terminal event")? {
                Event::Key(key) => return Ok(Some(key)),
                Event::Resize(..) => return Ok(None),
                _ => {}
            }
        }
    }
}

pub struct SelectionMenu {
    listing: Listing,
    viewport: Viewport,
}

impl SelectionMenu {
    pub fn new(listing: Listing) -> Self {
        Self {
            listing,
            viewport: Viewport::default(),
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn apply(&mut self, command: Command) -> Step {
        let total = self.listing.len();
        match command {
            Command::Quit => return Step::Confirm,
            Command::Abort => return Step::Cancel,
            Command::ScrollUp => self.viewport.scroll_up(),
            Command::ScrollDown => self.viewport.scroll_down(total),
            Command::Top => self.viewport.top(),
            Command::Bottom => self.viewport.bottom(total),
            Command::Activate(key) => {
                self.listing.activate(key);
            }
        }
        Step::Continue
    }

    /// Runs the session until the user confirms or aborts. Each frame re-reads
    /// the viewport height from the terminal before drawing.
    pub fn run<B: Backend, K: KeySource>(
        mut self,
        terminal: &mut Terminal<B>,
        keys: &mut K,
    ) -> Result<MenuExit> {
        loop {
            terminal
                .draw(|frame| self.draw(frame))
                .context("draw selection menu")?;

            let Some(key) = keys.next_key()? else {
                continue;
            };
            let Some(command) = Command::from_key(key) else {
                continue;
            };

            match self.apply(command) {
                Step::Continue => {}
                Step::Confirm => return Ok(MenuExit::Confirmed(self.listing)),
                Step::Cancel => return Ok(MenuExit::Cancelled),
            }
        }
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let (list_area, status_area) = split_area(frame.size());
        self.viewport
            .resize(list_area.height as usize, self.listing.len());

        let visible = self.viewport.visible(self.listing.len());
        let rows: Vec<ListItem> = self.listing.items()[visible]
            .iter()
            .map(|item| ListItem::new(Line::from(Span::styled(row_text(item), row_style(item)))))
            .collect();
        frame.render_widget(List::new(rows), list_area);

        if let Some(area) = status_area {
            frame.render_widget(self.status_line(), area);
        }
    }

    fn status_line(&self) -> Paragraph<'static> {
        let site = self.listing.count(Selection::Site);
        let comments = self.listing.count(Selection::Comments);
        let line = Line::from(vec![
            Span::raw(KEY_HINT),
            Span::raw("   "),
            Span::styled(format!("site {site}"), Style::default().fg(COLOR_SITE)),
            Span::raw("  "),
            Span::styled(
                format!("comments {comments}"),
                Style::default().fg(COLOR_COMMENTS),
            ),
        ]);
        Paragraph::new(line).style(
            Style::default()
                .fg(COLOR_STATUS_FG)
                .bg(COLOR_STATUS_BG)
                .add_modifier(Modifier::BOLD),
        )
    }
}

fn split_area(area: Rect) -> (Rect, Option<Rect>) {
    if area.height < 2 {
        return (area, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    (chunks[0], Some(chunks[1]))
}

fn row_text(item: &Item) -> String {
    let key = item.key().map(String::from).unwrap_or_default();
    format!(" {key:2} - {}", item.title)
}

fn row_style(item: &Item) -> Style {
    match item.selection {
        Selection::Unselected => Style::default(),
        Selection::Site => Style::default().fg(COLOR_SITE),
        Selection::Comments => Style::default().fg(COLOR_COMMENTS),
    }
}

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Set while a `TerminalGuard` holds the terminal.
static TERMINAL_ACQUIRED: AtomicBool = AtomicBool::new(false);

/// Raw mode and the alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    pub fn acquire() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        match Self::enter() {
            Ok(terminal) => {
                TERMINAL_ACQUIRED.store(true, Ordering::SeqCst);
                Ok(Self { terminal })
            }
            Err(err) => {
                let _ = restore();
                Err(err)
            }
        }
    }

    fn enter() -> Result<Tui> {
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .context("enter alternate screen")?;
        stdout.execute(Hide).context("hide cursor")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")?;
        terminal.clear().context("clear terminal")?;
        Ok(terminal)
    }

    pub fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_if_acquired();
    }
}

/// Restores the terminal only while a guard holds it. Returns whether a
/// restore happened.
pub fn restore_if_acquired() -> io::Result<bool> {
    if !TERMINAL_ACQUIRED.swap(false, Ordering::SeqCst) {
        return Ok(false);
    }
    restore()?;
    Ok(true)
}

/// Leaves raw mode and the alternate screen. Safe to call more than once.
pub fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen)?;
    stdout.execute(Show)?;
    Ok(())
}

/// Runs an interactive menu on the controlling terminal.
pub fn run_menu(listing: Listing) -> Result<MenuExit> {
    let mut guard = TerminalGuard::acquire()?;
    SelectionMenu::new(listing).run(guard.terminal_mut(), &mut TerminalKeys)
}
