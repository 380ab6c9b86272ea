//! ratatui-based UI.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use homedeck_application::{
    Activation, AppContext, Direction as MoveDir, FragmentHistory, SearchHit, Searcher,
    infer_columns, move_cursor,
};
use homedeck_core::{FragmentEntry, Mode, PanelId, SelectionCursor, Theme};
use homedeck_engine::fetch::Fetcher;
use homedeck_engine::fragments::FragmentStore;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

const TILE_WIDTH: u16 = 20;
const TILE_HEIGHT: u16 = 3;

/// Tiles whose top offset matches the first tile's within this many rows
/// count as the first grid row when inferring the column count.
const ROW_TOLERANCE: u16 = 1;

const BACKGROUND_ACCENTS: &[Color] = &[
    Color::Yellow,
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Blue,
    Color::Red,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Quit,
    Reload,
}

#[derive(Debug, Clone)]
pub struct UiOutcome {
    pub ctx: AppContext,
    pub exit: UiExit,
}

pub struct Ui {
    ctx: AppContext,
    searcher: Searcher,
    fetcher: Fetcher,
    fragments: FragmentStore,
    notes: NotesScreen,
    /// Top offsets of the tiles rendered last frame, in item order. Column
    /// count for vertical cursor moves is inferred from these.
    grid_tops: Vec<u16>,
}

impl Ui {
    pub fn new(ctx: AppContext, notes_root: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            searcher: Searcher::new(),
            fetcher: Fetcher::new(),
            fragments: FragmentStore::new(notes_root),
            notes: NotesScreen::default(),
            grid_tops: Vec::new(),
        }
    }

    pub fn run(&mut self) -> anyhow::Result<UiOutcome> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(outcome)), Ok(())) => Ok(outcome),
            (Ok(Ok(_)), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<UiOutcome> {
        let tick_rate = Duration::from_millis(250);
        let mut needs_redraw = true;
        let mut clock = clock_line();

        loop {
            // Feed items load lazily, once per session, on first Rss entry.
            if self.ctx.mode == Mode::Rss && self.ctx.feed_items.is_none() {
                let accent = self.accent_color();
                terminal.draw(|frame| draw_loading(frame, accent))?;
                let now = chrono::Utc::now().timestamp();
                let items = self.fetcher.feed_items(
                    &self.ctx.feed_sources,
                    self.ctx.settings.feed_item_limit,
                    now,
                );
                tracing::info!(count = items.len(), "feed items loaded");
                self.ctx.feed_items = Some(items);
                needs_redraw = true;
            }

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                let tick = clock_line();
                if tick != clock {
                    clock = tick;
                    needs_redraw = true;
                }
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;

                    let exit = if self.notes.open {
                        self.handle_notes_key(key)?
                    } else {
                        match self.ctx.mode {
                            Mode::Grid => self.handle_grid_key(key)?,
                            Mode::Search => self.handle_search_key(key)?,
                            Mode::BookmarkBrowse => self.handle_browse_key(key)?,
                            Mode::BookmarkSearch => self.handle_bookmark_search_key(key)?,
                            Mode::Rss => self.handle_rss_key(key)?,
                        }
                    };
                    if let Some(exit) = exit {
                        return Ok(UiOutcome {
                            ctx: self.ctx.clone(),
                            exit,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_grid_key(&mut self, key: KeyEvent) -> anyhow::Result<Option<UiExit>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => return Ok(Some(UiExit::Quit)),
                KeyCode::Char('f') => self.open_search(None),
                KeyCode::Char('r') => self.ctx.enter_rss(),
                KeyCode::Char('n') => self.open_notes(),
                KeyCode::Char('t') => self.ctx.settings.cycle_theme(),
                _ => {}
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => {
                // First Esc cancels keyboard navigation; a second one quits.
                if self.ctx.cursor.take().is_some() {
                    return Ok(None);
                }
                return Ok(Some(UiExit::Quit));
            }
            KeyCode::F(5) => return Ok(Some(UiExit::Reload)),
            KeyCode::Tab => {
                if let Some(cursor) = self.ctx.cursor {
                    let panel = match cursor.panel {
                        PanelId::PrimaryGrid => PanelId::SidePanel,
                        PanelId::SidePanel => PanelId::PrimaryGrid,
                    };
                    self.ctx.cursor = Some(SelectionCursor { panel, index: 0 });
                }
            }
            KeyCode::Enter => {
                if let Some(cursor) = self.ctx.cursor {
                    self.activate_cursor(cursor);
                } else if !self.ctx.enter_browse() {
                    tracing::warn!("bookmark browser requested before any tree loaded");
                }
            }
            KeyCode::Left => self.move_selection(MoveDir::Left),
            KeyCode::Right => self.move_selection(MoveDir::Right),
            KeyCode::Up => self.move_selection(MoveDir::Up),
            KeyCode::Down => self.move_selection(MoveDir::Down),
            KeyCode::Char(c) => {
                if c == ' ' || c == '/' {
                    self.open_search(None);
                } else if c.is_ascii_alphabetic() {
                    self.open_search(Some(c));
                } else if let Some(digit) = c.to_digit(10) {
                    if digit >= 1 {
                        self.open_panel_link(digit as usize - 1);
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> anyhow::Result<Option<UiExit>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            // Ctrl+F is swallowed while the search input owns the keyboard.
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
                return Ok(Some(UiExit::Quit));
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => self.ctx.exit_search(),
            KeyCode::Backspace | KeyCode::Delete => {
                if self.ctx.search_query.is_empty() {
                    self.ctx.exit_search();
                } else if key.code == KeyCode::Backspace {
                    self.ctx.search_query.pop();
                    self.ctx.run_search(&self.searcher);
                }
            }
            KeyCode::Enter => {
                if self.ctx.search_hits.is_empty() {
                    let query = self.ctx.search_query.trim().to_string();
                    if !query.is_empty() {
                        let chat = key.modifiers.contains(KeyModifiers::SHIFT);
                        self.open_web_search(&query, chat);
                    }
                } else {
                    let index = self.ctx.cursor.map(|c| c.index).unwrap_or(0);
                    self.activate_cursor(SelectionCursor {
                        panel: PanelId::PrimaryGrid,
                        index,
                    });
                }
            }
            KeyCode::Left => self.move_selection(MoveDir::Left),
            KeyCode::Right => self.move_selection(MoveDir::Right),
            KeyCode::Up => self.move_selection(MoveDir::Up),
            KeyCode::Down => self.move_selection(MoveDir::Down),
            KeyCode::Char(c) => {
                if c == ' ' && self.ctx.search_query.is_empty() {
                    self.ctx.exit_search();
                } else {
                    self.ctx.search_query.push(c);
                    self.ctx.run_search(&self.searcher);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> anyhow::Result<Option<UiExit>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => return Ok(Some(UiExit::Quit)),
                KeyCode::Char('f') => self.open_bookmark_search(),
                _ => {}
            }
            return Ok(None);
        }
        if key.modifiers.contains(KeyModifiers::ALT) && key.code == KeyCode::Up {
            self.ctx.go_back();
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => {
                if self.ctx.cursor.take().is_some() {
                    return Ok(None);
                }
                self.ctx.go_back();
            }
            KeyCode::Backspace => {
                self.ctx.go_back();
            }
            KeyCode::Enter => {
                if let Some(cursor) = self.ctx.cursor {
                    self.activate_cursor(cursor);
                }
            }
            KeyCode::Left => self.move_selection(MoveDir::Left),
            KeyCode::Right => self.move_selection(MoveDir::Right),
            KeyCode::Up => self.move_selection(MoveDir::Up),
            KeyCode::Down => self.move_selection(MoveDir::Down),
            KeyCode::Char('/') => self.open_bookmark_search(),
            _ => {}
        }
        Ok(None)
    }

    fn handle_bookmark_search_key(&mut self, key: KeyEvent) -> anyhow::Result<Option<UiExit>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
                return Ok(Some(UiExit::Quit));
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => self.ctx.exit_bookmark_search(),
            KeyCode::Backspace => {
                self.ctx.bookmark_query.pop();
                self.ctx.run_bookmark_search(&self.searcher);
            }
            KeyCode::Enter => {
                if !self.ctx.bookmark_hits.is_empty() {
                    let index = self.ctx.cursor.map(|c| c.index).unwrap_or(0);
                    self.activate_cursor(SelectionCursor {
                        panel: PanelId::PrimaryGrid,
                        index,
                    });
                }
            }
            KeyCode::Left => self.move_selection(MoveDir::Left),
            KeyCode::Right => self.move_selection(MoveDir::Right),
            KeyCode::Up => self.move_selection(MoveDir::Up),
            KeyCode::Down => self.move_selection(MoveDir::Down),
            KeyCode::Char(c) => {
                self.ctx.bookmark_query.push(c);
                self.ctx.run_bookmark_search(&self.searcher);
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_rss_key(&mut self, key: KeyEvent) -> anyhow::Result<Option<UiExit>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
                return Ok(Some(UiExit::Quit));
            }
            return Ok(None);
        }

        let count = self.ctx.feed_items.as_ref().map(Vec::len).unwrap_or(0);
        match key.code {
            KeyCode::Esc => {
                self.ctx.close_active();
            }
            KeyCode::Up => {
                self.ctx.feed_selected = self.ctx.feed_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if count > 0 {
                    self.ctx.feed_selected = (self.ctx.feed_selected + 1).min(count - 1);
                }
            }
            KeyCode::Enter => {
                let item = self
                    .ctx
                    .feed_items
                    .as_ref()
                    .and_then(|items| items.get(self.ctx.feed_selected))
                    .cloned();
                if let Some(item) = item {
                    self.open_url(&item.link);
                    self.ctx.mark_visited(&item.link);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_notes_key(&mut self, key: KeyEvent) -> anyhow::Result<Option<UiExit>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => return Ok(Some(UiExit::Quit)),
                KeyCode::Char('n') => self.notes.open = false,
                _ => {}
            }
            return Ok(None);
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            match key.code {
                KeyCode::Left => {
                    if let Some(entry) = self.notes.history.back().cloned() {
                        self.show_fragment(entry, false);
                    }
                }
                KeyCode::Right => {
                    if let Some(entry) = self.notes.history.forward().cloned() {
                        self.show_fragment(entry, false);
                    }
                }
                _ => {}
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => self.notes.open = false,
            KeyCode::Up => self.notes.selected = self.notes.selected.saturating_sub(1),
            KeyCode::Down => {
                let count = self.ctx.notes_menu.len();
                if count > 0 {
                    self.notes.selected = (self.notes.selected + 1).min(count - 1);
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = self.ctx.notes_menu.get(self.notes.selected).cloned() {
                    self.show_fragment(entry, true);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn open_search(&mut self, seed: Option<char>) {
        self.ctx.enter_search(seed);
        self.ctx.run_search(&self.searcher);
    }

    fn open_bookmark_search(&mut self) {
        self.ctx.enter_bookmark_search();
        self.ctx.run_bookmark_search(&self.searcher);
    }

    fn open_notes(&mut self) {
        self.notes.open = true;
        self.notes.selected = self.notes.selected.min(self.ctx.notes_menu.len().saturating_sub(1));
        if self.notes.history.current().is_none() {
            if let Some(entry) = self.ctx.notes_menu.first().cloned() {
                self.show_fragment(entry, true);
            }
        }
    }

    fn show_fragment(&mut self, entry: FragmentEntry, record: bool) {
        match self.fragments.load(&entry.path) {
            Ok(text) => self.notes.content = text,
            Err(err) => {
                tracing::warn!(fragment = %entry.path, "fragment load failed: {err:#}");
                self.notes.content = format!("(unable to load {})", entry.path);
            }
        }
        self.notes.title = entry.title.clone();
        if let Some(index) = self
            .ctx
            .notes_menu
            .iter()
            .position(|candidate| candidate.path == entry.path)
        {
            self.notes.selected = index;
        }
        if record {
            self.notes.history.visit(entry);
        }
    }

    fn move_selection(&mut self, direction: MoveDir) {
        let Some(cursor) = self.ctx.cursor else {
            // First arrow press only enables navigation.
            self.ctx.cursor = Some(SelectionCursor::grid());
            return;
        };
        let len = self.ctx.collection_len(cursor.panel);
        let columns = match cursor.panel {
            PanelId::SidePanel => len.max(1),
            PanelId::PrimaryGrid => infer_columns(&self.grid_tops, ROW_TOLERANCE),
        };
        self.ctx.cursor = Some(move_cursor(cursor, direction, len, columns));
    }

    fn activate_cursor(&mut self, cursor: SelectionCursor) {
        match self.ctx.activate(cursor.panel, cursor.index) {
            Some(Activation::OpenUrl(url)) => self.open_url(&url),
            Some(Activation::EnterRss) => self.ctx.enter_rss(),
            Some(Activation::OpenedFolder) | None => {}
        }
    }

    fn open_panel_link(&mut self, index: usize) {
        let Some(link) = self.ctx.panel_links.get(index) else {
            return;
        };
        let url = link.url.clone();
        self.open_url(&url);
    }

    fn open_url(&mut self, url: &str) {
        if let Err(err) = open::that(url) {
            tracing::warn!(url, "open in browser failed: {err}");
        }
    }

    fn open_web_search(&mut self, query: &str, chat: bool) {
        let base = if chat && !self.ctx.settings.chat_url.is_empty() {
            self.ctx.settings.chat_url.clone()
        } else {
            self.ctx.settings.search_url.clone()
        };
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.open_url(&format!("{base}{encoded}"));
    }

    fn accent_color(&self) -> Color {
        if let Some(background) = &self.ctx.background {
            let sum: u64 = background.bytes().map(u64::from).sum();
            return BACKGROUND_ACCENTS[(sum % BACKGROUND_ACCENTS.len() as u64) as usize];
        }
        match self.ctx.settings.theme {
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Yellow,
        }
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);
        if self.notes.open {
            self.draw_notes(area, frame);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        self.draw_header(layout[0], frame);
        match self.ctx.mode {
            Mode::Grid => self.draw_grid_body(layout[1], frame),
            Mode::Search => self.draw_search_body(layout[1], frame),
            Mode::BookmarkBrowse => self.draw_browse_body(layout[1], frame),
            Mode::BookmarkSearch => self.draw_bookmark_search_body(layout[1], frame),
            Mode::Rss => self.draw_feed_body(layout[1], frame),
        }
        self.draw_footer(layout[2], frame);
    }

    fn draw_header(&self, area: Rect, frame: &mut ratatui::Frame) {
        let accent = Style::default()
            .fg(self.accent_color())
            .add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(vec![
                Span::styled("homedeck", accent),
                Span::raw("  ·  "),
                Span::raw(clock_line()),
            ]),
            Line::from(Span::styled(
                self.ctx.mode.to_string(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        let title = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, area);
    }

    fn draw_grid_body(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let tiles: Vec<Tile> = self.ctx.links.iter().map(Tile::link).collect();
        let selected = self.grid_cursor_index();
        self.draw_tile_grid(layout[0], frame, &tiles, selected, "No links configured.");
        self.draw_side_panel(layout[1], frame);
    }

    fn draw_search_body(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        self.draw_query_box(layout[0], frame, "Search", &self.ctx.search_query.clone());

        let tiles: Vec<Tile> = self
            .ctx
            .search_hits
            .iter()
            .map(|hit| match hit {
                SearchHit::Link(record) => Tile::link(record),
                SearchHit::FeedEntry => Tile {
                    label: "RSS Feed".to_string(),
                    folder: false,
                },
            })
            .collect();
        let selected = self.grid_cursor_index();
        self.draw_tile_grid(layout[1], frame, &tiles, selected, "No matches.");
    }

    fn draw_browse_body(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let path = Paragraph::new(Line::from(Span::styled(
            self.browse_path(),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Left);
        frame.render_widget(path, layout[0]);

        let tiles: Vec<Tile> = self
            .ctx
            .current_folder()
            .map(|folder| {
                folder
                    .children()
                    .iter()
                    .map(|child| Tile {
                        label: child.name().to_string(),
                        folder: child.is_folder(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let selected = self.grid_cursor_index();
        self.draw_tile_grid(layout[1], frame, &tiles, selected, "No bookmarks.");
    }

    fn draw_bookmark_search_body(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        self.draw_query_box(
            layout[0],
            frame,
            "All bookmarks",
            &self.ctx.bookmark_query.clone(),
        );

        let tiles: Vec<Tile> = self.ctx.bookmark_hits.iter().map(Tile::link).collect();
        let selected = self.grid_cursor_index();
        self.draw_tile_grid(layout[1], frame, &tiles, selected, "No matches.");
    }

    fn draw_feed_body(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let block = Block::default().borders(Borders::ALL).title("Feeds");
        let items = self.ctx.feed_items.as_deref().unwrap_or(&[]);
        if items.is_empty() {
            let empty = Paragraph::new("No items.")
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, area);
            return;
        }

        let now = chrono::Utc::now().timestamp();
        let accent = self.accent_color();
        let rows: Vec<ListItem> = items
            .iter()
            .map(|item| {
                let mut style = Style::default();
                if self.ctx.is_visited(&item.link) {
                    style = style.add_modifier(Modifier::DIM);
                }
                let line = Line::from(vec![
                    Span::styled(item.feed_title.clone(), Style::default().fg(accent)),
                    Span::raw("  "),
                    Span::styled(item.title.clone(), style),
                    Span::raw("  "),
                    Span::styled(
                        format_relative(item.published, now),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                ]);
                ListItem::new(line).style(style)
            })
            .collect();

        let list = List::new(rows)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.ctx.feed_selected.min(items.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_notes(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(area);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(layout[0]);

        let rows: Vec<ListItem> = self
            .ctx
            .notes_menu
            .iter()
            .map(|entry| ListItem::new(Line::raw(entry.title.clone())))
            .collect();
        let accent = self.accent_color();
        let menu = List::new(rows)
            .block(Block::default().borders(Borders::ALL).title("Notes"))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !self.ctx.notes_menu.is_empty() {
            state.select(Some(self.notes.selected.min(self.ctx.notes_menu.len() - 1)));
        }
        frame.render_stateful_widget(menu, body[0], &mut state);

        let title = if self.notes.title.is_empty() {
            "Notes".to_string()
        } else {
            self.notes.title.clone()
        };
        let content = Paragraph::new(self.notes.content.clone())
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(content, body[1]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("Enter", bold()),
            Span::raw(" open  "),
            Span::styled("Alt+←/→", bold()),
            Span::raw(" history  "),
            Span::styled("Esc", bold()),
            Span::raw(" close"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
        frame.render_widget(help, layout[1]);
    }

    fn draw_query_box(&self, area: Rect, frame: &mut ratatui::Frame, title: &str, query: &str) {
        let accent = self.accent_color();
        let input = Paragraph::new(Line::from(vec![
            Span::raw(query.to_string()),
            Span::styled("▏", Style::default().fg(accent)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string()),
        );
        frame.render_widget(input, area);
    }

    fn draw_side_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let selected = match self.ctx.cursor {
            Some(SelectionCursor {
                panel: PanelId::SidePanel,
                index,
            }) => Some(index),
            _ => None,
        };

        let mut spans: Vec<Span> = Vec::new();
        for (i, link) in self.ctx.panel_links.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("   "));
            }
            let label = format!("{} {}", i + 1, link.display_name);
            let style = if selected == Some(i) {
                Style::default()
                    .fg(Color::Black)
                    .bg(self.accent_color())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(label, style));
        }
        if spans.is_empty() {
            spans.push(Span::styled(
                "no quick links",
                Style::default().add_modifier(Modifier::DIM),
            ));
        }

        let panel = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(panel, area);
    }

    fn draw_tile_grid(
        &mut self,
        area: Rect,
        frame: &mut ratatui::Frame,
        tiles: &[Tile],
        selected: Option<usize>,
        empty_message: &str,
    ) {
        self.grid_tops.clear();
        if tiles.is_empty() {
            let empty = Paragraph::new(empty_message.to_string()).wrap(Wrap { trim: true });
            frame.render_widget(empty, area);
            return;
        }

        let rects = tile_rects(area, tiles.len());
        let visible_rows = (area.height / TILE_HEIGHT).max(1);
        let columns = (area.width / TILE_WIDTH).max(1) as usize;
        let selected_row = selected.map(|index| index / columns).unwrap_or(0) as u16;
        let row_offset = selected_row.saturating_sub(visible_rows - 1);

        let accent = self.accent_color();
        for (index, (tile, rect)) in tiles.iter().zip(rects).enumerate() {
            let mut rect = rect;
            let scroll = row_offset * TILE_HEIGHT;
            if rect.y < area.y + scroll {
                continue;
            }
            rect.y -= scroll;
            if rect.y + rect.height > area.y + area.height {
                continue;
            }
            self.grid_tops.push(rect.y);

            let highlighted = selected == Some(index);
            let border_style = if highlighted {
                Style::default().fg(accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            let label_style = if highlighted {
                Style::default().fg(accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let marker = if tile.folder { "▸ " } else { "" };
            let label = truncate_label(
                &format!("{marker}{}", tile.label),
                rect.width.saturating_sub(2) as usize,
            );
            let block = Block::default().borders(Borders::ALL).border_style(border_style);
            let paragraph = Paragraph::new(Line::from(Span::styled(label, label_style)))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, rect);
        }
    }

    fn draw_footer(&self, area: Rect, frame: &mut ratatui::Frame) {
        let lines = match self.ctx.mode {
            Mode::Grid => vec![
                Line::from(vec![
                    Span::styled("a-z", bold()),
                    Span::raw(" search  "),
                    Span::styled("Enter", bold()),
                    Span::raw(" bookmarks  "),
                    Span::styled("Ctrl+R", bold()),
                    Span::raw(" feeds  "),
                    Span::styled("Ctrl+N", bold()),
                    Span::raw(" notes  "),
                    Span::styled("Ctrl+T", bold()),
                    Span::raw(" theme"),
                ]),
                Line::from(vec![
                    Span::styled("arrows", bold()),
                    Span::raw(" select  "),
                    Span::styled("Tab", bold()),
                    Span::raw(" panel  "),
                    Span::styled("1-9", bold()),
                    Span::raw(" quick links  "),
                    Span::styled("Esc", bold()),
                    Span::raw(" quit"),
                ]),
            ],
            Mode::Search => vec![Line::from(vec![
                Span::styled("Enter", bold()),
                Span::raw(" open top hit  "),
                Span::styled("Shift+Enter", bold()),
                Span::raw(" ask chat  "),
                Span::styled("Esc", bold()),
                Span::raw(" close"),
            ])],
            Mode::BookmarkBrowse => vec![Line::from(vec![
                Span::styled("Enter", bold()),
                Span::raw(" open  "),
                Span::styled("Backspace", bold()),
                Span::raw(" up one level  "),
                Span::styled("/", bold()),
                Span::raw(" search all  "),
                Span::styled("Esc", bold()),
                Span::raw(" back/close"),
            ])],
            Mode::BookmarkSearch => vec![Line::from(vec![
                Span::styled("Enter", bold()),
                Span::raw(" open top hit  "),
                Span::styled("Esc", bold()),
                Span::raw(" back to folders"),
            ])],
            Mode::Rss => vec![Line::from(vec![
                Span::styled("↑/↓", bold()),
                Span::raw(" select  "),
                Span::styled("Enter", bold()),
                Span::raw(" open & mark read  "),
                Span::styled("Esc", bold()),
                Span::raw(" close"),
            ])],
        };

        let footer = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }

    fn grid_cursor_index(&self) -> Option<usize> {
        match self.ctx.cursor {
            Some(SelectionCursor {
                panel: PanelId::PrimaryGrid,
                index,
            }) => Some(index),
            _ => None,
        }
    }

    fn browse_path(&self) -> String {
        let mut parts = vec!["Bookmarks".to_string()];
        let mut node = self.ctx.bookmark_tree.as_ref();
        for &index in &self.ctx.nav_path {
            node = node.and_then(|folder| folder.children().get(index));
            if let Some(folder) = node {
                parts.push(folder.name().to_string());
            }
        }
        parts.join(" / ")
    }
}

#[derive(Debug, Default)]
struct NotesScreen {
    open: bool,
    selected: usize,
    history: FragmentHistory,
    title: String,
    content: String,
}

#[derive(Debug, Clone)]
struct Tile {
    label: String,
    folder: bool,
}

impl Tile {
    fn link(record: &homedeck_core::LinkRecord) -> Self {
        Self {
            label: record.display_name.clone(),
            folder: false,
        }
    }
}

fn draw_loading(frame: &mut ratatui::Frame, accent: Color) {
    let area = centered_rect(40, 20, frame.area());
    frame.render_widget(Clear, area);
    let message = Paragraph::new("Loading feeds…")
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent)),
        );
    frame.render_widget(message, area);
}

/// Fixed-size tile layout; tops feed the column inference.
fn tile_rects(area: Rect, count: usize) -> Vec<Rect> {
    let columns = (area.width / TILE_WIDTH).max(1) as usize;
    (0..count)
        .map(|index| {
            let col = (index % columns) as u16;
            let row = (index / columns) as u16;
            Rect {
                x: area.x + col * TILE_WIDTH,
                y: area.y + row * TILE_HEIGHT,
                width: TILE_WIDTH.min(area.width),
                height: TILE_HEIGHT,
            }
        })
        .collect()
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn clock_line() -> String {
    Local::now().format("%I:%M %p | %a, %-m/%-d").to_string()
}

fn format_relative(published: i64, now: i64) -> String {
    let delta = now.saturating_sub(published);
    if delta < 60 {
        return "just now".to_string();
    }
    if delta < 60 * 60 {
        return format!("{}m ago", delta / 60);
    }
    if delta < 60 * 60 * 24 {
        return format!("{}h ago", delta / (60 * 60));
    }
    if delta < 60 * 60 * 24 * 7 {
        return format!("{}d ago", delta / (60 * 60 * 24));
    }
    chrono::DateTime::from_timestamp(published, 0)
        .map(|date| date.format("%b %-d").to_string())
        .unwrap_or_else(|| "long ago".to_string())
}

fn truncate_label(label: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(label) <= max_width {
        return label.to_string();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for ch in label.chars() {
        let mut buf = [0u8; 4];
        let w = UnicodeWidthStr::width(ch.encode_utf8(&mut buf));
        if width + w >= max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}
