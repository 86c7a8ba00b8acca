//! App — terminal event loop around the view-state machine.
//!
//! Architecture:
//! - `App` owns the `ViewStateMachine`, the catalog client, the player and
//!   the toast overlay.
//! - A `tokio::mpsc` channel carries `AppMessage`s in from background tasks:
//!   terminal events from a blocking reader, catalog results from fetch tasks.
//! - Key presses become `Action`s, actions resolve against the cursor and the
//!   active view into `Intent`s, and the machine's `Effect`s are carried out
//!   here.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use podcast_core::catalog::{CatalogClient, CatalogEvent, Fetch};
use podcast_core::genres::genre_label;
use podcast_core::view_state::{Effect, Intent, LoadStatus, View, ViewStateMachine};
use ratatui::crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{action_for_key, Action};
use crate::player::Player;
use crate::theme::{
    style_accent, style_border, style_default, style_error, style_loading, style_muted,
    style_playing, style_secondary, style_selected, style_star, style_tag,
};
use crate::widgets::status_bar;
use crate::widgets::toast::ToastManager;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Catalog(CatalogEvent),
}

/// One cursor per view, so going back lands where the user left.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Cursors {
    previews: usize,
    seasons: usize,
    episodes: usize,
    favourites: usize,
}

impl Cursors {
    fn get(&self, view: &View) -> usize {
        match view {
            View::Previews => self.previews,
            View::ShowDetail(_) => self.seasons,
            View::Season { .. } => self.episodes,
            View::Favourites => self.favourites,
        }
    }

    fn get_mut(&mut self, view: &View) -> &mut usize {
        match view {
            View::Previews => &mut self.previews,
            View::ShowDetail(_) => &mut self.seasons,
            View::Season { .. } => &mut self.episodes,
            View::Favourites => &mut self.favourites,
        }
    }
}

fn depth(view: &View) -> u8 {
    match view {
        View::Previews => 0,
        View::ShowDetail(_) | View::Favourites => 1,
        View::Season { .. } => 2,
    }
}

pub struct App {
    machine: ViewStateMachine,
    catalog: Arc<dyn CatalogClient>,
    player: Player,
    toast: ToastManager,
    cursors: Cursors,
    paused: bool,
    spinner_label: Option<&'static str>,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(machine: ViewStateMachine, catalog: Arc<dyn CatalogClient>, player: Player) -> Self {
        Self {
            machine,
            catalog,
            player,
            toast: ToastManager::new(),
            cursors: Cursors::default(),
            paused: false,
            spinner_label: None,
            tx: None,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard events ──────────────────────────────────
        // Polls so the reader notices the app has gone away.
        let event_tx = tx;
        tokio::task::spawn_blocking(move || loop {
            if event_tx.is_closed() {
                break;
            }
            match event::poll(Duration::from_millis(250)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(_) => break,
            }
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        self.start().await;
        let result = self.main_loop(&mut terminal, &mut rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        self.player.stop().await;
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        let (favourites, playback) = self.machine.into_parts();
        playback.dispose();
        drop(favourites.dispose());
        info!("podcasts: shut down");

        result
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Term,
        rx: &mut mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        // Toast expiry + spinner animation + player liveness.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg).await;
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next).await;
                    }
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    needs_redraw = self.on_tick().await;
                }
            }
        }
        Ok(())
    }

    async fn start(&mut self) {
        info!("podcasts: starting");
        let effects = self.machine.start();
        self.apply_effects(effects).await;
    }

    // ── Message handler ───────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                if let Some(action) = action_for_key(key) {
                    self.handle_action(action).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Catalog(event) => {
                let before = depth(self.machine.view());
                let effects = self.machine.on_catalog_event(event);
                self.after_transition(before);
                self.apply_effects(effects).await;
            }
        }
    }

    async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Move(delta) => self.move_cursor(delta),
            Action::TogglePause => self.toggle_pause().await,
            other => match self.resolve(&other) {
                Some(intent) => self.dispatch(intent).await,
                None => debug!("app: {:?} has no target in {}", other, self.machine.view().name()),
            },
        }
    }

    /// Turn a cursor-relative action into an intent for the active view.
    fn resolve(&self, action: &Action) -> Option<Intent> {
        let view = self.machine.view();
        let cursor = self.cursors.get(view);
        match (action, view) {
            (Action::Intent(intent), _) => Some(intent.clone()),

            (Action::Activate, View::Previews) => {
                if matches!(self.machine.previews_status(), LoadStatus::Failed(_)) {
                    return Some(Intent::RetryPreviews);
                }
                self.machine
                    .previews()
                    .get(cursor)
                    .map(|p| Intent::SelectShow(p.id.clone()))
            }
            (Action::Activate, View::ShowDetail(show)) => show
                .seasons
                .get(cursor)
                .map(|s| Intent::SelectSeason(s.id.clone())),
            (Action::Activate | Action::Play, View::Season { season, .. }) => {
                season.episodes.get(cursor).cloned().map(Intent::PlayEpisode)
            }
            (Action::Activate | Action::Play, View::Favourites) => self
                .machine
                .favourites()
                .get(cursor)
                .cloned()
                .map(Intent::PlayFavourite),

            (Action::Back, View::ShowDetail(_) | View::Favourites) => Some(Intent::BackToPreviews),
            (Action::Back, View::Season { .. }) => Some(Intent::BackToSeasons),

            (Action::ToggleFavourite, View::Season { season, .. }) => {
                season.episodes.get(cursor).cloned().map(Intent::ToggleFavourite)
            }
            (Action::Remove, View::Favourites) => self
                .machine
                .favourites()
                .get(cursor)
                .map(|e| Intent::RemoveFavourite(e.id.clone())),

            _ => None,
        }
    }

    async fn dispatch(&mut self, intent: Intent) {
        let before = depth(self.machine.view());
        let effects = self.machine.handle(intent);
        self.after_transition(before);
        self.apply_effects(effects).await;
    }

    /// Going deeper starts the new list at the top; every list is clamped so
    /// removals never leave the cursor past the end.
    fn after_transition(&mut self, before: u8) {
        if depth(self.machine.view()) > before {
            *self.cursors.get_mut(self.machine.view()) = 0;
        }
        let len = self.list_len();
        let cursor = self.cursors.get_mut(self.machine.view());
        *cursor = (*cursor).min(len.saturating_sub(1));
    }

    fn list_len(&self) -> usize {
        match self.machine.view() {
            View::Previews => self.machine.previews().len(),
            View::ShowDetail(show) => show.seasons.len(),
            View::Season { season, .. } => season.episodes.len(),
            View::Favourites => self.machine.favourites().len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.list_len();
        let cursor = self.cursors.get_mut(self.machine.view());
        if len == 0 {
            *cursor = 0;
            return;
        }
        let next = (*cursor as isize + delta).clamp(0, len as isize - 1);
        *cursor = next as usize;
    }

    async fn toggle_pause(&mut self) {
        if self.machine.now_playing().is_none() {
            return;
        }
        match self.player.toggle_pause().await {
            Ok(()) => self.paused = !self.paused,
            Err(e) => {
                warn!("player: pause failed: {}", e);
                self.toast.error(format!("pause failed: {}", e));
            }
        }
    }

    /// Toast expiry, spinner animation and player liveness.  Returns whether
    /// anything visible changed; the playback revision catches a slot cleared
    /// by `check_player`.
    async fn on_tick(&mut self) -> bool {
        let had_toasts = !self.toast.is_empty();
        let rev = self.machine.playback_rev();
        self.toast.tick();
        self.check_player().await;
        had_toasts || !self.toast.is_empty() || self.machine.playback_rev() != rev
    }

    /// Clear the slot once mpv exits on its own (end of episode or crash).
    async fn check_player(&mut self) {
        if self.machine.now_playing().is_some() && !self.player.is_running() {
            info!("app: playback ended");
            let effects = self.machine.handle(Intent::StopPlayback);
            self.apply_effects(effects).await;
        }
    }

    // ── Effects ───────────────────────────────────────────────────────────────

    async fn apply_effects(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Fetch(fetch) => self.spawn_fetch(fetch),
                Effect::StartAudio(episode) => {
                    self.paused = false;
                    if let Err(e) = self.player.play(&episode.file).await {
                        warn!("player: could not start {:?}: {}", episode.title, e);
                        self.toast.error(format!("cannot play {}: {}", episode.title, e));
                        queue.extend(self.machine.handle(Intent::StopPlayback));
                    }
                }
                Effect::StopAudio => {
                    self.player.stop().await;
                    self.paused = false;
                }
                Effect::Notify(notice) => self.toast.notice(&notice),
            }
        }
        self.sync_spinner();
    }

    fn spawn_fetch(&self, fetch: Fetch) {
        let Some(tx) = self.tx.clone() else {
            warn!("app: no event channel, dropping fetch {:?}", fetch.kind);
            return;
        };
        debug!("app: fetch {:?} (tag {})", fetch.kind, fetch.tag.value());
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            let event = fetch.run(catalog.as_ref()).await;
            let _ = tx.send(AppMessage::Catalog(event)).await;
        });
    }

    fn sync_spinner(&mut self) {
        let label = if self.machine.is_loading_previews() {
            Some("loading shows")
        } else if self.machine.is_loading_detail() {
            Some("loading show")
        } else {
            None
        };
        if label == self.spinner_label {
            return;
        }
        self.spinner_label = label;
        match label {
            Some(text) => self.toast.spinner(text),
            None => self.toast.dismiss_spinner(),
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(frame, rows[0]);

        let view = self.machine.view();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_border())
            .title(Span::styled(format!(" {} ", body_title(view)), style_accent()));
        let inner = block.inner(rows[1]);
        frame.render_widget(block, rows[1]);

        let cursor = self.cursors.get(view);
        match view {
            View::Previews => self.draw_previews(frame, inner, cursor),
            View::ShowDetail(show) => {
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(4), Constraint::Min(0)])
                    .split(inner);
                frame.render_widget(
                    Paragraph::new(show.description.as_str())
                        .style(style_secondary())
                        .wrap(Wrap { trim: true }),
                    parts[0],
                );
                let items = show
                    .seasons
                    .iter()
                    .map(|s| {
                        ListItem::new(Line::from(vec![
                            Span::styled(s.title.clone(), style_default()),
                            Span::styled(
                                format!("  {}", count_label(s.episodes.len(), "episode")),
                                style_muted(),
                            ),
                        ]))
                    })
                    .collect();
                draw_list(frame, parts[1], items, cursor);
            }
            View::Season { season, .. } => {
                let playing = self.machine.now_playing().map(|p| p.file.as_str());
                let items = season
                    .episodes
                    .iter()
                    .map(|ep| {
                        let play_mark = if playing == Some(ep.file.as_str()) {
                            Span::styled("▶ ", style_playing())
                        } else {
                            Span::raw("  ")
                        };
                        let star = if self.machine.is_favourite(&ep.id) {
                            Span::styled("★ ", style_star())
                        } else {
                            Span::raw("  ")
                        };
                        ListItem::new(Line::from(vec![
                            play_mark,
                            star,
                            Span::styled(ep.title.clone(), style_default()),
                        ]))
                    })
                    .collect();
                draw_list(frame, inner, items, cursor);
            }
            View::Favourites => {
                let favourites = self.machine.favourites();
                if favourites.is_empty() {
                    draw_message(
                        frame,
                        inner,
                        "No favourites yet. Press f on an episode to add one.",
                        style_muted(),
                    );
                } else {
                    let items = favourites
                        .iter()
                        .map(|e| {
                            ListItem::new(Line::from(vec![
                                Span::styled("★ ", style_star()),
                                Span::styled(e.title.clone(), style_default()),
                                Span::styled(
                                    format!("  {} · {}", e.show_title, e.season_title),
                                    style_secondary(),
                                ),
                                Span::styled(
                                    format!("  added {}", e.added_at.format("%Y-%m-%d")),
                                    style_muted(),
                                ),
                            ]))
                        })
                        .collect();
                    draw_list(frame, inner, items, cursor);
                }
            }
        }

        status_bar::draw_now_playing(frame, rows[2], self.machine.now_playing(), self.paused);
        status_bar::draw_keys_bar(frame, rows[3], view);
        self.toast.draw(frame, area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let crumbs = breadcrumb(self.machine.view());
        let last = crumbs.len() - 1;
        let mut spans = vec![Span::raw(" ")];
        for (i, crumb) in crumbs.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" › ", style_muted()));
            }
            let style = if i == last { style_accent() } else { style_secondary() };
            spans.push(Span::styled(crumb, style));
        }
        spans.push(Span::styled(
            format!("   ★ {}", self.machine.favourites().len()),
            style_star(),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_previews(&self, frame: &mut Frame, area: Rect, cursor: usize) {
        let previews = self.machine.previews();
        if previews.is_empty() {
            match self.machine.previews_status() {
                LoadStatus::Loading => draw_message(frame, area, "Loading shows…", style_loading()),
                LoadStatus::Failed(e) => draw_message(
                    frame,
                    area,
                    &format!("Could not load shows: {}\nPress r to retry.", e),
                    style_error(),
                ),
                LoadStatus::Ready => draw_message(frame, area, "No shows available.", style_muted()),
            }
            return;
        }
        let items = previews
            .iter()
            .map(|p| {
                let genres = p
                    .genre_ids
                    .iter()
                    .map(|&g| genre_label(g))
                    .collect::<Vec<_>>()
                    .join(", ");
                ListItem::new(Line::from(vec![
                    Span::styled(p.title.clone(), style_default()),
                    Span::styled(
                        format!("  {}", count_label(p.seasons_count as usize, "season")),
                        style_secondary(),
                    ),
                    Span::styled(format!("  {}", genres), style_tag()),
                    Span::styled(
                        format!("  updated {}", p.updated_at.format("%Y-%m-%d")),
                        style_muted(),
                    ),
                ]))
            })
            .collect();
        draw_list(frame, area, items, cursor);
    }
}

fn draw_list(frame: &mut Frame, area: Rect, items: Vec<ListItem<'static>>, cursor: usize) {
    let mut state = ListState::default().with_selected(Some(cursor));
    let list = List::new(items)
        .highlight_style(style_selected())
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_message(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(
        Paragraph::new(text.to_string())
            .style(style)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn body_title(view: &View) -> String {
    match view {
        View::Previews => "Shows".to_string(),
        View::ShowDetail(show) => show.title.clone(),
        View::Season { season, .. } => season.title.clone(),
        View::Favourites => "Favourites".to_string(),
    }
}

fn breadcrumb(view: &View) -> Vec<String> {
    let mut crumbs = vec!["Podcasts".to_string()];
    match view {
        View::Previews => {}
        View::ShowDetail(show) => crumbs.push(show.title.clone()),
        View::Season { show, season } => {
            crumbs.push(show.title.clone());
            crumbs.push(season.title.clone());
        }
        View::Favourites => crumbs.push("Favourites".to_string()),
    }
    crumbs
}

fn count_label(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}
