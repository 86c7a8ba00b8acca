//! Bottom rows: now-playing bar and the keybindings footer.

use podcast_core::models::PlayingEpisode;
use podcast_core::view_state::View;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_LOADING, C_MUTED, C_PLAYING, C_PRIMARY};

/// One row: what is playing, or a muted placeholder.
pub fn draw_now_playing(
    frame: &mut Frame,
    area: Rect,
    now_playing: Option<&PlayingEpisode>,
    paused: bool,
) {
    let line = match now_playing {
        Some(episode) => {
            let (icon, color) = if paused {
                ("⏸", C_LOADING)
            } else {
                ("▶", C_PLAYING)
            };
            Line::from(vec![
                Span::styled(
                    format!(" {} ", icon),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(episode.title.clone(), Style::default().fg(C_PRIMARY)),
            ])
        }
        None => Line::from(Span::styled(" ■ nothing playing", Style::default().fg(C_MUTED))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn keys_for(view: &View) -> &'static str {
    match view {
        View::Previews => " ↑↓/jk select  Enter open  F favourites  r retry  s stop  Space pause  q quit",
        View::ShowDetail(_) => " ↑↓/jk select  Enter open season  Esc back  s stop  Space pause  q quit",
        View::Season { .. } => {
            " ↑↓/jk select  Enter/p play  f favourite  Esc seasons  s stop  Space pause  q quit"
        }
        View::Favourites => " ↑↓/jk select  Enter/p play  d remove  Esc back  s stop  Space pause  q quit",
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, view: &View) {
    let label = view.name().to_uppercase();
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_for(view), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
