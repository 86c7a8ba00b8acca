//! Toast notification system — transient status messages.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use podcast_core::view_state::{Notice, NoticeLevel};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

struct Toast {
    message: String,
    level: NoticeLevel,
    expires: Instant,
}

/// A persistent spinner toast that animates until dismissed.
struct SpinnerToast {
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinner: Option<SpinnerToast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinner: None,
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: NoticeLevel, duration: Duration) {
        // Remove duplicates (same message)
        let msg = message.into();
        self.toasts.retain(|t| t.message != msg);
        self.toasts.push_back(Toast {
            message: msg,
            level,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    /// Show a notice from the view-state machine; errors linger longer.
    pub fn notice(&mut self, notice: &Notice) {
        let secs = match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => 3,
            NoticeLevel::Warning => 4,
            NoticeLevel::Error => 5,
        };
        self.push(notice.message.clone(), notice.level, Duration::from_secs(secs));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, NoticeLevel::Error, Duration::from_secs(5));
    }

    /// Start or replace the spinner.  It animates on every `tick()` and stays
    /// until `dismiss_spinner`.
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some(SpinnerToast {
            message: message.into(),
            frame: 0,
        });
    }

    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Remove expired toasts and advance the spinner frame. Call each tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some(ref mut s) = self.spinner {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    /// Render toasts in the top-right corner of `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60);
        let mut y = area.y + 1;

        let mut rows: Vec<(String, ratatui::style::Color)> = Vec::new();
        if let Some(ref s) = self.spinner {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            rows.push((format!(" {} {} ", icon, s.message), C_TOAST_INFO));
        }
        for toast in self.toasts.iter().rev().take(self.max_visible) {
            let (color, icon) = match toast.level {
                NoticeLevel::Info => (C_TOAST_INFO, "·"),
                NoticeLevel::Success => (C_TOAST_SUCCESS, "✓"),
                NoticeLevel::Warning => (C_TOAST_WARNING, "!"),
                NoticeLevel::Error => (C_TOAST_ERROR, "✗"),
            };
            rows.push((format!(" {} {} ", icon, toast.message), color));
        }

        for (text, color) in rows {
            if y >= area.y + area.height {
                break;
            }
            let w = (text.width() as u16).min(max_width);
            let x = area.x + area.width.saturating_sub(w + 1);
            let toast_area = Rect {
                x,
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            let paragraph = Paragraph::new(Line::from(vec![Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]));
            frame.render_widget(paragraph, toast_area);
            y += 1;
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_collapse() {
        let mut toasts = ToastManager::new();
        toasts.error("offline");
        toasts.error("offline");
        assert_eq!(toasts.toasts.len(), 1);
    }

    #[test]
    fn expired_toasts_are_dropped_on_tick() {
        let mut toasts = ToastManager::new();
        toasts.push("gone", NoticeLevel::Info, Duration::ZERO);
        toasts.tick();
        assert!(toasts.is_empty());
    }

    #[test]
    fn spinner_stays_until_dismissed() {
        let mut toasts = ToastManager::new();
        toasts.spinner("loading");
        toasts.tick();
        assert!(!toasts.is_empty());
        toasts.dismiss_spinner();
        assert!(toasts.is_empty());
    }
}
